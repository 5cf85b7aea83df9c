//! Clock — the engine's only source of "today".
//!
//! Period windows (this week, this month) are anchored on the clock,
//! so tests pin it with FixedClock instead of reading the system time.

use crate::types::Day;
use chrono::Utc;

pub trait Clock: Send + Sync {
    /// The current UTC calendar date.
    fn today(&self) -> Day;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Day {
        Utc::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Day);

impl Clock for FixedClock {
    fn today(&self) -> Day {
        self.0
    }
}
