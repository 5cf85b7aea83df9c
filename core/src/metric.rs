//! Raw metric events and the store boundary.
//!
//! RULE: The engine never writes through a MetricStore.
//! Every top-level computation performs one `query()` and works
//! on the returned snapshot.

use crate::{
    error::{EngineError, EngineResult},
    types::{AgentId, Day, MetricKey},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw metric reading produced by an external system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricEvent {
    pub agent_id:   AgentId,
    pub metric_key: MetricKey,
    pub value:      f64,
    pub timestamp:  DateTime<Utc>,
}

impl MetricEvent {
    pub fn new(
        agent_id:   impl Into<AgentId>,
        metric_key: impl Into<MetricKey>,
        value:      f64,
        timestamp:  DateTime<Utc>,
    ) -> Self {
        Self {
            agent_id:   agent_id.into(),
            metric_key: metric_key.into(),
            value,
            timestamp,
        }
    }

    /// Build an event from a textual timestamp.
    /// Fails on a malformed timestamp or a NaN/infinite value.
    pub fn parse(
        agent_id:   impl Into<AgentId>,
        metric_key: impl Into<MetricKey>,
        value:      f64,
        timestamp:  &str,
    ) -> EngineResult<Self> {
        let metric_key = metric_key.into();
        if !value.is_finite() {
            return Err(EngineError::NonFiniteValue { key: metric_key, value });
        }
        Ok(Self::new(agent_id, metric_key, value, parse_timestamp(timestamp)?))
    }

    /// Calendar day this event belongs to (UTC).
    pub fn day(&self) -> Day {
        self.timestamp.date_naive()
    }
}

/// Parse a metric timestamp and normalise it to UTC.
///
/// Accepts RFC 3339 with an offset, or a naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// (also with a space separator) which is taken to already be UTC.
pub fn parse_timestamp(raw: &str) -> EngineResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(EngineError::MalformedTimestamp { raw: raw.to_string() })
}

/// Query criteria accepted by a MetricStore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricFilter {
    pub agent_id: AgentId,
}

impl MetricFilter {
    pub fn agent(agent_id: impl Into<AgentId>) -> Self {
        Self { agent_id: agent_id.into() }
    }
}

/// The only thing the engine needs from persistent storage.
/// Results may come back in any order.
pub trait MetricStore {
    fn query(&self, filter: &MetricFilter) -> EngineResult<Vec<MetricEvent>>;
}

impl<S: MetricStore + ?Sized> MetricStore for &S {
    fn query(&self, filter: &MetricFilter) -> EngineResult<Vec<MetricEvent>> {
        (**self).query(filter)
    }
}

/// Vector-backed store. Returns events in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricStore {
    events: Vec<MetricEvent>,
}

impl InMemoryMetricStore {
    pub fn with_events(events: Vec<MetricEvent>) -> Self {
        Self { events }
    }
}

impl MetricStore for InMemoryMetricStore {
    fn query(&self, filter: &MetricFilter) -> EngineResult<Vec<MetricEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.agent_id == filter.agent_id)
            .cloned()
            .collect())
    }
}
