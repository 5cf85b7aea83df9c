//! Deterministic synthetic metric data for demos and tests.
//!
//! RULE: Nothing here may call a platform RNG.
//! The same (seed, agent, profile) always yields the same event list,
//! so reports built on synthetic data are reproducible run to run.

use crate::{
    error::EngineResult,
    kpi::KpiRegistry,
    metric::MetricEvent,
    store::SqliteMetricStore,
    types::Day,
};
use chrono::{Duration, NaiveTime};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A seeded RNG stream for one agent.
pub struct SeededRng {
    inner: Pcg64Mcg,
}

impl SeededRng {
    /// Derive a stream from the master seed and a stable stream index.
    pub fn new(master_seed: u64, stream: u64) -> Self {
        let derived_seed = master_seed ^ (stream.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self { inner: Pcg64Mcg::seed_from_u64(derived_seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Shape of the generated history.
#[derive(Debug, Clone)]
pub struct SyntheticProfile {
    /// First calendar day with data.
    pub start:             Day,
    /// Consecutive calendar days to generate.
    pub days:              u32,
    /// Probability that a KPI is reported on a given day.
    pub coverage:          f64,
    /// Probability that a reported KPI gets an extra, later reading.
    pub correction_rate:   f64,
    /// Readings are drawn uniformly in target × [1 - spread, 1 + spread].
    pub spread:            f64,
    /// Metric keys outside the registry to sprinkle in.
    pub unregistered_keys: Vec<String>,
}

impl SyntheticProfile {
    pub fn new(start: Day, days: u32) -> Self {
        Self {
            start,
            days,
            coverage:          0.85,
            correction_rate:   0.25,
            spread:            0.4,
            unregistered_keys: vec!["login_count".into()],
        }
    }
}

/// Generate a history for `agent_id` covering every KPI in `registry`.
pub fn generate(
    registry: &KpiRegistry,
    agent_id: &str,
    seed:     u64,
    profile:  &SyntheticProfile,
) -> Vec<MetricEvent> {
    let stream = agent_id.bytes().fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(b as u64));
    let mut rng = SeededRng::new(seed, stream);
    let mut events = Vec::new();

    for offset in 0..profile.days {
        let day = profile.start + Duration::days(offset as i64);

        for def in registry.all() {
            if !rng.chance(profile.coverage) {
                continue;
            }
            let hour = 8 + rng.next_u64_below(8) as u32;
            let value = round2(def.target * rng.uniform(1.0 - profile.spread, 1.0 + profile.spread));
            events.push(reading(agent_id, &def.key, value, day, hour));

            if rng.chance(profile.correction_rate) {
                let corrected = round2(value * rng.uniform(0.9, 1.1));
                events.push(reading(agent_id, &def.key, corrected, day, hour + 2));
            }
        }

        for key in &profile.unregistered_keys {
            let value = rng.next_u64_below(20) as f64;
            events.push(reading(agent_id, key, value, day, 7));
        }
    }

    log::debug!(
        "Generated {} synthetic events for {agent_id} over {} days",
        events.len(),
        profile.days
    );
    events
}

/// Write a generated history for `agent_id` into `store`, but only when the
/// store holds no events for any agent. Returns the number of events written.
pub fn seed_empty_store(
    store:    &mut SqliteMetricStore,
    registry: &KpiRegistry,
    agent_id: &str,
    seed:     u64,
    profile:  &SyntheticProfile,
) -> EngineResult<usize> {
    let existing = store.total_events()?;
    if existing > 0 {
        log::info!("Store already holds {existing} events; not seeding synthetic data");
        return Ok(0);
    }
    let events = generate(registry, agent_id, seed, profile);
    store.insert_events(&events)?;
    log::info!("Seeded {} synthetic events for {agent_id}", events.len());
    Ok(events.len())
}

fn reading(agent_id: &str, key: &str, value: f64, day: Day, hour: u32) -> MetricEvent {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    MetricEvent::new(agent_id, key, value, day.and_time(time).and_utc())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
