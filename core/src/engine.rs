//! The KPI engine — fetch-then-compute over a MetricStore.
//!
//! FLOW (every public operation):
//!   1. One query against the metric store for the agent.
//!   2. Daily resolver groups by UTC day and keeps the latest reading per key.
//!   3. Score evaluator scores each day against the registry.
//!   4. Temporal aggregator folds the days into the requested shape.
//!
//! RULES:
//!   - Nothing is cached between calls. Each call recomputes from the store.
//!   - The registry is shared and read-only.
//!   - Sparse or missing data is an empty result, never an error.

use crate::{
    aggregator::{Period, PeriodActivity, TemporalAggregator, TrendPoint, WeeklyBucket, WindowSummary},
    clock::{Clock, SystemClock},
    config::EngineConfig,
    error::EngineResult,
    kpi::KpiRegistry,
    metric::{InMemoryMetricStore, MetricEvent, MetricFilter, MetricStore},
    resolver::distinct_dates,
    scoring::DaySummary,
    types::Day,
};
use std::sync::Arc;

pub struct KpiEngine<S: MetricStore> {
    pub config: EngineConfig,
    registry:   Arc<KpiRegistry>,
    clock:      Box<dyn Clock>,
    store:      S,
}

impl<S: MetricStore> KpiEngine<S> {
    pub fn new(store: S, registry: Arc<KpiRegistry>, config: EngineConfig) -> Self {
        Self {
            config,
            registry,
            clock: Box::new(SystemClock),
            store,
        }
    }

    /// Build an engine from the data/ directory: engine config plus the
    /// KPI registry file.
    pub fn build(store: S, data_dir: &str) -> anyhow::Result<Self> {
        let config = EngineConfig::load(data_dir)?;
        let registry = Arc::new(KpiRegistry::load(data_dir)?);
        Ok(Self::new(store, registry, config))
    }

    /// Replace the clock used to anchor period windows.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn registry(&self) -> &KpiRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> Day {
        self.clock.today()
    }

    fn fetch(&self, agent_id: &str) -> EngineResult<Vec<MetricEvent>> {
        let events = self.store.query(&MetricFilter::agent(agent_id))?;
        log::debug!("Fetched {} metric events for {agent_id}", events.len());
        Ok(events)
    }

    fn aggregator(&self) -> TemporalAggregator<'_> {
        TemporalAggregator::new(&self.registry, &self.config)
    }

    /// Day summaries for the `n` most recent dates with data, newest first.
    pub fn last_n_days(&self, agent_id: &str, n: usize) -> EngineResult<Vec<DaySummary>> {
        let events = self.fetch(agent_id)?;
        Ok(self.aggregator().last_n_days(&events, n))
    }

    pub fn window_summary(&self, agent_id: &str, n: usize) -> EngineResult<WindowSummary> {
        let events = self.fetch(agent_id)?;
        let summary = self.aggregator().window_summary(&events, n);
        log::debug!(
            "{agent_id}: window of {n} -> {} days, xp={} points={}",
            summary.total_days_tracked,
            summary.totals.xp,
            summary.totals.points
        );
        Ok(summary)
    }

    /// Daily XP trend, oldest first.
    pub fn daily_trend(&self, agent_id: &str, n: usize) -> EngineResult<Vec<TrendPoint>> {
        let events = self.fetch(agent_id)?;
        Ok(self.aggregator().daily_trend(&events, n))
    }

    pub fn weekly_trajectory(&self, agent_id: &str) -> EngineResult<Vec<WeeklyBucket>> {
        let events = self.fetch(agent_id)?;
        Ok(self.aggregator().weekly_trajectory(&events))
    }

    pub fn period_activity(&self, agent_id: &str, period: Period) -> EngineResult<PeriodActivity> {
        let events = self.fetch(agent_id)?;
        let today = self.clock.today();
        let activity = self.aggregator().period_activity(&events, period, today);
        log::debug!(
            "{agent_id}: {period} from {} -> {} KPIs, {} points",
            activity.start,
            activity.kpi_metrics.len(),
            activity.total_points
        );
        Ok(activity)
    }

    /// Like period_activity, with the period given by name ("week" | "month").
    pub fn period_activity_named(&self, agent_id: &str, period: &str) -> EngineResult<PeriodActivity> {
        let period: Period = period.parse()?;
        self.period_activity(agent_id, period)
    }

    /// Distinct dates with data for an agent, ascending.
    pub fn tracked_dates(&self, agent_id: &str) -> EngineResult<Vec<Day>> {
        let events = self.fetch(agent_id)?;
        Ok(distinct_dates(&events))
    }
}

impl KpiEngine<InMemoryMetricStore> {
    /// In-memory engine with the built-in registry and default config.
    /// Used in tests.
    pub fn build_test(events: Vec<MetricEvent>) -> Self {
        Self::new(
            InMemoryMetricStore::with_events(events),
            KpiRegistry::builtin(),
            EngineConfig::default_test(),
        )
    }
}
