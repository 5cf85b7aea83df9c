//! Shared primitive types used across the engine.

/// Stable identifier of the agent whose metrics are being scored.
pub type AgentId = String;

/// Raw metric key as emitted by the metric store, e.g. `"aht"`.
/// Matches `KpiDefinition::key` when the metric is a registered KPI.
pub type MetricKey = String;

/// One calendar day (UTC). The unit of daily resolution and scoring.
pub type Day = chrono::NaiveDate;
