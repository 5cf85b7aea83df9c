//! KPI scoring and temporal aggregation for agent performance dashboards.
//!
//! Raw metric readings go in; per-day scores, XP and points rewards, and
//! daily / weekly / period summaries come out.

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod kpi;
pub mod metric;
pub mod resolver;
pub mod scoring;
pub mod store;
pub mod synthetic;
pub mod types;
