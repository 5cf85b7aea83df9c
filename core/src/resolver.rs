//! Daily resolver — partitions raw events by calendar day and collapses
//! repeated readings of a metric within a day to one authoritative value.
//!
//! Day boundaries are UTC: every timestamp is normalised to UTC when it
//! is parsed, and the calendar date is taken from that instant.

use crate::{
    metric::MetricEvent,
    types::{Day, MetricKey},
};
use std::collections::{BTreeMap, BTreeSet};

/// At most one event per metric key for a single agent-day.
pub type ResolvedDayMetrics = BTreeMap<MetricKey, MetricEvent>;

/// Keep the latest reading per metric key.
/// On equal timestamps the event seen last in `events` wins.
pub fn resolve_day<'a, I>(events: I) -> ResolvedDayMetrics
where
    I: IntoIterator<Item = &'a MetricEvent>,
{
    let mut resolved = ResolvedDayMetrics::new();
    for event in events {
        let keep_current = resolved
            .get(&event.metric_key)
            .is_some_and(|current| current.timestamp > event.timestamp);
        if !keep_current {
            resolved.insert(event.metric_key.clone(), event.clone());
        }
    }
    resolved
}

/// Group events by UTC calendar date. Input order is kept within a day.
pub fn group_by_calendar_day<'a, I>(events: I) -> BTreeMap<Day, Vec<MetricEvent>>
where
    I: IntoIterator<Item = &'a MetricEvent>,
{
    let mut days: BTreeMap<Day, Vec<MetricEvent>> = BTreeMap::new();
    for event in events {
        days.entry(event.day()).or_default().push(event.clone());
    }
    days
}

/// Distinct calendar dates present in `events`, ascending.
pub fn distinct_dates<'a, I>(events: I) -> Vec<Day>
where
    I: IntoIterator<Item = &'a MetricEvent>,
{
    events
        .into_iter()
        .map(MetricEvent::day)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
