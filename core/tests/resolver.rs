//! Daily resolver tests: same-day duplicate resolution and day grouping.

use kpi_core::{
    metric::{parse_timestamp, MetricEvent},
    resolver::{distinct_dates, group_by_calendar_day, resolve_day},
    types::Day,
};

fn ev(key: &str, value: f64, ts: &str) -> MetricEvent {
    MetricEvent::parse("agent-7", key, value, ts).expect("valid timestamp")
}

fn day(s: &str) -> Day {
    s.parse().expect("valid date")
}

#[test]
fn later_reading_wins_within_a_day() {
    let events = vec![
        ev("aht", 30.0, "2024-03-04T09:00:00Z"),
        ev("aht", 25.0, "2024-03-04T14:00:00Z"),
    ];
    let resolved = resolve_day(&events);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved["aht"].value, 25.0);
}

#[test]
fn later_reading_wins_regardless_of_input_order() {
    let events = vec![
        ev("aht", 25.0, "2024-03-04T14:00:00Z"),
        ev("nps", 70.0, "2024-03-04T10:00:00Z"),
        ev("aht", 30.0, "2024-03-04T09:00:00Z"),
    ];
    let resolved = resolve_day(&events);
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved["aht"].value, 25.0);
    assert_eq!(resolved["nps"].value, 70.0);
}

#[test]
fn resolving_is_idempotent() {
    let events = vec![
        ev("aht", 30.0, "2024-03-04T09:00:00Z"),
        ev("aht", 25.0, "2024-03-04T14:00:00Z"),
        ev("qa_score", 88.0, "2024-03-04T11:00:00Z"),
    ];
    let once = resolve_day(&events);
    let twice = resolve_day(once.values());
    assert_eq!(once, twice);
}

#[test]
fn empty_input_resolves_to_nothing() {
    let events: Vec<MetricEvent> = Vec::new();
    assert!(resolve_day(&events).is_empty());
    assert!(group_by_calendar_day(&events).is_empty());
    assert!(distinct_dates(&events).is_empty());
}

#[test]
fn events_group_by_utc_calendar_day() {
    let events = vec![
        ev("aht", 20.0, "2024-03-05T08:00:00Z"),
        ev("aht", 21.0, "2024-03-04T23:59:59Z"),
        ev("nps", 70.0, "2024-03-05T17:30:00Z"),
        ev("aht", 22.0, "2024-03-05T00:00:00Z"),
    ];
    let days = group_by_calendar_day(&events);

    let keys: Vec<Day> = days.keys().copied().collect();
    assert_eq!(keys, vec![day("2024-03-04"), day("2024-03-05")]);
    assert_eq!(days[&day("2024-03-04")].len(), 1);

    // Input order is kept inside a day.
    let values: Vec<f64> = days[&day("2024-03-05")].iter().map(|e| e.value).collect();
    assert_eq!(values, vec![20.0, 70.0, 22.0]);
}

#[test]
fn distinct_dates_are_sorted_ascending() {
    let events = vec![
        ev("aht", 1.0, "2024-03-09T08:00:00Z"),
        ev("aht", 1.0, "2024-03-01T08:00:00Z"),
        ev("nps", 1.0, "2024-03-09T09:00:00Z"),
        ev("aht", 1.0, "2024-03-05T08:00:00Z"),
    ];
    assert_eq!(
        distinct_dates(&events),
        vec![day("2024-03-01"), day("2024-03-05"), day("2024-03-09")]
    );
}

#[test]
fn timestamps_accept_naive_and_offset_forms() {
    let utc = parse_timestamp("2024-03-04T09:00:00Z").unwrap();
    assert_eq!(parse_timestamp("2024-03-04T09:00:00").unwrap(), utc);
    assert_eq!(parse_timestamp("2024-03-04 09:00:00").unwrap(), utc);
    assert_eq!(parse_timestamp("2024-03-04T11:00:00+02:00").unwrap(), utc);
    assert_eq!(parse_timestamp("2024-03-04T09:00:00.000Z").unwrap(), utc);
}

#[test]
fn malformed_timestamps_fail_fast() {
    for raw in ["", "yesterday", "2024-13-40T00:00:00Z", "2024-03-04"] {
        let err = MetricEvent::parse("agent-7", "aht", 20.0, raw).unwrap_err();
        assert!(
            matches!(err, kpi_core::error::EngineError::MalformedTimestamp { .. }),
            "expected MalformedTimestamp for {raw:?}, got {err:?}"
        );
    }
}

#[test]
fn non_finite_values_are_rejected_at_parse() {
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = MetricEvent::parse("agent-7", "nrpc", value, "2024-03-04T09:00:00Z").unwrap_err();
        assert!(
            matches!(err, kpi_core::error::EngineError::NonFiniteValue { .. }),
            "expected NonFiniteValue for {value}, got {err:?}"
        );
    }
}
