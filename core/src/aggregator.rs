//! Temporal aggregator — folds scored days into the window shapes the
//! dashboards consume.
//!
//! Every operation here is a pure function of the event slice it is given.
//! Fetching from a MetricStore is the engine's job (see engine.rs).

use crate::{
    config::EngineConfig,
    error::EngineError,
    kpi::KpiRegistry,
    metric::MetricEvent,
    resolver::{group_by_calendar_day, resolve_day},
    scoring::{DaySummary, ScoreEvaluator},
    types::Day,
};
use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RewardTotals {
    pub xp:     u64,
    pub points: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RewardAverages {
    pub xp_per_day:     u32,
    pub points_per_day: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WindowSummary {
    pub total_days_tracked: usize,
    /// Newest first.
    pub days:               Vec<DaySummary>,
    pub totals:             RewardTotals,
    pub averages:           RewardAverages,
    pub days_with_data:     usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub date:       Day,
    pub xp_earned:  u32,
    pub target:     u32,
    pub percentage: f64,
    pub display:    String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeeklyBucket {
    /// 1-based, oldest bucket first.
    pub week:          usize,
    pub label:         String,
    pub points_earned: u64,
    pub days_in_week:  usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Week,
    Month,
}

impl Period {
    /// First day of the period containing `today`.
    /// Weeks start on Sunday.
    pub fn start(&self, today: Day) -> Day {
        match self {
            Self::Week => {
                let offset = today.weekday().num_days_from_sunday() as i64;
                today - Duration::days(offset)
            }
            Self::Month => today.with_day(1).unwrap_or(today),
        }
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week"  => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other   => Err(EngineError::InvalidPeriod { period: other.to_string() }),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Week  => "week",
            Self::Month => "month",
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KpiDataPoint {
    pub date:   Day,
    pub value:  f64,
    pub target: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KpiSeries {
    pub key:         String,
    pub name:        String,
    pub unit:        String,
    /// Oldest first. Days without a reading are absent, not interpolated.
    pub data_points: Vec<KpiDataPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeriodActivity {
    pub period:       Period,
    pub start:        Day,
    pub kpi_metrics:  Vec<KpiSeries>,
    pub total_points: u64,
}

pub struct TemporalAggregator<'a> {
    registry:  &'a KpiRegistry,
    config:    &'a EngineConfig,
    evaluator: ScoreEvaluator<'a>,
}

impl<'a> TemporalAggregator<'a> {
    pub fn new(registry: &'a KpiRegistry, config: &'a EngineConfig) -> Self {
        Self {
            registry,
            config,
            evaluator: ScoreEvaluator::new(registry, &config.status, config.daily_xp_target),
        }
    }

    /// Scored summaries for the `n` most recent dates with data, newest first.
    pub fn last_n_days(&self, events: &[MetricEvent], n: usize) -> Vec<DaySummary> {
        let by_day = group_by_calendar_day(events);
        by_day
            .iter()
            .rev()
            .take(n)
            .map(|(date, day_events)| self.evaluator.score_day(*date, &resolve_day(day_events)))
            .collect()
    }

    pub fn window_summary(&self, events: &[MetricEvent], n: usize) -> WindowSummary {
        let days = self.last_n_days(events, n);

        let totals = days.iter().fold(RewardTotals::default(), |acc, d| RewardTotals {
            xp:     acc.xp + d.xp_earned as u64,
            points: acc.points + d.points_earned as u64,
        });
        let averages = if days.is_empty() {
            RewardAverages::default()
        } else {
            let count = days.len() as f64;
            RewardAverages {
                xp_per_day:     (totals.xp as f64 / count).round() as u32,
                points_per_day: (totals.points as f64 / count).round() as u32,
            }
        };

        WindowSummary {
            total_days_tracked: days.len(),
            days_with_data: days.iter().filter(|d| d.has_data()).count(),
            totals,
            averages,
            days,
        }
    }

    /// Daily XP against the daily target, oldest first.
    pub fn daily_trend(&self, events: &[MetricEvent], n: usize) -> Vec<TrendPoint> {
        let target = self.config.daily_xp_target;
        let mut points: Vec<TrendPoint> = self
            .last_n_days(events, n)
            .into_iter()
            .map(|day| TrendPoint {
                date:       day.date,
                xp_earned:  day.xp_earned,
                target,
                percentage: (day.xp_earned as f64 / target as f64 * 100.0).min(100.0),
                display:    format!("{}/{}", day.xp_earned, target),
            })
            .collect();
        points.reverse();
        points
    }

    /// Points per week over the most recent trajectory span of distinct
    /// dates. Always returns `trajectory_weeks` buckets, oldest first;
    /// with short history the later buckets are empty.
    pub fn weekly_trajectory(&self, events: &[MetricEvent]) -> Vec<WeeklyBucket> {
        let by_day = group_by_calendar_day(events);
        let dates: Vec<Day> = by_day.keys().copied().collect();
        let recent = &dates[dates.len().saturating_sub(self.config.trajectory_span())..];
        let mut chunks = recent.chunks(self.config.days_per_week.max(1));

        (1..=self.config.trajectory_weeks)
            .map(|week| {
                let week_dates = chunks.next().unwrap_or(&[]);
                let points_earned = week_dates
                    .iter()
                    .map(|date| {
                        let resolved = resolve_day(by_day.get(date).into_iter().flatten());
                        self.evaluator.score_day(*date, &resolved).points_earned as u64
                    })
                    .sum();
                WeeklyBucket {
                    week,
                    label: format!("Week {week}"),
                    points_earned,
                    days_in_week: week_dates.len(),
                }
            })
            .collect()
    }

    /// Per-KPI time series and total points for the period containing `today`.
    pub fn period_activity(
        &self,
        events: &[MetricEvent],
        period: Period,
        today:  Day,
    ) -> PeriodActivity {
        let start = period.start(today);
        let by_day = group_by_calendar_day(events.iter().filter(|e| e.day() >= start));

        let mut series: BTreeMap<usize, KpiSeries> = BTreeMap::new();
        let mut total_points = 0u64;

        for (date, day_events) in &by_day {
            let resolved = resolve_day(day_events);
            for (pos, def) in self.registry.all().iter().enumerate() {
                let Some(event) = resolved.get(&def.key) else {
                    continue;
                };
                series
                    .entry(pos)
                    .or_insert_with(|| KpiSeries {
                        key:         def.key.clone(),
                        name:        def.name.clone(),
                        unit:        def.unit.clone(),
                        data_points: Vec::new(),
                    })
                    .data_points
                    .push(KpiDataPoint {
                        date:   *date,
                        value:  event.value,
                        target: def.target,
                    });
            }
            total_points += self.evaluator.score_day(*date, &resolved).points_earned as u64;
        }

        PeriodActivity {
            period,
            start,
            kpi_metrics: series.into_values().collect(),
            total_points,
        }
    }
}
