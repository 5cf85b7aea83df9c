//! Score evaluator — applies the KPI registry to one resolved agent-day.
//!
//! Two views of the same raw score are produced:
//!   - the display percentage, clamped to [0, 100];
//!   - the reward multiplier, NOT clamped, so a KPI scored at 150%
//!     earns 1.5x its base XP and points.

use crate::{
    config::StatusThresholds,
    kpi::KpiRegistry,
    resolver::ResolvedDayMetrics,
    types::Day,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum KpiStatus {
    Excellent,
    OnTrack,
    AtRisk,
    Critical,
}

impl KpiStatus {
    pub fn classify(raw_score: f64, thresholds: &StatusThresholds) -> Self {
        if raw_score >= thresholds.excellent {
            Self::Excellent
        } else if raw_score >= thresholds.on_track {
            Self::OnTrack
        } else if raw_score >= thresholds.at_risk {
            Self::AtRisk
        } else {
            Self::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::OnTrack   => "on-track",
            Self::AtRisk    => "at-risk",
            Self::Critical  => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KpiResult {
    pub key:        String,
    pub name:       String,
    pub value:      f64,
    pub target:     f64,
    pub unit:       String,
    pub raw_score:  f64,
    /// `raw_score` clamped to [0, 100].
    pub percentage: f64,
    pub achieved:   bool,
    pub status:     KpiStatus,
}

impl KpiResult {
    /// Value with its unit, e.g. `"8.5%"`.
    pub fn formatted_value(&self) -> String {
        format!("{}{}", self.value, self.unit)
    }

    /// Target with its unit, e.g. `"23min"`.
    pub fn formatted_target(&self) -> String {
        format!("{}{}", self.target, self.unit)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DaySummary {
    pub date:                Day,
    pub kpi_results:         Vec<KpiResult>,
    pub xp_earned:           u32,
    pub points_earned:       u32,
    /// XP earned as a share of the daily XP target. Not clamped.
    pub progress_percentage: u32,
}

impl DaySummary {
    pub fn has_data(&self) -> bool {
        !self.kpi_results.is_empty()
    }
}

pub struct ScoreEvaluator<'a> {
    registry:        &'a KpiRegistry,
    thresholds:      &'a StatusThresholds,
    daily_xp_target: u32,
}

impl<'a> ScoreEvaluator<'a> {
    pub fn new(
        registry:        &'a KpiRegistry,
        thresholds:      &'a StatusThresholds,
        daily_xp_target: u32,
    ) -> Self {
        Self { registry, thresholds, daily_xp_target }
    }

    /// Score one agent-day. KPIs without a finite reading are skipped
    /// entirely; readings for keys outside the registry are ignored.
    pub fn score_day(&self, date: Day, resolved: &ResolvedDayMetrics) -> DaySummary {
        let mut kpi_results = Vec::new();
        let mut xp_total = 0.0f64;
        let mut points_total = 0.0f64;

        for def in self.registry.all() {
            let Some(event) = resolved.get(&def.key) else {
                continue;
            };
            if !event.value.is_finite() {
                log::warn!("{date}: skipping non-finite {} reading {}", def.key, event.value);
                continue;
            }
            let raw_score = def.score(event.value);
            let multiplier = raw_score / 100.0;
            xp_total += (multiplier * def.xp_rate).round();
            points_total += (multiplier * def.points_rate).round();

            kpi_results.push(KpiResult {
                key:        def.key.clone(),
                name:       def.name.clone(),
                value:      event.value,
                target:     def.target,
                unit:       def.unit.clone(),
                raw_score,
                percentage: raw_score.clamp(0.0, 100.0),
                achieved:   raw_score >= 100.0,
                status:     KpiStatus::classify(raw_score, self.thresholds),
            });
        }

        if log::log_enabled!(log::Level::Trace) {
            for key in resolved.keys().filter(|k| self.registry.get(k).is_none()) {
                log::trace!("{date}: ignoring unregistered metric '{key}'");
            }
        }

        if !kpi_results.is_empty()
            && kpi_results.iter().all(|r| r.status == KpiStatus::Critical)
        {
            log::warn!("{date}: every scored KPI is critical");
        }

        let xp_earned = to_reward(xp_total);
        DaySummary {
            date,
            kpi_results,
            xp_earned,
            points_earned: to_reward(points_total),
            progress_percentage: to_reward(
                xp_earned as f64 / self.daily_xp_target as f64 * 100.0,
            ),
        }
    }
}

/// Round to a whole, non-negative reward amount.
fn to_reward(total: f64) -> u32 {
    if total.is_finite() {
        total.round().max(0.0) as u32
    } else {
        0
    }
}
