use serde::{Deserialize, Serialize};

/// Score boundaries for status classification. A raw score at or above a
/// boundary earns that status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusThresholds {
    pub excellent: f64,
    pub on_track:  f64,
    pub at_risk:   f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            excellent: 95.0,
            on_track:  80.0,
            at_risk:   60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// XP an agent is expected to earn per day. Drives trend percentages.
    pub daily_xp_target:  u32,
    /// Default window length for window summaries.
    pub summary_days:     usize,
    /// Default window length for the daily trend.
    pub trend_days:       usize,
    /// Number of buckets in the weekly trajectory.
    pub trajectory_weeks: usize,
    /// Distinct dates per trajectory bucket.
    pub days_per_week:    usize,
    pub status:           StatusThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            daily_xp_target:  100,
            summary_days:     5,
            trend_days:       7,
            trajectory_weeks: 4,
            days_per_week:    7,
            status:           StatusThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Load from `<data_dir>/engine/engine_config.json`.
    /// Missing fields fall back to their defaults.
    /// In tests, use EngineConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine/engine_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        if config.days_per_week == 0 || config.daily_xp_target == 0 {
            anyhow::bail!("{path}: days_per_week and daily_xp_target must be non-zero");
        }
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self::default()
    }

    /// Number of distinct dates covered by the weekly trajectory.
    pub fn trajectory_span(&self) -> usize {
        self.trajectory_weeks * self.days_per_week
    }
}
