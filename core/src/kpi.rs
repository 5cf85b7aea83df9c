//! KPI registry — the declarative table that turns raw metric values into
//! scores and rewards.
//!
//! RULE: The registry is built once and never mutated.
//! Scoring code only ever reads it through `get()` and `all()`.
//! Iteration order is declaration order and is part of the contract:
//! day summaries list their KPI results in this order.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Signature of a scoring formula: `(value, target) -> raw score`.
/// The raw score is unclamped and may exceed 100 for over-achievement.
pub type ScoreFn = fn(f64, f64) -> f64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// The scoring formula attached to a KPI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFormula {
    /// Full marks at or under target, then a linear penalty capped at 50.
    LowerIsBetterPenalty,
    /// Linear credit for attainment, capped at 150.
    HigherIsBetterBonus,
    /// Linear credit up to target, no bonus for overshoot.
    HigherIsBetterFloor,
    /// Any other pure formula. Only constructible from code.
    #[serde(skip)]
    Custom(ScoreFn),
}

impl ScoreFormula {
    pub fn apply(&self, value: f64, target: f64) -> f64 {
        match self {
            Self::LowerIsBetterPenalty => lower_is_better_penalty(value, target),
            Self::HigherIsBetterBonus  => higher_is_better_bonus(value, target),
            Self::HigherIsBetterFloor  => higher_is_better_floor(value, target),
            Self::Custom(f)            => f(value, target),
        }
    }
}

pub fn lower_is_better_penalty(value: f64, target: f64) -> f64 {
    if value <= target {
        return 100.0;
    }
    let penalty = ((value - target) / target * 50.0).min(50.0);
    (100.0 - penalty).max(0.0)
}

pub fn higher_is_better_bonus(value: f64, target: f64) -> f64 {
    (value / target * 100.0).min(150.0)
}

pub fn higher_is_better_floor(value: f64, target: f64) -> f64 {
    if value >= target {
        return 100.0;
    }
    (value / target * 100.0).max(0.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub key:         String,
    pub name:        String,
    /// Advisory relative importance. Never applied during scoring.
    pub weight:      f64,
    pub target:      f64,
    pub direction:   Direction,
    pub unit:        String,
    /// Presentation ceiling. Raw scores may exceed it.
    pub max_points:  f64,
    /// XP granted at exactly 100% achievement.
    pub xp_rate:     f64,
    /// Points granted at exactly 100% achievement.
    pub points_rate: f64,
    pub formula:     ScoreFormula,
}

impl KpiDefinition {
    /// Unclamped raw score for `value` against this KPI's target.
    pub fn score(&self, value: f64) -> f64 {
        self.formula.apply(value, self.target)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct KpiRegistryFile {
    kpis: Vec<KpiDefinition>,
}

#[derive(Debug, Clone)]
pub struct KpiRegistry {
    definitions: Vec<KpiDefinition>,
    index:       HashMap<String, usize>,
}

static BUILTIN: OnceLock<Arc<KpiRegistry>> = OnceLock::new();

impl KpiRegistry {
    /// Validate and index a set of definitions.
    /// Rejects duplicate keys and non-positive or non-finite targets.
    pub fn from_definitions(definitions: Vec<KpiDefinition>) -> EngineResult<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if !(def.target.is_finite() && def.target > 0.0) {
                return Err(EngineError::InvalidTarget {
                    key:    def.key.clone(),
                    target: def.target,
                });
            }
            if index.insert(def.key.clone(), i).is_some() {
                return Err(EngineError::DuplicateKpiKey { key: def.key.clone() });
            }
        }
        Ok(Self { definitions, index })
    }

    /// Load from `<data_dir>/kpi/kpi_registry.json`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/kpi/kpi_registry.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: KpiRegistryFile = serde_json::from_str(&content)?;
        let registry = Self::from_definitions(file.kpis)?;
        log::debug!("Loaded {} KPI definitions from {path}", registry.len());
        Ok(registry)
    }

    /// The process-wide built-in registry. Built on first use, shared after.
    pub fn builtin() -> Arc<KpiRegistry> {
        BUILTIN
            .get_or_init(|| {
                let definitions = builtin_definitions();
                let index = definitions
                    .iter()
                    .enumerate()
                    .map(|(i, d)| (d.key.clone(), i))
                    .collect();
                Arc::new(Self { definitions, index })
            })
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<&KpiDefinition> {
        self.index.get(key).map(|&i| &self.definitions[i])
    }

    /// All definitions in declaration order.
    pub fn all(&self) -> &[KpiDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn builtin_definitions() -> Vec<KpiDefinition> {
    use crate::kpi::{Direction::*, ScoreFormula::*};

    let kpi = |key: &str, name: &str, weight: f64, target: f64,
               direction: Direction, unit: &str, formula: ScoreFormula| KpiDefinition {
        key:         key.into(),
        name:        name.into(),
        weight,
        target,
        direction,
        unit:        unit.into(),
        max_points:  100.0,
        xp_rate:     10.0,
        points_rate: 100.0,
        formula,
    };

    vec![
        kpi("new_refund_pct",     "New Refund %",        10.0,   8.0, LowerIsBetter,  "%",   LowerIsBetterPenalty),
        kpi("new_conversion_pct", "New Conversion %",    20.0,  20.0, HigherIsBetter, "%",   HigherIsBetterBonus),
        kpi("nrpc",               "NRPC",                25.0,  50.0, HigherIsBetter, "$",   HigherIsBetterBonus),
        kpi("aht",                "Average Handle Time", 20.0,  23.0, LowerIsBetter,  "min", LowerIsBetterPenalty),
        kpi("nps",                "Net Promoter Score",  15.0,  65.0, HigherIsBetter, "",    HigherIsBetterFloor),
        kpi("qa_score",           "QA Score",            10.0,  80.0, HigherIsBetter, "%",   HigherIsBetterFloor),
        kpi("aos",                "Average Order Size",   0.0, 100.0, HigherIsBetter, "$",   HigherIsBetterBonus),
        kpi("revenue",            "Revenue",              0.0, 500.0, HigherIsBetter, "$",   HigherIsBetterBonus),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_full_marks_at_target() {
        assert_eq!(lower_is_better_penalty(8.0, 8.0), 100.0);
        assert_eq!(lower_is_better_penalty(2.0, 8.0), 100.0);
    }

    #[test]
    fn penalty_is_linear_then_capped() {
        assert_eq!(lower_is_better_penalty(12.0, 8.0), 75.0);
        assert_eq!(lower_is_better_penalty(16.0, 8.0), 50.0);
        assert_eq!(lower_is_better_penalty(1000.0, 8.0), 50.0);
    }

    #[test]
    fn penalty_non_increasing_above_target() {
        let target = 23.0;
        let mut prev = lower_is_better_penalty(target, target);
        let mut v = target;
        while v < target * 4.0 {
            v += 0.5;
            let s = lower_is_better_penalty(v, target);
            assert!(s <= prev, "score rose from {prev} to {s} at value {v}");
            assert!(s >= 0.0);
            prev = s;
        }
    }

    #[test]
    fn bonus_scales_and_caps() {
        assert_eq!(higher_is_better_bonus(25.0, 20.0), 125.0);
        assert_eq!(higher_is_better_bonus(40.0, 20.0), 150.0);
        assert_eq!(higher_is_better_bonus(10.0, 20.0), 50.0);
    }

    #[test]
    fn floor_never_exceeds_100() {
        assert_eq!(higher_is_better_floor(90.0, 65.0), 100.0);
        assert_eq!(higher_is_better_floor(40.0, 80.0), 50.0);
        assert_eq!(higher_is_better_floor(-5.0, 80.0), 0.0);
    }

    #[test]
    fn custom_formula_is_applied() {
        fn halve(value: f64, _target: f64) -> f64 { value / 2.0 }
        assert_eq!(ScoreFormula::Custom(halve).apply(50.0, 1.0), 25.0);
    }

    #[test]
    fn formula_names_round_trip_through_json() {
        let f: ScoreFormula = serde_json::from_str("\"higher_is_better_floor\"").unwrap();
        assert!(matches!(f, ScoreFormula::HigherIsBetterFloor));
    }
}
