use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ScoreError;
use crate::health::domain::ActivityKind;

/// Tunable parameters for the engagement health model.
///
/// Every field has a default, so a partial JSON document only overrides the
/// fields it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default)]
    pub event_weights: EventWeights,
    #[serde(default = "default_weekly_baseline")]
    pub weekly_baseline: f64,
    #[serde(default)]
    pub composite_weights: CompositeWeights,
    #[serde(default)]
    pub tier_thresholds: TierThresholds,
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            event_weights: EventWeights::default(),
            weekly_baseline: default_weekly_baseline(),
            composite_weights: CompositeWeights::default(),
            tier_thresholds: TierThresholds::default(),
            flag_threshold: default_flag_threshold(),
        }
    }
}

impl ScoringConfig {
    /// Weighted points expected from a normally engaged student over the window.
    pub fn expected_points(&self) -> f64 {
        self.weekly_baseline * f64::from(self.lookback_days) / 7.0
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ScoreError::InvalidInput(format!(
                "lookback_days must be within 1-{MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }

        if !self.weekly_baseline.is_finite() || self.weekly_baseline <= 0.0 {
            return Err(ScoreError::InvalidInput(format!(
                "weekly_baseline must be a positive number, got {}",
                self.weekly_baseline
            )));
        }

        for (kind, weight) in self.event_weights.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoreError::InvalidInput(format!(
                    "event weight for {} must be a non-negative number, got {}",
                    kind.code(),
                    weight
                )));
            }
        }

        self.composite_weights.validate()?;
        self.tier_thresholds.validate()?;

        if self.flag_threshold > 100 {
            return Err(ScoreError::InvalidInput(format!(
                "flag_threshold must be within 0-100, got {}",
                self.flag_threshold
            )));
        }

        Ok(())
    }
}

/// Ten years; longer windows stop meaning "recent" activity.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

fn default_lookback_days() -> u32 {
    7
}

fn default_weekly_baseline() -> f64 {
    20.0
}

fn default_flag_threshold() -> u8 {
    30
}

/// Per-kind weights applied to activity inside the lookback window.
///
/// Deserialization merges the supplied entries over the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ActivityKind, f64>",
    into = "BTreeMap<ActivityKind, f64>"
)]
pub struct EventWeights {
    weights: BTreeMap<ActivityKind, f64>,
}

impl EventWeights {
    pub fn weight(&self, kind: ActivityKind) -> f64 {
        self.weights.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, kind: ActivityKind, weight: f64) {
        self.weights.insert(kind, weight);
    }

    pub fn with(mut self, kind: ActivityKind, weight: f64) -> Self {
        self.set(kind, weight);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActivityKind, f64)> + '_ {
        self.weights.iter().map(|(kind, weight)| (*kind, *weight))
    }
}

impl Default for EventWeights {
    fn default() -> Self {
        let weights = ActivityKind::ordered()
            .into_iter()
            .map(|kind| {
                let weight = match kind {
                    ActivityKind::Login => 1.0,
                    ActivityKind::TaskUpdated => 2.0,
                    ActivityKind::TaskCompleted => 3.0,
                    ActivityKind::FeedbackSubmitted => 4.0,
                    ActivityKind::Comment | ActivityKind::ResourceView => 0.5,
                    ActivityKind::Logout => 0.0,
                };
                (kind, weight)
            })
            .collect();

        Self { weights }
    }
}

impl From<BTreeMap<ActivityKind, f64>> for EventWeights {
    fn from(overrides: BTreeMap<ActivityKind, f64>) -> Self {
        let mut weights = Self::default();
        for (kind, weight) in overrides {
            weights.set(kind, weight);
        }
        weights
    }
}

impl From<EventWeights> for BTreeMap<ActivityKind, f64> {
    fn from(value: EventWeights) -> Self {
        value.weights
    }
}

/// Contribution of each sub-score to the composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub engagement: f64,
    pub completion: f64,
    pub feedback: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            engagement: 0.5,
            completion: 0.3,
            feedback: 0.2,
        }
    }
}

impl CompositeWeights {
    fn validate(&self) -> Result<(), ScoreError> {
        let weights = [
            ("engagement", self.engagement),
            ("completion", self.completion),
            ("feedback", self.feedback),
        ];

        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoreError::InvalidInput(format!(
                    "composite weight '{name}' must be a non-negative number, got {weight}"
                )));
            }
        }

        Ok(())
    }
}

/// Inclusive lower bounds of the EXCELLENT and NORMAL tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub excellent: u8,
    pub normal: u8,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: 80,
            normal: 50,
        }
    }
}

impl TierThresholds {
    fn validate(&self) -> Result<(), ScoreError> {
        if self.excellent > 100 || self.normal > self.excellent {
            return Err(ScoreError::InvalidInput(format!(
                "tier thresholds must satisfy normal <= excellent <= 100, got normal {} excellent {}",
                self.normal, self.excellent
            )));
        }
        Ok(())
    }
}
