use serde::{Deserialize, Serialize};

use super::config::{CompositeWeights, ScoringConfig, TierThresholds};
use super::rules::ScoreSignals;
use super::{round_score, SubScores};
use crate::health::domain::{HealthFlag, HealthTier};

/// Tier decision together with the composite it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub composite: u8,
    pub tier: HealthTier,
    pub flags: Vec<HealthFlag>,
}

pub fn composite_score(scores: &SubScores, weights: &CompositeWeights) -> u8 {
    let weighted = weights.engagement * f64::from(scores.engagement)
        + weights.completion * f64::from(scores.completion)
        + weights.feedback * f64::from(scores.feedback);
    round_score(weighted)
}

/// Lower bounds are inclusive, so a composite sitting on a threshold takes the
/// higher tier.
pub fn tier_for(composite: u8, thresholds: &TierThresholds) -> HealthTier {
    if composite >= thresholds.excellent {
        HealthTier::Excellent
    } else if composite >= thresholds.normal {
        HealthTier::Normal
    } else {
        HealthTier::AtRisk
    }
}

pub fn classify(
    scores: &SubScores,
    signals: &ScoreSignals,
    config: &ScoringConfig,
) -> Classification {
    let composite = composite_score(scores, &config.composite_weights);
    let tier = tier_for(composite, &config.tier_thresholds);
    let flags = if tier == HealthTier::AtRisk {
        at_risk_flags(scores, signals, config.flag_threshold)
    } else {
        Vec::new()
    };

    Classification {
        composite,
        tier,
        flags,
    }
}

fn at_risk_flags(scores: &SubScores, signals: &ScoreSignals, threshold: u8) -> Vec<HealthFlag> {
    let mut flags = Vec::new();

    if scores.engagement < threshold {
        flags.push(HealthFlag::LowEngagement);
    }

    if signals.window_events == 0 {
        flags.push(HealthFlag::NoRecentUpdates);
    }

    if scores.completion < threshold && signals.task_count > 0 {
        flags.push(HealthFlag::MissedDeadline);
    }

    if scores.feedback < threshold && signals.feedback_count > 0 {
        flags.push(HealthFlag::NeedsSupport);
    }

    flags
}
