mod config;
mod policy;
mod rules;

pub use config::{
    CompositeWeights, EventWeights, ScoringConfig, TierThresholds, MAX_LOOKBACK_DAYS,
};
pub use policy::{classify, composite_score, tier_for, Classification};
pub use rules::ScoreSignals;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ActivityEvent, FeedbackRecord, HealthStatus, TaskSnapshot, UserId};

/// The three bounded sub-scores, each within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub engagement: u8,
    pub completion: u8,
    pub feedback: u8,
}

/// Raw records feeding one user's recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLedger {
    #[serde(default)]
    pub activity: Vec<ActivityEvent>,
    #[serde(default)]
    pub tasks: Vec<TaskSnapshot>,
    #[serde(default)]
    pub feedback: Vec<FeedbackRecord>,
}

/// Scoring output with the intermediate composite kept for audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEvaluation {
    pub status: HealthStatus,
    pub composite: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Stateless scorer holding a validated configuration.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    config: ScoringConfig,
}

impl ScoreEngine {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoreError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        user_id: &UserId,
        ledger: &UserLedger,
        as_of: DateTime<Utc>,
    ) -> Result<HealthEvaluation, ScoreError> {
        score(
            user_id,
            &ledger.activity,
            &ledger.tasks,
            &ledger.feedback,
            &self.config,
            as_of,
        )
    }
}

/// Score one user's ledger as of `as_of`.
///
/// Pure: identical inputs always produce an identical status. Empty
/// collections are valid and score zero; records belonging to another user,
/// ratings outside 1-5 and malformed configuration are rejected with
/// [`ScoreError::InvalidInput`].
pub fn compute_health_status(
    user_id: &UserId,
    activity: &[ActivityEvent],
    tasks: &[TaskSnapshot],
    feedback: &[FeedbackRecord],
    config: &ScoringConfig,
    as_of: DateTime<Utc>,
) -> Result<HealthStatus, ScoreError> {
    config.validate()?;
    score(user_id, activity, tasks, feedback, config, as_of).map(|evaluation| evaluation.status)
}

fn score(
    user_id: &UserId,
    activity: &[ActivityEvent],
    tasks: &[TaskSnapshot],
    feedback: &[FeedbackRecord],
    config: &ScoringConfig,
    as_of: DateTime<Utc>,
) -> Result<HealthEvaluation, ScoreError> {
    rules::validate_ledger(user_id, activity, tasks, feedback)?;

    let (scores, signals) = rules::score_ledger(activity, tasks, feedback, config, as_of)?;
    let classification = classify(&scores, &signals, config);

    let status = HealthStatus {
        user_id: user_id.clone(),
        engagement_score: scores.engagement,
        task_completion: scores.completion,
        feedback_score: scores.feedback,
        status: classification.tier,
        last_active: signals.last_active,
        flags: classification.flags,
    };

    Ok(HealthEvaluation {
        status,
        composite: classification.composite,
    })
}

/// Round half away from zero into `0..=100`. The value is snapped to six
/// decimals first so an exact half such as `0.5 * 10 + 0.3 * 97 + 0.2 * 77`
/// still rounds up.
pub(crate) fn round_score(value: f64) -> u8 {
    let snapped = (value * 1e6).round() / 1e6;
    snapped.round().clamp(0.0, 100.0) as u8
}
