use chrono::{DateTime, Duration, Utc};

use super::config::ScoringConfig;
use super::{round_score, ScoreError, SubScores};
use crate::health::domain::{ActivityEvent, FeedbackRecord, TaskSnapshot, UserId};

/// Facts gathered while scoring that the flag rules need later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreSignals {
    pub window_events: usize,
    pub task_count: usize,
    pub feedback_count: usize,
    pub last_active: Option<DateTime<Utc>>,
}

pub(crate) fn validate_ledger(
    user_id: &UserId,
    activity: &[ActivityEvent],
    tasks: &[TaskSnapshot],
    feedback: &[FeedbackRecord],
) -> Result<(), ScoreError> {
    if let Some(event) = activity.iter().find(|event| &event.user_id != user_id) {
        return Err(ScoreError::InvalidInput(format!(
            "activity event for user {} supplied while scoring {}",
            event.user_id, user_id
        )));
    }

    if let Some(task) = tasks.iter().find(|task| &task.user_id != user_id) {
        return Err(ScoreError::InvalidInput(format!(
            "task owned by {} supplied while scoring {}",
            task.user_id, user_id
        )));
    }

    for record in feedback {
        if &record.receiver_id != user_id {
            return Err(ScoreError::InvalidInput(format!(
                "feedback addressed to {} supplied while scoring {}",
                record.receiver_id, user_id
            )));
        }
        if !(1..=5).contains(&record.rating) {
            return Err(ScoreError::InvalidInput(format!(
                "feedback rating {} from {} is outside 1-5",
                record.rating, record.sender_id
            )));
        }
    }

    Ok(())
}

pub(crate) fn score_ledger(
    activity: &[ActivityEvent],
    tasks: &[TaskSnapshot],
    feedback: &[FeedbackRecord],
    config: &ScoringConfig,
    as_of: DateTime<Utc>,
) -> Result<(SubScores, ScoreSignals), ScoreError> {
    let window_start = Duration::try_days(i64::from(config.lookback_days))
        .and_then(|span| as_of.checked_sub_signed(span))
        .ok_or_else(|| {
            ScoreError::InvalidInput(format!(
                "lookback of {} days before {as_of} is outside the supported time range",
                config.lookback_days
            ))
        })?;
    let window: Vec<&ActivityEvent> = activity
        .iter()
        .filter(|event| event.timestamp >= window_start && event.timestamp <= as_of)
        .collect();

    let window_events = window.len();
    let points: f64 = window
        .iter()
        .map(|event| config.event_weights.weight(event.kind))
        .sum();
    let engagement = if window_events == 0 {
        0
    } else {
        round_score(points / config.expected_points() * 100.0)
    };

    let task_count = tasks.len();
    let done = tasks.iter().filter(|task| task.status.is_done()).count();
    let completion = if task_count == 0 {
        0
    } else {
        round_score(done as f64 * 100.0 / task_count as f64)
    };

    let feedback_count = feedback.len();
    let rating_total: u32 = feedback.iter().map(|record| u32::from(record.rating)).sum();
    // (mean - 1) / 4 * 100, rearranged to divide once.
    let feedback_score = if feedback_count == 0 {
        0
    } else {
        let above_floor = f64::from(rating_total) - feedback_count as f64;
        round_score(above_floor * 100.0 / (4.0 * feedback_count as f64))
    };

    let last_active = activity.iter().map(|event| event.timestamp).max();

    let scores = SubScores {
        engagement,
        completion,
        feedback: feedback_score,
    };
    let signals = ScoreSignals {
        window_events,
        task_count,
        feedback_count,
        last_active,
    };

    Ok((scores, signals))
}

