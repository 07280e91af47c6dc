use chrono::{DateTime, Duration, Utc};

use super::common::*;
use crate::health::domain::{ActivityKind, HealthFlag, HealthTier};
use crate::health::scoring::{
    compute_health_status, ScoreEngine, ScoreError, ScoringConfig, MAX_LOOKBACK_DAYS,
};

#[test]
fn empty_ledger_scores_zero_and_is_at_risk() {
    let ada = user("ada");

    let status = compute_health_status(&ada, &[], &[], &[], &ScoringConfig::default(), as_of())
        .expect("empty ledger is valid");

    assert_eq!(status.engagement_score, 0);
    assert_eq!(status.task_completion, 0);
    assert_eq!(status.feedback_score, 0);
    assert_eq!(status.status, HealthTier::AtRisk);
    assert_eq!(
        status.flags,
        vec![HealthFlag::LowEngagement, HealthFlag::NoRecentUpdates]
    );
    assert!(status.last_active.is_none());
}

#[test]
fn task_completion_is_share_of_done_tasks() {
    let ada = user("ada");
    let config = ScoringConfig::default();

    let all_done = compute_health_status(&ada, &[], &tasks(&ada, 10, 0), &[], &config, as_of())
        .expect("scores");
    assert_eq!(all_done.task_completion, 100);

    let none_done = compute_health_status(&ada, &[], &tasks(&ada, 0, 5), &[], &config, as_of())
        .expect("scores");
    assert_eq!(none_done.task_completion, 0);

    let one_third = compute_health_status(&ada, &[], &tasks(&ada, 1, 2), &[], &config, as_of())
        .expect("scores");
    assert_eq!(one_third.task_completion, 33);

    let two_thirds = compute_health_status(&ada, &[], &tasks(&ada, 2, 1), &[], &config, as_of())
        .expect("scores");
    assert_eq!(two_thirds.task_completion, 67);
}

#[test]
fn seed_feedback_ratings_rescale_to_sixty_nine() {
    let ada = user("ada");

    let status = compute_health_status(
        &ada,
        &[],
        &[],
        &seed_feedback(&ada),
        &ScoringConfig::default(),
        as_of(),
    )
    .expect("scores");

    assert_eq!(status.feedback_score, 69);
}

#[test]
fn feedback_extremes_map_to_bounds() {
    let ada = user("ada");
    let config = ScoringConfig::default();

    let lowest = compute_health_status(&ada, &[], &[], &[feedback(&ada, 1)], &config, as_of())
        .expect("scores");
    assert_eq!(lowest.feedback_score, 0);

    let highest = compute_health_status(&ada, &[], &[], &[feedback(&ada, 5)], &config, as_of())
        .expect("scores");
    assert_eq!(highest.feedback_score, 100);
}

#[test]
fn engagement_weights_events_against_weekly_baseline() {
    let ada = user("ada");

    let status = compute_health_status(
        &ada,
        &steady_activity(&ada),
        &[],
        &[],
        &ScoringConfig::default(),
        as_of(),
    )
    .expect("scores");

    assert_eq!(status.engagement_score, 70);
}

#[test]
fn engagement_is_capped_at_one_hundred() {
    let ada = user("ada");
    let mut activity = events(&ada, ActivityKind::Login, 10);
    activity.extend(events(&ada, ActivityKind::TaskUpdated, 5));
    activity.extend(events(&ada, ActivityKind::TaskCompleted, 2));
    activity.push(event(&ada, ActivityKind::FeedbackSubmitted, 0));

    let status = compute_health_status(
        &ada,
        &activity,
        &[],
        &[],
        &ScoringConfig::default(),
        as_of(),
    )
    .expect("scores");

    assert_eq!(status.engagement_score, 100);
}

#[test]
fn logouts_count_as_activity_but_carry_no_weight() {
    let ada = user("ada");
    let activity = vec![event(&ada, ActivityKind::Logout, 1)];

    let status = compute_health_status(
        &ada,
        &activity,
        &[],
        &[],
        &ScoringConfig::default(),
        as_of(),
    )
    .expect("scores");

    assert_eq!(status.engagement_score, 0);
    assert_eq!(status.status, HealthTier::AtRisk);
    assert_eq!(status.flags, vec![HealthFlag::LowEngagement]);
}

#[test]
fn stale_events_only_update_last_active() {
    let ada = user("ada");
    let stale = event(&ada, ActivityKind::TaskCompleted, 10);
    let older = event(&ada, ActivityKind::Login, 30);

    let status = compute_health_status(
        &ada,
        &[older, stale.clone()],
        &[],
        &[],
        &ScoringConfig::default(),
        as_of(),
    )
    .expect("scores");

    assert_eq!(status.engagement_score, 0);
    assert_eq!(status.last_active, Some(stale.timestamp));
    assert!(status.flags.contains(&HealthFlag::NoRecentUpdates));
}

#[test]
fn lookback_window_is_inclusive_and_ignores_future_events() {
    let ada = user("ada");
    let on_boundary = event(&ada, ActivityKind::TaskCompleted, 7);
    let mut future = event(&ada, ActivityKind::FeedbackSubmitted, 0);
    future.timestamp = as_of() + Duration::hours(1);

    let status = compute_health_status(
        &ada,
        &[on_boundary, future.clone()],
        &[],
        &[],
        &ScoringConfig::default(),
        as_of(),
    )
    .expect("scores");

    // Only the boundary completion counts: 3 / 20 points.
    assert_eq!(status.engagement_score, 15);
    assert_eq!(status.last_active, Some(future.timestamp));
}

#[test]
fn weight_overrides_change_engagement() {
    let ada = user("ada");
    let mut config = ScoringConfig::default();
    config.event_weights.set(ActivityKind::Login, 4.0);

    let status = compute_health_status(
        &ada,
        &events(&ada, ActivityKind::Login, 5),
        &[],
        &[],
        &config,
        as_of(),
    )
    .expect("scores");

    assert_eq!(status.engagement_score, 100);
}

#[test]
fn wider_lookback_scales_the_baseline() {
    let ada = user("ada");
    let config = ScoringConfig {
        lookback_days: 14,
        ..ScoringConfig::default()
    };

    let status = compute_health_status(
        &ada,
        &steady_activity(&ada),
        &[],
        &[],
        &config,
        as_of(),
    )
    .expect("scores");

    // 14 points against a 40 point fortnight baseline.
    assert_eq!(status.engagement_score, 35);
}

#[test]
fn identical_inputs_produce_identical_bytes() {
    let ada = user("ada");
    let activity = steady_activity(&ada);
    let tasks = tasks(&ada, 2, 3);
    let feedback = seed_feedback(&ada);
    let config = ScoringConfig::default();

    let first = compute_health_status(&ada, &activity, &tasks, &feedback, &config, as_of())
        .expect("scores");
    let second = compute_health_status(&ada, &activity, &tasks, &feedback, &config, as_of())
        .expect("scores");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).expect("serializes"),
        serde_json::to_vec(&second).expect("serializes")
    );
}

#[test]
fn rejects_ratings_outside_one_to_five() {
    let ada = user("ada");
    let config = ScoringConfig::default();

    for rating in [0, 6] {
        let result =
            compute_health_status(&ada, &[], &[], &[feedback(&ada, rating)], &config, as_of());
        match result {
            Err(ScoreError::InvalidInput(reason)) => {
                assert!(reason.contains(&rating.to_string()))
            }
            other => panic!("expected invalid input for rating {rating}, got {other:?}"),
        }
    }
}

#[test]
fn rejects_records_belonging_to_other_users() {
    let ada = user("ada");
    let bo = user("bo");
    let config = ScoringConfig::default();

    let foreign_event = [event(&bo, ActivityKind::Login, 1)];
    assert!(matches!(
        compute_health_status(&ada, &foreign_event, &[], &[], &config, as_of()),
        Err(ScoreError::InvalidInput(_))
    ));

    let foreign_task = [task(&bo, crate::health::domain::TaskStatus::Done)];
    assert!(matches!(
        compute_health_status(&ada, &[], &foreign_task, &[], &config, as_of()),
        Err(ScoreError::InvalidInput(_))
    ));

    let foreign_feedback = [feedback(&bo, 4)];
    assert!(matches!(
        compute_health_status(&ada, &[], &[], &foreign_feedback, &config, as_of()),
        Err(ScoreError::InvalidInput(_))
    ));
}

#[test]
fn rejects_malformed_configuration() {
    let ada = user("ada");

    let zero_baseline = ScoringConfig {
        weekly_baseline: 0.0,
        ..ScoringConfig::default()
    };
    assert!(matches!(
        compute_health_status(&ada, &[], &[], &[], &zero_baseline, as_of()),
        Err(ScoreError::InvalidInput(_))
    ));

    let mut negative_weight = ScoringConfig::default();
    negative_weight.event_weights.set(ActivityKind::Comment, -1.0);
    assert!(ScoreEngine::new(negative_weight).is_err());

    let mut inverted = ScoringConfig::default();
    inverted.tier_thresholds.normal = 90;
    assert!(ScoreEngine::new(inverted).is_err());

    let no_window = ScoringConfig {
        lookback_days: 0,
        ..ScoringConfig::default()
    };
    assert!(ScoreEngine::new(no_window).is_err());
}

#[test]
fn engine_reports_composite_alongside_status() {
    let ada = user("ada");
    let engine = ScoreEngine::new(ScoringConfig::default()).expect("valid config");
    let ledger = ledger(steady_activity(&ada), tasks(&ada, 3, 1), seed_feedback(&ada));

    let evaluation = engine.evaluate(&ada, &ledger, as_of()).expect("scores");

    assert_eq!(evaluation.status.engagement_score, 70);
    assert_eq!(evaluation.status.task_completion, 75);
    assert_eq!(evaluation.status.feedback_score, 69);
    // 35 + 22.5 + 13.8
    assert_eq!(evaluation.composite, 71);
    assert_eq!(evaluation.status.status, HealthTier::Normal);
    assert!(evaluation.status.flags.is_empty());
}

#[test]
fn partial_json_config_keeps_defaults() {
    let config: ScoringConfig = serde_json::from_str(
        r#"{ "lookback_days": 14, "event_weights": { "RESOURCE_VIEW": 1.5 }, "composite_weights": { "feedback": 0.4 } }"#,
    )
    .expect("config parses");

    assert_eq!(config.lookback_days, 14);
    assert_eq!(config.event_weights.weight(ActivityKind::ResourceView), 1.5);
    assert_eq!(config.event_weights.weight(ActivityKind::Login), 1.0);
    assert_eq!(config.composite_weights.feedback, 0.4);
    assert_eq!(config.composite_weights.engagement, 0.5);
    assert_eq!(config.weekly_baseline, 20.0);
    assert_eq!(config.flag_threshold, 30);
}

#[test]
fn engagement_half_points_round_up() {
    let ada = user("ada");
    let config = ScoringConfig {
        lookback_days: 5,
        ..ScoringConfig::default()
    };

    // 0.5 of an expected 20 * 5 / 7 points is exactly 3.5%.
    let activity = vec![event(&ada, ActivityKind::Comment, 1)];
    let status = compute_health_status(&ada, &activity, &[], &[], &config, as_of())
        .expect("scores");

    assert_eq!(status.engagement_score, 4);
}

#[test]
fn oversized_lookback_is_rejected_not_panicking() {
    let ada = user("ada");
    let activity = vec![event(&ada, ActivityKind::Login, 1)];

    for lookback_days in [MAX_LOOKBACK_DAYS + 1, 1_000_000_000, u32::MAX] {
        let config = ScoringConfig {
            lookback_days,
            ..ScoringConfig::default()
        };
        let err = compute_health_status(&ada, &activity, &[], &[], &config, as_of())
            .expect_err("lookback beyond the cap is rejected");
        assert!(matches!(err, ScoreError::InvalidInput(_)));
        assert!(ScoreEngine::new(config).is_err());
    }

    let widest = ScoringConfig {
        lookback_days: MAX_LOOKBACK_DAYS,
        ..ScoringConfig::default()
    };
    let status = compute_health_status(&ada, &activity, &[], &[], &widest, as_of())
        .expect("widest lookback scores");
    assert_eq!(status.last_active, activity.first().map(|event| event.timestamp));
}

#[test]
fn window_before_the_earliest_instant_is_rejected() {
    let ada = user("ada");
    let config = ScoringConfig::default();

    let err = compute_health_status(&ada, &[], &[], &[], &config, DateTime::<Utc>::MIN_UTC)
        .expect_err("window cannot start before the representable range");
    match err {
        ScoreError::InvalidInput(reason) => assert!(reason.contains("time range")),
    }

    let latest = compute_health_status(&ada, &[], &[], &[], &config, DateTime::<Utc>::MAX_UTC)
        .expect("latest instant still has a representable window");
    assert_eq!(latest.engagement_score, 0);
}
