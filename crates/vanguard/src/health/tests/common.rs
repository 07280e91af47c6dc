use std::collections::HashMap;
use std::future::{ready, Future};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::health::domain::{
    ActivityEvent, ActivityKind, FeedbackCategory, FeedbackRecord, FeedbackSentiment,
    HealthStatus, HealthTier, MentorId, ProjectId, StudentProfile, TaskSnapshot, TaskStatus,
    UserId,
};
use crate::health::memory::InMemoryEngagementStore;
use crate::health::repository::{EngagementStore, StoreError};
use crate::health::scoring::{ScoringConfig, UserLedger};
use crate::health::service::HealthService;

pub(super) const SEED_RATINGS: [u8; 8] = [5, 5, 4, 4, 4, 3, 3, 2];

pub(super) fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0)
        .single()
        .expect("valid evaluation instant")
}

pub(super) fn user(id: &str) -> UserId {
    UserId::new(id)
}

pub(super) fn mentor(id: &str) -> MentorId {
    MentorId::new(id)
}

pub(super) fn event(user_id: &UserId, kind: ActivityKind, days_ago: i64) -> ActivityEvent {
    ActivityEvent {
        user_id: user_id.clone(),
        kind,
        timestamp: as_of() - Duration::days(days_ago),
    }
}

pub(super) fn events(user_id: &UserId, kind: ActivityKind, count: usize) -> Vec<ActivityEvent> {
    (0..count)
        .map(|offset| event(user_id, kind, (offset % 6) as i64))
        .collect()
}

pub(super) fn task(user_id: &UserId, status: TaskStatus) -> TaskSnapshot {
    TaskSnapshot {
        user_id: user_id.clone(),
        project_id: ProjectId("capstone".to_string()),
        status,
        updated_at: as_of() - Duration::days(1),
    }
}

pub(super) fn tasks(user_id: &UserId, done: usize, open: usize) -> Vec<TaskSnapshot> {
    let mut tasks: Vec<TaskSnapshot> = (0..done).map(|_| task(user_id, TaskStatus::Done)).collect();
    tasks.extend((0..open).map(|_| task(user_id, TaskStatus::InProgress)));
    tasks
}

pub(super) fn feedback(receiver: &UserId, rating: u8) -> FeedbackRecord {
    FeedbackRecord {
        sender_id: user("peer"),
        receiver_id: receiver.clone(),
        rating,
        sentiment: FeedbackSentiment::Positive,
        category: FeedbackCategory::Collaboration,
        is_anonymous: false,
        created_at: as_of() - Duration::days(2),
    }
}

pub(super) fn seed_feedback(receiver: &UserId) -> Vec<FeedbackRecord> {
    SEED_RATINGS
        .iter()
        .map(|rating| feedback(receiver, *rating))
        .collect()
}

/// 5 logins, 3 task updates and a completion: 14 weighted points, 70 with defaults.
pub(super) fn steady_activity(user_id: &UserId) -> Vec<ActivityEvent> {
    let mut activity = events(user_id, ActivityKind::Login, 5);
    activity.extend(events(user_id, ActivityKind::TaskUpdated, 3));
    activity.push(event(user_id, ActivityKind::TaskCompleted, 1));
    activity
}

pub(super) fn ledger(
    activity: Vec<ActivityEvent>,
    tasks: Vec<TaskSnapshot>,
    feedback: Vec<FeedbackRecord>,
) -> UserLedger {
    UserLedger {
        activity,
        tasks,
        feedback,
    }
}

pub(super) fn student(id: &str, name: &str, mentor_id: &str) -> StudentProfile {
    StudentProfile {
        user_id: user(id),
        name: name.to_string(),
        mentor_id: mentor(mentor_id),
    }
}

pub(super) fn status(id: &str, engagement: u8, completion: u8, tier: HealthTier) -> HealthStatus {
    HealthStatus {
        user_id: user(id),
        engagement_score: engagement,
        task_completion: completion,
        feedback_score: 50,
        status: tier,
        last_active: Some(as_of()),
        flags: Vec::new(),
    }
}

pub(super) fn statuses(entries: Vec<HealthStatus>) -> HashMap<UserId, HealthStatus> {
    entries
        .into_iter()
        .map(|status| (status.user_id.clone(), status))
        .collect()
}

/// Store with an engaged student and a silent one under `m-1`, plus a student
/// of another mentor.
pub(super) fn seeded_store() -> InMemoryEngagementStore {
    let store = InMemoryEngagementStore::default();

    let ada = user("ada");
    store
        .add_student(student("ada", "Ada", "m-1"))
        .expect("student stored");
    for record in steady_activity(&ada) {
        store.record_activity(record).expect("activity stored");
    }
    for record in tasks(&ada, 3, 1) {
        store.record_task(record).expect("task stored");
    }
    for record in seed_feedback(&ada) {
        store.record_feedback(record).expect("feedback stored");
    }

    let bo = user("bo");
    store
        .add_student(student("bo", "Bo", "m-1"))
        .expect("student stored");
    for record in tasks(&bo, 0, 2) {
        store.record_task(record).expect("task stored");
    }

    store
        .add_student(student("cy", "Cy", "m-2"))
        .expect("student stored");

    store
}

pub(super) fn build_service() -> (
    HealthService<InMemoryEngagementStore>,
    InMemoryEngagementStore,
) {
    let store = seeded_store();
    let service = HealthService::new(Arc::new(store.clone()), ScoringConfig::default())
        .expect("default config is valid");
    (service, store)
}

#[derive(Default)]
pub(super) struct UnavailableStore;

impl EngagementStore for UnavailableStore {
    fn ledger_for(
        &self,
        _user_id: &UserId,
    ) -> impl Future<Output = Result<UserLedger, StoreError>> + Send + '_ {
        ready(Err(StoreError::Unavailable("database offline".to_string())))
    }

    fn students_for_mentor(
        &self,
        _mentor_id: &MentorId,
    ) -> impl Future<Output = Result<Vec<StudentProfile>, StoreError>> + Send + '_ {
        ready(Err(StoreError::Unavailable("database offline".to_string())))
    }

    fn health_status(
        &self,
        _user_id: &UserId,
    ) -> impl Future<Output = Result<Option<HealthStatus>, StoreError>> + Send + '_ {
        ready(Err(StoreError::Unavailable("database offline".to_string())))
    }

    fn health_statuses(
        &self,
        _user_ids: &[UserId],
    ) -> impl Future<Output = Result<HashMap<UserId, HealthStatus>, StoreError>> + Send + '_ {
        ready(Err(StoreError::Unavailable("database offline".to_string())))
    }

    fn upsert_health_status(
        &self,
        _status: HealthStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send + '_ {
        ready(Err(StoreError::Unavailable("database offline".to_string())))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
