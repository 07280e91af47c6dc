//! Persistence boundary for the health model.
//!
//! The scoring core never touches storage; the service reads ledgers and
//! writes snapshots through [`EngagementStore`]. Methods return `Send` futures
//! so recomputes for different students can run on separate tokio tasks.

use std::collections::HashMap;
use std::future::Future;

use super::domain::{HealthStatus, MentorId, StudentProfile, UserId};
use super::scoring::UserLedger;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait EngagementStore: Send + Sync {
    /// Activity (ordered by timestamp), tasks and feedback received by `user_id`.
    fn ledger_for(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<UserLedger, StoreError>> + Send + '_;

    /// Students whose assigned mentor is `mentor_id`.
    fn students_for_mentor(
        &self,
        mentor_id: &MentorId,
    ) -> impl Future<Output = Result<Vec<StudentProfile>, StoreError>> + Send + '_;

    /// Latest snapshot, or `None` before the first recompute.
    fn health_status(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<HealthStatus>, StoreError>> + Send + '_;

    /// Snapshots for the requested users; users never recomputed are omitted.
    fn health_statuses(
        &self,
        user_ids: &[UserId],
    ) -> impl Future<Output = Result<HashMap<UserId, HealthStatus>, StoreError>> + Send + '_;

    /// Full replacement keyed by `status.user_id`; the last writer wins.
    fn upsert_health_status(
        &self,
        status: HealthStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send + '_;
}

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
