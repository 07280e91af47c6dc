//! Engagement health model: per-student scoring, tier classification and
//! mentor squad rollups, plus the store, service and HTTP layers around it.
//!
//! The scoring core ([`scoring`] and [`squad`]) is pure and synchronous. All
//! I/O goes through [`EngagementStore`], and absence of a stored snapshot is
//! always reported as [`HealthStatus::zero_default`].

pub mod domain;
pub mod import;
pub mod memory;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod squad;

#[cfg(test)]
mod tests;

pub use domain::{
    ActivityEvent, ActivityKind, FeedbackCategory, FeedbackRecord, FeedbackSentiment, HealthFlag,
    HealthStatus, HealthTier, MentorId, ProjectId, StudentProfile, TaskSnapshot, TaskStatus,
    UserId,
};
pub use import::{export_from_dir, ledger_from_paths, LedgerExport, LedgerImportError};
pub use memory::InMemoryEngagementStore;
pub use repository::{EngagementStore, StoreError};
pub use router::{health_router, EvaluateRequest, EvaluateResponse};
pub use scoring::{
    compute_health_status, Classification, CompositeWeights, EventWeights, HealthEvaluation,
    ScoreEngine, ScoreError, ScoringConfig, SubScores, TierThresholds, UserLedger,
};
pub use service::{HealthService, HealthServiceError};
pub use squad::{aggregate_squad, SquadSummary, StudentHealthEntry};
