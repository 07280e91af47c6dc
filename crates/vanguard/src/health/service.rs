use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::domain::{HealthStatus, MentorId, UserId};
use super::repository::{EngagementStore, StoreError};
use super::scoring::{HealthEvaluation, ScoreEngine, ScoreError, ScoringConfig, UserLedger};
use super::squad::{aggregate_squad, SquadSummary};

/// Service composing the persistence collaborator with the scoring engine.
pub struct HealthService<S> {
    store: Arc<S>,
    engine: Arc<ScoreEngine>,
}

impl<S> Clone for HealthService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S> HealthService<S>
where
    S: EngagementStore + 'static,
{
    pub fn new(store: Arc<S>, config: ScoringConfig) -> Result<Self, ScoreError> {
        let engine = Arc::new(ScoreEngine::new(config)?);
        Ok(Self { store, engine })
    }

    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    /// Score a caller-supplied ledger without touching the store.
    pub fn evaluate(
        &self,
        user_id: &UserId,
        ledger: &UserLedger,
        as_of: DateTime<Utc>,
    ) -> Result<HealthEvaluation, ScoreError> {
        self.engine.evaluate(user_id, ledger, as_of)
    }

    pub async fn recompute(&self, user_id: &UserId) -> Result<HealthStatus, HealthServiceError> {
        self.recompute_at(user_id, Utc::now()).await
    }

    /// Rebuild the user's snapshot from the ledger and upsert it.
    pub async fn recompute_at(
        &self,
        user_id: &UserId,
        as_of: DateTime<Utc>,
    ) -> Result<HealthStatus, HealthServiceError> {
        let ledger = self.store.ledger_for(user_id).await?;
        debug!(
            %user_id,
            events = ledger.activity.len(),
            tasks = ledger.tasks.len(),
            feedback = ledger.feedback.len(),
            "scoring ledger"
        );

        let evaluation = self.engine.evaluate(user_id, &ledger, as_of)?;
        self.store
            .upsert_health_status(evaluation.status.clone())
            .await?;

        info!(
            %user_id,
            tier = evaluation.status.status.label(),
            composite = evaluation.composite,
            flags = evaluation.status.flags.len(),
            "health status recomputed"
        );

        Ok(evaluation.status)
    }

    /// Latest snapshot, falling back to the zero-default before the first recompute.
    pub async fn status(&self, user_id: &UserId) -> Result<HealthStatus, HealthServiceError> {
        let status = self
            .store
            .health_status(user_id)
            .await?
            .unwrap_or_else(|| HealthStatus::zero_default(user_id.clone()));
        Ok(status)
    }

    pub async fn squad(&self, mentor_id: &MentorId) -> Result<SquadSummary, HealthServiceError> {
        let roster = self.store.students_for_mentor(mentor_id).await?;
        let ids: Vec<UserId> = roster.iter().map(|student| student.user_id.clone()).collect();
        let statuses = self.store.health_statuses(&ids).await?;
        Ok(aggregate_squad(mentor_id, &roster, &statuses))
    }

    /// Recompute every student of the mentor concurrently, then summarize.
    ///
    /// The first failing student aborts the remaining recomputes and the error
    /// is returned. Students already upserted keep their new snapshot while the
    /// rest keep their previous one, so a failed call can leave the squad
    /// partially refreshed. Retrying converges because each recompute is a
    /// full replacement.
    pub async fn recompute_squad(
        &self,
        mentor_id: &MentorId,
        as_of: DateTime<Utc>,
    ) -> Result<SquadSummary, HealthServiceError> {
        let roster = self.store.students_for_mentor(mentor_id).await?;

        let mut tasks = JoinSet::new();
        for student in &roster {
            let service = self.clone();
            let user_id = student.user_id.clone();
            tasks.spawn(async move { service.recompute_at(&user_id, as_of).await });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|err| HealthServiceError::Task(err.to_string()))?;
            if let Err(err) = outcome {
                warn!(%mentor_id, error = %err, "squad recompute aborted");
                return Err(err);
            }
        }

        info!(%mentor_id, students = roster.len(), "squad recomputed");

        let ids: Vec<UserId> = roster.iter().map(|student| student.user_id.clone()).collect();
        let statuses = self.store.health_statuses(&ids).await?;
        Ok(aggregate_squad(mentor_id, &roster, &statuses))
    }
}

/// Error raised by the health service.
#[derive(Debug, thiserror::Error)]
pub enum HealthServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("recompute task failed: {0}")]
    Task(String),
}
