use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{HealthStatus, MentorId, UserId};
use super::repository::EngagementStore;
use super::scoring::{ScoreEngine, ScoreError, ScoringConfig, UserLedger};
use super::service::{HealthService, HealthServiceError};

/// Router builder exposing the health read, recompute and squad endpoints.
pub fn health_router<S>(service: Arc<HealthService<S>>) -> Router
where
    S: EngagementStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/students/:user_id/health",
            get(status_handler::<S>),
        )
        .route(
            "/api/v1/students/:user_id/health/recompute",
            post(recompute_handler::<S>),
        )
        .route("/api/v1/mentors/:mentor_id/squad", get(squad_handler::<S>))
        .route(
            "/api/v1/mentors/:mentor_id/squad/recompute",
            post(recompute_squad_handler::<S>),
        )
        .route("/api/v1/health/evaluate", post(evaluate_handler::<S>))
        .with_state(service)
}

/// Stateless scoring request; `config` overrides the service defaults when present.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluateRequest {
    pub user_id: UserId,
    #[serde(flatten)]
    pub ledger: UserLedger,
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default)]
    pub config: Option<ScoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub health: HealthStatus,
    pub composite: u8,
    pub as_of: DateTime<Utc>,
    pub flag_labels: Vec<String>,
}

pub(crate) async fn status_handler<S>(
    State(service): State<Arc<HealthService<S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    let user_id = UserId(user_id);
    match service.status(&user_id).await {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn recompute_handler<S>(
    State(service): State<Arc<HealthService<S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    let user_id = UserId(user_id);
    match service.recompute(&user_id).await {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn squad_handler<S>(
    State(service): State<Arc<HealthService<S>>>,
    Path(mentor_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    let mentor_id = MentorId(mentor_id);
    match service.squad(&mentor_id).await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn recompute_squad_handler<S>(
    State(service): State<Arc<HealthService<S>>>,
    Path(mentor_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    let mentor_id = MentorId(mentor_id);
    match service.recompute_squad(&mentor_id, Utc::now()).await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn evaluate_handler<S>(
    State(service): State<Arc<HealthService<S>>>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    S: EngagementStore + 'static,
{
    let EvaluateRequest {
        user_id,
        ledger,
        as_of,
        config,
    } = request;
    let as_of = as_of.unwrap_or_else(Utc::now);

    let evaluation = match config {
        Some(config) => {
            ScoreEngine::new(config).and_then(|engine| engine.evaluate(&user_id, &ledger, as_of))
        }
        None => service.evaluate(&user_id, &ledger, as_of),
    };

    match evaluation {
        Ok(evaluation) => {
            let flag_labels = evaluation
                .status
                .flag_labels()
                .into_iter()
                .map(str::to_string)
                .collect();
            let body = EvaluateResponse {
                health: evaluation.status,
                composite: evaluation.composite,
                as_of,
                flag_labels,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => error_response(HealthServiceError::Scoring(error)),
    }
}

fn error_response(error: HealthServiceError) -> Response {
    let status = match &error {
        HealthServiceError::Scoring(ScoreError::InvalidInput(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        HealthServiceError::Store(_) | HealthServiceError::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
