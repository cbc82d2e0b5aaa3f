use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::service::{CandidateMatcher, MatchError};
use crate::directory::{AccountRole, DirectoryStore, EntityRef};
use crate::error::{integrity_fault, retryable_unavailable};
use crate::identity::Authenticated;

/// Shared handler state for the matching routes.
pub struct MatchingState<S> {
    pub matcher: Arc<CandidateMatcher<S>>,
    pub timeout: Duration,
}

impl<S> Clone for MatchingState<S> {
    fn clone(&self) -> Self {
        Self {
            matcher: Arc::clone(&self.matcher),
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateQuery {
    #[serde(default, alias = "maxDistanceKm")]
    pub max_distance_km: Option<f64>,
}

/// Router exposing `GET /api/v1/openings/:opening/candidates`.
pub fn matching_router<S>(matcher: Arc<CandidateMatcher<S>>, timeout: Duration) -> Router
where
    S: DirectoryStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/openings/:opening/candidates",
            get(candidates_handler::<S>),
        )
        .with_state(MatchingState { matcher, timeout })
}

pub(crate) async fn candidates_handler<S>(
    State(state): State<MatchingState<S>>,
    Authenticated(claim): Authenticated,
    Path(opening): Path<String>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    S: DirectoryStore + 'static,
{
    if claim.account_role() == AccountRole::Candidate {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "only posters and admins can list candidates" })),
        )
            .into_response();
    }

    let Some(reference) = EntityRef::parse(&opening) else {
        return opening_not_found();
    };

    let outcome = tokio::time::timeout(
        state.timeout,
        state
            .matcher
            .match_candidates(&reference, query.max_distance_km),
    )
    .await;

    match outcome {
        Ok(Ok(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(Err(MatchError::OpeningNotFound(_))) => opening_not_found(),
        Ok(Err(MatchError::InvalidRadius(km))) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": MatchError::InvalidRadius(km).to_string() })),
        )
            .into_response(),
        Ok(Err(MatchError::Storage(err))) => {
            warn!(%reference, error = %err, "candidate match hit a storage fault");
            retryable_unavailable()
        }
        Ok(Err(MatchError::Directory(err))) => {
            error!(%reference, error = %err, "candidate match hit a directory integrity fault");
            integrity_fault()
        }
        Err(_elapsed) => {
            warn!(
                %reference,
                timeout_ms = state.timeout.as_millis() as u64,
                "candidate match timed out"
            );
            retryable_unavailable()
        }
    }
}

fn opening_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "opening not found" })),
    )
        .into_response()
}
