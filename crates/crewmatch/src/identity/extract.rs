use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::{debug, error};

use super::claims::NormalizedClaim;
use super::verifier::CredentialVerifier;

/// Extractor yielding the caller's normalized identity.
///
/// The verifier is read from request extensions, so any router can use it once the server
/// installs `Extension(Arc<CredentialVerifier>)`.
#[derive(Debug, Clone)]
pub struct Authenticated(pub NormalizedClaim);

/// Why [`Authenticated`] refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Generic 401; never says which scheme was tried or why it failed.
    Unauthenticated,
    /// The router was built without a verifier extension.
    VerifierMissing,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "error": "not authenticated" })),
            )
                .into_response(),
            AuthRejection::VerifierMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "authentication is not configured" })),
            )
                .into_response(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(verifier) = parts.extensions.get::<Arc<CredentialVerifier>>().cloned() else {
            error!("credential verifier extension missing from router");
            return Err(AuthRejection::VerifierMissing);
        };

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        match verifier.verify(bearer_token(header)) {
            Ok(claim) => {
                debug!(
                    scheme = claim.scheme.label(),
                    subject = %claim.subject_id,
                    "credential accepted"
                );
                Ok(Authenticated(claim))
            }
            Err(failure) => {
                debug!(reason = ?failure.reason(), "credential rejected");
                Err(AuthRejection::Unauthenticated)
            }
        }
    }
}

/// Strips an optional, case-insensitive `Bearer ` prefix.
pub fn bearer_token(header: &str) -> &str {
    let trimmed = header.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim(),
        _ => trimmed,
    }
}

/// `GET /api/v1/session`: echoes the caller's normalized claim.
pub fn session_router() -> Router {
    Router::new().route("/api/v1/session", get(session_handler))
}

pub(crate) async fn session_handler(
    Authenticated(claim): Authenticated,
) -> Json<NormalizedClaim> {
    Json(claim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::verifier::FixedClock;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Extension;
    use chrono::Utc;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        let verifier = CredentialVerifier::new(b"native", b"legacy")
            .with_clock(Arc::new(FixedClock(Utc::now())));
        session_router().layer(Extension(Arc::new(verifier)))
    }

    async fn read_json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[test]
    fn bearer_prefix_is_optional() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(bearer_token("bearer  abc"), "abc");
        assert_eq!(bearer_token("abc.def.ghi"), "abc.def.ghi");
        assert_eq!(bearer_token(""), "");
    }

    #[tokio::test]
    async fn session_returns_legacy_claim() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({
                "exp": Utc::now().timestamp() + 600,
                "data": { "user": { "id": 42, "user_email": "a@b.com", "roles": ["employer"] } }
            }),
            &EncodingKey::from_secret(b"legacy"),
        )
        .expect("token");

        let response = router()
            .oneshot(
                Request::get("/api/v1/session")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["subjectId"], "42");
        assert_eq!(body["scheme"], "legacy");
    }

    #[tokio::test]
    async fn router_without_verifier_is_a_server_fault() {
        let response = session_router()
            .oneshot(
                Request::get("/api/v1/session")
                    .header(AUTHORIZATION, "Bearer abc.def.ghi")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json_body(response).await;
        assert_eq!(body, json!({ "error": "authentication is not configured" }));
    }

    #[tokio::test]
    async fn missing_credentials_are_a_generic_401() {
        let response = router()
            .oneshot(
                Request::get("/api/v1/session")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = read_json_body(response).await;
        assert_eq!(body, json!({ "error": "not authenticated" }));
    }
}
