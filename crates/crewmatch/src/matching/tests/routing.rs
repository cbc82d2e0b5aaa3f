use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;

async fn get(router: axum::Router, uri: &str, token: Option<&str>) -> Response {
    let mut request = Request::get(uri);
    if let Some(token) = token {
        request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    router
        .oneshot(request.body(Body::empty()).expect("request"))
        .await
        .expect("response")
}

fn seeded_router() -> axum::Router {
    router_with(directory(), Duration::from_secs(5))
}

#[tokio::test]
async fn anonymous_callers_get_a_generic_401() {
    let response = get(seeded_router(), "/api/v1/openings/500/candidates", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        read_json_body(response).await,
        json!({ "error": "not authenticated" })
    );
}

#[tokio::test]
async fn candidates_cannot_list_other_candidates() {
    let token = legacy_token(201, &["subscriber"]);
    let response = get(
        seeded_router(),
        "/api/v1/openings/500/candidates",
        Some(&token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn legacy_poster_lists_candidates_with_both_ids() {
    let token = legacy_token(100, &["employer"]);
    let response = get(
        seeded_router(),
        "/api/v1/openings/500/candidates",
        Some(&token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["opening"], json!({ "id": "op-sound", "legacyId": 500 }));

    let candidates = body["candidates"].as_array().expect("candidate list");
    let ids: Vec<&str> = candidates
        .iter()
        .filter_map(|candidate| candidate["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["cand-c", "cand-d", "cand-a"]);

    let ari = &candidates[2];
    assert_eq!(ari["legacyId"], 201);
    assert_eq!(ari["distanceKm"], "unknown");
    assert_eq!(ari["withinRadius"], json!(null));
    assert!(candidates[1]["legacyId"].is_null());
}

#[tokio::test]
async fn query_radius_overrides_the_default() {
    let token = native_token("admin");
    let response = get(
        seeded_router(),
        "/api/v1/openings/op-sound/candidates?max_distance_km=1000",
        Some(&token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["radiusKm"], 1000.0);
    assert_eq!(body["candidates"][1]["withinRadius"], true);
}

#[tokio::test]
async fn negative_radius_is_a_bad_request() {
    let token = native_token("poster");
    let response = get(
        seeded_router(),
        "/api/v1/openings/op-sound/candidates?maxDistanceKm=-3",
        Some(&token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_opening_is_404() {
    let token = native_token("poster");
    let response = get(
        seeded_router(),
        "/api/v1/openings/op-missing/candidates",
        Some(&token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json_body(response).await,
        json!({ "error": "opening not found" })
    );
}

#[tokio::test]
async fn pool_outage_is_retryable() {
    let token = native_token("poster");
    let router = router_with(
        Arc::new(FaultyPool::new(PoolFault::Unavailable)),
        Duration::from_secs(5),
    );
    let response = get(router, "/api/v1/openings/500/candidates", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json_body(response).await;
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn stalled_pool_times_out_as_retryable() {
    let token = native_token("poster");
    let router = router_with(
        Arc::new(FaultyPool::new(PoolFault::Stalled)),
        Duration::from_millis(20),
    );
    let response = get(router, "/api/v1/openings/500/candidates", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json_body(response).await;
    assert_eq!(body["retryable"], true);
}
