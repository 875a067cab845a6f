//! Requests driven through the full router, middleware included.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use rust_redis_stats::{server, AppState, MemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;

const T: i64 = 1_609_497_015;

fn router_at(store: MemoryStore) -> Router {
    server::create_router(Arc::new(AppState::new(Arc::new(store))))
}

fn router() -> Router {
    router_at(MemoryStore::with_time(T))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, headers, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, HeaderMap, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn bodiless_post_counts_one() {
    let app = router();

    let (status, _, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/buckets/orders/increment")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "bucket": "orders", "type": "counts" }));

    let uri = format!("/api/buckets/orders/counts/seconds?from={T}&to={T}");
    let (status, _, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([{ "timestamp": T, "value": 1 }]));
}

#[tokio::test]
async fn json_step_is_applied() {
    let app = router();

    let (status, _, _) = post_json(&app, "/api/buckets/orders/increment", json!({ "step": 5 })).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/buckets/orders/counts/minutes?from={}&to={T}", T - 60);
    let (_, _, body) = get(&app, &uri).await;
    assert_eq!(body["data"], json!([{ "timestamp": 1_609_497_000, "value": 5 }]));
}

#[tokio::test]
async fn malformed_increment_body_is_a_bad_request() {
    let app = router();

    let (status, _, body) = post_json(
        &app,
        "/api/buckets/orders/increment",
        json!({ "step": "five" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("increment body"));

    let (_, _, body) = get(&app, "/api/buckets").await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn timing_and_gauge_routes_record() {
    let app = router();

    let (status, _, body) =
        post_json(&app, "/api/buckets/deploys/timing", json!({ "occurred_at": T - 30 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "timings");

    let (status, _, body) = post_json(&app, "/api/buckets/deploys/gauge", json!({ "value": 2.5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "gauges");

    let uri = format!("/api/buckets/deploys/timings/seconds?from={T}&to={T}");
    let (_, _, body) = get(&app, &uri).await;
    assert_eq!(body["data"], json!([{ "timestamp": T, "value": T - 30 }]));

    let uri = format!("/api/buckets/deploys/gauges/seconds?from={T}&to={T}");
    let (_, _, body) = get(&app, &uri).await;
    assert_eq!(body["data"], json!([{ "timestamp": T, "value": 2 }]));
}

#[tokio::test]
async fn catalog_routes_do_not_collide_with_export() {
    let app = router();
    post_json(&app, "/api/buckets/deploys/gauge", json!({ "value": 1.0 })).await;
    post_json(&app, "/api/buckets/orders/increment", json!({})).await;

    let (status, _, body) = get(&app, "/api/buckets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(["deploys", "orders"]));

    let (status, _, body) = get(&app, "/api/buckets/deploys/types").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(["gauges"]));

    let (_, _, body) = get(&app, "/api/buckets/unknown/types").await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn open_ended_export_reads_up_to_now() {
    let app = router_at(MemoryStore::new());
    let from = chrono::Utc::now().timestamp() - 5;

    post_json(&app, "/api/buckets/live/increment", json!({ "step": 2 })).await;

    let uri = format!("/api/buckets/live/counts/seconds?from={from}");
    let (status, _, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);

    let points = body["data"].as_array().unwrap();
    let total: i64 = points.iter().map(|p| p["value"].as_i64().unwrap()).sum();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn export_rejects_bad_parameters() {
    let app = router();

    let uri = format!("/api/buckets/orders/counts/weeks?from={T}&to={T}");
    let (status, _, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("weeks"));

    let uri = format!("/api/buckets/orders/histograms/seconds?from={T}&to={T}");
    let (status, _, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = get(&app, "/api/buckets/orders/counts/seconds").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Roughly 51 years of hour partitions
    let uri = format!("/api/buckets/orders/counts/seconds?from=0&to={T}");
    let (status, _, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("partitions"));
}

#[tokio::test]
async fn metrics_route_reports_handled_requests() {
    let app = router();
    post_json(&app, "/api/buckets/orders/increment", json!({})).await;
    get(&app, &format!("/api/buckets/orders/counts/days?from={T}&to={T}")).await;

    let (status, _, body) = get(&app, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], 2);
    assert_eq!(body["total_errors"], 0);
    assert!(body["store"]["increment"].is_object());
    assert!(body["store"]["export"].is_object());
}

#[tokio::test]
async fn every_response_carries_timing_headers() {
    let app = router();

    let ok = post_json(&app, "/api/buckets/orders/increment", json!({})).await;
    let rejected = get(&app, "/api/buckets/orders/counts/weeks?from=0").await;
    let missing = get(&app, "/nowhere").await;

    assert_eq!(missing.0, StatusCode::NOT_FOUND);
    for (status, headers, _) in [ok, rejected, missing] {
        let us = headers
            .get("x-response-time-us")
            .unwrap_or_else(|| panic!("no response time on {status}"));
        assert!(us.to_str().unwrap().parse::<u64>().is_ok());

        let server_timing = headers.get("server-timing").unwrap().to_str().unwrap();
        assert!(server_timing.starts_with("total;dur="), "{server_timing}");
    }
}

#[tokio::test]
async fn cors_is_permissive() {
    let app = router();
    let (_, headers, _) = send(
        &app,
        Request::builder()
            .uri("/api/buckets")
            .header("origin", "http://dashboard.example")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
}
