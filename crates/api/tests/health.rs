//! HTTP-level tests for `/health` and the shared middleware stack.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, get, TestDirs};
use sqlx::SqlitePool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_reports_ok(pool: SqlitePool) {
    let dirs = TestDirs::new();
    let app = build_test_app(pool, &dirs);

    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("x-request-id"),
        "request id should be propagated to the response"
    );

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["preview_format"], "webp");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_route_returns_404(pool: SqlitePool) {
    let dirs = TestDirs::new();
    let app = build_test_app(pool, &dirs);

    let response = get(app, "/api/v1/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cors_exposes_etag_and_request_id_is_echoed(pool: SqlitePool) {
    let dirs = TestDirs::new();
    let app = build_test_app(pool, &dirs);

    let request = Request::builder()
        .uri("/health")
        .header("origin", "http://localhost:5173")
        .header("x-request-id", "labeler-test-1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:5173");
    let exposed = headers["access-control-expose-headers"].to_str().unwrap();
    assert!(exposed.to_ascii_lowercase().contains("etag"), "{exposed}");
    assert_eq!(headers["x-request-id"], "labeler-test-1");
}
