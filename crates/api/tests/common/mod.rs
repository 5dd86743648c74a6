#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageBuffer, Luma};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use bscan_api::config::ServerConfig;
use bscan_api::router::build_app_router;
use bscan_api::state::AppState;
use bscan_core::preview::RenderConfig;

/// Scratch directories for one test: a scans root and a cache root.
pub struct TestDirs {
    _root: TempDir,
    pub scans_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl TestDirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let scans_dir = root.path().join("scans");
        let cache_dir = root.path().join("cache");
        std::fs::create_dir_all(&scans_dir).unwrap();
        std::fs::create_dir_all(&cache_dir).unwrap();
        Self {
            _root: root,
            scans_dir,
            cache_dir,
        }
    }

    /// Write 16-bit gradient frames `{index}.png` into `scans/<scan>/`.
    pub fn write_scan(&self, scan: &str, indices: &[u32]) -> PathBuf {
        let dir = self.scans_dir.join(scan);
        std::fs::create_dir_all(&dir).unwrap();
        for &index in indices {
            write_gray16_png(&dir.join(format!("{index}.png")), index);
        }
        dir
    }
}

/// A small 16-bit grayscale gradient; `seed` shifts the intensities so
/// frames differ.
pub fn write_gray16_png(path: &Path, seed: u32) {
    let img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(16, 8, |x, y| {
        Luma([((x * 2000 + y * 500 + seed * 37) % 65536) as u16])
    });
    img.save(path).unwrap();
}

/// Build a test `ServerConfig` pointing at the given scratch directories.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and the default preview settings.
pub fn test_config(dirs: &TestDirs) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "sqlite::memory:".to_string(),
        scans_dir: dirs.scans_dir.clone(),
        cache_dir: dirs.cache_dir.clone(),
        render: RenderConfig::default(),
        preview_workers: 2,
        preview_timeout_secs: 30,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: SqlitePool, dirs: &TestDirs) -> Router {
    build_test_app_with(pool, test_config(dirs))
}

pub fn build_test_app_with(pool: SqlitePool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

/// Import `scans/<scan>` through the API and return the response JSON.
pub async fn import_scan(app: Router, scan: &str) -> serde_json::Value {
    let response = post_json(
        app,
        "/api/v1/scans/import",
        serde_json::json!({ "directory": scan }),
    )
    .await;
    assert!(
        response.status().is_success(),
        "import of {scan} failed: {}",
        response.status()
    );
    body_json(response).await
}
