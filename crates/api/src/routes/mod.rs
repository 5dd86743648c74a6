pub mod bscans;
pub mod cache;
pub mod export;
pub mod health;
pub mod scans;
pub mod stats;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /scans                                     list (GET)
/// /scans/import                              import directory (POST)
/// /scans/{scan_id}                           get, delete
/// /scans/{scan_id}/stats                     per-scan stats (GET)
/// /scans/{scan_id}/bscans/{index}            frame + navigation (GET)
/// /scans/{scan_id}/bscans/{index}/preview    preview image (GET)
///
/// /bscans/labels                             bulk label update (POST)
/// /bscans/{id}                               frame + navigation (GET)
/// /bscans/{id}/label                         set (POST), clear (DELETE)
///
/// /stats                                     global stats (GET)
/// /stats/summary                             per-scan summary, newest first (GET)
///
/// /export/labels                             CSV / JSON export (GET)
///
/// /cache                                     clear (DELETE)
/// /cache/stats                               entry count and size (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Scans, import and scan-scoped frames.
        .nest("/scans", scans::router())
        // Frames by id and labeling.
        .nest("/bscans", bscans::router())
        // Labeling progress.
        .nest("/stats", stats::router())
        // Label export.
        .nest("/export", export::router())
        // Preview cache maintenance.
        .nest("/cache", cache::router())
}
