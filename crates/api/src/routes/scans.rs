//! Route definitions for scans and scan-scoped frames.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{bscans, scans};
use crate::state::AppState;

/// Routes mounted at `/scans`.
///
/// ```text
/// GET    /                                -> list_scans
/// POST   /import                          -> import_scan
/// GET    /{scan_id}                       -> get_scan
/// DELETE /{scan_id}                       -> delete_scan
/// GET    /{scan_id}/stats                 -> get_scan_stats
/// GET    /{scan_id}/bscans/{index}        -> get_frame
/// GET    /{scan_id}/bscans/{index}/preview -> get_frame_preview
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scans::list_scans))
        .route("/import", post(scans::import_scan))
        .route("/{scan_id}", get(scans::get_scan).delete(scans::delete_scan))
        .route("/{scan_id}/stats", get(scans::get_scan_stats))
        .route("/{scan_id}/bscans/{index}", get(bscans::get_frame))
        .route(
            "/{scan_id}/bscans/{index}/preview",
            get(bscans::get_frame_preview),
        )
}
