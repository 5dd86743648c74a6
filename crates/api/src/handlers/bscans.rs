//! Handlers for frame lookup, previews and labeling.
//!
//! Frame responses combine the database row with navigation pointers from
//! the resolver and the URL of the frame's preview.

use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bscan_core::error::CoreError;
use bscan_core::label::Label;
use bscan_core::navigation::{resolve, FrameNeighbors};
use bscan_core::types::{BScanIndex, DbId, Timestamp};
use bscan_db::models::bscan::{BScan, BulkLabelUpdate, SetLabel};
use bscan_db::repositories::{BScanRepo, PoolFrameLookup};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Previews are keyed by content and config, so a URL's bytes never change.
const PREVIEW_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Upper bound on entries in one bulk label request.
pub const MAX_BULK_UPDATES: usize = 1000;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A frame with its navigation pointers and preview URL.
#[derive(Debug, Serialize)]
pub struct BScanResponse {
    pub id: DbId,
    pub scan_id: String,
    pub bscan_index: BScanIndex,
    pub path: String,
    pub label: i64,
    pub label_name: &'static str,
    pub updated_at: Timestamp,
    pub preview_url: String,
    #[serde(flatten)]
    pub neighbors: FrameNeighbors,
}

impl BScanResponse {
    fn new(bscan: BScan, neighbors: FrameNeighbors) -> Self {
        let preview_url = preview_url(&bscan.scan_id, bscan.bscan_index);
        Self {
            id: bscan.id,
            label_name: bscan.label_name(),
            scan_id: bscan.scan_id,
            bscan_index: bscan.bscan_index,
            path: bscan.path,
            label: bscan.label,
            updated_at: bscan.updated_at,
            preview_url,
            neighbors,
        }
    }
}

/// Relative URL of a frame's preview image.
pub fn preview_url(scan_id: &str, index: BScanIndex) -> String {
    format!("/api/v1/scans/{scan_id}/bscans/{index}/preview")
}

async fn with_neighbors(state: &AppState, bscan: BScan) -> AppResult<BScanResponse> {
    let lookup = PoolFrameLookup::new(&state.pool);
    let neighbors = resolve(&lookup, &bscan.scan_id, bscan.bscan_index).await?;
    Ok(BScanResponse::new(bscan, neighbors))
}

async fn find_frame(state: &AppState, scan_id: &str, index: BScanIndex) -> AppResult<BScan> {
    BScanRepo::find_by_index(&state.pool, scan_id, index)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::FrameNotFound {
                scan_id: scan_id.to_string(),
                index,
            })
        })
}

async fn find_by_id(state: &AppState, id: DbId) -> AppResult<BScan> {
    BScanRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "BScan",
        id: id.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// GET /api/v1/scans/{scan_id}/bscans/{index}
///
/// Frame metadata with `prev_index`, `next_index`, `next_unlabeled_index`
/// and `preview_url`.
pub async fn get_frame(
    State(state): State<AppState>,
    Path((scan_id, index)): Path<(String, BScanIndex)>,
) -> AppResult<impl IntoResponse> {
    let bscan = find_frame(&state, &scan_id, index).await?;
    let response = with_neighbors(&state, bscan).await?;

    Ok(Json(DataResponse { data: response }))
}

/// GET /api/v1/scans/{scan_id}/bscans/{index}/preview
///
/// The 8-bit preview image. The cache key doubles as a strong ETag.
pub async fn get_frame_preview(
    State(state): State<AppState>,
    Path((scan_id, index)): Path<(String, BScanIndex)>,
) -> AppResult<Response> {
    let bscan = find_frame(&state, &scan_id, index).await?;
    let preview = state
        .previews
        .get_or_create(PathBuf::from(&bscan.path))
        .await?;

    tracing::debug!(
        scan_id = %scan_id,
        index,
        cache_hit = preview.cache_hit,
        "Serving preview"
    );

    Ok((
        [
            (CONTENT_TYPE, preview.format.content_type().to_string()),
            (CACHE_CONTROL, PREVIEW_CACHE_CONTROL.to_string()),
            (ETAG, format!("\"{}\"", preview.key)),
        ],
        Body::from(preview.bytes),
    )
        .into_response())
}

/// GET /api/v1/bscans/{id}
pub async fn get_bscan(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let bscan = find_by_id(&state, id).await?;
    let response = with_neighbors(&state, bscan).await?;

    Ok(Json(DataResponse { data: response }))
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// POST /api/v1/bscans/{id}/label
///
/// Set a frame to healthy (1) or unhealthy (2). Returns the updated frame
/// with refreshed navigation so the client can jump to the next unlabeled
/// frame.
pub async fn set_label(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetLabel>,
) -> AppResult<impl IntoResponse> {
    let label = Label::from_assignment(input.label)?;
    let bscan = BScanRepo::set_label(&state.pool, id, label.code())
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(bscan_id = id, label = %label, "Label set");

    let response = with_neighbors(&state, bscan).await?;
    Ok(Json(DataResponse { data: response }))
}

/// DELETE /api/v1/bscans/{id}/label
pub async fn clear_label(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let bscan = BScanRepo::clear_label(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(bscan_id = id, "Label cleared");

    let response = with_neighbors(&state, bscan).await?;
    Ok(Json(DataResponse { data: response }))
}

/// Result of a bulk label update.
#[derive(Debug, Serialize)]
pub struct BulkLabelResult {
    pub updated: usize,
    pub bscans: Vec<BScan>,
}

/// POST /api/v1/bscans/labels
///
/// Apply several label updates atomically. Every label must be 1 or 2 and
/// every id must exist, otherwise nothing is written.
pub async fn bulk_update_labels(
    State(state): State<AppState>,
    Json(input): Json<BulkLabelUpdate>,
) -> AppResult<impl IntoResponse> {
    if input.updates.is_empty() {
        return Err(AppError::BadRequest("updates must not be empty".into()));
    }
    if input.updates.len() > MAX_BULK_UPDATES {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_BULK_UPDATES} updates per request"
        )));
    }
    for update in &input.updates {
        Label::from_assignment(update.label)?;
    }

    let bscans = BScanRepo::bulk_set_labels(&state.pool, &input.updates).await?;
    tracing::info!(count = bscans.len(), "Bulk label update applied");

    Ok(Json(DataResponse {
        data: BulkLabelResult {
            updated: bscans.len(),
            bscans,
        },
    }))
}
