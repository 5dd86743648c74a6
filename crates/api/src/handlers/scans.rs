//! Handlers for scan listing, import, stats and deletion.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bscan_core::error::CoreError;
use bscan_core::importer::{
    discover_frames, resolve_within_root, validate_scan_id, ImportReport, DEFAULT_EXTENSION,
};
use bscan_core::preview::PreviewError;
use bscan_core::stats::ScanStats;
use bscan_core::types::Timestamp;
use bscan_db::models::scan::{Scan, ScanSummary};
use bscan_db::repositories::{BScanRepo, ScanRepo, StatsRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// One entry of `GET /scans`.
#[derive(Debug, Serialize)]
pub struct ScanListItem {
    pub scan_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub total_bscans: i64,
    pub labeled_bscans: i64,
    pub percent_complete: f64,
}

impl From<ScanSummary> for ScanListItem {
    fn from(summary: ScanSummary) -> Self {
        let percent_complete = summary.percent_complete();
        Self {
            scan_id: summary.scan_id,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            total_bscans: summary.total_bscans,
            labeled_bscans: summary.labeled_bscans,
            percent_complete,
        }
    }
}

/// A scan with its label statistics.
#[derive(Debug, Serialize)]
pub struct ScanDetail {
    #[serde(flatten)]
    pub scan: Scan,
    pub stats: ScanStats,
}

/// Body of `POST /scans/import`.
#[derive(Debug, Deserialize)]
pub struct ImportScanRequest {
    /// Directory holding the frames, relative to the scans root (or absolute
    /// inside it).
    pub directory: String,
    /// Defaults to the directory's name.
    pub scan_id: Option<String>,
    /// Frame file extension (default `png`).
    pub extension: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/scans
///
/// All scans with frame counts and completion, newest first.
pub async fn list_scans(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let scans: Vec<ScanListItem> = ScanRepo::list_summaries(&state.pool)
        .await?
        .into_iter()
        .map(ScanListItem::from)
        .collect();

    Ok(Json(DataResponse { data: scans }))
}

/// GET /api/v1/scans/{scan_id}
pub async fn get_scan(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let scan = find_scan(&state, &scan_id).await?;
    let stats = StatsRepo::scan_stats(&state.pool, &scan_id).await?;

    Ok(Json(DataResponse {
        data: ScanDetail { scan, stats },
    }))
}

/// GET /api/v1/scans/{scan_id}/stats
pub async fn get_scan_stats(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    find_scan(&state, &scan_id).await?;
    let stats = StatsRepo::scan_stats(&state.pool, &scan_id).await?;

    Ok(Json(DataResponse { data: stats }))
}

/// DELETE /api/v1/scans/{scan_id}
///
/// Removes the scan, all of its frames and their cached previews.
pub async fn delete_scan(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> AppResult<StatusCode> {
    let frames = BScanRepo::list_for_export(&state.pool, Some(&scan_id)).await?;
    if !ScanRepo::delete(&state.pool, &scan_id).await? {
        return Err(scan_not_found(&scan_id));
    }

    let mut invalidated = 0usize;
    for frame in frames {
        match state.previews.invalidate(PathBuf::from(&frame.path)).await {
            Ok(true) => invalidated += 1,
            Ok(false) => {}
            // Source already gone: its key cannot be derived, nothing to drop.
            Err(PreviewError::SourceNotFound { .. }) => {}
            Err(e) => tracing::warn!(path = %frame.path, error = %e, "Failed to invalidate preview"),
        }
    }
    tracing::info!(scan_id = %scan_id, invalidated, "Scan deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/scans/import
///
/// Register the numbered frame images of a directory under the scans root.
/// Re-importing only adds frames that are not registered yet. Responds 201
/// when the scan is new and 200 otherwise.
pub async fn import_scan(
    State(state): State<AppState>,
    Json(input): Json<ImportScanRequest>,
) -> AppResult<impl IntoResponse> {
    let root = state.config.scans_dir.clone();
    let requested = input.directory.trim().to_string();
    if requested.is_empty() {
        return Err(AppError::BadRequest("directory must not be empty".into()));
    }
    let extension = input
        .extension
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let (dir, discovery) = tokio::task::spawn_blocking(move || {
        let dir = resolve_within_root(&root, FsPath::new(&requested))?;
        let discovery = discover_frames(&dir, &extension)?;
        Ok::<_, CoreError>((dir, discovery))
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Import task failed: {e}")))??;

    let scan_id = match input.scan_id {
        Some(id) => id,
        None => dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::BadRequest("Cannot derive a scan id from the scans root".into()))?,
    };
    validate_scan_id(&scan_id)?;

    let outcome = ScanRepo::import(&state.pool, &scan_id, &discovery.frames).await?;

    let report = ImportReport {
        scan_id,
        scan_created: outcome.scan_created,
        discovered: discovery.frames.len(),
        imported: outcome.imported as usize,
        skipped_existing: outcome.skipped_existing as usize,
        skipped_files: discovery.skipped,
    };
    tracing::info!(
        scan_id = %report.scan_id,
        directory = %dir.display(),
        imported = report.imported,
        skipped_existing = report.skipped_existing,
        skipped_files = report.skipped_files.len(),
        "Scan imported"
    );

    let status = if report.scan_created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: report })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_scan(state: &AppState, scan_id: &str) -> AppResult<Scan> {
    ScanRepo::find_by_id(&state.pool, scan_id)
        .await?
        .ok_or_else(|| scan_not_found(scan_id))
}

fn scan_not_found(scan_id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Scan",
        id: scan_id.to_string(),
    })
}
