//! Handler for exporting labels as CSV or JSON.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bscan_core::error::CoreError;
use bscan_core::export::{to_csv, to_json, ExportRow};
use bscan_db::repositories::{BScanRepo, ScanRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /export/labels`.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// `csv` (default) or `json`.
    pub format: Option<String>,
    /// Restrict the export to one scan.
    pub scan_id: Option<String>,
}

/// GET /api/v1/export/labels?format=csv|json&scan_id=
///
/// CSV is served as an attachment; JSON is grouped by scan and wrapped in
/// the standard envelope.
pub async fn export_labels(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let format = params.format.as_deref().unwrap_or("csv").to_ascii_lowercase();
    if format != "csv" && format != "json" {
        return Err(AppError::BadRequest(format!(
            "Unknown export format '{format}'. Must be one of: csv, json"
        )));
    }

    if let Some(scan_id) = params.scan_id.as_deref() {
        if ScanRepo::find_by_id(&state.pool, scan_id).await?.is_none() {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Scan",
                id: scan_id.to_string(),
            }));
        }
    }

    let rows: Vec<ExportRow> = BScanRepo::list_for_export(&state.pool, params.scan_id.as_deref())
        .await?
        .into_iter()
        .map(ExportRow::from)
        .collect();
    tracing::info!(rows = rows.len(), format = %format, "Exporting labels");

    if format == "json" {
        let export = to_json(rows, chrono::Utc::now());
        return Ok(Json(DataResponse { data: export }).into_response());
    }

    let filename = match params.scan_id.as_deref() {
        Some(scan_id) => format!("labels_{}.csv", scan_id.replace(['"', '\r', '\n'], "_")),
        None => "labels.csv".to_string(),
    };
    Ok((
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        to_csv(&rows),
    )
        .into_response())
}
