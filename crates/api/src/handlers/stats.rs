//! Handlers for labeling progress statistics.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use bscan_core::stats::ScanStats;
use bscan_core::types::Timestamp;
use bscan_db::repositories::StatsRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Per-scan row of `GET /stats/summary`.
#[derive(Debug, Serialize)]
pub struct ScanStatsSummary {
    pub scan_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub stats: ScanStats,
}

/// Body of `GET /stats/summary`.
#[derive(Debug, Serialize)]
pub struct StatsSummary {
    pub total_scans: usize,
    pub scans: Vec<ScanStatsSummary>,
}

/// GET /api/v1/stats
///
/// Totals across all scans.
pub async fn global_stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = StatsRepo::global(&state.pool).await?;

    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/stats/summary
///
/// Completion figures for every scan, most recently created first.
pub async fn stats_summary(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let scans: Vec<ScanStatsSummary> = StatsRepo::per_scan_counts(&state.pool)
        .await?
        .into_iter()
        .map(|row| ScanStatsSummary {
            scan_id: row.scan.scan_id,
            created_at: row.scan.created_at,
            updated_at: row.scan.updated_at,
            stats: ScanStats::from(row.counts),
        })
        .collect();

    Ok(Json(DataResponse {
        data: StatsSummary {
            total_scans: scans.len(),
            scans,
        },
    }))
}
