//! Scan (tomogram) models.

use serde::Serialize;
use sqlx::FromRow;
use bscan_core::stats::{completion_percentage, LabelCounts};
use bscan_core::types::Timestamp;

/// A row from the `scans` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scan {
    pub scan_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A scan joined with its frame counts, as listed by `GET /scans`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScanSummary {
    pub scan_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub total_bscans: i64,
    pub labeled_bscans: i64,
}

impl ScanSummary {
    pub fn percent_complete(&self) -> f64 {
        completion_percentage(self.labeled_bscans, self.total_bscans)
    }
}

/// A scan with its frame counts split by label.
#[derive(Debug, Clone)]
pub struct ScanLabelCounts {
    pub scan: Scan,
    pub counts: LabelCounts,
}

/// Outcome of registering a scan and its frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// The scan row did not exist before this import.
    pub scan_created: bool,
    /// Frames inserted by this import.
    pub imported: u64,
    /// Frames whose `(scan_id, bscan_index)` was already registered.
    pub skipped_existing: u64,
}
