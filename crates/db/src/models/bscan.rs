//! B-scan frame models and label DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use bscan_core::label::label_name;
use bscan_core::types::{BScanIndex, DbId, Timestamp};

// ---------------------------------------------------------------------------
// BScan
// ---------------------------------------------------------------------------

/// A row from the `bscans` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BScan {
    pub id: DbId,
    pub scan_id: String,
    pub bscan_index: BScanIndex,
    /// Canonical path of the 16-bit source image.
    pub path: String,
    /// 0 = unlabeled, 1 = healthy, 2 = unhealthy.
    pub label: i64,
    pub updated_at: Timestamp,
}

impl BScan {
    pub fn label_name(&self) -> &'static str {
        label_name(self.label)
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Body of `POST /bscans/{id}/label`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetLabel {
    pub label: i64,
}

/// One entry of a bulk label update.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelUpdate {
    pub bscan_id: DbId,
    pub label: i64,
}

/// Body of `POST /bscans/labels`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkLabelUpdate {
    pub updates: Vec<LabelUpdate>,
}

impl From<BScan> for bscan_core::export::ExportRow {
    fn from(row: BScan) -> Self {
        Self {
            scan_id: row.scan_id,
            bscan_index: row.bscan_index,
            label: row.label,
            path: row.path,
            updated_at: row.updated_at,
        }
    }
}
