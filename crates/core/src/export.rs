//! Label export formatting (CSV and grouped JSON).

use serde::Serialize;

use crate::label::label_name;
use crate::types::{BScanIndex, Timestamp};

/// Header row of the CSV export.
pub const CSV_HEADER: &str = "scan_id,bscan_index,label,label_name,path,updated_at";

/// One exported frame. Rows are expected in `(scan_id, bscan_index)` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub scan_id: String,
    pub bscan_index: BScanIndex,
    pub label: i64,
    pub path: String,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelExport {
    pub export_date: Timestamp,
    pub total_bscans: usize,
    pub total_scans: usize,
    pub scans: Vec<ScanExport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanExport {
    pub scan_id: String,
    pub bscans: Vec<BScanExport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BScanExport {
    pub bscan_index: BScanIndex,
    pub label: i64,
    pub label_name: &'static str,
    pub path: String,
    pub updated_at: Timestamp,
}

/// Render rows as CSV with a header line. Every line ends with `\n`.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = String::with_capacity(64 * (rows.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            csv_escape(&row.scan_id),
            row.bscan_index.to_string(),
            row.label.to_string(),
            label_name(row.label).to_string(),
            csv_escape(&row.path),
            row.updated_at.to_rfc3339(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Group consecutive rows by scan.
pub fn to_json(rows: Vec<ExportRow>, export_date: Timestamp) -> LabelExport {
    let total_bscans = rows.len();
    let mut scans: Vec<ScanExport> = Vec::new();
    for row in rows {
        let entry = BScanExport {
            bscan_index: row.bscan_index,
            label: row.label,
            label_name: label_name(row.label),
            path: row.path,
            updated_at: row.updated_at,
        };
        match scans.last_mut() {
            Some(scan) if scan.scan_id == row.scan_id => scan.bscans.push(entry),
            _ => scans.push(ScanExport {
                scan_id: row.scan_id,
                bscans: vec![entry],
            }),
        }
    }
    LabelExport {
        export_date,
        total_bscans,
        total_scans: scans.len(),
        scans,
    }
}

/// Quote a CSV field if it contains a comma, quote, or line break.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
