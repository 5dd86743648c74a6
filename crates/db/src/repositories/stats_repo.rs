//! Label-count aggregation for progress reporting.

use bscan_core::stats::{GlobalStats, LabelCounts, ScanStats};
use bscan_core::types::Timestamp;

use crate::models::scan::{Scan, ScanLabelCounts};
use crate::DbPool;

/// Aggregates label counts with `GROUP BY label` queries.
pub struct StatsRepo;

impl StatsRepo {
    /// Label counts for one scan. A scan with no frames yields all zeros.
    pub async fn scan_counts(pool: &DbPool, scan_id: &str) -> Result<LabelCounts, sqlx::Error> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT label, COUNT(*) FROM bscans WHERE scan_id = $1 GROUP BY label",
        )
        .bind(scan_id)
        .fetch_all(pool)
        .await?;
        Ok(LabelCounts::from_rows(rows))
    }

    pub async fn scan_stats(pool: &DbPool, scan_id: &str) -> Result<ScanStats, sqlx::Error> {
        Self::scan_counts(pool, scan_id).await.map(ScanStats::from)
    }

    /// Counts across all scans.
    pub async fn global(pool: &DbPool) -> Result<GlobalStats, sqlx::Error> {
        let total_scans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scans")
            .fetch_one(pool)
            .await?;
        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT label, COUNT(*) FROM bscans GROUP BY label")
                .fetch_all(pool)
                .await?;
        Ok(GlobalStats::new(total_scans, LabelCounts::from_rows(rows)))
    }

    /// Label counts for every scan, most recently created first. Scans
    /// without frames are included with zero counts.
    pub async fn per_scan_counts(pool: &DbPool) -> Result<Vec<ScanLabelCounts>, sqlx::Error> {
        let rows: Vec<(String, Timestamp, Timestamp, Option<i64>, i64)> = sqlx::query_as(
            "SELECT s.scan_id, s.created_at, s.updated_at, b.label, COUNT(b.id)
             FROM scans s
             LEFT JOIN bscans b ON b.scan_id = s.scan_id
             GROUP BY s.scan_id, b.label
             ORDER BY s.created_at DESC, s.scan_id ASC",
        )
        .fetch_all(pool)
        .await?;

        let mut summary: Vec<ScanLabelCounts> = Vec::new();
        for (scan_id, created_at, updated_at, label, count) in rows {
            let counts = match label {
                Some(code) => LabelCounts::from_rows([(code, count)]),
                None => LabelCounts::default(),
            };
            match summary.last_mut() {
                Some(last) if last.scan.scan_id == scan_id => last.counts = last.counts + counts,
                _ => summary.push(ScanLabelCounts {
                    scan: Scan {
                        scan_id,
                        created_at,
                        updated_at,
                    },
                    counts,
                }),
            }
        }
        Ok(summary)
    }
}
