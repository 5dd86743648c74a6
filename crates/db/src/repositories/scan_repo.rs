//! Repository for the `scans` table.

use bscan_core::importer::DiscoveredFrame;

use crate::models::scan::{ImportOutcome, Scan, ScanSummary};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "scan_id, created_at, updated_at";

/// Provides scan registration, listing and deletion.
pub struct ScanRepo;

impl ScanRepo {
    pub async fn find_by_id(pool: &DbPool, scan_id: &str) -> Result<Option<Scan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scans WHERE scan_id = $1");
        sqlx::query_as::<_, Scan>(&query)
            .bind(scan_id)
            .fetch_optional(pool)
            .await
    }

    /// List all scans with frame counts, most recently created first.
    pub async fn list_summaries(pool: &DbPool) -> Result<Vec<ScanSummary>, sqlx::Error> {
        sqlx::query_as::<_, ScanSummary>(
            "SELECT s.scan_id, s.created_at, s.updated_at,
                    COUNT(b.id) AS total_bscans,
                    COALESCE(SUM(CASE WHEN b.label <> 0 THEN 1 ELSE 0 END), 0) AS labeled_bscans
             FROM scans s
             LEFT JOIN bscans b ON b.scan_id = s.scan_id
             GROUP BY s.scan_id
             ORDER BY s.created_at DESC, s.scan_id ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// Delete a scan and, by cascade, its frames. Returns `true` if a row
    /// was removed.
    pub async fn delete(pool: &DbPool, scan_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scans WHERE scan_id = $1")
            .bind(scan_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Register a scan and its frames in one transaction.
    ///
    /// The scan row is created if absent. Frames whose `(scan_id, index)` is
    /// already registered are skipped, so re-importing a directory only adds
    /// new frames. A frame path already owned by another scan aborts the
    /// whole import with a unique violation.
    pub async fn import(
        pool: &DbPool,
        scan_id: &str,
        frames: &[DiscoveredFrame],
    ) -> Result<ImportOutcome, sqlx::Error> {
        let now = chrono::Utc::now();
        let mut tx = pool.begin().await?;

        let scan_created = sqlx::query(
            "INSERT INTO scans (scan_id, created_at, updated_at)
             VALUES ($1, $2, $2)
             ON CONFLICT (scan_id) DO NOTHING",
        )
        .bind(scan_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let mut outcome = ImportOutcome {
            scan_created,
            ..ImportOutcome::default()
        };

        for frame in frames {
            let inserted = sqlx::query(
                "INSERT INTO bscans (scan_id, bscan_index, path, label, updated_at)
                 VALUES ($1, $2, $3, 0, $4)
                 ON CONFLICT (scan_id, bscan_index) DO NOTHING",
            )
            .bind(scan_id)
            .bind(frame.index)
            .bind(frame.path.to_string_lossy().as_ref())
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                outcome.imported += 1;
            } else {
                outcome.skipped_existing += 1;
            }
        }

        if outcome.imported > 0 && !scan_created {
            sqlx::query("UPDATE scans SET updated_at = $2 WHERE scan_id = $1")
                .bind(scan_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(outcome)
    }
}
