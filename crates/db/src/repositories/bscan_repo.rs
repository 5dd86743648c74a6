//! Repository for the `bscans` table.

use bscan_core::label::LABEL_UNLABELED;
use bscan_core::types::{BScanIndex, DbId};

use crate::models::bscan::{BScan, LabelUpdate};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, scan_id, bscan_index, path, label, updated_at";

/// Provides frame lookup and label writes.
pub struct BScanRepo;

impl BScanRepo {
    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<BScan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bscans WHERE id = $1");
        sqlx::query_as::<_, BScan>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a frame by its position within a scan.
    pub async fn find_by_index(
        pool: &DbPool,
        scan_id: &str,
        index: BScanIndex,
    ) -> Result<Option<BScan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bscans WHERE scan_id = $1 AND bscan_index = $2");
        sqlx::query_as::<_, BScan>(&query)
            .bind(scan_id)
            .bind(index)
            .fetch_optional(pool)
            .await
    }

    /// Set a frame's label code. Returns `None` if the frame does not exist.
    ///
    /// Callers validate the code; the table's CHECK constraint rejects
    /// anything outside 0..=2.
    pub async fn set_label(
        pool: &DbPool,
        id: DbId,
        label: i64,
    ) -> Result<Option<BScan>, sqlx::Error> {
        let query = format!(
            "UPDATE bscans SET label = $2, updated_at = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BScan>(&query)
            .bind(id)
            .bind(label)
            .bind(chrono::Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Reset a frame to unlabeled.
    pub async fn clear_label(pool: &DbPool, id: DbId) -> Result<Option<BScan>, sqlx::Error> {
        Self::set_label(pool, id, LABEL_UNLABELED).await
    }

    /// Apply several label updates in one transaction.
    ///
    /// If any id does not exist the transaction is rolled back and
    /// `sqlx::Error::RowNotFound` is returned.
    pub async fn bulk_set_labels(
        pool: &DbPool,
        updates: &[LabelUpdate],
    ) -> Result<Vec<BScan>, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "UPDATE bscans SET label = $2, updated_at = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            let row = sqlx::query_as::<_, BScan>(&query)
                .bind(update.bscan_id)
                .bind(update.label)
                .bind(now)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            updated.push(row);
        }
        tx.commit().await?;

        Ok(updated)
    }

    /// All frames ordered by scan then index, optionally restricted to one scan.
    pub async fn list_for_export(
        pool: &DbPool,
        scan_id: Option<&str>,
    ) -> Result<Vec<BScan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bscans
             WHERE ($1 IS NULL OR scan_id = $1)
             ORDER BY scan_id ASC, bscan_index ASC"
        );
        sqlx::query_as::<_, BScan>(&query)
            .bind(scan_id)
            .fetch_all(pool)
            .await
    }
}
