//! Integration tests for scan registration, labeling, navigation and stats.
//!
//! Exercises the repository layer against a real SQLite database:
//! - Import is idempotent and skips existing frames
//! - Label writes, clears and bulk updates (including rollback)
//! - Navigation queries over gapped indices
//! - Per-scan and global label counts
//! - Cascade delete and unique constraints

use std::path::PathBuf;

use bscan_core::importer::DiscoveredFrame;
use bscan_core::label::{LABEL_HEALTHY, LABEL_UNHEALTHY, LABEL_UNLABELED};
use bscan_core::navigation::{resolve, FrameNeighbors, NavigationError};
use bscan_db::models::bscan::LabelUpdate;
use bscan_db::repositories::{BScanRepo, PoolFrameLookup, ScanRepo, StatsRepo};
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn frames(scan_id: &str, indices: &[i64]) -> Vec<DiscoveredFrame> {
    indices
        .iter()
        .map(|&index| DiscoveredFrame {
            index,
            path: PathBuf::from(format!("/data/scans/{scan_id}/{index}.png")),
        })
        .collect()
}

/// Import `indices` into `scan_id` and return the frame ids in index order.
async fn seed(pool: &SqlitePool, scan_id: &str, indices: &[i64]) -> Vec<i64> {
    ScanRepo::import(pool, scan_id, &frames(scan_id, indices))
        .await
        .unwrap();
    let mut ids = Vec::new();
    for &index in indices {
        let row = BScanRepo::find_by_index(pool, scan_id, index)
            .await
            .unwrap()
            .unwrap();
        ids.push(row.id);
    }
    ids
}

// ---------------------------------------------------------------------------
// Test: Import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_creates_scan_and_frames(pool: SqlitePool) {
    let outcome = ScanRepo::import(&pool, "scan_a", &frames("scan_a", &[1, 2, 3]))
        .await
        .unwrap();
    assert!(outcome.scan_created);
    assert_eq!(outcome.imported, 3);
    assert_eq!(outcome.skipped_existing, 0);

    let scan = ScanRepo::find_by_id(&pool, "scan_a").await.unwrap().unwrap();
    assert_eq!(scan.scan_id, "scan_a");

    let frame = BScanRepo::find_by_index(&pool, "scan_a", 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame.label, LABEL_UNLABELED);
    assert_eq!(frame.path, "/data/scans/scan_a/2.png");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reimport_skips_existing_frames(pool: SqlitePool) {
    ScanRepo::import(&pool, "scan_a", &frames("scan_a", &[1, 2]))
        .await
        .unwrap();

    let outcome = ScanRepo::import(&pool, "scan_a", &frames("scan_a", &[1, 2, 3]))
        .await
        .unwrap();
    assert!(!outcome.scan_created);
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped_existing, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reimport_keeps_existing_labels(pool: SqlitePool) {
    let ids = seed(&pool, "scan_a", &[1, 2]).await;
    BScanRepo::set_label(&pool, ids[0], LABEL_HEALTHY)
        .await
        .unwrap();

    ScanRepo::import(&pool, "scan_a", &frames("scan_a", &[1, 2]))
        .await
        .unwrap();

    let frame = BScanRepo::find_by_id(&pool, ids[0]).await.unwrap().unwrap();
    assert_eq!(frame.label, LABEL_HEALTHY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_rolls_back_on_path_conflict(pool: SqlitePool) {
    seed(&pool, "scan_a", &[1]).await;

    // Same file claimed by a second scan.
    let conflicting = vec![
        DiscoveredFrame {
            index: 7,
            path: PathBuf::from("/data/scans/scan_b/7.png"),
        },
        DiscoveredFrame {
            index: 8,
            path: PathBuf::from("/data/scans/scan_a/1.png"),
        },
    ];
    let err = ScanRepo::import(&pool, "scan_b", &conflicting)
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert!(db_err.is_unique_violation());

    assert!(ScanRepo::find_by_id(&pool, "scan_b").await.unwrap().is_none());
    assert!(BScanRepo::find_by_index(&pool, "scan_b", 7)
        .await
        .unwrap()
        .is_none());
}

/// Insert a frame row directly, bypassing the importer's conflict handling.
async fn insert_frame(pool: &SqlitePool, scan_id: &str, index: i64, path: &str) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO bscans (scan_id, bscan_index, path) VALUES ($1, $2, $3)")
        .bind(scan_id)
        .bind(index)
        .bind(path)
        .execute(pool)
        .await
        .map(|_| ())
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_frame_index_rejected(pool: SqlitePool) {
    seed(&pool, "scan_a", &[1]).await;

    let err = insert_frame(&pool, "scan_a", 1, "/a/other.png")
        .await
        .unwrap_err();
    assert!(err.as_database_error().unwrap().is_unique_violation());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_frame_requires_existing_scan(pool: SqlitePool) {
    let err = insert_frame(&pool, "missing", 1, "/a/1.png")
        .await
        .unwrap_err();
    assert!(err.as_database_error().unwrap().is_foreign_key_violation());
}

// ---------------------------------------------------------------------------
// Test: Labels
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_and_clear_label(pool: SqlitePool) {
    let ids = seed(&pool, "scan_a", &[1]).await;

    let labeled = BScanRepo::set_label(&pool, ids[0], LABEL_UNHEALTHY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(labeled.label, LABEL_UNHEALTHY);
    assert_eq!(labeled.label_name(), "unhealthy");

    let cleared = BScanRepo::clear_label(&pool, ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.label, LABEL_UNLABELED);
    assert!(cleared.updated_at >= labeled.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_label_missing_frame_returns_none(pool: SqlitePool) {
    let result = BScanRepo::set_label(&pool, 999, LABEL_HEALTHY)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_label_check_constraint(pool: SqlitePool) {
    let ids = seed(&pool, "scan_a", &[1]).await;
    let err = BScanRepo::set_label(&pool, ids[0], 7).await.unwrap_err();
    assert!(err.as_database_error().unwrap().is_check_violation());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_update_applies_all(pool: SqlitePool) {
    let ids = seed(&pool, "scan_a", &[1, 2, 3]).await;
    let updates = vec![
        LabelUpdate {
            bscan_id: ids[0],
            label: LABEL_HEALTHY,
        },
        LabelUpdate {
            bscan_id: ids[2],
            label: LABEL_UNHEALTHY,
        },
    ];

    let updated = BScanRepo::bulk_set_labels(&pool, &updates).await.unwrap();
    assert_eq!(updated.len(), 2);

    let counts = StatsRepo::scan_counts(&pool, "scan_a").await.unwrap();
    assert_eq!(counts.healthy, 1);
    assert_eq!(counts.unhealthy, 1);
    assert_eq!(counts.unlabeled, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_update_rolls_back_on_missing_id(pool: SqlitePool) {
    let ids = seed(&pool, "scan_a", &[1]).await;
    let updates = vec![
        LabelUpdate {
            bscan_id: ids[0],
            label: LABEL_HEALTHY,
        },
        LabelUpdate {
            bscan_id: 999,
            label: LABEL_HEALTHY,
        },
    ];

    let err = BScanRepo::bulk_set_labels(&pool, &updates)
        .await
        .unwrap_err();
    assert!(matches!(err, sqlx::Error::RowNotFound));

    let frame = BScanRepo::find_by_id(&pool, ids[0]).await.unwrap().unwrap();
    assert_eq!(frame.label, LABEL_UNLABELED);
}

// ---------------------------------------------------------------------------
// Test: Navigation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_navigation_skips_gaps(pool: SqlitePool) {
    seed(&pool, "scan_a", &[1, 2, 3, 5]).await;
    let lookup = PoolFrameLookup::new(&pool);

    let at_three = resolve(&lookup, "scan_a", 3).await.unwrap();
    assert_eq!(at_three.prev_index, Some(2));
    assert_eq!(at_three.next_index, Some(5));

    let at_five = resolve(&lookup, "scan_a", 5).await.unwrap();
    assert_eq!(at_five.prev_index, Some(3));
    assert_eq!(at_five.next_index, None);

    let at_one = resolve(&lookup, "scan_a", 1).await.unwrap();
    assert_eq!(at_one.prev_index, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_next_unlabeled(pool: SqlitePool) {
    let ids = seed(&pool, "scan_a", &[1, 2, 3, 4]).await;
    BScanRepo::set_label(&pool, ids[0], LABEL_HEALTHY)
        .await
        .unwrap();
    BScanRepo::set_label(&pool, ids[2], LABEL_UNHEALTHY)
        .await
        .unwrap();
    let lookup = PoolFrameLookup::new(&pool);

    let from_one = resolve(&lookup, "scan_a", 1).await.unwrap();
    assert_eq!(from_one.next_unlabeled_index, Some(2));
    let from_three = resolve(&lookup, "scan_a", 3).await.unwrap();
    assert_eq!(from_three.next_unlabeled_index, Some(4));
    let from_four = resolve(&lookup, "scan_a", 4).await.unwrap();
    assert_eq!(from_four.next_unlabeled_index, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_navigation_stays_within_scan(pool: SqlitePool) {
    seed(&pool, "scan_a", &[1, 3]).await;
    seed(&pool, "scan_b", &[2]).await;
    let lookup = PoolFrameLookup::new(&pool);

    let neighbors = resolve(&lookup, "scan_a", 1).await.unwrap();
    assert_eq!(
        neighbors,
        FrameNeighbors {
            prev_index: None,
            next_index: Some(3),
            next_unlabeled_index: Some(3),
        }
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_navigation_missing_frame(pool: SqlitePool) {
    seed(&pool, "scan_a", &[1, 2]).await;
    let lookup = PoolFrameLookup::new(&pool);

    let err = resolve(&lookup, "scan_a", 9).await.unwrap_err();
    assert!(matches!(
        err,
        NavigationError::FrameNotFound { ref scan_id, index: 9 } if scan_id == "scan_a"
    ));
}

// ---------------------------------------------------------------------------
// Test: Stats
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scan_stats(pool: SqlitePool) {
    let ids = seed(&pool, "scan_a", &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).await;
    for &id in &ids[..3] {
        BScanRepo::set_label(&pool, id, LABEL_HEALTHY)
            .await
            .unwrap();
    }
    BScanRepo::set_label(&pool, ids[3], LABEL_UNHEALTHY)
        .await
        .unwrap();

    let stats = StatsRepo::scan_stats(&pool, "scan_a").await.unwrap();
    assert_eq!(stats.total_bscans, 10);
    assert_eq!(stats.labeled, 4);
    assert_eq!(stats.unlabeled, 6);
    assert_eq!(stats.percent_complete, 40.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_scan_stats(pool: SqlitePool) {
    let outcome = ScanRepo::import(&pool, "empty", &[]).await.unwrap();
    assert!(outcome.scan_created);

    let stats = StatsRepo::scan_stats(&pool, "empty").await.unwrap();
    assert_eq!(stats.total_bscans, 0);
    assert_eq!(stats.percent_complete, 0.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_global_stats_and_summary(pool: SqlitePool) {
    let a = seed(&pool, "scan_a", &[1, 2]).await;
    seed(&pool, "scan_b", &[1, 2]).await;
    ScanRepo::import(&pool, "scan_c", &[]).await.unwrap();
    BScanRepo::set_label(&pool, a[0], LABEL_HEALTHY)
        .await
        .unwrap();
    // Creation order scan_a, scan_c, scan_b, one minute apart.
    let base = chrono::Utc::now();
    for (offset, scan_id) in [(0, "scan_a"), (1, "scan_c"), (2, "scan_b")] {
        sqlx::query("UPDATE scans SET created_at = $2 WHERE scan_id = $1")
            .bind(scan_id)
            .bind(base + chrono::Duration::minutes(offset))
            .execute(&pool)
            .await
            .unwrap();
    }

    let global = StatsRepo::global(&pool).await.unwrap();
    assert_eq!(global.total_scans, 3);
    assert_eq!(global.total_bscans, 4);
    assert_eq!(global.total_labeled, 1);
    assert_eq!(global.percent_complete, 25.0);

    let summary = StatsRepo::per_scan_counts(&pool).await.unwrap();
    let names: Vec<&str> = summary.iter().map(|row| row.scan.scan_id.as_str()).collect();
    assert_eq!(names, ["scan_b", "scan_c", "scan_a"]);
    assert_eq!(summary[2].counts.healthy, 1);
    assert_eq!(summary[2].counts.unlabeled, 1);
    assert_eq!(summary[1].counts.total(), 0);
    assert!(summary[0].scan.created_at > summary[2].scan.created_at);

    let listed = ScanRepo::list_summaries(&pool).await.unwrap();
    let listed_names: Vec<&str> = listed.iter().map(|s| s.scan_id.as_str()).collect();
    assert_eq!(listed_names, names);
    let scan_a = listed.iter().find(|s| s.scan_id == "scan_a").unwrap();
    assert_eq!(scan_a.total_bscans, 2);
    assert_eq!(scan_a.labeled_bscans, 1);
    assert_eq!(scan_a.percent_complete(), 50.0);
}

// ---------------------------------------------------------------------------
// Test: Delete and export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_scan_cascades(pool: SqlitePool) {
    let ids = seed(&pool, "scan_a", &[1, 2]).await;

    assert!(ScanRepo::delete(&pool, "scan_a").await.unwrap());
    assert!(BScanRepo::find_by_id(&pool, ids[0]).await.unwrap().is_none());
    assert!(!ScanRepo::delete(&pool, "scan_a").await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_export_rows_ordered_and_filtered(pool: SqlitePool) {
    seed(&pool, "scan_b", &[2, 1]).await;
    seed(&pool, "scan_a", &[3]).await;

    let all = BScanRepo::list_for_export(&pool, None).await.unwrap();
    let order: Vec<(&str, i64)> = all
        .iter()
        .map(|b| (b.scan_id.as_str(), b.bscan_index))
        .collect();
    assert_eq!(order, [("scan_a", 3), ("scan_b", 1), ("scan_b", 2)]);

    let only_b = BScanRepo::list_for_export(&pool, Some("scan_b"))
        .await
        .unwrap();
    assert_eq!(only_b.len(), 2);
}
