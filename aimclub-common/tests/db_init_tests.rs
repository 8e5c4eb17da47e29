//! Integration tests for database initialization
//!
//! - Database file is created on first run
//! - Existing databases reopen without error
//! - Shared secret is generated once and then reused
//! - Every pooled connection carries the WAL, busy timeout and foreign key pragmas

use aimclub_common::api::auth::{load_shared_secret, SHARED_SECRET_KEY};
use aimclub_common::db::init::BUSY_TIMEOUT;
use aimclub_common::db::{get_setting, init_database};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("aimclub.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("aimclub.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO settings (key, value) VALUES ('marker', 'kept')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    let marker = get_setting(&pool2.unwrap(), "marker").await.unwrap();
    assert_eq!(marker.as_deref(), Some("kept"));
}

#[tokio::test]
async fn test_shared_secret_generated_once() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("aimclub.db");
    let pool = init_database(&db_path).await.unwrap();

    assert_eq!(get_setting(&pool, SHARED_SECRET_KEY).await.unwrap(), None);

    let first = load_shared_secret(&pool).await.unwrap();
    let second = load_shared_secret(&pool).await.unwrap();

    assert_ne!(first, 0);
    assert_eq!(first, second, "secret must persist across loads");
}

#[tokio::test]
async fn test_pragmas_apply_to_every_pooled_connection() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("aimclub.db")).await.unwrap();

    // Hold several connections at once so the pool has to open new ones
    let mut held = Vec::new();
    for _ in 0..4 {
        held.push(pool.acquire().await.unwrap());
    }

    for conn in held.iter_mut() {
        let journal: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        let busy: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&mut **conn)
            .await
            .unwrap();

        assert_eq!(journal.to_lowercase(), "wal");
        assert_eq!(busy, BUSY_TIMEOUT.as_millis() as i64);
        assert_eq!(foreign_keys, 1);
    }
}
