//! Tests for database initialization
//!
//! Covers creation of a missing database file, reopening an existing one,
//! schema constraints on `files`/`songs`, and the in-memory pool.

use tuneful_common::config::sqlite_url;
use tuneful_common::db::init::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("nested").join("tuneful.db");

    let result = init_database(&sqlite_url(&db_path)).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let url = sqlite_url(&temp_dir.path().join("tuneful.db"));

    let pool1 = init_database(&url).await.unwrap();
    sqlx::query("INSERT INTO files (name) VALUES ('kept.mp3')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&url).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
        .fetch_one(&pool2)
        .await
        .unwrap();

    assert_eq!(count, 1, "Existing rows should survive re-initialization");
}

#[tokio::test]
async fn test_song_requires_existing_file() {
    let pool = init_database("sqlite::memory:").await.unwrap();

    let result = sqlx::query("INSERT INTO songs (file_id) VALUES (42)")
        .execute(&pool)
        .await;

    assert!(result.is_err(), "Foreign key to a missing file must be rejected");
}

#[tokio::test]
async fn test_file_referenced_by_one_song_only() {
    let pool = init_database("sqlite::memory:").await.unwrap();

    let file_id = sqlx::query("INSERT INTO files (name) VALUES ('a.mp3')")
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

    sqlx::query("INSERT INTO songs (file_id) VALUES (?)")
        .bind(file_id)
        .execute(&pool)
        .await
        .unwrap();

    let second = sqlx::query("INSERT INTO songs (file_id) VALUES (?)")
        .bind(file_id)
        .execute(&pool)
        .await;

    let err = tuneful_common::Error::from(second.unwrap_err());
    assert!(err.is_unique_violation(), "A file may back at most one song");
}

#[tokio::test]
async fn test_foreign_key_failure_is_not_unique_violation() {
    let pool = init_database("sqlite::memory:").await.unwrap();

    let err = sqlx::query("INSERT INTO songs (file_id) VALUES (42)")
        .execute(&pool)
        .await
        .unwrap_err();

    assert!(!tuneful_common::Error::from(err).is_unique_violation());
}

#[tokio::test]
async fn test_deleting_file_cascades_to_song() {
    let pool = init_database("sqlite::memory:").await.unwrap();

    let file_id = sqlx::query("INSERT INTO files (name) VALUES ('a.mp3')")
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();
    sqlx::query("INSERT INTO songs (file_id) VALUES (?)")
        .bind(file_id)
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM files WHERE id = ?")
        .bind(file_id)
        .execute(&pool)
        .await
        .unwrap();

    let songs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(songs, 0);
}

#[tokio::test]
async fn test_file_name_length_is_bounded() {
    let pool = init_database("sqlite::memory:").await.unwrap();

    let too_long = "x".repeat(129);
    let result = sqlx::query("INSERT INTO files (name) VALUES (?)")
        .bind(&too_long)
        .execute(&pool)
        .await;

    assert!(result.is_err());
}
