//! File row operations

use sqlx::SqliteConnection;
use tuneful_common::db::FileRecord;
use tuneful_common::Result;

/// Insert a file row and return it with its assigned id
pub async fn insert_file(conn: &mut SqliteConnection, name: &str) -> Result<FileRecord> {
    let id = sqlx::query("INSERT INTO files (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    Ok(FileRecord {
        id,
        name: name.to_string(),
    })
}

pub async fn get_file(conn: &mut SqliteConnection, id: i64) -> Result<Option<FileRecord>> {
    let file = sqlx::query_as::<_, FileRecord>("SELECT id, name FROM files WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(file)
}

/// Whether a file other than `except_id` already uses `name`
pub async fn is_name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    except_id: i64,
) -> Result<bool> {
    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM files WHERE name = ? AND id != ?)")
            .bind(name)
            .bind(except_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(taken)
}

/// Change a file's stored name; `None` if the file does not exist
pub async fn rename_file(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
) -> Result<Option<FileRecord>> {
    let updated = sqlx::query("UPDATE files SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    Ok(Some(FileRecord {
        id,
        name: name.to_string(),
    }))
}

/// Delete a file row (and, by cascade, the song using it).
/// Returns whether a row was removed.
pub async fn delete_file(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let deleted = sqlx::query("DELETE FROM files WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

/// Whether some song already points at this file
pub async fn is_file_referenced(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let referenced: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM songs WHERE file_id = ?)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(referenced)
}
