//! Song row operations
//!
//! Songs are always read joined with their file so callers get the full
//! embedded representation.

use sqlx::SqliteConnection;
use tuneful_common::db::{FileRecord, Song, SongRecord};
use tuneful_common::Result;

const SELECT_SONGS: &str = r#"
    SELECT songs.id AS id, files.id AS file_id, files.name AS file_name
    FROM songs
    JOIN files ON files.id = songs.file_id
"#;

#[derive(sqlx::FromRow)]
struct SongRow {
    id: i64,
    file_id: i64,
    file_name: String,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Song {
            id: row.id,
            file: FileRecord {
                id: row.file_id,
                name: row.file_name,
            },
        }
    }
}

/// Insert a song referencing an existing file
pub async fn insert_song(conn: &mut SqliteConnection, file_id: i64) -> Result<SongRecord> {
    let id = sqlx::query("INSERT INTO songs (file_id) VALUES (?)")
        .bind(file_id)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    Ok(SongRecord { id, file_id })
}

pub async fn get_song(conn: &mut SqliteConnection, id: i64) -> Result<Option<Song>> {
    let row = sqlx::query_as::<_, SongRow>(&format!("{} WHERE songs.id = ?", SELECT_SONGS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Song::from))
}

/// All songs ordered by id
pub async fn list_songs(conn: &mut SqliteConnection) -> Result<Vec<Song>> {
    let rows = sqlx::query_as::<_, SongRow>(&format!("{} ORDER BY songs.id", SELECT_SONGS))
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Song::from).collect())
}
