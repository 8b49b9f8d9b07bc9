//! Database row models

use serde::{Deserialize, Serialize};

/// Longest file name the `files` table accepts
pub const MAX_FILE_NAME_LEN: usize = 128;

/// Row of the `files` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
}

/// Row of the `songs` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SongRecord {
    pub id: i64,
    pub file_id: i64,
}

/// A song joined with the file it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: i64,
    pub file: FileRecord,
}
