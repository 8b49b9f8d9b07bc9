//! JSON request and response bodies

use serde::{Deserialize, Serialize};
use tuneful_common::db::{FileRecord, Song};

use crate::UploadDir;

/// File representation: id, stored name and the URL serving its bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: i64,
    pub name: String,
    pub path: String,
}

impl FileResponse {
    pub fn new(file: FileRecord, uploads: &UploadDir) -> Self {
        let path = uploads.url(&file.name);
        Self {
            id: file.id,
            name: file.name,
            path,
        }
    }
}

/// Song representation with its file embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongResponse {
    pub id: i64,
    pub file: FileResponse,
}

impl SongResponse {
    pub fn new(song: Song, uploads: &UploadDir) -> Self {
        Self {
            id: song.id,
            file: FileResponse::new(song.file, uploads),
        }
    }
}

/// POST /api/songs body. Without `file.id` a placeholder file is created.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSongRequest {
    #[serde(default)]
    pub file: Option<FileReference>,
}

#[derive(Debug, Deserialize)]
pub struct FileReference {
    #[serde(default)]
    pub id: Option<i64>,
}

/// PUT /api/songs/:id body
#[derive(Debug, Deserialize)]
pub struct UpdateSongRequest {
    pub file: FileRename,
}

#[derive(Debug, Deserialize)]
pub struct FileRename {
    pub name: String,
}
