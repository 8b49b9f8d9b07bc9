//! File upload endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};
use tuneful_common::db::FileRecord;

use super::types::FileResponse;
use crate::db::files;
use crate::uploads::secure_filename;
use crate::{ApiError, ApiResult, AppState, Session};

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// POST /api/files
///
/// Stores the `file` field under its sanitized name. The body is read
/// before any database connection is taken; the bytes are written first and
/// the row is inserted in a short transaction afterwards. If that fails the
/// bytes are removed again. The upload directory must already exist.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<FileResponse>)> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = match upload {
        Some((filename, data)) if !filename.is_empty() => (filename, data),
        _ => return Err(ApiError::MissingUploadPayload),
    };

    let name = secure_filename(&filename)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid file name: {:?}", filename)))?;

    let path = state.uploads.path(&name);
    tokio::fs::write(&path, &data).await?;

    let file = match insert_row(&state, &name).await {
        Ok(file) => file,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                warn!("Could not remove {} after failed insert: {}", path.display(), rm);
            }
            return Err(e);
        }
    };

    info!("Stored upload {} as file {} ({} bytes)", name, file.id, data.len());

    Ok((
        StatusCode::CREATED,
        Json(FileResponse::new(file, &state.uploads)),
    ))
}

async fn insert_row(state: &AppState, name: &str) -> ApiResult<FileRecord> {
    let mut session = Session::begin(&state.db).await?;
    let file = files::insert_file(session.conn(), name).await?;
    session.commit().await?;
    Ok(file)
}
