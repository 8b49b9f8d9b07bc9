//! Song endpoints
//!
//! Path ids are song ids. Renaming and deleting resolve the song's file
//! through the song, and a missing song is a 404 before anything is
//! touched.

use axum::{
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{debug, info, warn};

use super::types::{CreateSongRequest, FileResponse, SongResponse, UpdateSongRequest};
use crate::db::{files, songs};
use crate::uploads::secure_filename;
use crate::{ApiError, ApiResult, AppState, Session};

/// Name given to the file row created for a song posted without one
pub const PLACEHOLDER_FILE_NAME: &str = "name";

fn song_not_found(id: i64) -> ApiError {
    debug!("Song {} not found", id);
    ApiError::NotFound(format!("Could not find song with id {}", id))
}

/// GET /api/songs
pub async fn list_songs(
    State(state): State<AppState>,
    mut session: Session,
) -> ApiResult<Json<Vec<SongResponse>>> {
    let songs = songs::list_songs(session.conn()).await?;
    session.commit().await?;

    Ok(Json(
        songs
            .into_iter()
            .map(|song| SongResponse::new(song, &state.uploads))
            .collect(),
    ))
}

/// GET /api/songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut session: Session,
) -> ApiResult<Json<SongResponse>> {
    let song = songs::get_song(session.conn(), id)
        .await?
        .ok_or_else(|| song_not_found(id))?;
    session.commit().await?;

    Ok(Json(SongResponse::new(song, &state.uploads)))
}

/// POST /api/songs
///
/// Links the song to `file.id` when given (the file must exist and not
/// already back another song), otherwise to a new placeholder file.
pub async fn create_song(
    State(state): State<AppState>,
    mut session: Session,
    Json(request): Json<CreateSongRequest>,
) -> ApiResult<impl IntoResponse> {
    let file = match request.file.and_then(|f| f.id) {
        Some(file_id) => {
            let file = files::get_file(session.conn(), file_id)
                .await?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Could not find file with id {}", file_id))
                })?;

            if files::is_file_referenced(session.conn(), file_id).await? {
                return Err(ApiError::Conflict(format!(
                    "File with id {} already belongs to a song",
                    file_id
                )));
            }
            file
        }
        None => files::insert_file(session.conn(), PLACEHOLDER_FILE_NAME).await?,
    };

    // A concurrent POST can claim the file between the check and the insert
    let song = songs::insert_song(session.conn(), file.id)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::Conflict(format!("File with id {} already belongs to a song", file.id))
            } else {
                e.into()
            }
        })?;
    session.commit().await?;

    info!("Created song {} for file {} ({})", song.id, file.id, file.name);

    let body = SongResponse {
        id: song.id,
        file: FileResponse::new(file, &state.uploads),
    };
    Ok((
        StatusCode::CREATED,
        [(LOCATION, "/api/songs".to_string())],
        Json(body),
    ))
}

/// PUT /api/songs/:id
///
/// Renames the song's file to the sanitized `file.name` and moves its bytes
/// in the upload directory along with it. A name already used by another
/// file row or present on disk is a 409.
pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut session: Session,
    Json(request): Json<UpdateSongRequest>,
) -> ApiResult<impl IntoResponse> {
    let song = songs::get_song(session.conn(), id)
        .await?
        .ok_or_else(|| song_not_found(id))?;

    let name = secure_filename(&request.file.name).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid file name: {:?}", request.file.name))
    })?;

    let old_name = song.file.name;
    if name != old_name {
        let target = state.uploads.path(&name);
        if files::is_name_taken(session.conn(), &name, song.file.id).await?
            || tokio::fs::try_exists(&target).await?
        {
            return Err(ApiError::Conflict(format!("File name {} is already in use", name)));
        }
    }

    let file = files::rename_file(session.conn(), song.file.id, &name)
        .await?
        .ok_or_else(|| song_not_found(id))?;

    // Placeholder rows can share a name; their bytes are copied, not moved
    let shared = files::is_name_taken(session.conn(), &old_name, file.id).await?;
    let moved = name != old_name && move_upload(&state, &old_name, &name, shared).await?;

    if let Err(e) = session.commit().await {
        if moved {
            undo_move(&state, &old_name, &name, shared).await;
        }
        return Err(e);
    }

    info!("Renamed file {} of song {}: {} -> {}", file.id, id, old_name, file.name);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/songs/{}", id))],
        Json(FileResponse::new(file, &state.uploads)),
    ))
}

/// Move (or copy, when other rows still use `from`) the stored bytes.
/// Returns false when `from` has no bytes on disk yet.
async fn move_upload(
    state: &AppState,
    from: &str,
    to: &str,
    shared: bool,
) -> ApiResult<bool> {
    let source = state.uploads.path(from);
    if !tokio::fs::try_exists(&source).await? {
        debug!("No stored bytes for {}, renaming row only", from);
        return Ok(false);
    }

    let target = state.uploads.path(to);
    if shared {
        tokio::fs::copy(&source, &target).await?;
    } else {
        tokio::fs::rename(&source, &target).await?;
    }
    Ok(true)
}

async fn undo_move(state: &AppState, from: &str, to: &str, shared: bool) {
    let target = state.uploads.path(to);
    let result = if shared {
        tokio::fs::remove_file(&target).await
    } else {
        tokio::fs::rename(&target, state.uploads.path(from)).await
    };
    if let Err(e) = result {
        warn!("Could not restore {} after failed rename: {}", from, e);
    }
}

/// DELETE /api/songs/:id
///
/// Removes the song together with its file row. Bytes already in the
/// upload directory are left in place.
pub async fn delete_song(Path(id): Path<i64>, mut session: Session) -> ApiResult<StatusCode> {
    let song = songs::get_song(session.conn(), id)
        .await?
        .ok_or_else(|| song_not_found(id))?;

    files::delete_file(session.conn(), song.file.id).await?;
    session.commit().await?;

    info!("Deleted song {} and file {} ({})", id, song.file.id, song.file.name);

    Ok(StatusCode::NO_CONTENT)
}
