//! tuneful-api library - song catalogue and audio upload service
//!
//! Exposes the router and application state so integration tests can
//! drive the service without binding a socket.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tuneful_common::config::DEFAULT_MAX_UPLOAD_BYTES;

pub mod api;
pub mod db;
pub mod error;
pub mod negotiation;
pub mod session;
pub mod uploads;

pub use crate::error::{ApiError, ApiResult};
pub use crate::session::Session;
pub use crate::uploads::UploadDir;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool; handlers borrow from it through [`Session`]
    pub db: SqlitePool,
    /// Directory holding uploaded audio files
    pub uploads: Arc<UploadDir>,
    /// Largest accepted upload request body, in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, uploads: UploadDir) -> Self {
        Self {
            db,
            uploads: Arc::new(uploads),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build application router
///
/// Content negotiation is layered per handler so a rejected request never
/// reaches its extractors.
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::handler::Handler;
    use axum::routing::{get, post};
    use negotiation::{accept, APPLICATION_JSON, MULTIPART_FORM_DATA};
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;

    let json = accept(APPLICATION_JSON);
    let json_body = accept(APPLICATION_JSON).require(APPLICATION_JSON);

    // Guards wrap the handlers, not the method routers, so an unsupported
    // method still gets 405 whatever its headers say
    let songs = Router::new()
        .route(
            "/api/songs",
            get(api::list_songs.layer(json)).post(api::create_song.layer(json_body)),
        )
        .route(
            "/api/songs/:id",
            get(api::get_song.layer(json))
                .put(api::update_song.layer(json_body))
                .delete(api::delete_song.layer(json)),
        );

    let files = Router::new()
        .route(
            "/api/files",
            post(
                api::upload_file.layer(accept(APPLICATION_JSON).require(MULTIPART_FORM_DATA)),
            ),
        )
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    let serve_uploads = ServeDir::new(state.uploads.root());

    Router::new()
        .merge(songs)
        .merge(files)
        .merge(api::health_routes())
        .nest_service(uploads::UPLOADS_MOUNT, serve_uploads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
