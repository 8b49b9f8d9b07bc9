//! HTTP API handlers for tuneful-api

pub mod files;
pub mod health;
pub mod songs;
pub mod types;

pub use files::upload_file;
pub use health::health_routes;
pub use songs::{create_song, delete_song, get_song, list_songs, update_song};
