//! # Tuneful Common Library
//!
//! Shared code for the tuneful service:
//! - Error type
//! - Configuration loading and resolution
//! - Database initialization and row models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
