//! Storage queries for files and songs
//!
//! Every function runs on a caller-supplied connection, normally the one
//! owned by the request's [`crate::Session`]. Lookups of a missing id
//! return `None` rather than an error.

pub mod files;
pub mod songs;
