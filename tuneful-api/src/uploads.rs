//! Upload directory management and filename sanitization

use std::path::{Path, PathBuf};
use tuneful_common::db::MAX_FILE_NAME_LEN;

/// URL prefix under which uploaded files are served
pub const UPLOADS_MOUNT: &str = "/uploads";

/// Configured root folder for uploaded audio files
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `filename` inside the upload root
    pub fn path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Absolute-path URL at which `filename` is served
    pub fn url(&self, filename: &str) -> String {
        format!("{}/{}", UPLOADS_MOUNT, filename)
    }

    /// Create the upload root (and parents) if missing
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}

/// Make a client-supplied filename safe to use as a single path component.
///
/// Path separators count as whitespace, whitespace runs collapse to `_`,
/// anything outside ASCII letters, digits, `.`, `_` and `-` is dropped, and
/// leading/trailing `.` and `_` are stripped. Returns `None` when nothing
/// usable is left.
pub fn secure_filename(filename: &str) -> Option<String> {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let trimmed = trim_name(&filtered);
    if trimmed.is_empty() {
        return None;
    }

    Some(truncate_keeping_extension(trimmed))
}

fn trim_name(name: &str) -> &str {
    name.trim_matches(|c| c == '.' || c == '_')
}

/// Shorten the stem so the name fits `MAX_FILE_NAME_LEN` with its extension
/// intact; the served content type is inferred from that extension.
/// Input is ASCII only, so byte offsets are char boundaries.
fn truncate_keeping_extension(name: &str) -> String {
    if name.len() <= MAX_FILE_NAME_LEN {
        return name.to_string();
    }

    if let Some(dot) = name.rfind('.') {
        let extension = &name[dot..];
        if extension.len() < MAX_FILE_NAME_LEN {
            let stem = trim_name(&name[..MAX_FILE_NAME_LEN - extension.len()]);
            if !stem.is_empty() {
                return format!("{}{}", stem, extension);
            }
        }
    }

    trim_name(&name[..MAX_FILE_NAME_LEN]).to_string()
}
