//! Configuration loading and resolution
//!
//! Every setting resolves in priority order:
//! 1. Explicit override (command-line flag or its environment variable)
//! 2. TOML config file
//! 3. Compiled default
//!
//! The `testing` profile replaces the TOML layer with fixed throwaway
//! locations: an in-memory database and an upload folder under the
//! system temp directory.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Environment variable selecting the configuration profile (read by the CLI)
pub const PROFILE_ENV_VAR: &str = "TUNEFUL_CONFIG";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5730;

/// Default upper bound on an upload request body (64 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

const DATABASE_FILE_NAME: &str = "tuneful.db";
const UPLOAD_FOLDER_NAME: &str = "uploads";

/// Named configuration profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Production,
    Testing,
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Profile::Production),
            "testing" | "test" => Ok(Profile::Testing),
            other => Err(Error::Config(format!("Unknown configuration profile: {}", other))),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Production => write!(f, "production"),
            Profile::Testing => write!(f, "testing"),
        }
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,
}

/// On-disk TOML configuration. Every key is optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// sqlx connection URL, e.g. `sqlite:///var/lib/tuneful/tuneful.db`
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub upload_folder: Option<PathBuf>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Load a TOML config file.
    ///
    /// A missing file yields the empty config with a warning; a file that
    /// exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file not found at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }
}

/// Platform default location of the TOML config file
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tuneful").join("config.toml"))
}

/// Compiled defaults used when nothing else specifies a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub log_level: String,
    pub max_upload_bytes: usize,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("tuneful"))
            .unwrap_or_else(|| PathBuf::from("./tuneful_data"));

        Self {
            root_folder,
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Values supplied explicitly on the command line or through environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root_folder: Option<PathBuf>,
    pub database_url: Option<String>,
    pub upload_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub profile: Profile,
    pub database_url: String,
    pub upload_folder: PathBuf,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides, TOML and compiled defaults for the given profile
    pub fn resolve(profile: Profile, overrides: &Overrides, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let empty = TomlConfig::default();
        let toml = match profile {
            Profile::Production => toml,
            Profile::Testing => &empty,
        };

        let root_folder = overrides
            .root_folder
            .clone()
            .or_else(|| toml.root_folder.clone())
            .unwrap_or(defaults.root_folder);

        let database_url = overrides
            .database_url
            .clone()
            .or_else(|| toml.database_url.clone())
            .unwrap_or_else(|| match profile {
                Profile::Production => sqlite_url(&root_folder.join(DATABASE_FILE_NAME)),
                Profile::Testing => "sqlite::memory:".to_string(),
            });

        let upload_folder = overrides
            .upload_folder
            .clone()
            .or_else(|| toml.upload_folder.clone())
            .unwrap_or_else(|| match profile {
                Profile::Production => root_folder.join(UPLOAD_FOLDER_NAME),
                Profile::Testing => std::env::temp_dir().join("tuneful-test-uploads"),
            });

        Self {
            profile,
            database_url,
            upload_folder,
            port: overrides.port.or(toml.port).unwrap_or(defaults.port),
            max_upload_bytes: toml.max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
            log_level: overrides
                .log_level
                .clone()
                .or_else(|| toml.logging.level.clone())
                .unwrap_or(defaults.log_level),
        }
    }
}

/// Build a create-if-missing sqlx URL for a database file
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parsing() {
        assert_eq!("production".parse::<Profile>().unwrap(), Profile::Production);
        assert_eq!("Testing".parse::<Profile>().unwrap(), Profile::Testing);
        assert_eq!(" test ".parse::<Profile>().unwrap(), Profile::Testing);
        assert!("staging".parse::<Profile>().is_err());
    }

    #[test]
    fn test_production_defaults_live_under_root_folder() {
        let overrides = Overrides {
            root_folder: Some(PathBuf::from("/srv/tuneful")),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(Profile::Production, &overrides, &TomlConfig::default());

        assert_eq!(config.database_url, "sqlite:///srv/tuneful/tuneful.db?mode=rwc");
        assert_eq!(config.upload_folder, PathBuf::from("/srv/tuneful/uploads"));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_override_beats_toml() {
        let toml = TomlConfig {
            port: Some(9000),
            upload_folder: Some(PathBuf::from("/toml/uploads")),
            ..Default::default()
        };
        let overrides = Overrides {
            port: Some(9100),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(Profile::Production, &overrides, &toml);

        assert_eq!(config.port, 9100);
        assert_eq!(config.upload_folder, PathBuf::from("/toml/uploads"));
    }

    #[test]
    fn test_testing_profile_ignores_toml() {
        let toml = TomlConfig {
            database_url: Some("sqlite:///toml.db".to_string()),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(Profile::Testing, &Overrides::default(), &toml);

        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.upload_folder.starts_with(std::env::temp_dir()));
    }
}
