//! Configuration management.
//!
//! Settings come from a TOML file; every key is optional:
//!
//! ```toml
//! data_dir = "/srv/mediasnap"
//! media_dir = "/srv/media"
//! overwrite = true
//! copy_media = true
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! file = "/var/log/mediasnap.log"
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application directory name under the platform config and data dirs.
const APP_DIR: &str = "mediasnap";

/// Main configuration for mediasnap.
#[derive(Debug, Clone)]
pub struct MediasnapConfig {
    /// Root of the dataset catalog.
    pub data_dir: PathBuf,
    /// Overrides where imported media are copied.
    pub media_dir: Option<PathBuf>,
    /// Default for replacing existing snapshot entries on export.
    pub overwrite: bool,
    /// Default for copying media into the media store on import.
    pub copy_media: bool,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging settings from the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `mediasnap=debug`.
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Optional log file, opened in append mode.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Media store override.
    pub media_dir: Option<String>,
    /// Export overwrite default.
    pub overwrite: Option<bool>,
    /// Import copy default.
    pub copy_media: Option<bool>,
    /// Logging configuration.
    pub logging: Option<LoggingSettings>,
}

impl Default for MediasnapConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            media_dir: None,
            overwrite: true,
            copy_media: true,
            logging: LoggingSettings::default(),
        }
    }
}

/// Returns the platform data dir plus `mediasnap`, or `.mediasnap`.
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(format!(".{APP_DIR}")),
        |dirs| dirs.data_dir().join(APP_DIR),
    )
}

impl MediasnapConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::io("read_config_file", path, &e))?;
        Self::parse(&contents)
            .map_err(|e| Error::InvalidInput(format!("config file {}: {e}", path.display())))
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or has unknown keys.
    pub fn parse(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self::from_config_file(file))
    }

    /// Returns the default config file location, if a home directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join(APP_DIR).join("config.toml"))
    }

    /// Loads configuration from the default location.
    ///
    /// Returns default configuration if no config file is found. A file that
    /// exists but cannot be loaded is logged and ignored.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path().filter(|p| p.exists()) else {
            return Self::default();
        };
        Self::load_from_file(&path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable config file");
            Self::default()
        })
    }

    /// Converts a `ConfigFile` to `MediasnapConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        config.media_dir = file.media_dir.map(PathBuf::from);
        if let Some(overwrite) = file.overwrite {
            config.overwrite = overwrite;
        }
        if let Some(copy_media) = file.copy_media {
            config.copy_media = copy_media;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the media store override.
    #[must_use]
    pub fn with_media_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.media_dir = Some(path.into());
        self
    }

    /// Returns where media imported into `dataset` are copied.
    ///
    /// The override wins; otherwise `<data_dir>/<dataset>/media`.
    #[must_use]
    pub fn media_dir_for(&self, dataset: &str) -> PathBuf {
        self.media_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(dataset).join("media"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MediasnapConfig::new();
        assert!(config.overwrite);
        assert!(config.copy_media);
        assert!(config.media_dir.is_none());
        assert!(config.data_dir.ends_with("mediasnap") || config.data_dir.ends_with(".mediasnap"));
    }

    #[test]
    fn test_parse_full_file() {
        let config = MediasnapConfig::parse(
            r#"
            data_dir = "/srv/snap"
            media_dir = "/srv/media"
            overwrite = false
            copy_media = false

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/snap"));
        assert_eq!(config.media_dir, Some(PathBuf::from("/srv/media")));
        assert!(!config.overwrite);
        assert!(!config.copy_media);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MediasnapConfig::parse("overwrite = false\n").unwrap();
        assert!(!config.overwrite);
        assert!(config.copy_media);
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = MediasnapConfig::parse("max_results = 3\n").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "data_dir = \"/tmp/x\"\n").unwrap();

        let config = MediasnapConfig::load_from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/x"));

        let missing = MediasnapConfig::load_from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(Error::Io { .. })));
    }

    #[test]
    fn test_media_dir_for() {
        let config = MediasnapConfig::new().with_data_dir("/data");
        assert_eq!(config.media_dir_for("pets"), PathBuf::from("/data/pets/media"));

        let config = config.with_media_dir("/elsewhere");
        assert_eq!(config.media_dir_for("pets"), PathBuf::from("/elsewhere"));
    }
}
