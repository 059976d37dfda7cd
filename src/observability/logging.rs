//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "MEDIASNAP_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name; unknown names fall back to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds the config from file settings, the environment and `--verbose`.
    ///
    /// Filter precedence: `MEDIASNAP_LOG`, `RUST_LOG`, `debug` when verbose,
    /// the configured level, then `info`.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    fn resolve(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let filter = env(LOG_ENV)
            .or_else(|| env("RUST_LOG"))
            .filter(|f| !f.trim().is_empty())
            .or_else(|| verbose.then(|| "debug".to_string()))
            .or_else(|| settings.and_then(|s| s.level.clone()))
            .unwrap_or_else(|| "info".to_string());

        Self {
            filter,
            format: settings
                .and_then(|s| s.format.as_deref())
                .map(LogFormat::parse)
                .unwrap_or_default(),
            file: settings.and_then(|s| s.file.clone()),
        }
    }
}
