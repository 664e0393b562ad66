//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Default filter when nothing else is configured.
const DEFAULT_FILTER: &str = "music_library=info,tower_http=info,warn";

/// Default filter with `--verbose`.
const VERBOSE_FILTER: &str = "music_library=debug,tower_http=debug,info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directives.
    pub filter: String,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from config settings.
    ///
    /// The filter is taken from `RUST_LOG`, then the configured filter, then
    /// a default that `verbose` raises to debug.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        Self::resolve(settings, verbose, std::env::var("RUST_LOG").ok())
    }

    fn resolve(settings: &LoggingSettings, verbose: bool, rust_log: Option<String>) -> Self {
        let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
        let filter = rust_log
            .or_else(|| settings.filter.clone())
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        Self {
            format: settings
                .format
                .as_deref()
                .map(LogFormat::parse)
                .unwrap_or_default(),
            filter,
            file: settings.file.clone(),
        }
    }
}
