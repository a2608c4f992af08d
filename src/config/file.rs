//! TOML configuration file loading
//!
//! Supports `~/.config/muse/dashboard/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct DashboardConfigFile {
    /// MongoDB connection string
    #[serde(default)]
    pub mongo_uri: Option<String>,

    /// IANA time zone used for displayed timestamps (e.g. "Europe/Paris")
    #[serde(default)]
    pub timezone: Option<String>,

    /// Document store configuration
    #[serde(default)]
    pub mongo: MongoFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Lookup cache configuration
    #[serde(default)]
    pub cache: CacheFileConfig,

    /// Conversation summary configuration
    #[serde(default)]
    pub summary: SummaryFileConfig,
}

/// Document store configuration
#[derive(Debug, Default, Deserialize)]
pub struct MongoFileConfig {
    /// Database holding conversations and context entries
    pub app_database: Option<String>,

    /// Database holding per-conversation analytics
    pub feedback_database: Option<String>,

    /// Connect and server selection timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,
}

/// Lookup cache configuration
#[derive(Debug, Default, Deserialize)]
pub struct CacheFileConfig {
    /// Seconds a cached lookup stays valid
    pub ttl_secs: Option<u64>,

    /// Maximum number of cached lookups per kind
    pub capacity: Option<u64>,
}

/// Conversation summary configuration
#[derive(Debug, Default, Deserialize)]
pub struct SummaryFileConfig {
    /// API key for the chat-completions endpoint
    pub api_key: Option<String>,

    /// Chat-completions endpoint URL
    pub url: Option<String>,

    /// Model identifier
    pub model: Option<String>,

    /// Maximum prompt length in characters
    pub max_prompt_chars: Option<usize>,
}

/// Load the TOML config file from the standard path
///
/// Returns `DashboardConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> DashboardConfigFile {
    config_file_path().map_or_else(DashboardConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
pub fn load_from(path: &Path) -> DashboardConfigFile {
    if !path.exists() {
        return DashboardConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                DashboardConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            DashboardConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/muse/dashboard/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("muse")
            .join("dashboard")
            .join("config.toml")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let file: DashboardConfigFile = toml::from_str(
            r#"
            mongo_uri = "mongodb://localhost:27017"

            [cache]
            ttl_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(file.mongo_uri.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(file.cache.ttl_secs, Some(30));
        assert!(file.cache.capacity.is_none());
        assert!(file.server.port.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let file = load_from(Path::new("/nonexistent/muse/config.toml"));
        assert!(file.mongo_uri.is_none());
        assert!(file.timezone.is_none());
    }
}
