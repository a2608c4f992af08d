//! Configuration management for the dashboard
//!
//! Values are layered env > TOML file > defaults. The only required value is
//! the MongoDB connection string; its absence fails at startup.

pub mod file;

use std::fmt;
use std::time::Duration;

use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};

use crate::format::system_timezone;
use crate::{Error, Result};

pub use file::DashboardConfigFile;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8501;

/// Default database holding conversations and context entries
pub const DEFAULT_APP_DATABASE: &str = "muse-application";

/// Default database holding per-conversation analytics
pub const DEFAULT_FEEDBACK_DATABASE: &str = "muse-assistant-feedback";

/// Default connect/selection timeout for the document store
pub const DEFAULT_MONGO_TIMEOUT_MS: u64 = 30_000;

/// Default lifetime of a cached lookup
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default number of cached lookups per kind
pub const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Default chat-completions endpoint for summaries
pub const DEFAULT_SUMMARY_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default summary model
pub const DEFAULT_SUMMARY_MODEL: &str = "llama-3.3-70b-versatile";

/// Default prompt length budget for summaries
pub const DEFAULT_SUMMARY_PROMPT_CHARS: usize = 1000;

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Document store connection
    pub mongo: MongoConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Lookup cache configuration
    pub cache: CacheConfig,

    /// Time zone for displayed timestamps
    pub timezone: Tz,

    /// Conversation summaries; `None` when no API key is configured
    pub summary: Option<SummaryConfig>,
}

/// Document store connection settings
#[derive(Clone)]
pub struct MongoConfig {
    /// Connection string (kept secret; it usually embeds credentials)
    pub uri: SecretString,

    /// Database holding `conversations` and `context`
    pub app_database: String,

    /// Database holding `analytics`
    pub feedback_database: String,

    /// Connect and server selection timeout
    pub timeout: Duration,
}

impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("uri", &"[redacted]")
            .field("app_database", &self.app_database)
            .field("feedback_database", &self.feedback_database)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MongoConfig {
    /// Expose the connection string for the driver
    #[must_use]
    pub fn uri(&self) -> &str {
        self.uri.expose_secret()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Lookup cache configuration
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// How long a cached lookup stays valid
    pub ttl: Duration,

    /// Maximum number of entries per lookup kind
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Conversation summary configuration
#[derive(Clone)]
pub struct SummaryConfig {
    /// Bearer token for the chat-completions endpoint
    pub api_key: SecretString,

    /// Chat-completions endpoint URL
    pub url: String,

    /// Model identifier
    pub model: String,

    /// Prompt length budget in characters
    pub max_prompt_chars: usize,
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("api_key", &"[redacted]")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if `MONGO_URI` is missing or a value cannot be parsed
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(|key| std::env::var(key).ok(), fc)
    }

    /// Build configuration from an environment lookup and a parsed config file
    ///
    /// # Errors
    ///
    /// Returns error if `MONGO_URI` is missing or a value cannot be parsed
    pub fn from_sources<F>(env: F, fc: DashboardConfigFile) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let uri = env("MONGO_URI")
            .or_else(|| fc.mongo_uri.map(|v| v.trim().to_string()))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                let hint = file::config_file_path().map_or_else(
                    || "the config file".to_string(),
                    |p| p.display().to_string(),
                );
                Error::Config(format!(
                    "MONGO_URI is not set; export MONGO_URI=mongodb+srv://... or add `mongo_uri` to {hint}"
                ))
            })?;

        let timeout_ms = parse_env(&env, "MUSE_MONGO_TIMEOUT_MS")?
            .or(fc.mongo.timeout_ms)
            .unwrap_or(DEFAULT_MONGO_TIMEOUT_MS);

        let mongo = MongoConfig {
            uri: SecretString::new(uri.into()),
            app_database: env("MUSE_APP_DB")
                .or(fc.mongo.app_database)
                .unwrap_or_else(|| DEFAULT_APP_DATABASE.to_string()),
            feedback_database: env("MUSE_FEEDBACK_DB")
                .or(fc.mongo.feedback_database)
                .unwrap_or_else(|| DEFAULT_FEEDBACK_DATABASE.to_string()),
            timeout: Duration::from_millis(timeout_ms),
        };

        let server = ServerConfig {
            port: parse_env(&env, "MUSE_DASHBOARD_PORT")?
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
        };

        let cache = CacheConfig {
            ttl: Duration::from_secs(
                parse_env(&env, "MUSE_CACHE_TTL_SECS")?
                    .or(fc.cache.ttl_secs)
                    .unwrap_or(DEFAULT_CACHE_TTL_SECS),
            ),
            capacity: parse_env(&env, "MUSE_CACHE_CAPACITY")?
                .or(fc.cache.capacity)
                .unwrap_or(DEFAULT_CACHE_CAPACITY),
        };

        let timezone = match env("MUSE_TIMEZONE").or(fc.timezone) {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| Error::Config(format!("invalid MUSE_TIMEZONE {name:?}: {e}")))?,
            None => system_timezone(),
        };

        let summary = env("GROQ_API_KEY")
            .or_else(|| env("MUSE_SUMMARY_API_KEY"))
            .or(fc.summary.api_key)
            .map(|key| SummaryConfig {
                api_key: SecretString::new(key.into()),
                url: env("MUSE_SUMMARY_URL")
                    .or(fc.summary.url)
                    .unwrap_or_else(|| DEFAULT_SUMMARY_URL.to_string()),
                model: env("MUSE_SUMMARY_MODEL")
                    .or(fc.summary.model)
                    .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
                max_prompt_chars: fc
                    .summary
                    .max_prompt_chars
                    .unwrap_or(DEFAULT_SUMMARY_PROMPT_CHARS),
            });

        Ok(Self {
            mongo,
            server,
            cache,
            timezone,
            summary,
        })
    }
}

/// Parse an optional numeric environment value, rejecting garbage instead of ignoring it
fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::Config(format!("invalid {key} {raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_mongo_uri_fails_fast() {
        let err = Config::from_sources(env_from(&[]), DashboardConfigFile::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("MONGO_URI"));
    }

    #[test]
    fn blank_mongo_uri_is_treated_as_missing() {
        let err = Config::from_sources(env_from(&[("MONGO_URI", "   ")]), DashboardConfigFile::default())
            .unwrap_err();
        assert!(err.to_string().contains("MONGO_URI"));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_sources(
            env_from(&[("MONGO_URI", " mongodb://localhost:27017 "), ("MUSE_TIMEZONE", "UTC")]),
            DashboardConfigFile::default(),
        )
        .unwrap();

        assert_eq!(config.mongo.uri(), "mongodb://localhost:27017");
        assert_eq!(config.mongo.app_database, DEFAULT_APP_DATABASE);
        assert_eq!(config.mongo.feedback_database, DEFAULT_FEEDBACK_DATABASE);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.cache.ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
        assert_eq!(config.timezone, Tz::UTC);
        assert!(config.summary.is_none());
    }

    #[test]
    fn env_overrides_file() {
        let fc: DashboardConfigFile = toml::from_str(
            r#"
            mongo_uri = "mongodb://file:27017"
            timezone = "Asia/Tokyo"

            [server]
            port = 9000

            [cache]
            ttl_secs = 10
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            env_from(&[("MONGO_URI", "mongodb://env:27017"), ("MUSE_DASHBOARD_PORT", "9100")]),
            fc,
        )
        .unwrap();

        assert_eq!(config.mongo.uri(), "mongodb://env:27017");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.cache.ttl, Duration::from_secs(10));
        assert_eq!(config.timezone, chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = Config::from_sources(
            env_from(&[("MONGO_URI", "mongodb://x"), ("MUSE_TIMEZONE", "Mars/Olympus")]),
            DashboardConfigFile::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("MUSE_TIMEZONE"));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = Config::from_sources(
            env_from(&[("MONGO_URI", "mongodb://x"), ("MUSE_DASHBOARD_PORT", "eighty")]),
            DashboardConfigFile::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("MUSE_DASHBOARD_PORT"));
    }

    #[test]
    fn summary_enabled_by_api_key() {
        let config = Config::from_sources(
            env_from(&[("MONGO_URI", "mongodb://x"), ("GROQ_API_KEY", "gsk-test")]),
            DashboardConfigFile::default(),
        )
        .unwrap();

        let summary = config.summary.unwrap();
        assert_eq!(summary.url, DEFAULT_SUMMARY_URL);
        assert_eq!(summary.model, DEFAULT_SUMMARY_MODEL);
        assert!(!format!("{summary:?}").contains("gsk-test"));
    }
}
