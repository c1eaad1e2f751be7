use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::filters::{DEFAULT_CANDIDATE_LIMIT, DEFAULT_MIN_READINESS};
use crate::core::orchestrator::DEFAULT_FRESHNESS_WINDOW_MS;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            redis_url: default_redis_url(),
            ttl_secs: None,
            l1_cache_size: None,
        }
    }
}

fn default_cache_enabled() -> bool { true }
fn default_redis_url() -> String { "redis://127.0.0.1:6379".to_string() }

/// Match formation and browsing rules
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    /// Age below which a resolved match is reported as new
    #[serde(default = "default_freshness_window_ms")]
    pub freshness_window_ms: i64,
    #[serde(default = "default_candidate_min_readiness")]
    pub candidate_min_readiness: u8,
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            freshness_window_ms: default_freshness_window_ms(),
            candidate_min_readiness: default_candidate_min_readiness(),
            candidate_limit: default_candidate_limit(),
        }
    }
}

fn default_freshness_window_ms() -> i64 { DEFAULT_FRESHNESS_WINDOW_MS }
fn default_candidate_min_readiness() -> u8 { DEFAULT_MIN_READINESS }
fn default_candidate_limit() -> usize { DEFAULT_CANDIDATE_LIMIT }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Plain environment variables that override individual settings
const ENV_OVERRIDES: [(&str, &str); 3] = [
    ("DATABASE_URL", "database.url"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with KINNECT__)
    /// 5. DATABASE_URL, LOG_LEVEL and LOG_FORMAT, if set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., KINNECT__SERVER__PORT -> server.port
            .add_source(kinnect_env())
            .build()?;

        apply_env_overrides(settings, |name| std::env::var(name).ok())?.try_deserialize()
    }

    /// Load configuration from a custom path, with the same overrides as [`load`](Self::load)
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(kinnect_env())
            .build()?;

        apply_env_overrides(settings, |name| std::env::var(name).ok())?.try_deserialize()
    }

    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.matching.freshness_window_ms)
    }
}

fn kinnect_env() -> Environment {
    Environment::with_prefix("KINNECT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Plain variables such as `DATABASE_URL` win over anything in the config files
fn apply_env_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);
    for (name, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(name) {
            builder = builder.set_override(key, value)?;
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matching_rules() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.freshness_window_ms, 5_000);
        assert_eq!(matching.candidate_min_readiness, 4);
        assert_eq!(matching.candidate_limit, 20);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let settings: Settings = Config::builder()
            .set_override("server.host", "127.0.0.1").unwrap()
            .set_override("server.port", 8080).unwrap()
            .set_override("database.url", "postgres://localhost/kinnect").unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(settings.cache.enabled);
        assert_eq!(settings.freshness_window(), chrono::Duration::seconds(5));
    }

    #[test]
    fn test_plain_env_vars_override_files() {
        let base = Config::builder()
            .set_override("server.host", "127.0.0.1").unwrap()
            .set_override("server.port", 8080).unwrap()
            .set_override("database.url", "postgres://file/kinnect").unwrap()
            .set_override("logging.format", "json").unwrap()
            .build()
            .unwrap();

        let settings: Settings = apply_env_overrides(base, |name| match name {
            "DATABASE_URL" => Some("postgres://env/kinnect".to_string()),
            "LOG_FORMAT" => Some("pretty".to_string()),
            _ => None,
        })
        .unwrap()
        .try_deserialize()
        .unwrap();

        assert_eq!(settings.database.url, "postgres://env/kinnect");
        assert_eq!(settings.logging.format, "pretty");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("kinnect-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
            [server]
            host = "0.0.0.0"
            port = 9090

            [database]
            url = "postgres://localhost/kinnect"

            [matching]
            candidate_limit = 5
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.matching.candidate_limit, 5);
        assert_eq!(settings.matching.candidate_min_readiness, 4);
    }
}
