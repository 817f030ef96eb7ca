//! Configuration loading for the provisioner.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `PROVISIONER_`, producing a typed [`AppConfig`]. Missing platform
//! credentials are not a configuration error: the service starts in a
//! degraded state and every invocation reports `sdk_unavailable` until
//! credentials are supplied.

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Application configuration derived from `PROVISIONER_*` environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub profile: String,
    pub api_bind_addr: String,
    pub log_level: String,
    pub log_format: String,
    /// Base URL of the remote BI platform's admin API. Empty means no
    /// client can be constructed.
    pub platform_base_url: String,
    pub platform_client_id: String,
    pub platform_client_secret: String,
    /// Disable only against self-signed staging instances.
    pub platform_verify_tls: bool,
    pub default_template_folder_id: Option<i64>,
    pub default_template_dashboard_ids: Vec<i64>,
    pub retry: RetryConfig,
}

/// Bounded-retry parameters applied uniformly to every idempotent
/// resource operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Total attempt budget, including the first try.
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    /// Starting backoff in seconds; doubles per completed attempt.
    #[serde(default = "default_retry_base_seconds")]
    pub base_seconds: u64,
    /// Upper bound for the computed backoff.
    #[serde(default = "default_retry_max_seconds")]
    pub max_seconds: u64,
    /// Multiplicative jitter factor (0.0..=1.0); zero keeps backoff
    /// deterministic.
    #[serde(default = "default_retry_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            base_seconds: default_retry_base_seconds(),
            max_seconds: default_retry_max_seconds(),
            jitter_factor: default_retry_jitter_factor(),
        }
    }
}

impl AppConfig {
    /// Parse the configured bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// True when enough platform configuration is present to construct a
    /// remote client.
    pub fn platform_configured(&self) -> bool {
        !self.platform_base_url.is_empty()
            && !self.platform_client_id.is_empty()
            && !self.platform_client_secret.is_empty()
    }

    /// Serialize the configuration with the client secret masked, for
    /// startup logging.
    pub fn redacted_json(&self) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut()
            && obj.contains_key("platform_client_secret")
            && !self.platform_client_secret.is_empty()
        {
            obj.insert(
                "platform_client_secret".to_string(),
                serde_json::Value::String("***".to_string()),
            );
        }
        serde_json::to_string(&value)
    }
}

impl Default for AppConfig {
    /// Defaults with no platform credentials; the remote client stays
    /// disabled until they are supplied.
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            platform_base_url: String::new(),
            platform_client_id: String::new(),
            platform_client_secret: String::new(),
            platform_verify_tls: true,
            default_template_folder_id: None,
            default_template_dashboard_ids: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_profile() -> String {
    "dev".to_string()
}

fn default_api_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_seconds() -> u64 {
    2
}

fn default_retry_max_seconds() -> u64 {
    10
}

fn default_retry_jitter_factor() -> f64 {
    0.0
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid platform base url '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("retry max attempts must be at least 1")]
    InvalidRetryAttempts,
    #[error("retry base seconds ({base}) cannot be greater than max seconds ({max})")]
    InvalidRetryBounds { base: u64, max: u64 },
    #[error("retry jitter factor must be between 0.0 and 1.0, got {value}")]
    InvalidRetryJitter { value: f64 },
}

/// Loads configuration using layered `.env` files and `PROVISIONER_*`
/// env vars. Later layers win: `.env` < `.env.{profile}` <
/// `.env.{profile}.local` < process environment.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut layered = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("PROVISIONER_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        let take = |layered: &mut BTreeMap<String, String>, key: &str| {
            layered.remove(key).filter(|v| !v.trim().is_empty())
        };

        let profile = take(&mut layered, "PROFILE").unwrap_or_else(default_profile);
        let api_bind_addr =
            take(&mut layered, "API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = take(&mut layered, "LOG_FORMAT").unwrap_or_else(default_log_format);
        let platform_base_url = take(&mut layered, "PLATFORM_BASE_URL").unwrap_or_default();
        let platform_client_id = take(&mut layered, "PLATFORM_CLIENT_ID").unwrap_or_default();
        let platform_client_secret =
            take(&mut layered, "PLATFORM_CLIENT_SECRET").unwrap_or_default();
        let platform_verify_tls = take(&mut layered, "PLATFORM_VERIFY_TLS")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);
        let default_template_folder_id = take(&mut layered, "DEFAULT_TEMPLATE_FOLDER_ID")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|id| *id > 0);
        // Comma-separated list; entries that fail to parse are skipped.
        let default_template_dashboard_ids = take(&mut layered, "DEFAULT_TEMPLATE_DASHBOARD_IDS")
            .map(|raw| {
                raw.split(',')
                    .filter_map(|item| item.trim().parse::<i64>().ok())
                    .filter(|id| *id > 0)
                    .collect()
            })
            .unwrap_or_default();

        let retry = RetryConfig {
            max_attempts: take(&mut layered, "RETRY_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_retry_max_attempts),
            base_seconds: take(&mut layered, "RETRY_BASE_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_retry_base_seconds),
            max_seconds: take(&mut layered, "RETRY_MAX_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_retry_max_seconds),
            jitter_factor: take(&mut layered, "RETRY_JITTER_FACTOR")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_retry_jitter_factor),
        };

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            platform_base_url,
            platform_client_id,
            platform_client_secret,
            platform_verify_tls,
            default_template_folder_id,
            default_template_dashboard_ids,
            retry,
        };

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        config
            .bind_addr()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            })?;

        if !config.platform_base_url.is_empty() {
            url::Url::parse(&config.platform_base_url).map_err(|source| {
                ConfigError::InvalidBaseUrl {
                    value: config.platform_base_url.clone(),
                    source,
                }
            })?;
        }

        if config.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetryAttempts);
        }
        if config.retry.base_seconds > config.retry.max_seconds {
            return Err(ConfigError::InvalidRetryBounds {
                base: config.retry.base_seconds,
                max: config.retry.max_seconds,
            });
        }
        if !(0.0..=1.0).contains(&config.retry.jitter_factor) {
            return Err(ConfigError::InvalidRetryJitter {
                value: config.retry.jitter_factor,
            });
        }

        Ok(())
    }

    /// Read `.env`, `.env.{profile}`, `.env.{profile}.local` in order,
    /// keeping only `PROVISIONER_*` keys. A missing file is fine; an
    /// unreadable one is an error.
    fn collect_layered_env(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let mut layered = BTreeMap::new();

        let base = self.base_dir.join(".env");
        self.merge_env_file(&mut layered, &base)?;

        let profile = layered
            .get("PROFILE")
            .cloned()
            .or_else(|| env::var("PROVISIONER_PROFILE").ok())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_profile);

        for name in [
            format!(".env.{profile}"),
            format!(".env.{profile}.local"),
        ] {
            let path = self.base_dir.join(name);
            self.merge_env_file(&mut layered, &path)?;
        }

        Ok(layered)
    }

    fn merge_env_file(
        &self,
        layered: &mut BTreeMap<String, String>,
        path: &PathBuf,
    ) -> Result<(), ConfigError> {
        if !path.exists() {
            return Ok(());
        }
        let iter = dotenvy::from_path_iter(path).map_err(|source| ConfigError::EnvFile {
            path: path.clone(),
            source,
        })?;
        for item in iter {
            let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                path: path.clone(),
                source,
            })?;
            if let Some(stripped) = key.strip_prefix("PROVISIONER_") {
                layered.insert(stripped.to_string(), value);
            }
        }
        Ok(())
    }
}
