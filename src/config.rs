//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `HOUSING_DATA_SOURCE` - `mock` (bundled catalog, default) or `remote`
//! - `HOUSING_API_URL` - Base URL of the record API (required for `remote`)
//! - `HOUSING_HTTP_TIMEOUT_SECS` - Request timeout for the record API (default: 30)
//! - `HOUSING_LOG` - Default tracing filter when `RUST_LOG` is unset (default: info)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where listings, favorites and saved searches live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Mock,
    Remote { base_url: Url },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_source: DataSource,
    pub http_timeout: Duration,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::Mock,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_source = match get("HOUSING_DATA_SOURCE").as_deref() {
            None | Some("mock") => DataSource::Mock,
            Some("remote") => {
                let raw = get("HOUSING_API_URL")
                    .ok_or_else(|| ConfigError::MissingEnvVar("HOUSING_API_URL".to_string()))?;
                let base_url = Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("HOUSING_API_URL".to_string(), e.to_string())
                })?;
                if !matches!(base_url.scheme(), "http" | "https") {
                    return Err(ConfigError::InvalidEnvVar(
                        "HOUSING_API_URL".to_string(),
                        format!("unsupported scheme '{}'", base_url.scheme()),
                    ));
                }
                DataSource::Remote { base_url }
            }
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "HOUSING_DATA_SOURCE".to_string(),
                    format!("expected 'mock' or 'remote', got '{}'", other),
                ))
            }
        };

        let http_timeout = match get("HOUSING_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidEnvVar(
                        "HOUSING_HTTP_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a whole number of seconds", raw),
                    )
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            data_source,
            http_timeout,
            log_filter: get("HOUSING_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}
