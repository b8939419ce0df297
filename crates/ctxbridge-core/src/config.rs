//! Context API configuration.
//!
//! Configuration is resolved once at process entry from environment variables
//! and handed to the client by value. Variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | INSERT_ENDPOINT | `<BASE_API_URL>/insert` | Insert endpoint URL |
//! | SEARCH_ENDPOINT | `<BASE_API_URL>/search` | Search endpoint URL |
//! | BASE_API_URL | (none) | Base URL used to derive missing endpoints |
//! | API_KEY / TOKEN | (none) | Bearer credential (optional) |
//! | API_TIMEOUT | 30000 | Request timeout in milliseconds |
//!
//! # Example
//!
//! ```rust,no_run
//! use ctxbridge_core::ContextConfig;
//!
//! let config = ContextConfig::from_env().expect("invalid configuration");
//! println!("inserting into {}", config.insert_endpoint);
//! ```

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use crate::defaults;

/// One invalid or missing configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Every field that failed validation, in declaration order.
    #[error("Configuration validation failed: {}", format_issues(.0))]
    Validation(Vec<ConfigIssue>),
}

impl ConfigError {
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            Self::Validation(issues) => issues,
        }
    }
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Validated, immutable configuration for the context API client.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    /// Endpoint receiving insert requests.
    pub insert_endpoint: Url,
    /// Endpoint receiving search requests.
    pub search_endpoint: Url,
    /// Bearer credential, if the remote service requires one.
    pub api_key: Option<String>,
    /// Hard per-call timeout in milliseconds. Always > 0.
    pub api_timeout_ms: u64,
}

impl ContextConfig {
    /// Build a configuration from explicit values, validating both endpoints.
    pub fn new(
        insert_endpoint: &str,
        search_endpoint: &str,
        api_key: Option<String>,
        api_timeout_ms: u64,
    ) -> ConfigResult<Self> {
        let mut issues = Vec::new();
        let insert = parse_endpoint("insertEndpoint", Some(insert_endpoint), &mut issues);
        let search = parse_endpoint("searchEndpoint", Some(search_endpoint), &mut issues);
        if api_timeout_ms == 0 {
            issues.push(ConfigIssue::new(
                "apiTimeout",
                "must be a positive number of milliseconds",
            ));
        }

        match (insert, search) {
            (Some(insert_endpoint), Some(search_endpoint)) if issues.is_empty() => Ok(Self {
                insert_endpoint,
                search_endpoint,
                api_key: normalize_key(api_key),
                api_timeout_ms,
            }),
            _ => Err(ConfigError::Validation(issues)),
        }
    }

    /// Load configuration from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// All fields are validated before returning so that a single error
    /// reports every problem at once.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base = read("BASE_API_URL");
        let insert_raw = read("INSERT_ENDPOINT")
            .or_else(|| derive_endpoint(base.as_deref(), defaults::INSERT_PATH));
        let search_raw = read("SEARCH_ENDPOINT")
            .or_else(|| derive_endpoint(base.as_deref(), defaults::SEARCH_PATH));

        let mut issues = Vec::new();
        let insert = parse_endpoint("insertEndpoint", insert_raw.as_deref(), &mut issues);
        let search = parse_endpoint("searchEndpoint", search_raw.as_deref(), &mut issues);

        let api_key = normalize_key(read("API_KEY").or_else(|| read("TOKEN")));
        let api_timeout_ms = parse_timeout(read("API_TIMEOUT").as_deref());

        match (insert, search) {
            (Some(insert_endpoint), Some(search_endpoint)) => {
                debug!(
                    subsystem = "config",
                    insert = %insert_endpoint,
                    search = %search_endpoint,
                    has_api_key = api_key.is_some(),
                    timeout_ms = api_timeout_ms,
                    "Configuration loaded"
                );
                Ok(Self {
                    insert_endpoint,
                    search_endpoint,
                    api_key,
                    api_timeout_ms,
                })
            }
            _ => Err(ConfigError::Validation(issues)),
        }
    }

    /// The per-call timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }
}

fn derive_endpoint(base: Option<&str>, path: &str) -> Option<String> {
    base.map(|b| format!("{}{}", b.trim().trim_end_matches('/'), path))
}

fn parse_endpoint(
    field: &'static str,
    raw: Option<&str>,
    issues: &mut Vec<ConfigIssue>,
) -> Option<Url> {
    let Some(raw) = raw else {
        issues.push(ConfigIssue::new(
            field,
            "is required (set the endpoint variable or BASE_API_URL)",
        ));
        return None;
    };

    match Url::parse(raw.trim()) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        Ok(url) => {
            issues.push(ConfigIssue::new(
                field,
                format!("must use http or https, got: {}", url.scheme()),
            ));
            None
        }
        Err(e) => {
            issues.push(ConfigIssue::new(
                field,
                format!("must be a valid URL ({}): {}", e, raw),
            ));
            None
        }
    }
}

fn parse_timeout(raw: Option<&str>) -> u64 {
    match raw {
        None => defaults::API_TIMEOUT_MS,
        Some(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => ms,
            _ => {
                warn!(
                    subsystem = "config",
                    value = value,
                    default_ms = defaults::API_TIMEOUT_MS,
                    "Invalid API_TIMEOUT, using default"
                );
                defaults::API_TIMEOUT_MS
            }
        },
    }
}

fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}
