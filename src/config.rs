use std::str::FromStr;

use crate::{ApiClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

pub const ENV_BASE_URL: &str = "API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "API_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "API_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "API_RETRY_DELAY_MS";

/// Configures base URL, timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// Absolute URL every endpoint is resolved against.
    pub base_url: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Total number of attempts per call, including the first one.
    pub max_retries: usize,
    /// Fixed delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl ClientConfig {
    /// Creates a config for `base_url` with default timeout and retry settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Loads the config from environment variables.
    ///
    /// Reads:
    /// - `API_BASE_URL`
    /// - `API_TIMEOUT_MS`
    /// - `API_MAX_RETRIES`
    /// - `API_RETRY_DELAY_MS`
    ///
    /// Unset variables keep their defaults. A variable that is set but empty or
    /// unparsable is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let base_url = match lookup(ENV_BASE_URL) {
            Some(url) if url.trim().is_empty() => {
                return Err(ApiClientError::Config(format!(
                    "{ENV_BASE_URL} is set but empty"
                )))
            }
            Some(url) => url.trim().to_owned(),
            None => defaults.base_url,
        };

        Ok(Self {
            base_url,
            timeout_ms: parse_var(&lookup, ENV_TIMEOUT_MS)?.unwrap_or(defaults.timeout_ms),
            max_retries: parse_var(&lookup, ENV_MAX_RETRIES)?.unwrap_or(defaults.max_retries),
            retry_delay_ms: parse_var(&lookup, ENV_RETRY_DELAY_MS)?
                .unwrap_or(defaults.retry_delay_ms),
        })
    }

    /// Number of attempts actually made per call. Never less than one.
    pub fn attempts(&self) -> usize {
        self.max_retries.max(1)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|err| ApiClientError::Config(format!("invalid {key} '{raw}': {err}")))
        })
        .transpose()
}
