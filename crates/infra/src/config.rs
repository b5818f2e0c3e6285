//! Environment-driven configuration.
//!
//! | variable                       | default   |
//! |--------------------------------|-----------|
//! | `RIOT_API_KEY`                 | required  |
//! | `MATCHLENS_MAX_CONCURRENCY`    | 5         |
//! | `MATCHLENS_REQUEST_TIMEOUT_MS` | 10000     |
//! | `MATCHLENS_MATCH_LIMIT`        | 20        |
//! | `MATCHLENS_DATA_DIR`           | in-memory |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::jobs::{MAX_MATCH_LIMIT, MIN_MATCH_LIMIT};
use crate::store::{BlobStore, FsBlobStore, InMemoryBlobStore};
use crate::upstream::{ClientConfig, RetryPolicy};

pub const API_KEY_VAR: &str = "RIOT_API_KEY";
pub const MAX_CONCURRENCY_VAR: &str = "MATCHLENS_MAX_CONCURRENCY";
pub const REQUEST_TIMEOUT_VAR: &str = "MATCHLENS_REQUEST_TIMEOUT_MS";
pub const MATCH_LIMIT_VAR: &str = "MATCHLENS_MATCH_LIMIT";
pub const DATA_DIR_VAR: &str = "MATCHLENS_DATA_DIR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    /// Default per-job match limit, already clamped.
    pub match_limit: u8,
    pub data_dir: Option<PathBuf>,
}

// Keeps the api key out of logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("max_concurrency", &self.max_concurrency)
            .field("request_timeout", &self.request_timeout)
            .field("match_limit", &self.match_limit)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;

        let max_concurrency = parse_or(get(MAX_CONCURRENCY_VAR), MAX_CONCURRENCY_VAR, 5usize)?;
        if max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: MAX_CONCURRENCY_VAR,
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let timeout_ms = parse_or(get(REQUEST_TIMEOUT_VAR), REQUEST_TIMEOUT_VAR, 10_000u64)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: REQUEST_TIMEOUT_VAR,
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let match_limit = parse_or(get(MATCH_LIMIT_VAR), MATCH_LIMIT_VAR, 20u32)?
            .clamp(MIN_MATCH_LIMIT as u32, MAX_MATCH_LIMIT as u32) as u8;

        Ok(Self {
            api_key,
            max_concurrency,
            request_timeout: Duration::from_millis(timeout_ms),
            match_limit,
            data_dir: get(DATA_DIR_VAR).map(PathBuf::from),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_max_concurrency(self.max_concurrency)
            .with_retry(RetryPolicy {
                attempt_timeout: self.request_timeout,
                ..RetryPolicy::default()
            })
    }

    /// Directory-backed store when `data_dir` is set, in-memory otherwise.
    pub fn blob_store(&self) -> Arc<dyn BlobStore> {
        match &self.data_dir {
            Some(dir) => Arc::new(FsBlobStore::new(dir.clone())),
            None => {
                tracing::warn!("{DATA_DIR_VAR} not set, job records will not survive a restart");
                Arc::new(InMemoryBlobStore::new())
            }
        }
    }
}

fn parse_or<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
