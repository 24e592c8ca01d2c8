//! Client configuration.

use std::env;

use serde::Deserialize;

pub const DEFAULT_IO_WORKERS: usize = 16;

/// Environment variable read by [`ClientConfig::from_env`].
pub const IO_WORKERS_VAR: &str = "ANYDOC_IO_WORKERS";

/// Settings of a [`Client`](crate::client::Client).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum number of store calls running at the same time.
    pub io_workers: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            io_workers: DEFAULT_IO_WORKERS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ClientConfig::default();

        if let Some(raw) = lookup(IO_WORKERS_VAR) {
            config.io_workers = raw
                .trim()
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .ok_or(ConfigError::InvalidIoWorkers(raw))?;
        }

        Ok(config)
    }

    pub fn with_io_workers(mut self, io_workers: usize) -> Self {
        self.io_workers = io_workers;
        self
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ANYDOC_IO_WORKERS must be a positive integer, got {0:?}")]
    InvalidIoWorkers(String),
}
