//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;
use crate::endpoint::{Endpoint, EndpointError};
use crate::idle::BackoffParams;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Proxy sockets to connect to.
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub idle: IdleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse every configured endpoint.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>, EndpointError> {
        self.endpoints.iter().map(|raw| raw.parse()).collect()
    }
}

/// Settings applied to every proxy connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Nickname sent during registration.
    #[serde(default = "default_nick")]
    pub nick: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nick: default_nick(),
        }
    }
}

/// Idle timeout and backoff tuning. Durations are in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct IdleConfig {
    /// Idle timeout before any backoff.
    #[serde(default = "default_idle_timeout")]
    pub timeout_secs: f64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Ceiling for the backed-off idle timeout.
    #[serde(default = "default_max_timeout")]
    pub max_timeout_secs: f64,
    /// Explicit exponent ceiling; overrides `max_timeout_secs`.
    #[serde(default)]
    pub backoff_max_exp: Option<u32>,
    /// Backoff window width as a fraction of the idle timeout.
    #[serde(default = "default_deadzone")]
    pub deadzone: f64,
    #[serde(default = "default_decay")]
    pub decay_secs: f64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_idle_timeout(),
            backoff_factor: default_backoff_factor(),
            max_timeout_secs: default_max_timeout(),
            backoff_max_exp: None,
            deadzone: default_deadzone(),
            decay_secs: default_decay(),
        }
    }
}

impl IdleConfig {
    /// Backoff parameters for the idle controller.
    ///
    /// Expects a config that passed [`super::validate`].
    pub fn backoff_params(&self) -> BackoffParams {
        let idle_timeout = secs(self.timeout_secs);
        let max_exp = self.backoff_max_exp.unwrap_or_else(|| {
            BackoffParams::max_exp_for(
                idle_timeout,
                self.backoff_factor,
                secs(self.max_timeout_secs),
            )
        });
        BackoffParams {
            idle_timeout,
            factor: self.backoff_factor,
            max_exp,
            deadzone: self.deadzone,
            decay: secs(self.decay_secs),
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}
