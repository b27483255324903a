use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::backoff::Backoff;
use crate::error::ConfigError;
use crate::retry::{ErrorCode, RetryPolicyBuilder, DEFAULT_MAX_ATTEMPTS};
use crate::throttle::TokenBucket;

/// Backoff section, e.g. `backoff = { kind = "exponential", initial_ms = 10, maximum_ms = 1000, multiplier = 2.0 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffConfig {
    None,
    Linear {
        delays_ms: Vec<u64>,
    },
    Exponential {
        initial_ms: u64,
        maximum_ms: u64,
        multiplier: f64,
    },
}

impl BackoffConfig {
    pub fn to_backoff(&self) -> Result<Backoff, ConfigError> {
        match self {
            BackoffConfig::None => Ok(Backoff::none()),
            BackoffConfig::Linear { delays_ms } => {
                Backoff::linear(delays_ms.iter().copied().map(Duration::from_millis))
            }
            BackoffConfig::Exponential {
                initial_ms,
                maximum_ms,
                multiplier,
            } => Backoff::exponential(
                Duration::from_millis(*initial_ms),
                Duration::from_millis(*maximum_ms),
                *multiplier,
            ),
        }
    }
}

/// Token bucket parameters. Absent section = unthrottled retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    pub max_tokens: f64,
    /// Tokens regained per successful attempt.
    pub token_ratio: f64,
    /// Admission threshold; defaults to half of `max_tokens`.
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl ThrottleConfig {
    pub fn build(&self) -> Result<TokenBucket, ConfigError> {
        let bucket = TokenBucket::new(self.max_tokens, self.token_ratio)?;
        match self.threshold {
            Some(t) => bucket.with_threshold(t),
            None => Ok(bucket),
        }
    }
}

/// Retry policy parameters for one service (or the default policy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per call including the first; clamped to the hard cap at build time.
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: Option<BackoffConfig>,
    #[serde(default)]
    pub throttle: Option<ThrottleConfig>,
    /// Error codes worth retrying.
    #[serde(default)]
    pub retryable_codes: Vec<i32>,
    /// Per-attempt deadline in milliseconds (None = only the call deadline applies).
    #[serde(default)]
    pub attempt_timeout_ms: Option<u64>,
    #[serde(default)]
    pub skip_visited_nodes: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Some(BackoffConfig::Exponential {
                initial_ms: 10,
                maximum_ms: 1000,
                multiplier: 2.0,
            }),
            throttle: Some(ThrottleConfig {
                max_tokens: 10.0,
                token_ratio: 0.1,
                threshold: None,
            }),
            retryable_codes: vec![14],
            attempt_timeout_ms: None,
            skip_visited_nodes: false,
        }
    }
}

impl RetryConfig {
    /// Builder pre-loaded with these settings. A throttle section yields a new
    /// bucket: build the policy once and clone it so calls share that bucket.
    pub fn to_builder<R, E: ErrorCode>(&self) -> Result<RetryPolicyBuilder<R, E>, ConfigError> {
        let mut builder = RetryPolicyBuilder::new()
            .max_attempts(self.max_attempts)
            .retryable_codes(self.retryable_codes.iter().copied())
            .skip_visited_nodes(self.skip_visited_nodes);
        if let Some(backoff) = &self.backoff {
            builder = builder.backoff(backoff.to_backoff()?);
        }
        if let Some(throttle) = &self.throttle {
            builder = builder.throttle(Arc::new(throttle.build()?));
        }
        if let Some(ms) = self.attempt_timeout_ms {
            builder = builder.attempt_timeout(Duration::from_millis(ms));
        }
        Ok(builder)
    }
}

/// Global configuration loaded from `~/.config/rpcretry/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Policy used for services without their own section.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Per-service overrides, keyed by service name.
    #[serde(default)]
    pub services: BTreeMap<String, RetryConfig>,
}

impl Config {
    pub fn for_service(&self, service: &str) -> &RetryConfig {
        self.services.get(service).unwrap_or(&self.retry)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rpcretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = Config::default();
        save_to_path(&default_cfg, &path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_to_path(cfg: &Config, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml).with_context(|| format!("writing config {}", path.display()))?;
    Ok(())
}
