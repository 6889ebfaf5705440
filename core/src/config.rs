//! Client configuration: where to connect and how long to wait.
//!
//! # Sources
//! - TOML file (`ClientConfig::load`)
//! - environment (`ClientConfig::from_env`)
//! - built-in per-platform profiles (`ClientConfig::for_platform`)
//!
//! Every source goes through `validate` before a client is built from it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::endpoints::EndpointSet;
use crate::error::ConfigError;

pub const ENV_URL: &str = "CIVIC_API_URL";
pub const ENV_FALLBACKS: &str = "CIVIC_API_FALLBACKS";
pub const ENV_TIMEOUT_MS: &str = "CIVIC_API_TIMEOUT_MS";

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const LAN_URL: &str = "http://192.168.1.27:8000/api/v1";
const EMULATOR_URL: &str = "http://10.0.2.2:8000/api/v1";
const LOCALHOST_URL: &str = "http://localhost:8000/api/v1";
const PRODUCTION_URL: &str = "https://your-production-api.com/api/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub primary_url: String,
    #[serde(default)]
    pub fallback_urls: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Where the app runs; decides which loopback aliases are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Web,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Release,
}

impl ClientConfig {
    pub fn new(primary_url: impl Into<String>) -> Self {
        Self {
            primary_url: primary_url.into(),
            fallback_urls: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_fallbacks<I, S>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_urls = fallbacks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Built-in endpoints for a platform.
    ///
    /// A physical Android device usually reaches the dev machine over Wi-Fi,
    /// the emulator through `10.0.2.2`, and `adb reverse` through localhost,
    /// so Android development carries all three.
    pub fn for_platform(platform: Platform, mode: BuildMode) -> Self {
        match (mode, platform) {
            (BuildMode::Release, _) => Self::new(PRODUCTION_URL),
            (BuildMode::Development, Platform::Android) => {
                Self::new(LAN_URL).with_fallbacks([LAN_URL, EMULATOR_URL, LOCALHOST_URL])
            }
            (BuildMode::Development, Platform::Ios | Platform::Web) => Self::new(LOCALHOST_URL),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Read `CIVIC_API_URL`, `CIVIC_API_FALLBACKS` (comma separated) and
    /// `CIVIC_API_TIMEOUT_MS`. Returns `Ok(None)` when no URL is set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(primary) = lookup(ENV_URL) else {
            return Ok(None);
        };
        let mut config = Self::new(primary);
        if let Some(fallbacks) = lookup(ENV_FALLBACKS) {
            config.fallback_urls = fallbacks
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_TIMEOUT_MS} is not a number: {timeout:?}")))?;
        }
        config.validate()?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_url.trim().is_empty() {
            return Err(ConfigError::Invalid("primary_url is empty".to_string()));
        }
        for url in std::iter::once(&self.primary_url).chain(&self.fallback_urls) {
            let parsed = Url::parse(url.trim())
                .map_err(|e| ConfigError::Invalid(format!("{url:?} is not a valid URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!("{url:?} must use http or https")));
            }
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn endpoint_set(&self) -> EndpointSet {
        EndpointSet::new(&self.primary_url, &self.fallback_urls)
    }
}
