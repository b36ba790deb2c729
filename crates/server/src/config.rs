//! Engine configuration loaded from TOML.
//!
//! Every section has defaults, so an empty file is a valid configuration:
//!
//! ```toml
//! strategy = "embedding"          # or "rank"
//! seed_genres = "artist_metadata" # or "catalog_artists"
//! random_seed = 42
//! request_timeout_ms = 60000
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 1000
//! backoff_multiplier = 2.0
//! attempt_timeout_ms = 10000
//!
//! [catalog]
//! backend = "sqlite"
//! url = "sqlite://everynoise.db"
//! max_connections = 5
//!
//! [upstream]
//! market = "US"
//! access_token_env = "SPOTIFY_ACCESS_TOKEN"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use fetcher::RetryPolicy;
use serde::{Deserialize, Serialize};
use similarity::StrategyKind;
use thiserror::Error;
use upstream::SpotifyConfig;

use crate::seeds::SeedGenreSource;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Environment variable {0} holding the API access token is not set")]
    MissingToken(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub strategy: StrategyKind,
    pub seed_genres: SeedGenreSource,
    /// Fixed seed for genre/artist sampling and tie-breaks
    pub random_seed: Option<u64>,
    /// Budget for one whole `recommend` call
    pub request_timeout_ms: Option<u64>,
    pub retry: RetryConfig,
    pub catalog: CatalogConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            attempt_timeout_ms: 10_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_multiplier,
        )
        .with_attempt_timeout(Duration::from_millis(self.attempt_timeout_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CatalogConfig {
    /// In-memory index loaded from a JSON document
    Json { path: PathBuf },
    Sqlite {
        url: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_max_connections() -> u32 {
    5
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig::Json {
            path: PathBuf::from("data/catalog.sample.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub market: String,
    /// Name of the environment variable holding the bearer token
    pub access_token_env: String,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        let defaults = SpotifyConfig::default();
        Self {
            base_url: defaults.base_url,
            market: defaults.market,
            access_token_env: "SPOTIFY_ACCESS_TOKEN".to_string(),
            timeout_ms: defaults.timeout.as_millis() as u64,
            connect_timeout_ms: defaults.connect_timeout.as_millis() as u64,
        }
    }
}

impl UpstreamConfig {
    /// Client settings with the token read from the configured variable
    pub fn spotify_config(&self) -> Result<SpotifyConfig, ConfigError> {
        let access_token = std::env::var(&self.access_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingToken(self.access_token_env.clone()))?;

        Ok(SpotifyConfig {
            base_url: self.base_url.clone(),
            market: self.market.clone(),
            access_token,
            timeout: Duration::from_millis(self.timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        })
    }
}

impl EngineConfig {
    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let retry = &self.retry;
        if retry.initial_delay_ms == 0 {
            return Err(ConfigError::Invalid("retry.initial_delay_ms must be positive".into()));
        }
        if !retry.backoff_multiplier.is_finite() || retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "retry.backoff_multiplier must be at least 1.0, got {}",
                retry.backoff_multiplier
            )));
        }
        if retry.attempt_timeout_ms == 0 {
            return Err(ConfigError::Invalid("retry.attempt_timeout_ms must be positive".into()));
        }
        if let Some(budget) = self.request_timeout() {
            // A deadline shorter than one call's retry series cuts off recoverable calls
            let worst_case = retry.policy().worst_case();
            if budget < worst_case {
                return Err(ConfigError::Invalid(format!(
                    "request_timeout_ms ({:?}) is shorter than the retry worst case of a single call ({:?})",
                    budget, worst_case
                )));
            }
        }

        match &self.catalog {
            CatalogConfig::Json { path } if path.as_os_str().is_empty() => {
                return Err(ConfigError::Invalid("catalog.path is empty".into()));
            }
            CatalogConfig::Sqlite { url, .. } if url.trim().is_empty() => {
                return Err(ConfigError::Invalid("catalog.url is empty".into()));
            }
            CatalogConfig::Sqlite { max_connections: 0, .. } => {
                return Err(ConfigError::Invalid("catalog.max_connections must be positive".into()));
            }
            _ => {}
        }

        if self.upstream.access_token_env.trim().is_empty() {
            return Err(ConfigError::Invalid("upstream.access_token_env is empty".into()));
        }
        Ok(())
    }
}
