//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `LEXBRIDGE_*` environment
//! variables. Provider API keys are optional here; constructing a live
//! provider without the matching key is the hard failure, not config loading.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BOOTSTRAP_SAMPLES, DEFAULT_EMBEDDING_CACHE_CAPACITY, DEFAULT_EMBEDDING_CACHE_TTL_SECS,
    DEFAULT_EMBEDDING_DIM, DEFAULT_NOISE_FLOOR_CAPACITY, DEFAULT_NOISE_FLOOR_TTL_SECS,
    DEFAULT_PRECOMPUTE_CAPACITY, DEFAULT_PRECOMPUTE_TTL_SECS, DEFAULT_PRECOMPUTE_WAIT_SECS,
    DEFAULT_VOCABULARY_MAX_WORDS, DEFAULT_VOCABULARY_PAGE_SIZE,
};

/// Default embedding model requested from the embedding provider.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Core configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `LEXBRIDGE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the embedding provider. Optional until a live provider is built.
    pub openai_api_key: Option<String>,

    /// API key for the generative provider. Optional until a live provider is built.
    pub anthropic_api_key: Option<String>,

    /// Embedding model name. Default: `text-embedding-3-small`.
    pub embedding_model: String,

    /// Expected embedding dimension. Default: `1536`.
    pub embedding_dim: usize,

    /// Max entries in the embedding cache. Default: `10_000`.
    pub embedding_cache_capacity: usize,

    /// TTL for embedding cache entries. Default: 1 hour.
    pub embedding_cache_ttl: Duration,

    /// Max cached noise floors. Default: `1_000`.
    pub noise_floor_capacity: u64,

    /// TTL for noise-floor cache entries. Default: 1 hour.
    pub noise_floor_ttl: Duration,

    /// Cap on words loaded into the vocabulary pool. Default: `50_000`.
    pub vocabulary_max_words: usize,

    /// Page size for vocabulary store pagination. Default: `10_000`.
    pub vocabulary_page_size: usize,

    /// Bootstrap samples per pre-built null distribution. Default: `200`.
    pub bootstrap_samples: usize,

    /// Retention TTL for precompute tasks. Default: 30 minutes.
    pub precompute_ttl: Duration,

    /// Hard cap on retained precompute tasks. Default: `1_000`.
    pub precompute_capacity: usize,

    /// Default bounded wait for precomputed results. Default: 5 seconds.
    pub precompute_wait: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            embedding_cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
            embedding_cache_ttl: Duration::from_secs(DEFAULT_EMBEDDING_CACHE_TTL_SECS),
            noise_floor_capacity: DEFAULT_NOISE_FLOOR_CAPACITY,
            noise_floor_ttl: Duration::from_secs(DEFAULT_NOISE_FLOOR_TTL_SECS),
            vocabulary_max_words: DEFAULT_VOCABULARY_MAX_WORDS,
            vocabulary_page_size: DEFAULT_VOCABULARY_PAGE_SIZE,
            bootstrap_samples: DEFAULT_BOOTSTRAP_SAMPLES,
            precompute_ttl: Duration::from_secs(DEFAULT_PRECOMPUTE_TTL_SECS),
            precompute_capacity: DEFAULT_PRECOMPUTE_CAPACITY,
            precompute_wait: Duration::from_secs(DEFAULT_PRECOMPUTE_WAIT_SECS),
        }
    }
}

impl Config {
    const ENV_OPENAI_API_KEY: &'static str = "LEXBRIDGE_OPENAI_API_KEY";
    const ENV_ANTHROPIC_API_KEY: &'static str = "LEXBRIDGE_ANTHROPIC_API_KEY";
    const ENV_EMBEDDING_MODEL: &'static str = "LEXBRIDGE_EMBEDDING_MODEL";
    const ENV_EMBEDDING_DIM: &'static str = "LEXBRIDGE_EMBEDDING_DIM";
    const ENV_EMBEDDING_CACHE_CAPACITY: &'static str = "LEXBRIDGE_EMBEDDING_CACHE_CAPACITY";
    const ENV_EMBEDDING_CACHE_TTL_SECS: &'static str = "LEXBRIDGE_EMBEDDING_CACHE_TTL_SECS";
    const ENV_NOISE_FLOOR_CAPACITY: &'static str = "LEXBRIDGE_NOISE_FLOOR_CAPACITY";
    const ENV_NOISE_FLOOR_TTL_SECS: &'static str = "LEXBRIDGE_NOISE_FLOOR_TTL_SECS";
    const ENV_VOCABULARY_MAX_WORDS: &'static str = "LEXBRIDGE_VOCABULARY_MAX_WORDS";
    const ENV_VOCABULARY_PAGE_SIZE: &'static str = "LEXBRIDGE_VOCABULARY_PAGE_SIZE";
    const ENV_BOOTSTRAP_SAMPLES: &'static str = "LEXBRIDGE_BOOTSTRAP_SAMPLES";
    const ENV_PRECOMPUTE_TTL_SECS: &'static str = "LEXBRIDGE_PRECOMPUTE_TTL_SECS";
    const ENV_PRECOMPUTE_CAPACITY: &'static str = "LEXBRIDGE_PRECOMPUTE_CAPACITY";
    const ENV_PRECOMPUTE_WAIT_SECS: &'static str = "LEXBRIDGE_PRECOMPUTE_WAIT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            openai_api_key: Self::optional_string(Self::ENV_OPENAI_API_KEY),
            anthropic_api_key: Self::optional_string(Self::ENV_ANTHROPIC_API_KEY),
            embedding_model: Self::string_or(Self::ENV_EMBEDDING_MODEL, defaults.embedding_model),
            embedding_dim: Self::usize_or(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?,
            embedding_cache_capacity: Self::usize_or(
                Self::ENV_EMBEDDING_CACHE_CAPACITY,
                defaults.embedding_cache_capacity,
            )?,
            embedding_cache_ttl: Self::secs_or(
                Self::ENV_EMBEDDING_CACHE_TTL_SECS,
                defaults.embedding_cache_ttl,
            )?,
            noise_floor_capacity: Self::u64_or(
                Self::ENV_NOISE_FLOOR_CAPACITY,
                defaults.noise_floor_capacity,
            )?,
            noise_floor_ttl: Self::secs_or(
                Self::ENV_NOISE_FLOOR_TTL_SECS,
                defaults.noise_floor_ttl,
            )?,
            vocabulary_max_words: Self::usize_or(
                Self::ENV_VOCABULARY_MAX_WORDS,
                defaults.vocabulary_max_words,
            )?,
            vocabulary_page_size: Self::usize_or(
                Self::ENV_VOCABULARY_PAGE_SIZE,
                defaults.vocabulary_page_size,
            )?,
            bootstrap_samples: Self::usize_or(
                Self::ENV_BOOTSTRAP_SAMPLES,
                defaults.bootstrap_samples,
            )?,
            precompute_ttl: Self::secs_or(Self::ENV_PRECOMPUTE_TTL_SECS, defaults.precompute_ttl)?,
            precompute_capacity: Self::usize_or(
                Self::ENV_PRECOMPUTE_CAPACITY,
                defaults.precompute_capacity,
            )?,
            precompute_wait: Self::secs_or(
                Self::ENV_PRECOMPUTE_WAIT_SECS,
                defaults.precompute_wait,
            )?,
        })
    }

    /// Validates basic invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dim == 0 {
            return Err(ConfigError::ZeroValue {
                var: Self::ENV_EMBEDDING_DIM,
            });
        }
        if self.embedding_cache_capacity == 0 {
            return Err(ConfigError::ZeroValue {
                var: Self::ENV_EMBEDDING_CACHE_CAPACITY,
            });
        }
        if self.vocabulary_page_size == 0 {
            return Err(ConfigError::ZeroValue {
                var: Self::ENV_VOCABULARY_PAGE_SIZE,
            });
        }
        if self.precompute_capacity == 0 {
            return Err(ConfigError::ZeroValue {
                var: Self::ENV_PRECOMPUTE_CAPACITY,
            });
        }
        Ok(())
    }

    fn optional_string(var: &'static str) -> Option<String> {
        env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string_or(var: &'static str, default: String) -> String {
        env::var(var).unwrap_or(default)
    }

    fn usize_or(var: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(var) {
            Ok(value) => value.parse().map_err(|e| ConfigError::IntParseError {
                var,
                value,
                source: e,
            }),
            Err(_) => Ok(default),
        }
    }

    fn u64_or(var: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var) {
            Ok(value) => value.parse().map_err(|e| ConfigError::IntParseError {
                var,
                value,
                source: e,
            }),
            Err(_) => Ok(default),
        }
    }

    fn secs_or(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        match env::var(var) {
            Ok(value) => value
                .parse()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::IntParseError {
                    var,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }
}
