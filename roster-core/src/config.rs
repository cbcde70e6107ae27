//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CACHE_TTL_SECS, ENV_CACHE_TTL_SECS, MAX_CACHE_TTL_SECS};
use crate::error::{RegistryError, Result};

/// Configuration for a caching registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum snapshot age in seconds before a refresh is required
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given TTL.
    ///
    /// The TTL is stored in whole seconds; a fractional part rounds up, so
    /// snapshots never expire sooner than requested.
    pub fn with_ttl(ttl: Duration) -> Self {
        let round_up = u64::from(ttl.subsec_nanos() > 0);
        Self {
            ttl_seconds: ttl.as_secs().saturating_add(round_up),
        }
    }

    /// Loads configuration from the environment (and `.env`, if present).
    ///
    /// Reads `ROSTER_CACHE_TTL_SECS`; unset means the default TTL.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config = match std::env::var(ENV_CACHE_TTL_SECS) {
            Ok(raw) => Self::from_ttl_str(&raw)?,
            Err(_) => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn from_ttl_str(raw: &str) -> Result<Self> {
        let ttl_seconds = raw.trim().parse::<u64>().map_err(|e| {
            RegistryError::ConfigError(format!("{ENV_CACHE_TTL_SECS}={raw:?}: {e}"))
        })?;
        Ok(Self { ttl_seconds })
    }

    /// Returns the TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_seconds > MAX_CACHE_TTL_SECS {
            return Err(RegistryError::ConfigError(format!(
                "ttl_seconds {} exceeds maximum {}",
                self.ttl_seconds, MAX_CACHE_TTL_SECS
            )));
        }
        Ok(())
    }
}
