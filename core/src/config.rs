//! Ambient configuration for the cache layer.
//!
//! Only one knob matters here: the freshness window `freq`. This module
//! gives it a home with the validation and environment-override
//! conventions the rest of this lineage uses for configuration.

use crate::error::CacheError;
use std::time::Duration;

/// Configuration for a [`CacheRepo`](crate) instance.
///
/// ALL values are required — no silent defaults baked into the cache
/// logic itself, only into this struct's [`Default`] impl.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// The minimum interval between authoritative refills for a given
    /// (object, access pattern).
    pub freshness_window: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    pub fn new(freshness_window: Duration) -> Self {
        Self { freshness_window }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - `freshness_window` is positive (a zero window makes every
    ///   bookkeeping tag due-for-refresh the instant it's written, which is
    ///   a legal but almost certainly unintended configuration worth
    ///   flagging).
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.freshness_window.is_zero() {
            return Err(CacheError::Config(
                "freshness_window must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build from environment variables with fallback to [`Default`].
    ///
    /// Environment variables:
    /// - `ASSETGRAPH_CACHE_FRESHNESS_WINDOW_SECS`: freshness window in
    ///   whole seconds (default: 60).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            freshness_window: std::env::var("ASSETGRAPH_CACHE_FRESHNESS_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.freshness_window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = CacheConfig::new(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
