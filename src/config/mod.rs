//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turns the retry sections into [`RetryPolicy`] values.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! let policy = config.default_policy().unwrap();
//! println!("Default policy makes {} attempts", policy.max_attempts());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackoffKind, ClientConfig, Config, DomainRetryEntry, ExceededBehaviorKind, RetryConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

use crate::retry::{Backoff, DomainConfig, ExceededBehavior, RetryPolicy};
use crate::ConfigError;
use std::time::Duration;

impl Config {
    /// The policy used for domains without their own entry
    pub fn default_policy(&self) -> Result<RetryPolicy, ConfigError> {
        self.retry.to_policy()
    }

    /// One [`DomainConfig`] per `[[domain]]` entry, inheriting unset fields
    pub fn domain_configs(&self) -> Result<Vec<DomainConfig>, ConfigError> {
        self.domains
            .iter()
            .map(|entry| {
                let host = validation::normalize_domain(&entry.domain)?;
                let policy = entry.resolve(&self.retry).to_policy()?;
                Ok(DomainConfig::new(host, policy))
            })
            .collect()
    }
}

impl RetryConfig {
    /// Builds an immutable retry policy from this section
    pub fn to_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let base = Duration::from_millis(self.retry_delay_ms);
        let max = Duration::from_millis(self.max_delay_ms);
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::Fixed(base),
            BackoffKind::Exponential => Backoff::Exponential { base, max },
            BackoffKind::Jittered => Backoff::Jittered { base, max },
        };
        let exceeded = match self.exceeded_behavior {
            ExceededBehaviorKind::Fail => ExceededBehavior::FailWithError,
            ExceededBehaviorKind::ReturnLastResponse => ExceededBehavior::ReturnLastResponse,
        };

        Ok(RetryPolicy::new(self.max_attempts, backoff)?
            .with_exceeded_behavior(exceeded)
            .with_deadline(self.deadline_secs.map(Duration::from_secs)))
    }
}
