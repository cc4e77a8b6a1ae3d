//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Session store selection and Redis configuration
//! - `delivery` - SMS/voice provider selection and credentials
//! - `environment` - Environment detection and logging configuration
//! - `otp` - Verification code policy (length, TTL, cooldown, caps, secret)
//! - `rate_limit` - Per-client throttling of OTP requests
//! - `server` - HTTP server configuration
//!
//! Every sub-configuration can be built from the process environment with
//! `from_env()` or from an arbitrary key lookup with `from_lookup()`, which is
//! what the tests use to avoid touching global process state.

pub mod cache;
pub mod delivery;
pub mod environment;
pub mod otp;
pub mod rate_limit;
pub mod server;

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

// Re-export commonly used types
pub use cache::{CacheConfig, SessionStoreKind};
pub use delivery::{DeliveryConfig, TwilioSettings};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::OtpConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

/// Errors raised while loading configuration at startup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent or empty
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    /// A variable is present but cannot be used
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Key lookup used by the `from_lookup` constructors
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Lookup backed by the process environment
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse `key` if present and non-blank, otherwise fall back to `default`
pub(crate) fn parse_or<T>(lookup: Lookup<'_>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                message: format!("{} ({:?})", e, raw),
            })
        }
        _ => Ok(default),
    }
}

/// Read `key` as a string, falling back to `default` when absent or blank
pub(crate) fn string_or(lookup: Lookup<'_>, key: &str, default: &str) -> String {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Verification code policy
    pub otp: OtpConfig,

    /// Delivery provider configuration
    pub delivery: DeliveryConfig,

    /// Session store configuration
    pub cache: CacheConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let environment = Environment::from_lookup(lookup);
        Ok(Self {
            environment,
            server: ServerConfig::from_lookup(lookup)?,
            otp: OtpConfig::from_lookup(lookup)?,
            delivery: DeliveryConfig::from_lookup(lookup),
            cache: CacheConfig::from_lookup(lookup)?,
            rate_limit: RateLimitConfig::from_lookup(lookup)?,
            logging: LoggingConfig::from_lookup(environment, lookup)?,
        })
    }
}
