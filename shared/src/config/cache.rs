//! Session store configuration module

use serde::{Deserialize, Serialize};

use super::{env_lookup, parse_or, string_or, ConfigError, Lookup};

/// Backing store for verification sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    /// Process-local map, lost on restart
    Memory,
    /// Shared Redis instance
    Redis,
}

impl std::str::FromStr for SessionStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(SessionStoreKind::Memory),
            "redis" => Ok(SessionStoreKind::Redis),
            _ => Err(format!("Unknown session store: {}", s)),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Which store to use
    #[serde(default = "default_store")]
    pub store: SessionStoreKind,

    /// Redis connection URL
    pub url: String,

    /// Prefix for session keys
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connection timeout in seconds
    pub connection_timeout: u64,

    /// Retries for failed connections and commands
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            url: String::from("redis://localhost:6379"),
            key_prefix: default_key_prefix(),
            connection_timeout: 5,
            max_retries: default_max_retries(),
        }
    }
}

impl CacheConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    /// Create from a key lookup
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            store: parse_or(lookup, "SESSION_STORE", defaults.store)?,
            url: string_or(lookup, "REDIS_URL", &defaults.url),
            key_prefix: string_or(lookup, "REDIS_KEY_PREFIX", &defaults.key_prefix),
            connection_timeout: parse_or(
                lookup,
                "REDIS_CONNECTION_TIMEOUT",
                defaults.connection_timeout,
            )?,
            max_retries: parse_or(lookup, "REDIS_MAX_RETRIES", defaults.max_retries)?,
        })
    }

    /// Create a Redis-backed configuration with URL
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            store: SessionStoreKind::Redis,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix for all session keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Generate a cache key with prefix
    pub fn make_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}

fn default_store() -> SessionStoreKind {
    SessionStoreKind::Memory
}

fn default_key_prefix() -> String {
    String::from("otp:session")
}

fn default_max_retries() -> u32 {
    3
}
