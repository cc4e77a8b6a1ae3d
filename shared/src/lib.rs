//! Shared utilities and common types for the PhoneVerify server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - Error response structure and error codes
//! - Phone number normalization and masking
//! - Health check payload

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, DeliveryConfig, Environment, LoggingConfig, OtpConfig,
    RateLimitConfig, ServerConfig, SessionStoreKind,
};
pub use errors::{error_codes, ErrorResponse};
pub use types::{HealthResponse, HealthStatus};
pub use utils::phone;
