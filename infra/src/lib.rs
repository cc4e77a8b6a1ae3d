//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the PhoneVerify backend.
//! It provides concrete implementations of the collaborator traits declared in
//! `pv_core`.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Cache**: Redis client and a Redis-backed `SessionStore` with
//!   compare-and-swap updates
//! - **Delivery**: `ChannelDispatcher` implementations (console mock, Twilio
//!   REST for SMS and voice) and a factory selecting one from configuration

// Re-export core types for convenience
pub use pv_core::errors::*;

/// Cache module - Redis client and session store
pub mod cache;

/// Delivery module - SMS/voice providers
pub mod delivery;

use pv_core::errors::DomainError;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SMS/voice provider error
    #[error("SMS service error: {0}")]
    Sms(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::Internal {
            message: err.to_string(),
        }
    }
}
