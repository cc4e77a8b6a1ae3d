//! Verification protocol and delivery error types
//!
//! `OtpError` is the taxonomy callers branch on; every variant carries the
//! retry hint a client needs. `DeliveryError` describes why a provider call
//! failed and is surfaced as a warning rather than failing the operation.

use thiserror::Error;

/// Failures of the verification protocol itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid phone number: {phone}")]
    InvalidPhoneNumber { phone: String },

    #[error("No pending verification for this phone number")]
    NoPendingVerification,

    #[error("Verification code expired")]
    Expired,

    #[error("Maximum verification attempts exceeded ({max_attempts})")]
    AttemptsExceeded { max_attempts: u32 },

    #[error("Please wait {retry_after_seconds} seconds before requesting a new code")]
    ResendTooSoon { retry_after_seconds: u64 },

    #[error("Maximum number of resends reached ({max_resends})")]
    ResendLimitExceeded { max_resends: u32 },

    #[error("Too many codes requested for this phone number, retry in {retry_after_seconds} seconds")]
    SendLimitExceeded { retry_after_seconds: u64 },

    #[error("Verification code must be {expected_length} digits")]
    InvalidCodeFormat { expected_length: usize },
}

impl OtpError {
    /// Seconds the caller should wait before retrying, if the error is time-bound
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            OtpError::ResendTooSoon { retry_after_seconds }
            | OtpError::SendLimitExceeded { retry_after_seconds } => Some(*retry_after_seconds),
            _ => None,
        }
    }
}

/// Why an outbound SMS or voice call could not be delivered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Destination rejected by provider: {message}")]
    InvalidDestination { message: String },

    #[error("Delivery provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    #[error("Delivery provider rate limit hit: {message}")]
    RateLimitedByProvider { message: String },
}

impl DeliveryError {
    /// Stable machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::InvalidDestination { .. } => "invalid_destination",
            DeliveryError::ProviderUnavailable { .. } => "provider_unavailable",
            DeliveryError::RateLimitedByProvider { .. } => "rate_limited_by_provider",
        }
    }
}
