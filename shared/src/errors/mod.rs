//! Shared error types and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Standard error response structure used across all API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for client identification
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Same text as `message`, for clients that read `detail`
    pub detail: String,

    /// Machine-readable hints (retry_after_seconds, attempts_remaining, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,

    /// Request correlation id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            error: error.into(),
            detail: message.clone(),
            message,
            details: None,
            request_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Add a detail field to the error response
    pub fn add_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let details = self.details.get_or_insert_with(HashMap::new);
        if let Ok(json_value) = serde_json::to_value(value) {
            details.insert(key.into(), json_value);
        }
        self
    }

    /// Attach the request correlation id
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Error codes returned in `ErrorResponse::error`
pub mod error_codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INVALID_PHONE_NUMBER: &str = "INVALID_PHONE_NUMBER";
    pub const INVALID_CODE_FORMAT: &str = "INVALID_CODE_FORMAT";
    pub const NO_PENDING_VERIFICATION: &str = "NO_PENDING_VERIFICATION";
    pub const VERIFICATION_EXPIRED: &str = "VERIFICATION_EXPIRED";
    pub const ATTEMPTS_EXCEEDED: &str = "ATTEMPTS_EXCEEDED";
    pub const RESEND_TOO_SOON: &str = "RESEND_TOO_SOON";
    pub const RESEND_LIMIT_EXCEEDED: &str = "RESEND_LIMIT_EXCEEDED";
    pub const SEND_LIMIT_EXCEEDED: &str = "SEND_LIMIT_EXCEEDED";
    pub const IP_RATE_LIMITED: &str = "IP_RATE_LIMITED";
}
