//! Request and response bodies for the OTP endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use pv_core::domain::entities::SessionState;
use pv_core::domain::value_objects::DeliveryChannel;
use pv_core::errors::DeliveryError;
use pv_core::services::{SendCodeResult, VerificationStatus};

/// Body of `POST /api/auth/send-otp` and `POST /api/auth/resend-otp`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    /// Phone number in any common format; normalized to E.164 by the service
    #[validate(length(min = 1, max = 32, message = "phone_number is required"))]
    pub phone_number: String,

    /// "sms" or "voice"; the configured default when absent on send, the
    /// session's last channel when absent on resend
    #[validate(custom = "validate_method")]
    #[serde(default)]
    pub method: Option<String>,
}

impl SendOtpRequest {
    /// Parsed channel, if one was named
    pub fn channel(&self) -> Option<DeliveryChannel> {
        self.method.as_deref().and_then(|m| m.parse().ok())
    }
}

/// Resend takes the same body as send
pub type ResendOtpRequest = SendOtpRequest;

/// Body of `POST /api/auth/verify-otp`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, max = 32, message = "phone_number is required"))]
    pub phone_number: String,

    /// Exact digit count is checked by the service
    #[validate(length(min = 1, max = 16, message = "code is required"))]
    pub code: String,
}

/// Query of `GET /api/auth/verification-status`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StatusQuery {
    #[validate(length(min = 1, max = 32, message = "phone_number is required"))]
    pub phone_number: String,
}

fn validate_method(method: &str) -> Result<(), ValidationError> {
    method
        .parse::<DeliveryChannel>()
        .map(|_| ())
        .map_err(|_| {
            let mut error = ValidationError::new("method");
            error.message = Some("method must be \"sms\" or \"voice\"".into());
            error
        })
}

/// Delivery problem reported alongside a successful send
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryWarning {
    pub kind: String,
    pub message: String,
}

impl From<&DeliveryError> for DeliveryWarning {
    fn from(error: &DeliveryError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Response of send-otp and resend-otp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
    pub expires_at: DateTime<Utc>,
    /// Seconds until resend is allowed
    pub resend_available_in: u64,
    pub method: DeliveryChannel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_warning: Option<DeliveryWarning>,
}

impl From<SendCodeResult> for SendOtpResponse {
    fn from(result: SendCodeResult) -> Self {
        let message = match (&result.delivery_warning, result.channel) {
            (Some(_), _) => "Verification started, but the code could not be delivered",
            (None, DeliveryChannel::Sms) => "Verification code sent via SMS",
            (None, DeliveryChannel::Voice) => "Verification call placed",
        };
        Self {
            success: true,
            message: message.to_string(),
            expires_at: result.expires_at,
            resend_available_in: result.resend_available_in,
            method: result.channel,
            delivery_warning: result.delivery_warning.as_ref().map(DeliveryWarning::from),
        }
    }
}

/// Response of verify-otp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    pub verified: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

/// Response of verification-status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationStatusResponse {
    pub phone_number: String,
    pub verified: bool,
    pub state: SessionState,
    pub method: DeliveryChannel,
    pub attempts: u32,
    pub max_attempts: u32,
    pub expires_at: DateTime<Utc>,
    pub last_sent_at: DateTime<Utc>,
    pub resend_available_in: u64,
}

impl From<VerificationStatus> for VerificationStatusResponse {
    fn from(status: VerificationStatus) -> Self {
        Self {
            phone_number: status.phone_number.to_string(),
            verified: status.verified,
            state: status.state,
            method: status.channel,
            attempts: status.attempts,
            max_attempts: status.max_attempts,
            expires_at: status.expires_at,
            last_sent_at: status.last_sent_at,
            resend_available_in: status.resend_available_in,
        }
    }
}
