//! Types for verification service results

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::SessionState;
use crate::domain::value_objects::{DeliveryChannel, DeliveryReceipt, PhoneNumber};
use crate::errors::DeliveryError;

/// Result of `send` or `resend`
///
/// The session is stored even when delivery failed; `delivery_warning`
/// then tells the caller to offer a retry.
#[derive(Debug, Clone)]
pub struct SendCodeResult {
    pub phone_number: PhoneNumber,
    /// Channel the code went out on
    pub channel: DeliveryChannel,
    /// When the new code stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Seconds until `resend` is allowed
    pub resend_available_in: u64,
    /// Provider acknowledgement, when delivery succeeded
    pub receipt: Option<DeliveryReceipt>,
    /// Why delivery failed, when it did
    pub delivery_warning: Option<DeliveryError>,
}

impl SendCodeResult {
    pub fn delivered(&self) -> bool {
        self.delivery_warning.is_none()
    }
}

/// Result of a well-formed verify call against a live, unlocked session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCodeResult {
    /// Whether the phone number is verified
    pub verified: bool,
    /// Set when the session had already been verified by an earlier call;
    /// the candidate is not checked then
    pub already_verified: bool,
    /// Attempts left after a mismatch, `None` on success
    pub attempts_remaining: Option<u32>,
}

/// Read-only projection of a live session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationStatus {
    pub phone_number: PhoneNumber,
    pub state: SessionState,
    pub verified: bool,
    pub channel: DeliveryChannel,
    pub attempts: u32,
    pub max_attempts: u32,
    pub expires_at: DateTime<Utc>,
    pub last_sent_at: DateTime<Utc>,
    /// Seconds until `resend` is allowed
    pub resend_available_in: u64,
}
