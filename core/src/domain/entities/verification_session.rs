//! Verification session entity for phone-number OTP verification.
//!
//! One session exists per normalized phone number. It holds only the keyed
//! hash of the current code, never the code itself, together with the
//! counters that drive expiry, attempt locking and resend throttling.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{DeliveryChannel, PhoneNumber};
use crate::errors::OtpError;

/// Length of the per-phone send window in seconds
pub const SEND_WINDOW_SECONDS: i64 = 3600;

/// Lifecycle state derived from a session and the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Code issued, awaiting verification
    Pending,
    /// Code matched; terminal for this session
    Verified,
    /// TTL elapsed; behaves as absent
    Expired,
    /// Attempts exhausted; only a fresh send or resend unlocks it
    Locked,
}

/// Persisted record of one phone number's verification handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSession {
    /// Normalized E.164 number, the unique key
    pub phone_number: PhoneNumber,

    /// Hex HMAC of the current code
    pub code_hash: String,

    /// Channel of the most recent delivery
    pub channel: DeliveryChannel,

    /// When the session was created by `send`
    pub created_at: DateTime<Utc>,

    /// When the current code stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Most recent delivery attempt, drives the resend cooldown
    pub last_sent_at: DateTime<Utc>,

    /// Failed verify attempts since the last delivery
    pub attempts: u32,

    /// Cap on `attempts`
    pub max_attempts: u32,

    /// Set exactly once on a successful match
    pub verified: bool,

    pub verified_at: Option<DateTime<Utc>>,

    /// Resends issued for this session
    pub resend_count: u32,

    /// Deliveries in the current send window, carried across sessions
    #[serde(default)]
    pub send_count: u32,

    /// Start of the current send window; the Unix epoch when absent from
    /// a stored record, which restarts the window on the next send
    #[serde(default)]
    pub send_window_started_at: DateTime<Utc>,
}

impl VerificationSession {
    /// Creates a pending session whose code expires `ttl` after `now`
    pub fn new(
        phone_number: PhoneNumber,
        code_hash: String,
        channel: DeliveryChannel,
        now: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            phone_number,
            code_hash,
            channel,
            created_at: now,
            expires_at: now + ttl,
            last_sent_at: now,
            attempts: 0,
            max_attempts,
            verified: false,
            verified_at: None,
            resend_count: 0,
            send_count: 0,
            send_window_started_at: now,
        }
    }

    /// True once `now` is past `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// True when failed attempts have reached the cap on an unverified session
    pub fn is_locked(&self) -> bool {
        !self.verified && self.attempts >= self.max_attempts
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    /// Whole seconds until another delivery is allowed, rounded up
    pub fn resend_available_in(&self, now: DateTime<Utc>, cooldown: Duration) -> u64 {
        ceil_seconds(self.last_sent_at + cooldown - now)
    }

    /// Current lifecycle state; expiry takes precedence over everything else
    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        if self.is_expired(now) {
            SessionState::Expired
        } else if self.verified {
            SessionState::Verified
        } else if self.is_locked() {
            SessionState::Locked
        } else {
            SessionState::Pending
        }
    }

    /// Count a wrong guess, saturating at the cap
    ///
    /// Returns the attempts left afterwards.
    pub fn record_failed_attempt(&mut self) -> u32 {
        self.attempts = (self.attempts + 1).min(self.max_attempts);
        self.attempts_remaining()
    }

    /// Mark the session verified; later calls keep the first timestamp
    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        if !self.verified {
            self.verified = true;
            self.verified_at = Some(now);
        }
    }

    /// Replace the code in place for a resend
    ///
    /// Resets attempts and extends expiry. `resend_count` is incremented and
    /// never reset here; only a brand-new session starts it from zero.
    pub fn reissue(
        &mut self,
        code_hash: String,
        channel: DeliveryChannel,
        now: DateTime<Utc>,
        ttl: Duration,
    ) {
        self.code_hash = code_hash;
        self.channel = channel;
        self.attempts = 0;
        self.expires_at = now + ttl;
        self.last_sent_at = now;
        self.resend_count += 1;
    }

    /// Take over the send window of the session this one supersedes
    pub fn carry_send_window(&mut self, prior: &VerificationSession) {
        self.send_count = prior.send_count;
        self.send_window_started_at = prior.send_window_started_at;
    }

    /// Count one delivery against the per-phone hourly cap
    ///
    /// The window restarts once it is older than `SEND_WINDOW_SECONDS`.
    pub fn register_send(&mut self, now: DateTime<Utc>, max_per_window: u32) -> Result<(), OtpError> {
        let window = Duration::seconds(SEND_WINDOW_SECONDS);
        if now - self.send_window_started_at >= window {
            self.send_window_started_at = now;
            self.send_count = 0;
        }

        if self.send_count >= max_per_window {
            let retry_after_seconds = ceil_seconds(self.send_window_started_at + window - now).max(1);
            return Err(OtpError::SendLimitExceeded { retry_after_seconds });
        }

        self.send_count += 1;
        Ok(())
    }
}

/// Round a duration up to whole seconds, clamping negatives to zero
pub(crate) fn ceil_seconds(duration: Duration) -> u64 {
    if duration <= Duration::zero() {
        return 0;
    }
    let millis = duration.num_milliseconds();
    ((millis + 999) / 1000) as u64
}
