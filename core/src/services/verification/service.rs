//! Main verification service implementation

use chrono::Duration;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::domain::entities::VerificationSession;
use crate::domain::value_objects::{DeliveryChannel, DeliveryReceipt, PhoneNumber};
use crate::errors::{DeliveryError, DomainError, DomainResult, OtpError};
use crate::repositories::SessionStore;

use super::code::{generate_code, CodeHasher};
use super::config::VerificationServiceConfig;
use super::traits::ChannelDispatcher;
use super::types::{SendCodeResult, VerificationStatus, VerifyCodeResult};

/// What a verify attempt did to the session, decided inside the atomic update
enum VerifyOutcome {
    Verified,
    AlreadyVerified,
    Mismatch { remaining: u32, max_attempts: u32 },
}

/// Verification service orchestrating code generation, storage and delivery
pub struct VerificationService<D: ChannelDispatcher + ?Sized, S: SessionStore> {
    /// Delivery provider
    dispatcher: Arc<D>,
    /// Session persistence
    store: Arc<S>,
    /// Keyed code hasher
    hasher: CodeHasher,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Service configuration
    config: VerificationServiceConfig,
}

impl<D: ChannelDispatcher + ?Sized, S: SessionStore> VerificationService<D, S> {
    /// Create a new verification service on the system clock
    ///
    /// # Arguments
    ///
    /// * `dispatcher` - Delivery provider implementation
    /// * `store` - Session store implementation
    /// * `hasher` - Hasher keyed with the server secret
    /// * `config` - Service configuration
    pub fn new(
        dispatcher: Arc<D>,
        store: Arc<S>,
        hasher: CodeHasher,
        config: VerificationServiceConfig,
    ) -> Self {
        Self {
            dispatcher,
            store,
            hasher,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &VerificationServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Start a new verification for a phone number
    ///
    /// This method:
    /// 1. Normalizes the phone number
    /// 2. Applies the per-phone hourly send cap
    /// 3. Generates a code and stores a fresh session, superseding any prior one
    /// 4. Delivers the code, reporting delivery failures as a warning
    ///
    /// # Arguments
    ///
    /// * `phone` - Phone number in any common format
    /// * `channel` - Delivery channel, or the configured default
    ///
    /// # Returns
    ///
    /// * `Ok(SendCodeResult)` - Session stored; check `delivery_warning`
    /// * `Err(DomainError)` - `InvalidPhoneNumber`, `SendLimitExceeded` or a store failure
    pub async fn send(
        &self,
        phone: &str,
        channel: Option<DeliveryChannel>,
    ) -> DomainResult<SendCodeResult> {
        let phone = self.parse_phone(phone)?;
        let channel = channel.unwrap_or(self.config.default_channel);
        let now = self.clock.now();

        let code = generate_code(self.config.code_length);
        let mut session = VerificationSession::new(
            phone.clone(),
            self.hasher.hash(&code, &phone),
            channel,
            now,
            self.config.ttl,
            self.config.max_attempts,
        );

        // The hourly window follows the phone number, not the session. This
        // read-then-create is not atomic, so racing sends may overshoot the cap.
        let prior = self
            .store
            .find(&phone)
            .await
            .map_err(|e| trace_failure(&phone, "otp_send_failed", e))?;
        if let Some(prior) = prior {
            session.carry_send_window(&prior);
        }
        session
            .register_send(now, self.config.max_sends_per_hour)
            .map_err(|e| trace_failure(&phone, "otp_send_limited", e.into()))?;

        self.store
            .create(session.clone())
            .await
            .map_err(|e| trace_failure(&phone, "otp_send_failed", e))?;

        tracing::info!(
            phone = %phone.masked(),
            channel = %channel,
            expires_at = %session.expires_at,
            event = "otp_generated",
            "Created verification session"
        );

        let (receipt, delivery_warning) = self.dispatch(&phone, channel, &code).await;

        Ok(SendCodeResult {
            resend_available_in: session.resend_available_in(now, self.config.resend_cooldown),
            phone_number: phone,
            channel,
            expires_at: session.expires_at,
            receipt,
            delivery_warning,
        })
    }

    /// Issue a new code for the pending session
    ///
    /// The code, hash, attempt counter and expiry are replaced in place; the
    /// resend counter keeps growing until a fresh `send`. A channel of `None`
    /// reuses the session's last channel.
    ///
    /// # Returns
    ///
    /// * `Ok(SendCodeResult)` - Code reissued; check `delivery_warning`
    /// * `Err(DomainError)` - `NoPendingVerification`, `Expired`, `ResendTooSoon`,
    ///   `ResendLimitExceeded`, `SendLimitExceeded` or a store failure
    pub async fn resend(
        &self,
        phone: &str,
        channel: Option<DeliveryChannel>,
    ) -> DomainResult<SendCodeResult> {
        let phone = self.parse_phone(phone)?;
        let now = self.clock.now();

        let code = generate_code(self.config.code_length);
        let code_hash = self.hasher.hash(&code, &phone);
        let config = &self.config;

        let session = self
            .store
            .update(&phone, |session| {
                if session.is_expired(now) {
                    return Err(OtpError::Expired.into());
                }
                // A verified session has nothing left to deliver
                if session.verified {
                    return Err(OtpError::NoPendingVerification.into());
                }

                let wait = session.resend_available_in(now, config.resend_cooldown);
                if wait > 0 {
                    return Err(OtpError::ResendTooSoon {
                        retry_after_seconds: wait,
                    }
                    .into());
                }
                if session.resend_count >= config.max_resends {
                    return Err(OtpError::ResendLimitExceeded {
                        max_resends: config.max_resends,
                    }
                    .into());
                }
                session.register_send(now, config.max_sends_per_hour)?;

                let channel = channel.unwrap_or(session.channel);
                session.reissue(code_hash.clone(), channel, now, config.ttl);
                Ok(session.clone())
            })
            .await
            .map_err(|e| trace_failure(&phone, "otp_resend_rejected", e))?;

        tracing::info!(
            phone = %phone.masked(),
            channel = %session.channel,
            resend_count = session.resend_count,
            event = "otp_regenerated",
            "Reissued verification code"
        );

        let (receipt, delivery_warning) = self.dispatch(&phone, session.channel, &code).await;

        Ok(SendCodeResult {
            resend_available_in: session.resend_available_in(now, self.config.resend_cooldown),
            phone_number: phone,
            channel: session.channel,
            expires_at: session.expires_at,
            receipt,
            delivery_warning,
        })
    }

    /// Check a candidate code
    ///
    /// This method:
    /// 1. Rejects malformed codes without consuming an attempt
    /// 2. Rejects expired and locked sessions
    /// 3. Compares the keyed hash in constant time
    /// 4. Atomically records the failed attempt or the verified flag
    ///
    /// Once a session is verified, later calls return `verified` with
    /// `already_verified` set, whatever the candidate, and never count an
    /// attempt.
    ///
    /// # Returns
    ///
    /// * `Ok(VerifyCodeResult)` - Match, or mismatch with attempts left
    /// * `Err(DomainError)` - `InvalidCodeFormat`, `NoPendingVerification`,
    ///   `Expired`, `AttemptsExceeded` or a store failure
    pub async fn verify(&self, phone: &str, candidate: &str) -> DomainResult<VerifyCodeResult> {
        let phone = self.parse_phone(phone)?;
        let candidate = candidate.trim();
        if candidate.len() != self.config.code_length
            || !candidate.bytes().all(|b| b.is_ascii_digit())
        {
            tracing::warn!(
                phone = %phone.masked(),
                code_length = candidate.len(),
                event = "invalid_code_format",
                "Invalid verification code format provided"
            );
            return Err(OtpError::InvalidCodeFormat {
                expected_length: self.config.code_length,
            }
            .into());
        }

        let now = self.clock.now();
        let hasher = &self.hasher;

        let outcome = self
            .store
            .update(&phone, |session| {
                // Never match against a stale hash
                if session.is_expired(now) {
                    return Err(OtpError::Expired.into());
                }

                if session.verified {
                    return Ok(VerifyOutcome::AlreadyVerified);
                }
                if session.is_locked() {
                    return Err(OtpError::AttemptsExceeded {
                        max_attempts: session.max_attempts,
                    }
                    .into());
                }

                if hasher.verify(candidate, &phone, &session.code_hash) {
                    session.mark_verified(now);
                    Ok(VerifyOutcome::Verified)
                } else {
                    Ok(VerifyOutcome::Mismatch {
                        remaining: session.record_failed_attempt(),
                        max_attempts: session.max_attempts,
                    })
                }
            })
            .await
            .map_err(|e| trace_failure(&phone, "otp_verification_rejected", e))?;

        match outcome {
            VerifyOutcome::Verified => {
                tracing::info!(
                    phone = %phone.masked(),
                    event = "otp_verified_success",
                    "Verification code successfully verified"
                );
                Ok(VerifyCodeResult {
                    verified: true,
                    already_verified: false,
                    attempts_remaining: None,
                })
            }
            VerifyOutcome::AlreadyVerified => Ok(VerifyCodeResult {
                verified: true,
                already_verified: true,
                attempts_remaining: None,
            }),
            VerifyOutcome::Mismatch {
                remaining: 0,
                max_attempts,
            } => {
                tracing::warn!(
                    phone = %phone.masked(),
                    max_attempts = max_attempts,
                    event = "max_attempts_exceeded",
                    "Maximum verification attempts exceeded for phone number"
                );
                Err(OtpError::AttemptsExceeded { max_attempts }.into())
            }
            VerifyOutcome::Mismatch { remaining, .. } => {
                tracing::warn!(
                    phone = %phone.masked(),
                    remaining_attempts = remaining,
                    event = "otp_verification_failed",
                    "Verification code mismatch"
                );
                Ok(VerifyCodeResult {
                    verified: false,
                    already_verified: false,
                    attempts_remaining: Some(remaining),
                })
            }
        }
    }

    /// Read-only view of the live session, for restoring UI state
    ///
    /// # Returns
    ///
    /// * `Ok(VerificationStatus)` - Current projection
    /// * `Err(DomainError)` - `NoPendingVerification`, `Expired` or a store failure
    pub async fn status(&self, phone: &str) -> DomainResult<VerificationStatus> {
        let phone = self.parse_phone(phone)?;
        let now = self.clock.now();

        let session = match self.store.find(&phone).await? {
            None => return Err(OtpError::NoPendingVerification.into()),
            Some(session) if session.is_expired(now) => return Err(OtpError::Expired.into()),
            Some(session) => session,
        };

        Ok(VerificationStatus {
            state: session.state(now),
            verified: session.verified,
            channel: session.channel,
            attempts: session.attempts,
            max_attempts: session.max_attempts,
            expires_at: session.expires_at,
            last_sent_at: session.last_sent_at,
            resend_available_in: session.resend_available_in(now, self.config.resend_cooldown),
            phone_number: session.phone_number,
        })
    }

    /// Delete the session if, and only if, it is verified and unexpired
    ///
    /// For callers that need each successful verification to be usable once.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A verified session was consumed
    /// * `Ok(false)` - Nothing verified to consume
    pub async fn consume(&self, phone: &str) -> DomainResult<bool> {
        let phone = self.parse_phone(phone)?;
        let now = self.clock.now();

        let consumed = self
            .store
            .delete_if(&phone, |session| session.verified && !session.is_expired(now))
            .await?;

        if consumed {
            tracing::info!(
                phone = %phone.masked(),
                event = "otp_verification_consumed",
                "Consumed verified session"
            );
        }
        Ok(consumed)
    }

    /// Drop sessions that expired more than `retention` ago
    pub async fn purge_expired(&self, retention: Duration) -> DomainResult<usize> {
        let cutoff = self.clock.now() - retention;
        self.store.purge_expired(cutoff).await
    }

    fn parse_phone(&self, raw: &str) -> DomainResult<PhoneNumber> {
        PhoneNumber::parse(raw).map_err(|e| {
            tracing::warn!(
                phone = %pv_shared::phone::mask_phone_number(raw),
                event = "invalid_phone_number",
                "Rejected malformed phone number"
            );
            DomainError::from(e)
        })
    }

    /// Deliver `code`, converting failures and timeouts into a warning
    async fn dispatch(
        &self,
        phone: &PhoneNumber,
        channel: DeliveryChannel,
        code: &str,
    ) -> (Option<DeliveryReceipt>, Option<DeliveryError>) {
        let provider = self.dispatcher.provider_name();
        let attempt = tokio::time::timeout(
            self.config.dispatch_timeout,
            self.dispatcher.send(phone, channel, code),
        )
        .await;

        let failure = match attempt {
            Ok(Ok(receipt)) => {
                tracing::info!(
                    phone = %phone.masked(),
                    channel = %channel,
                    provider = provider,
                    message_id = %receipt.message_id,
                    event = "otp_sent",
                    "Verification code delivered to provider"
                );
                return (Some(receipt), None);
            }
            Ok(Err(err)) => err,
            Err(_) => DeliveryError::ProviderUnavailable {
                message: format!(
                    "{} did not respond within {}ms",
                    provider,
                    self.config.dispatch_timeout.as_millis()
                ),
            },
        };

        tracing::warn!(
            phone = %phone.masked(),
            channel = %channel,
            provider = provider,
            kind = failure.kind(),
            error = %failure,
            event = "otp_delivery_failed",
            "Verification code delivery failed; session kept"
        );
        (None, Some(failure))
    }
}

/// Log a failed operation at a level matching its cause and pass it through
fn trace_failure(phone: &PhoneNumber, event: &'static str, err: DomainError) -> DomainError {
    match &err {
        DomainError::Otp(reason) => tracing::info!(
            phone = %phone.masked(),
            reason = %reason,
            event = event,
            "Verification request rejected"
        ),
        other => tracing::error!(
            phone = %phone.masked(),
            error = %other,
            event = event,
            "Verification request failed"
        ),
    }
    err
}
