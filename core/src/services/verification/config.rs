//! Configuration for the verification service

use chrono::Duration;
use pv_shared::config::OtpConfig;

use crate::domain::value_objects::DeliveryChannel;

/// Policy knobs of the verification service
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// Digits per generated code
    pub code_length: usize,
    /// Lifetime of an issued code
    pub ttl: Duration,
    /// Minimum wait between deliveries
    pub resend_cooldown: Duration,
    /// Failed verify attempts allowed per code
    pub max_attempts: u32,
    /// Resends allowed per session
    pub max_resends: u32,
    /// Deliveries allowed per phone number per hour
    pub max_sends_per_hour: u32,
    /// Bound on a single provider call
    pub dispatch_timeout: std::time::Duration,
    /// Channel used when a request names none
    pub default_channel: DeliveryChannel,
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            ttl: Duration::seconds(600),
            resend_cooldown: Duration::seconds(60),
            max_attempts: 5,
            max_resends: 5,
            max_sends_per_hour: 10,
            dispatch_timeout: std::time::Duration::from_secs(5),
            default_channel: DeliveryChannel::Sms,
        }
    }
}

impl From<&OtpConfig> for VerificationServiceConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            code_length: config.code_length,
            ttl: Duration::seconds(config.ttl_seconds as i64),
            resend_cooldown: Duration::seconds(config.resend_cooldown_seconds as i64),
            max_attempts: config.max_attempts,
            max_resends: config.max_resends,
            max_sends_per_hour: config.max_sends_per_hour,
            dispatch_timeout: std::time::Duration::from_secs(config.dispatch_timeout_seconds),
            // OtpConfig::validate only admits "sms" and "voice"
            default_channel: config
                .default_method
                .parse()
                .unwrap_or(DeliveryChannel::Sms),
        }
    }
}
