//! Rate limiting configuration for OTP request endpoints

use serde::{Deserialize, Serialize};

use super::{env_lookup, parse_or, ConfigError, Lookup};

/// Per-client throttling of `send-otp` and `resend-otp`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable the per-IP throttle
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Requests allowed per client IP per window
    pub otp_requests_per_window: u32,

    /// Window length in seconds
    pub window_seconds: u64,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only safe behind a proxy that overwrites those headers; otherwise
    /// the socket peer address is used.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            otp_requests_per_window: 5,
            window_seconds: 60,
            trust_proxy_headers: false,
        }
    }
}

impl RateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    /// Create from a key lookup
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            enabled: parse_or(lookup, "OTP_IP_RATE_LIMIT_ENABLED", defaults.enabled)?,
            otp_requests_per_window: parse_or(
                lookup,
                "OTP_IP_REQUESTS_PER_WINDOW",
                defaults.otp_requests_per_window,
            )?,
            window_seconds: parse_or(lookup, "OTP_IP_WINDOW_SECONDS", defaults.window_seconds)?,
            trust_proxy_headers: parse_or(
                lookup,
                "OTP_IP_TRUST_PROXY_HEADERS",
                defaults.trust_proxy_headers,
            )?,
        };
        if config.enabled && (config.otp_requests_per_window == 0 || config.window_seconds == 0) {
            return Err(ConfigError::Invalid {
                key: "OTP_IP_REQUESTS_PER_WINDOW",
                message: "limit and window must be greater than zero".to_string(),
            });
        }
        Ok(config)
    }

    /// Configuration with the throttle turned off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lookup_from;

    #[test]
    fn test_defaults() {
        let config = RateLimitConfig::from_lookup(&lookup_from(&[])).unwrap();
        assert!(config.enabled);
        assert_eq!(config.otp_requests_per_window, 5);
        assert_eq!(config.window_seconds, 60);
        assert!(!config.trust_proxy_headers);
    }

    #[test]
    fn test_trust_proxy_headers_opt_in() {
        let lookup = lookup_from(&[("OTP_IP_TRUST_PROXY_HEADERS", "true")]);
        assert!(RateLimitConfig::from_lookup(&lookup).unwrap().trust_proxy_headers);

        let lookup = lookup_from(&[("OTP_IP_TRUST_PROXY_HEADERS", "sometimes")]);
        assert!(matches!(
            RateLimitConfig::from_lookup(&lookup),
            Err(ConfigError::Invalid {
                key: "OTP_IP_TRUST_PROXY_HEADERS",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_limit_rejected_when_enabled() {
        let lookup = lookup_from(&[("OTP_IP_REQUESTS_PER_WINDOW", "0")]);
        assert!(RateLimitConfig::from_lookup(&lookup).is_err());

        let lookup = lookup_from(&[
            ("OTP_IP_REQUESTS_PER_WINDOW", "0"),
            ("OTP_IP_RATE_LIMIT_ENABLED", "false"),
        ]);
        assert!(!RateLimitConfig::from_lookup(&lookup).unwrap().enabled);
    }
}
