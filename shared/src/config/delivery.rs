//! Delivery provider configuration

use serde::{Deserialize, Serialize};

use super::{env_lookup, string_or, Lookup};

/// Default Twilio REST endpoint
pub const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Selects and configures the SMS/voice provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// Provider name ("mock", "twilio")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Twilio credentials, used when `provider` is "twilio"
    #[serde(default)]
    pub twilio: TwilioSettings,
}

/// Twilio account settings
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct TwilioSettings {
    pub account_sid: String,
    #[serde(skip_serializing, default)]
    pub auth_token: String,
    pub from_number: String,
    #[serde(default)]
    pub api_base: String,
}

impl std::fmt::Debug for TwilioSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioSettings")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            twilio: TwilioSettings {
                api_base: TWILIO_API_BASE.to_string(),
                ..Default::default()
            },
        }
    }
}

impl DeliveryConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(&env_lookup)
    }

    /// Create from a key lookup
    ///
    /// Credentials are not checked here; the provider factory rejects an
    /// incomplete Twilio configuration when it is actually selected.
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            provider: string_or(lookup, "DELIVERY_PROVIDER", &default_provider()).to_lowercase(),
            twilio: TwilioSettings {
                account_sid: string_or(lookup, "TWILIO_ACCOUNT_SID", ""),
                auth_token: string_or(lookup, "TWILIO_AUTH_TOKEN", ""),
                from_number: string_or(lookup, "TWILIO_FROM_NUMBER", ""),
                api_base: string_or(lookup, "TWILIO_API_BASE", TWILIO_API_BASE),
            },
        }
    }
}

fn default_provider() -> String {
    String::from("mock")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lookup_from;

    #[test]
    fn test_defaults_to_mock() {
        let config = DeliveryConfig::from_lookup(&lookup_from(&[]));
        assert_eq!(config.provider, "mock");
        assert_eq!(config.twilio.api_base, TWILIO_API_BASE);
    }

    #[test]
    fn test_twilio_settings() {
        let lookup = lookup_from(&[
            ("DELIVERY_PROVIDER", "Twilio"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "s3cr3t-token"),
            ("TWILIO_FROM_NUMBER", "+15550000000"),
        ]);
        let config = DeliveryConfig::from_lookup(&lookup);
        assert_eq!(config.provider, "twilio");
        assert_eq!(config.twilio.account_sid, "AC123");
        assert!(!format!("{:?}", config.twilio).contains("s3cr3t"));
    }
}
