//! Verification code policy configuration

use serde::{Deserialize, Serialize};

use super::{env_lookup, parse_or, string_or, ConfigError, Lookup};

/// Placeholder replaced by the code in outbound SMS bodies
pub const CODE_PLACEHOLDER: &str = "{{code}}";

/// Shortest secret length that does not trigger a startup warning
pub const RECOMMENDED_SECRET_BYTES: usize = 32;

/// Longest accepted code lifetime (one day)
pub const MAX_TTL_SECONDS: u64 = 86_400;

/// Longest accepted resend cooldown (one hour)
pub const MAX_RESEND_COOLDOWN_SECONDS: u64 = 3_600;

/// Longest accepted retention of expired sessions (seven days)
pub const MAX_EXPIRED_RETENTION_SECONDS: u64 = 604_800;

/// OTP policy settings
#[derive(Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Number of digits in a generated code (`OTP_CODE_LENGTH`)
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Lifetime of an issued code in seconds (`OTP_TTL_SECONDS`)
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Minimum wait between deliveries in seconds (`OTP_RESEND_COOLDOWN_SECONDS`)
    #[serde(default = "default_resend_cooldown_seconds")]
    pub resend_cooldown_seconds: u64,

    /// Failed verify attempts allowed per code (`OTP_MAX_ATTEMPTS`)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Resends allowed per session (`OTP_MAX_RESENDS`)
    #[serde(default = "default_max_resends")]
    pub max_resends: u32,

    /// Server-held HMAC key (`OTP_HASH_SECRET`)
    #[serde(skip_serializing, default)]
    pub hash_secret: String,

    /// Channel used when a request does not name one (`OTP_DEFAULT_METHOD`)
    #[serde(default = "default_method")]
    pub default_method: String,

    /// Sends allowed per phone number per rolling hour (`OTP_MAX_SENDS_PER_HOUR`)
    #[serde(default = "default_max_sends_per_hour")]
    pub max_sends_per_hour: u32,

    /// Upper bound on a single provider call (`OTP_DISPATCH_TIMEOUT_SECONDS`)
    #[serde(default = "default_dispatch_timeout_seconds")]
    pub dispatch_timeout_seconds: u64,

    /// How often the expiry janitor runs (`OTP_PURGE_INTERVAL_SECONDS`)
    #[serde(default = "default_purge_interval_seconds")]
    pub purge_interval_seconds: u64,

    /// How long expired sessions are kept so `Expired` can still be reported
    /// (`OTP_EXPIRED_RETENTION_SECONDS`)
    #[serde(default = "default_expired_retention_seconds")]
    pub expired_retention_seconds: u64,

    /// SMS body template, must contain `{{code}}` (`OTP_MESSAGE_TEMPLATE`)
    #[serde(default = "default_message_template")]
    pub message_template: String,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            ttl_seconds: default_ttl_seconds(),
            resend_cooldown_seconds: default_resend_cooldown_seconds(),
            max_attempts: default_max_attempts(),
            max_resends: default_max_resends(),
            hash_secret: String::new(),
            default_method: default_method(),
            max_sends_per_hour: default_max_sends_per_hour(),
            dispatch_timeout_seconds: default_dispatch_timeout_seconds(),
            purge_interval_seconds: default_purge_interval_seconds(),
            expired_retention_seconds: default_expired_retention_seconds(),
            message_template: default_message_template(),
        }
    }
}

impl std::fmt::Debug for OtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpConfig")
            .field("code_length", &self.code_length)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("resend_cooldown_seconds", &self.resend_cooldown_seconds)
            .field("max_attempts", &self.max_attempts)
            .field("max_resends", &self.max_resends)
            .field("hash_secret", &"<redacted>")
            .field("default_method", &self.default_method)
            .field("max_sends_per_hour", &self.max_sends_per_hour)
            .field("dispatch_timeout_seconds", &self.dispatch_timeout_seconds)
            .field("purge_interval_seconds", &self.purge_interval_seconds)
            .field("expired_retention_seconds", &self.expired_retention_seconds)
            .field("message_template", &self.message_template)
            .finish()
    }
}

impl OtpConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    /// Create from a key lookup and validate the result
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            code_length: parse_or(lookup, "OTP_CODE_LENGTH", defaults.code_length)?,
            ttl_seconds: parse_or(lookup, "OTP_TTL_SECONDS", defaults.ttl_seconds)?,
            resend_cooldown_seconds: parse_or(
                lookup,
                "OTP_RESEND_COOLDOWN_SECONDS",
                defaults.resend_cooldown_seconds,
            )?,
            max_attempts: parse_or(lookup, "OTP_MAX_ATTEMPTS", defaults.max_attempts)?,
            max_resends: parse_or(lookup, "OTP_MAX_RESENDS", defaults.max_resends)?,
            // Secret is taken verbatim, whitespace included
            hash_secret: lookup("OTP_HASH_SECRET").unwrap_or_default(),
            default_method: string_or(lookup, "OTP_DEFAULT_METHOD", &defaults.default_method)
                .to_lowercase(),
            max_sends_per_hour: parse_or(
                lookup,
                "OTP_MAX_SENDS_PER_HOUR",
                defaults.max_sends_per_hour,
            )?,
            dispatch_timeout_seconds: parse_or(
                lookup,
                "OTP_DISPATCH_TIMEOUT_SECONDS",
                defaults.dispatch_timeout_seconds,
            )?,
            purge_interval_seconds: parse_or(
                lookup,
                "OTP_PURGE_INTERVAL_SECONDS",
                defaults.purge_interval_seconds,
            )?,
            expired_retention_seconds: parse_or(
                lookup,
                "OTP_EXPIRED_RETENTION_SECONDS",
                defaults.expired_retention_seconds,
            )?,
            message_template: string_or(lookup, "OTP_MESSAGE_TEMPLATE", &defaults.message_template),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints and the presence of the secret
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hash_secret.is_empty() {
            return Err(ConfigError::Missing("OTP_HASH_SECRET"));
        }
        if self.hash_secret.len() < RECOMMENDED_SECRET_BYTES {
            tracing::warn!(
                length = self.hash_secret.len(),
                recommended = RECOMMENDED_SECRET_BYTES,
                "OTP_HASH_SECRET is shorter than recommended"
            );
        }
        if !(4..=10).contains(&self.code_length) {
            return Err(ConfigError::Invalid {
                key: "OTP_CODE_LENGTH",
                message: format!("must be between 4 and 10, got {}", self.code_length),
            });
        }
        if !(1..=MAX_TTL_SECONDS).contains(&self.ttl_seconds) {
            return Err(ConfigError::Invalid {
                key: "OTP_TTL_SECONDS",
                message: format!(
                    "must be between 1 and {}, got {}",
                    MAX_TTL_SECONDS, self.ttl_seconds
                ),
            });
        }
        if self.resend_cooldown_seconds > MAX_RESEND_COOLDOWN_SECONDS {
            return Err(ConfigError::Invalid {
                key: "OTP_RESEND_COOLDOWN_SECONDS",
                message: format!(
                    "must be at most {}, got {}",
                    MAX_RESEND_COOLDOWN_SECONDS, self.resend_cooldown_seconds
                ),
            });
        }
        if self.expired_retention_seconds > MAX_EXPIRED_RETENTION_SECONDS {
            return Err(ConfigError::Invalid {
                key: "OTP_EXPIRED_RETENTION_SECONDS",
                message: format!(
                    "must be at most {}, got {}",
                    MAX_EXPIRED_RETENTION_SECONDS, self.expired_retention_seconds
                ),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "OTP_MAX_ATTEMPTS",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_sends_per_hour == 0 {
            return Err(ConfigError::Invalid {
                key: "OTP_MAX_SENDS_PER_HOUR",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.dispatch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "OTP_DISPATCH_TIMEOUT_SECONDS",
                message: "must be greater than zero".to_string(),
            });
        }
        if !matches!(self.default_method.as_str(), "sms" | "voice") {
            return Err(ConfigError::Invalid {
                key: "OTP_DEFAULT_METHOD",
                message: format!("expected \"sms\" or \"voice\", got {:?}", self.default_method),
            });
        }
        if !self.message_template.contains(CODE_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                key: "OTP_MESSAGE_TEMPLATE",
                message: format!("must contain {}", CODE_PLACEHOLDER),
            });
        }
        Ok(())
    }

    /// Render the SMS body for `code`
    pub fn render_message(&self, code: &str) -> String {
        self.message_template.replace(CODE_PLACEHOLDER, code)
    }
}

fn default_code_length() -> usize {
    6
}

fn default_ttl_seconds() -> u64 {
    600 // 10 minutes
}

fn default_resend_cooldown_seconds() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_max_resends() -> u32 {
    5
}

fn default_method() -> String {
    String::from("sms")
}

fn default_max_sends_per_hour() -> u32 {
    10
}

fn default_dispatch_timeout_seconds() -> u64 {
    5
}

fn default_purge_interval_seconds() -> u64 {
    300 // 5 minutes
}

fn default_expired_retention_seconds() -> u64 {
    3600 // 1 hour
}

fn default_message_template() -> String {
    String::from("Your verification code is {{code}}")
}
