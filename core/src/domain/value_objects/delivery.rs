//! Delivery channel and provider receipt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a code reaches the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    Sms,
    Voice,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::Sms => "sms",
            DeliveryChannel::Voice => "voice",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sms" => Ok(DeliveryChannel::Sms),
            "voice" => Ok(DeliveryChannel::Voice),
            _ => Err(format!("Unknown delivery method: {}", s)),
        }
    }
}

/// Provider acknowledgement of an outbound message
///
/// Kept for logging only; verification never depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider-assigned message or call id
    pub message_id: String,
    /// Provider name, e.g. "twilio"
    pub provider: String,
    /// When the provider accepted the request
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parsing() {
        assert_eq!("SMS".parse::<DeliveryChannel>().unwrap(), DeliveryChannel::Sms);
        assert_eq!(" voice ".parse::<DeliveryChannel>().unwrap(), DeliveryChannel::Voice);
        assert!("fax".parse::<DeliveryChannel>().is_err());
    }

    #[test]
    fn test_channel_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&DeliveryChannel::Voice).unwrap(), "\"voice\"");
    }
}
