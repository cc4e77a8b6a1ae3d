//! Canonical E.164 phone number

use serde::{Deserialize, Serialize};
use std::fmt;

use pv_shared::phone::{mask_phone_number, to_e164};

use crate::errors::OtpError;

/// A phone number normalized to E.164
///
/// Construction is the only place normalization happens, so two
/// `PhoneNumber`s compare equal exactly when they address the same session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize and validate raw user input
    pub fn parse(raw: &str) -> Result<Self, OtpError> {
        to_e164(raw)
            .map(PhoneNumber)
            .ok_or_else(|| OtpError::InvalidPhoneNumber {
                phone: mask_phone_number(raw),
            })
    }

    /// The E.164 string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked form for logs
    pub fn masked(&self) -> String {
        mask_phone_number(&self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_inputs_share_a_key() {
        let a = PhoneNumber::parse("+15551234567").unwrap();
        let b = PhoneNumber::parse("15551234567").unwrap();
        let c = PhoneNumber::parse("+1 (555) 123-4567").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.as_str(), "+15551234567");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let once = PhoneNumber::parse("0044 20 7183 8750").unwrap();
        let twice = PhoneNumber::parse(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_invalid_input_is_masked_in_error() {
        let err = PhoneNumber::parse("12345").unwrap_err();
        assert_eq!(err, OtpError::InvalidPhoneNumber { phone: "****".into() });
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let phone: PhoneNumber = serde_json::from_str("\"+15551234567\"").unwrap();
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+15551234567\"");
        assert!(serde_json::from_str::<PhoneNumber>("\"not a phone\"").is_err());
    }

    #[test]
    fn test_masked() {
        let phone = PhoneNumber::parse("+15551234567").unwrap();
        assert_eq!(phone.masked(), "+15****4567");
    }
}
