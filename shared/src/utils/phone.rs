//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// International phone number regex (E.164 format, at least 8 digits)
static E164_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{7,14}$").unwrap()
});

// Characters people commonly type into a phone field
static FORMATTED_PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[\d\s().\-/]+$").unwrap()
});

/// Normalize a phone number by removing common formatting characters
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Convert user input to canonical E.164 (`+<country><number>`)
///
/// Accepts spaces, dashes, dots, slashes and parentheses as formatting. A
/// leading `00` international prefix becomes `+`, and input without a `+` is
/// read as already carrying its country code. Returns `None` when the input
/// contains anything else or does not form a plausible E.164 number.
///
/// The result is a fixed point: `to_e164(to_e164(x)) == to_e164(x)`.
pub fn to_e164(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    if !FORMATTED_PHONE_REGEX.is_match(trimmed) {
        return None;
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = match digits.strip_prefix("00") {
        Some(rest) if !trimmed.starts_with('+') => rest.to_string(),
        _ => digits,
    };

    let candidate = format!("+{}", digits);
    if E164_REGEX.is_match(&candidate) {
        Some(candidate)
    } else {
        None
    }
}

/// Check if a phone number is valid E.164 after normalization
pub fn is_valid_phone(phone: &str) -> bool {
    to_e164(phone).is_some()
}

/// Mask a phone number for display and logs (e.g., +15****4567)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() >= 7 {
        format!(
            "{}****{}",
            &normalized[0..3],
            &normalized[normalized.len() - 4..]
        )
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("555-123-4567"), "5551234567");
        assert_eq!(normalize_phone_number("+1 (555) 123-4567"), "+15551234567");
    }

    #[test]
    fn test_to_e164_formats() {
        assert_eq!(to_e164("+15551234567").as_deref(), Some("+15551234567"));
        assert_eq!(to_e164("+1 555-123-4567").as_deref(), Some("+15551234567"));
        assert_eq!(to_e164("15551234567").as_deref(), Some("+15551234567"));
        assert_eq!(to_e164("(+44) 20 7183 8750"), None);
        assert_eq!(to_e164("0044 20 7183 8750").as_deref(), Some("+442071838750"));
        assert_eq!(to_e164(" +86 138.1234.5678 ").as_deref(), Some("+8613812345678"));
    }

    #[test]
    fn test_to_e164_rejects_garbage() {
        assert_eq!(to_e164(""), None);
        assert_eq!(to_e164("+"), None);
        assert_eq!(to_e164("555-CALL-NOW"), None);
        assert_eq!(to_e164("+0123456789"), None); // Country code cannot start with 0
        assert_eq!(to_e164("+1234567"), None); // Too short
        assert_eq!(to_e164("+1234567890123456"), None); // Too long
        assert_eq!(to_e164("+1 555 123 4567 ext 9"), None);
    }

    #[test]
    fn test_to_e164_is_idempotent() {
        for input in ["+1 555-123-4567", "0044 20 7183 8750", "15551234567"] {
            let once = to_e164(input).unwrap();
            assert_eq!(to_e164(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("+15551234567"), "+15****4567");
        assert_eq!(mask_phone_number("+8613812345678"), "+86****5678");
        assert_eq!(mask_phone_number("12345"), "****");
    }
}
