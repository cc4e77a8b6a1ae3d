//! Code generation and keyed hashing
//!
//! Codes are uniform random decimal strings drawn from the OS CSPRNG. Only
//! `HMAC-SHA256(secret, code ‖ phone)` is ever stored, so a leaked store
//! reveals nothing without the secret and a hash cannot be replayed against
//! another phone number.

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, Rng};
use sha2::Sha256;

use crate::domain::value_objects::PhoneNumber;
use crate::errors::{DomainError, DomainResult};

type HmacSha256 = Hmac<Sha256>;

/// Generate a cryptographically secure random numeric code
///
/// Every digit is drawn independently and uniformly, so leading zeros are
/// as likely as any other digit.
///
/// # Panics
///
/// Panics if `length` is zero; that is a configuration bug, not user input.
pub fn generate_code(length: usize) -> String {
    assert!(length > 0, "verification code length must be positive");
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Keyed hasher holding the server secret
#[derive(Clone)]
pub struct CodeHasher {
    mac: HmacSha256,
}

impl CodeHasher {
    /// Create a hasher keyed with `secret`
    ///
    /// # Returns
    ///
    /// * `Err(DomainError::Validation)` - If the secret is empty
    pub fn new(secret: impl AsRef<[u8]>) -> DomainResult<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(DomainError::Validation {
                message: "Hash secret must not be empty".to_string(),
            });
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|e| DomainError::Validation {
            message: format!("Unusable hash secret: {}", e),
        })?;
        Ok(Self { mac })
    }

    /// Hex-encoded HMAC over `code ‖ phone`
    pub fn hash(&self, code: &str, phone: &PhoneNumber) -> String {
        let mut mac = self.mac.clone();
        mac.update(code.as_bytes());
        mac.update(phone.as_str().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Recompute the hash for `candidate` and compare in constant time
    pub fn verify(&self, candidate: &str, phone: &PhoneNumber, stored_hash: &str) -> bool {
        let computed = self.hash(candidate, phone);
        if computed.len() != stored_hash.len() {
            return false;
        }
        constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
    }
}

impl std::fmt::Debug for CodeHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CodeHasher(<keyed>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn phone(raw: &str) -> PhoneNumber {
        PhoneNumber::parse(raw).unwrap()
    }

    #[test]
    fn test_generate_code_format() {
        for length in [4, 6, 10] {
            let code = generate_code(length);
            assert_eq!(code.len(), length);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generate_code_varies() {
        let codes: HashSet<String> = (0..50).map(|_| generate_code(8)).collect();
        assert!(codes.len() > 45);
    }

    #[test]
    fn test_generate_code_uses_every_digit() {
        let digits: HashSet<char> = (0..200).flat_map(|_| generate_code(6).chars().collect::<Vec<_>>()).collect();
        assert_eq!(digits.len(), 10);
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_generate_code_zero_length_panics() {
        generate_code(0);
    }

    #[test]
    fn test_hash_is_deterministic_and_hex() {
        let hasher = CodeHasher::new("secret").unwrap();
        let p = phone("+15551234567");
        let a = hasher.hash("482913", &p);
        assert_eq!(a, hasher.hash("482913", &p));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, "482913");
    }

    #[test]
    fn test_hash_binds_phone_and_secret() {
        let hasher = CodeHasher::new("secret").unwrap();
        let other_secret = CodeHasher::new("other").unwrap();
        let p1 = phone("+15551234567");
        let p2 = phone("+15551234568");

        assert_ne!(hasher.hash("123456", &p1), hasher.hash("123456", &p2));
        assert_ne!(hasher.hash("123456", &p1), other_secret.hash("123456", &p1));
    }

    #[test]
    fn test_verify() {
        let hasher = CodeHasher::new("secret").unwrap();
        let p = phone("+15551234567");
        let stored = hasher.hash("000123", &p);

        assert!(hasher.verify("000123", &p, &stored));
        assert!(!hasher.verify("000124", &p, &stored));
        assert!(!hasher.verify("000123", &phone("+15551234568"), &stored));
        assert!(!hasher.verify("000123", &p, "short"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            CodeHasher::new(""),
            Err(DomainError::Validation { .. })
        ));
    }
}
