use super::*;

#[test]
fn test_otp_error_converts_into_domain_error() {
    let err: DomainError = OtpError::ResendTooSoon { retry_after_seconds: 42 }.into();
    assert_eq!(
        err.as_otp(),
        Some(&OtpError::ResendTooSoon { retry_after_seconds: 42 })
    );
    assert_eq!(err.to_string(), "Please wait 42 seconds before requesting a new code");
}

#[test]
fn test_retry_after_hint() {
    assert_eq!(
        OtpError::SendLimitExceeded { retry_after_seconds: 7 }.retry_after_seconds(),
        Some(7)
    );
    assert_eq!(OtpError::Expired.retry_after_seconds(), None);
}

#[test]
fn test_delivery_error_kind() {
    let err = DeliveryError::RateLimitedByProvider { message: "429".into() };
    assert_eq!(err.kind(), "rate_limited_by_provider");
    assert!(DomainError::from(err).as_otp().is_none());
}

#[test]
fn test_internal_error_display() {
    let err = DomainError::Internal { message: "store offline".into() };
    assert_eq!(err.to_string(), "Internal error: store offline");
}
