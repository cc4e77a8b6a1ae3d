//! Unit tests for the in-memory session store

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use crate::domain::entities::VerificationSession;
use crate::domain::value_objects::{DeliveryChannel, PhoneNumber};
use crate::errors::{DomainError, OtpError};
use crate::repositories::session::{InMemorySessionStore, SessionStore};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

fn phone() -> PhoneNumber {
    PhoneNumber::parse("+15551234567").unwrap()
}

fn session(hash: &str) -> VerificationSession {
    VerificationSession::new(
        phone(),
        hash.to_string(),
        DeliveryChannel::Sms,
        t0(),
        Duration::seconds(600),
        5,
    )
}

#[tokio::test]
async fn test_create_replaces_previous_session() {
    let store = InMemorySessionStore::new();
    store.create(session("first")).await.unwrap();
    store.create(session("second")).await.unwrap();

    assert_eq!(store.len().unwrap(), 1);
    let found = store.find(&phone()).await.unwrap().unwrap();
    assert_eq!(found.code_hash, "second");
}

#[tokio::test]
async fn test_get_hides_expired_but_find_does_not() {
    let store = InMemorySessionStore::new();
    store.create(session("h")).await.unwrap();

    let after_ttl = t0() + Duration::seconds(601);
    assert!(store.get(&phone(), t0()).await.unwrap().is_some());
    assert!(store.get(&phone(), after_ttl).await.unwrap().is_none());
    assert!(store.find(&phone()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_update_missing_session() {
    let store = InMemorySessionStore::new();
    let result = store.update(&phone(), |s| Ok(s.attempts)).await;
    assert!(matches!(
        result,
        Err(DomainError::Otp(OtpError::NoPendingVerification))
    ));
}

#[tokio::test]
async fn test_update_error_writes_nothing() {
    let store = InMemorySessionStore::new();
    store.create(session("h")).await.unwrap();

    let result: Result<(), _> = store
        .update(&phone(), |s| {
            s.attempts = 4;
            Err(OtpError::Expired.into())
        })
        .await;
    assert!(result.is_err());
    assert_eq!(store.find(&phone()).await.unwrap().unwrap().attempts, 0);
}

#[tokio::test]
async fn test_concurrent_updates_never_exceed_cap() {
    let store = Arc::new(InMemorySessionStore::new());
    store.create(session("h")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .update(&phone(), |s| {
                    if s.is_locked() {
                        return Err(OtpError::AttemptsExceeded { max_attempts: s.max_attempts }.into());
                    }
                    Ok(s.record_failed_attempt())
                })
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 5);
    assert_eq!(store.find(&phone()).await.unwrap().unwrap().attempts, 5);
}

#[tokio::test]
async fn test_delete_and_delete_if() {
    let store = InMemorySessionStore::new();
    assert!(!store.delete(&phone()).await.unwrap());

    store.create(session("h")).await.unwrap();
    assert!(!store.delete_if(&phone(), |s| s.verified).await.unwrap());
    assert_eq!(store.len().unwrap(), 1);

    store
        .update(&phone(), |s| {
            s.mark_verified(t0());
            Ok(())
        })
        .await
        .unwrap();
    assert!(store.delete_if(&phone(), |s| s.verified).await.unwrap());
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_purge_expired() {
    let store = InMemorySessionStore::new();
    store.create(session("h")).await.unwrap();

    let other = PhoneNumber::parse("+442071838750").unwrap();
    let mut later = session("h2");
    later.phone_number = other.clone();
    later.expires_at = t0() + Duration::seconds(3600);
    store.create(later).await.unwrap();

    let purged = store.purge_expired(t0() + Duration::seconds(1200)).await.unwrap();
    assert_eq!(purged, 1);
    assert!(store.find(&phone()).await.unwrap().is_none());
    assert!(store.find(&other).await.unwrap().is_some());
}
