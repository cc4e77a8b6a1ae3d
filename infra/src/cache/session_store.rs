//! Redis-backed verification session store
//!
//! Each session is one JSON string under `{prefix}:{e164}`. Keys expire on
//! their own at `expires_at + retention`, so `purge_expired` has nothing to
//! do. `update` and `delete_if` are optimistic: read, decide locally, then
//! write through a compare-and-swap script that only succeeds if the stored
//! JSON is byte-for-byte what was read. A lost race rereads and retries.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use pv_core::domain::entities::VerificationSession;
use pv_core::domain::value_objects::PhoneNumber;
use pv_core::errors::{DomainError, DomainResult, OtpError};
use pv_core::repositories::SessionStore;

use super::RedisClient;
use crate::InfrastructureError;

/// Optimistic retries before a contended update gives up
const MAX_CAS_ATTEMPTS: u32 = 16;

/// Session store shared by every server instance pointing at the same Redis
#[derive(Clone)]
pub struct RedisSessionStore {
    client: RedisClient,
    retention: Duration,
}

impl RedisSessionStore {
    /// Create a store keeping expired sessions for `retention` before Redis drops them
    pub fn new(client: RedisClient, retention: Duration) -> Self {
        Self { client, retention }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    fn key(&self, phone: &PhoneNumber) -> String {
        self.client.config().make_key(phone.as_str())
    }

    fn expire_at_ms(&self, session: &VerificationSession) -> i64 {
        (session.expires_at + self.retention).timestamp_millis()
    }

    async fn read(&self, key: &str) -> DomainResult<Option<(String, VerificationSession)>> {
        let Some(raw) = self.client.get(key).await? else {
            return Ok(None);
        };
        let session = serde_json::from_str(&raw).map_err(InfrastructureError::from)?;
        Ok(Some((raw, session)))
    }
}

fn encode(session: &VerificationSession) -> DomainResult<String> {
    Ok(serde_json::to_string(session).map_err(InfrastructureError::from)?)
}

fn contended(key: &str) -> DomainError {
    warn!(key = key, attempts = MAX_CAS_ATTEMPTS, "Session update lost every race");
    DomainError::Internal {
        message: "Session is being modified concurrently, try again".to_string(),
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, session: VerificationSession) -> DomainResult<()> {
        let key = self.key(&session.phone_number);
        let value = encode(&session)?;
        // SET replaces the previous session in one step
        self.client
            .set_expire_at(&key, &value, self.expire_at_ms(&session))
            .await?;
        Ok(())
    }

    async fn find(&self, phone: &PhoneNumber) -> DomainResult<Option<VerificationSession>> {
        Ok(self.read(&self.key(phone)).await?.map(|(_, session)| session))
    }

    async fn update<T, F>(&self, phone: &PhoneNumber, mut mutator: F) -> DomainResult<T>
    where
        T: Send,
        F: FnMut(&mut VerificationSession) -> DomainResult<T> + Send,
    {
        let key = self.key(phone);

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let Some((raw, current)) = self.read(&key).await? else {
                return Err(OtpError::NoPendingVerification.into());
            };

            let mut next = current.clone();
            let output = mutator(&mut next)?;
            if next == current {
                return Ok(output);
            }

            let value = encode(&next)?;
            if self
                .client
                .compare_and_swap(&key, &raw, &value, self.expire_at_ms(&next))
                .await?
            {
                return Ok(output);
            }
            debug!(key = %key, attempt = attempt, "Session changed underneath update, retrying");
        }

        Err(contended(&key))
    }

    async fn delete(&self, phone: &PhoneNumber) -> DomainResult<bool> {
        Ok(self.client.delete(&self.key(phone)).await?)
    }

    async fn delete_if<P>(&self, phone: &PhoneNumber, predicate: P) -> DomainResult<bool>
    where
        P: Fn(&VerificationSession) -> bool + Send + Sync,
    {
        let key = self.key(phone);

        for _ in 0..MAX_CAS_ATTEMPTS {
            let Some((raw, current)) = self.read(&key).await? else {
                return Ok(false);
            };
            if !predicate(&current) {
                return Ok(false);
            }
            if self.client.compare_and_delete(&key, &raw).await? {
                return Ok(true);
            }
        }

        Err(contended(&key))
    }

    async fn purge_expired(&self, _cutoff: DateTime<Utc>) -> DomainResult<usize> {
        Ok(0)
    }
}
