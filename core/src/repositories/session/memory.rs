//! In-process session store backed by a mutex-guarded map

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::entities::VerificationSession;
use crate::domain::value_objects::PhoneNumber;
use crate::errors::{DomainError, DomainResult, OtpError};

use super::r#trait::SessionStore;

/// Session store for single-instance deployments and tests
///
/// Every operation holds one lock for its whole read-modify-write, which
/// serializes mutations per phone number (and, more coarsely, globally).
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<PhoneNumber, VerificationSession>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included
    pub fn len(&self) -> DomainResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, HashMap<PhoneNumber, VerificationSession>>> {
        self.sessions.lock().map_err(|_| DomainError::Internal {
            message: "Session store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: VerificationSession) -> DomainResult<()> {
        let mut sessions = self.lock()?;
        sessions.insert(session.phone_number.clone(), session);
        Ok(())
    }

    async fn find(&self, phone: &PhoneNumber) -> DomainResult<Option<VerificationSession>> {
        Ok(self.lock()?.get(phone).cloned())
    }

    async fn update<T, F>(&self, phone: &PhoneNumber, mut mutator: F) -> DomainResult<T>
    where
        T: Send,
        F: FnMut(&mut VerificationSession) -> DomainResult<T> + Send,
    {
        let mut sessions = self.lock()?;
        let stored = sessions
            .get_mut(phone)
            .ok_or(DomainError::Otp(OtpError::NoPendingVerification))?;

        // Mutate a copy so an Err leaves the stored session untouched
        let mut draft = stored.clone();
        let outcome = mutator(&mut draft)?;
        if draft != *stored {
            *stored = draft;
        }
        Ok(outcome)
    }

    async fn delete(&self, phone: &PhoneNumber) -> DomainResult<bool> {
        Ok(self.lock()?.remove(phone).is_some())
    }

    async fn delete_if<P>(&self, phone: &PhoneNumber, predicate: P) -> DomainResult<bool>
    where
        P: Fn(&VerificationSession) -> bool + Send + Sync,
    {
        let mut sessions = self.lock()?;
        match sessions.get(phone) {
            Some(session) if predicate(session) => {
                sessions.remove(phone);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DomainResult<usize> {
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at >= cutoff);
        Ok(before - sessions.len())
    }
}
