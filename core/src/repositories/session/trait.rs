//! Session store trait defining the persistence contract for verification sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::VerificationSession;
use crate::domain::value_objects::PhoneNumber;
use crate::errors::DomainResult;

/// Keyed store of verification sessions, one per normalized phone number
///
/// Implementations must serialize mutations of a single phone number's
/// session: `update` is an atomic read-modify-write (lock or
/// compare-and-swap), so two concurrent verifies can never both observe
/// `attempts < max_attempts` and both increment past the cap. Operations on
/// different phone numbers are independent.
///
/// Stores keep expired sessions around (until purged) so callers can tell
/// `Expired` apart from "never existed"; `get` hides them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert `session`, atomically replacing any previous session for the
    /// same phone number
    ///
    /// There is no window in which both the old and the new code are stored.
    async fn create(&self, session: VerificationSession) -> DomainResult<()>;

    /// Live session for `phone`
    ///
    /// # Returns
    /// * `Ok(None)` - No session, or its TTL has elapsed at `now`
    async fn get(
        &self,
        phone: &PhoneNumber,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<VerificationSession>> {
        Ok(self.find(phone).await?.filter(|s| !s.is_expired(now)))
    }

    /// Stored session for `phone`, expired or not
    async fn find(&self, phone: &PhoneNumber) -> DomainResult<Option<VerificationSession>>;

    /// Atomically apply `mutator` to the stored session
    ///
    /// The mutator may run more than once if a concurrent writer wins a race,
    /// always against the latest stored state. When it returns `Err` nothing
    /// is written and the error is returned; when it leaves the session
    /// unchanged nothing is written either.
    ///
    /// # Returns
    /// * `Ok(T)` - Whatever the mutator returned, after the write landed
    /// * `Err(DomainError::Otp(NoPendingVerification))` - No stored session
    async fn update<T, F>(&self, phone: &PhoneNumber, mutator: F) -> DomainResult<T>
    where
        T: Send,
        F: FnMut(&mut VerificationSession) -> DomainResult<T> + Send;

    /// Remove the session for `phone`
    ///
    /// # Returns
    /// * `Ok(true)` - A session was removed
    /// * `Ok(false)` - Nothing was stored
    async fn delete(&self, phone: &PhoneNumber) -> DomainResult<bool>;

    /// Remove the session only if `predicate` holds for the stored value,
    /// atomically with respect to `create` and `update`
    async fn delete_if<P>(&self, phone: &PhoneNumber, predicate: P) -> DomainResult<bool>
    where
        P: Fn(&VerificationSession) -> bool + Send + Sync;

    /// Drop every session whose `expires_at` is before `cutoff`
    ///
    /// Stores that expire entries on their own may return `Ok(0)`.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DomainResult<usize>;
}
