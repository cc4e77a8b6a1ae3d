//! Mock implementations for testing verification service

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use crate::clock::ManualClock;
use crate::domain::entities::VerificationSession;
use crate::domain::value_objects::{DeliveryChannel, DeliveryReceipt, PhoneNumber};
use crate::errors::{DeliveryError, DomainError, DomainResult};
use crate::repositories::{InMemorySessionStore, SessionStore};
use crate::services::verification::{
    ChannelDispatcher, CodeHasher, VerificationService, VerificationServiceConfig,
};

/// One recorded delivery
#[derive(Debug, Clone)]
pub struct SentCode {
    pub phone: PhoneNumber,
    pub channel: DeliveryChannel,
    pub code: String,
}

// Dispatcher that remembers every code it was asked to deliver
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<SentCode>>,
    pub failure: Mutex<Option<DeliveryError>>,
    pub delay: Option<std::time::Duration>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            delay: None,
        }
    }

    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn fail_with(&self, error: DeliveryError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn last_code(&self) -> String {
        self.sent.lock().unwrap().last().expect("no code sent").code.clone()
    }

    pub fn last(&self) -> SentCode {
        self.sent.lock().unwrap().last().expect("no code sent").clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelDispatcher for RecordingDispatcher {
    async fn send(
        &self,
        destination: &PhoneNumber,
        channel: DeliveryChannel,
        code: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.sent.lock().unwrap().push(SentCode {
            phone: destination.clone(),
            channel,
            code: code.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(DeliveryReceipt {
            message_id: format!("rec-{}", self.sent_count()),
            provider: "recording".to_string(),
            sent_at: Utc::now(),
        })
    }

    fn provider_name(&self) -> &str {
        "recording"
    }
}

// Store whose every operation fails
pub struct FailingStore;

fn offline() -> DomainError {
    DomainError::Internal {
        message: "store offline".to_string(),
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn create(&self, _session: VerificationSession) -> DomainResult<()> {
        Err(offline())
    }

    async fn find(&self, _phone: &PhoneNumber) -> DomainResult<Option<VerificationSession>> {
        Err(offline())
    }

    async fn update<T, F>(&self, _phone: &PhoneNumber, _mutator: F) -> DomainResult<T>
    where
        T: Send,
        F: FnMut(&mut VerificationSession) -> DomainResult<T> + Send,
    {
        Err(offline())
    }

    async fn delete(&self, _phone: &PhoneNumber) -> DomainResult<bool> {
        Err(offline())
    }

    async fn delete_if<P>(&self, _phone: &PhoneNumber, _predicate: P) -> DomainResult<bool>
    where
        P: Fn(&VerificationSession) -> bool + Send + Sync,
    {
        Err(offline())
    }

    async fn purge_expired(&self, _cutoff: DateTime<Utc>) -> DomainResult<usize> {
        Err(offline())
    }
}

pub const PHONE: &str = "+15551234567";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// A code guaranteed to differ from `code`
pub fn wrong(code: &str) -> String {
    code.chars()
        .map(|c| {
            let d = c.to_digit(10).unwrap();
            char::from_digit((d + 1) % 10, 10).unwrap()
        })
        .collect()
}

pub struct Harness {
    pub service: VerificationService<RecordingDispatcher, InMemorySessionStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub store: Arc<InMemorySessionStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(RecordingDispatcher::new(), VerificationServiceConfig::default())
    }

    pub fn with_config(config: VerificationServiceConfig) -> Self {
        Self::with(RecordingDispatcher::new(), config)
    }

    pub fn with(dispatcher: RecordingDispatcher, config: VerificationServiceConfig) -> Self {
        let dispatcher = Arc::new(dispatcher);
        let store = Arc::new(InMemorySessionStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let service = VerificationService::new(
            dispatcher.clone(),
            store.clone(),
            CodeHasher::new("test-secret-with-enough-entropy!").unwrap(),
            config,
        )
        .with_clock(clock.clone());

        Self {
            service,
            dispatcher,
            store,
            clock,
        }
    }

    pub fn advance(&self, seconds: i64) {
        self.clock.advance(chrono::Duration::seconds(seconds));
    }

    pub async fn session(&self) -> VerificationSession {
        self.store
            .find(&PhoneNumber::parse(PHONE).unwrap())
            .await
            .unwrap()
            .expect("session stored")
    }
}
