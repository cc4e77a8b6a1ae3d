//! Mock delivery provider
//!
//! Writes the code to the log instead of sending it. Meant for local
//! development; it can also be told to fail with any `DeliveryError` kind.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use pv_core::domain::value_objects::{DeliveryChannel, DeliveryReceipt, PhoneNumber};
use pv_core::errors::DeliveryError;
use pv_core::services::ChannelDispatcher;

/// Console dispatcher for development and testing
#[derive(Clone, Default)]
pub struct MockDispatcher {
    /// Number of successful deliveries
    message_count: Arc<AtomicU64>,
    /// Failure returned by every send while set
    failure: Arc<Mutex<Option<DeliveryError>>>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with `error`, or succeed again with `None`
    pub fn simulate_failure(&self, error: Option<DeliveryError>) {
        match self.failure.lock() {
            Ok(mut guard) => *guard = error,
            Err(poisoned) => *poisoned.into_inner() = error,
        }
    }

    /// Total number of successful deliveries
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    fn current_failure(&self) -> Option<DeliveryError> {
        match self.failure.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ChannelDispatcher for MockDispatcher {
    async fn send(
        &self,
        destination: &PhoneNumber,
        channel: DeliveryChannel,
        code: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        if let Some(error) = self.current_failure() {
            warn!(
                provider = "mock",
                phone = %destination.masked(),
                kind = error.kind(),
                "Mock provider simulating failure"
            );
            return Err(error);
        }

        let message_id = format!("mock_{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;

        // Development only: the code is the whole point of this provider
        info!(
            provider = "mock",
            phone = %destination.masked(),
            channel = %channel,
            code = code,
            message_id = %message_id,
            count = count,
            "Mock delivery"
        );

        Ok(DeliveryReceipt {
            message_id,
            provider: "mock".to_string(),
            sent_at: Utc::now(),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
