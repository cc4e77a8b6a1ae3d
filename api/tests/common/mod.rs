//! Shared fixtures for the HTTP tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use pv_api::AppState;
use pv_core::clock::{Clock, ManualClock};
use pv_core::domain::value_objects::{DeliveryChannel, DeliveryReceipt, PhoneNumber};
use pv_core::errors::DeliveryError;
use pv_core::repositories::InMemorySessionStore;
use pv_core::services::{
    ChannelDispatcher, CodeHasher, VerificationService, VerificationServiceConfig,
};

pub const PHONE: &str = "+15551234567";

/// Dispatcher that keeps the codes so tests can submit them
#[derive(Default)]
pub struct CapturingDispatcher {
    codes: Mutex<Vec<(DeliveryChannel, String)>>,
}

impl CapturingDispatcher {
    pub fn last_code(&self) -> String {
        self.codes.lock().unwrap().last().expect("no code sent").1.clone()
    }

    pub fn last_channel(&self) -> DeliveryChannel {
        self.codes.lock().unwrap().last().expect("no code sent").0
    }

    pub fn count(&self) -> usize {
        self.codes.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelDispatcher for CapturingDispatcher {
    async fn send(
        &self,
        _destination: &PhoneNumber,
        channel: DeliveryChannel,
        code: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.codes.lock().unwrap().push((channel, code.to_string()));
        Ok(DeliveryReceipt {
            message_id: format!("test_{}", self.count()),
            provider: "test".to_string(),
            sent_at: Utc::now(),
        })
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

pub struct TestContext<D: ChannelDispatcher + ?Sized> {
    pub clock: Arc<ManualClock>,
    pub dispatcher: Arc<D>,
    pub state: web::Data<AppState<D, InMemorySessionStore>>,
}

impl<D: ChannelDispatcher + ?Sized> TestContext<D> {
    pub fn advance(&self, seconds: i64) {
        self.clock.advance(Duration::seconds(seconds));
    }
}

pub fn context() -> TestContext<CapturingDispatcher> {
    context_with(Arc::new(CapturingDispatcher::default()))
}

pub fn context_with<D: ChannelDispatcher + ?Sized>(dispatcher: Arc<D>) -> TestContext<D> {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 8, 14, 10, 0, 0).unwrap(),
    ));
    let service = VerificationService::new(
        dispatcher.clone(),
        Arc::new(InMemorySessionStore::new()),
        CodeHasher::new("integration-test-secret-of-sufficient-length").unwrap(),
        VerificationServiceConfig::default(),
    )
    .with_clock(clock.clone() as Arc<dyn Clock>);

    TestContext {
        clock,
        dispatcher,
        state: web::Data::new(AppState::new(Arc::new(service))),
    }
}
