//! Expired session janitor for periodic store maintenance
//!
//! Expiry is enforced when sessions are read, so the janitor is only about
//! storage hygiene. It keeps expired sessions for a retention period so
//! clients can still be told `Expired` rather than "no verification".

use chrono::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use pv_shared::config::OtpConfig;

use crate::clock::{Clock, SystemClock};
use crate::errors::DomainResult;
use crate::repositories::SessionStore;

/// Configuration for the janitor
#[derive(Debug, Clone)]
pub struct JanitorConfig {
    /// How often to purge (in seconds)
    pub interval_seconds: u64,
    /// How long expired sessions are kept before deletion
    pub retention: Duration,
    /// Whether to run at all
    pub enabled: bool,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            retention: Duration::seconds(3600),
            enabled: true,
        }
    }
}

impl From<&OtpConfig> for JanitorConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            interval_seconds: config.purge_interval_seconds,
            retention: Duration::seconds(config.expired_retention_seconds as i64),
            enabled: config.purge_interval_seconds > 0,
        }
    }
}

/// Background purger of expired sessions
pub struct SessionJanitor<S: SessionStore + 'static> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: JanitorConfig,
}

impl<S: SessionStore + 'static> SessionJanitor<S> {
    /// Create a janitor on the system clock
    pub fn new(store: Arc<S>, config: JanitorConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run a single purge cycle
    pub async fn run_once(&self) -> DomainResult<PurgeResult> {
        if !self.config.enabled {
            return Ok(PurgeResult::default());
        }

        let cutoff = self.clock.now() - self.config.retention;
        let purged = self.store.purge_expired(cutoff).await?;
        if purged > 0 {
            info!(purged = purged, cutoff = %cutoff, "Purged expired verification sessions");
        } else {
            debug!(cutoff = %cutoff, "No expired verification sessions to purge");
        }

        Ok(PurgeResult { purged })
    }

    /// Start the janitor as a background task
    ///
    /// Returns `None` when disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Session janitor is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                "Session janitor started"
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_once().await {
                    error!(error = %e, "Session purge cycle failed");
                }
            }
        }))
    }
}

/// Result of a purge cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeResult {
    /// Sessions deleted
    pub purged: usize,
}
