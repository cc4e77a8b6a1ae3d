//! Delivery Provider Module
//!
//! Concrete `ChannelDispatcher` implementations for sending verification
//! codes by SMS or voice call.
//!
//! ## Providers
//!
//! - **mock**: logs the code to the console, for development
//! - **twilio**: Twilio REST API, `Messages.json` for SMS and `Calls.json`
//!   with inline TwiML for voice

use std::sync::Arc;
use std::time::Duration;

use pv_core::services::ChannelDispatcher;
use pv_shared::config::{DeliveryConfig, OtpConfig};

pub mod mock;
pub mod twilio;

pub use mock::MockDispatcher;
pub use twilio::TwilioDispatcher;


/// Create the dispatcher named by `DELIVERY_PROVIDER`
///
/// Unknown providers and incomplete Twilio credentials are configuration
/// errors; there is no silent fallback to the mock in any environment.
///
/// # Arguments
///
/// * `delivery` - Provider selection and credentials
/// * `otp` - Supplies the SMS template and the per-call timeout
pub fn create_dispatcher(
    delivery: &DeliveryConfig,
    otp: &OtpConfig,
) -> Result<Arc<dyn ChannelDispatcher>, crate::InfrastructureError> {
    match delivery.provider.as_str() {
        "mock" => {
            tracing::warn!("Using mock delivery provider; codes are only written to the log");
            Ok(Arc::new(MockDispatcher::new()))
        }
        "twilio" => {
            let dispatcher = TwilioDispatcher::new(
                &delivery.twilio,
                otp.message_template.clone(),
                Duration::from_secs(otp.dispatch_timeout_seconds),
            )?;
            Ok(Arc::new(dispatcher))
        }
        other => Err(crate::InfrastructureError::Config(format!(
            "Unknown delivery provider '{}', expected \"mock\" or \"twilio\"",
            other
        ))),
    }
}
