//! Traits for delivery provider integration

use async_trait::async_trait;

use crate::domain::value_objects::{DeliveryChannel, DeliveryReceipt, PhoneNumber};
use crate::errors::DeliveryError;

/// Sends a code to a phone number over SMS or a voice call
///
/// Implementations talk to one provider. They never see session state and
/// must not retry indefinitely: the service bounds each call with a timeout.
#[async_trait]
pub trait ChannelDispatcher: Send + Sync {
    /// Deliver `code` to `destination` over `channel`
    async fn send(
        &self,
        destination: &PhoneNumber,
        channel: DeliveryChannel,
        code: &str,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    /// Provider name used in logs and receipts
    fn provider_name(&self) -> &str;
}
