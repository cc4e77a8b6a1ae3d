//! Twilio Delivery Provider
//!
//! Sends codes through the Twilio REST API with plain `reqwest` form posts:
//! SMS via `Messages.json`, voice via `Calls.json` with inline TwiML that
//! reads the code digit by digit.
//!
//! Provider failures are classified for the caller:
//! - HTTP 429 → `RateLimitedByProvider`
//! - Twilio error 21211/21614/21217, or any other 400 → `InvalidDestination`
//! - 5xx, auth failures, timeouts, network errors → `ProviderUnavailable`

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use pv_core::domain::value_objects::{DeliveryChannel, DeliveryReceipt, PhoneNumber};
use pv_core::errors::DeliveryError;
use pv_core::services::ChannelDispatcher;
use pv_shared::config::otp::CODE_PLACEHOLDER;
use pv_shared::config::TwilioSettings;
use pv_shared::phone::{is_valid_phone, mask_phone_number};

use crate::InfrastructureError;

/// Twilio error codes meaning the `To` number cannot receive the message
pub const INVALID_DESTINATION_CODES: [u32; 3] = [
    21211, // invalid 'To' phone number
    21614, // 'To' number is not a valid mobile number
    21217, // phone number does not appear to be valid
];

/// Error payload returned by the Twilio REST API
#[derive(Debug, Default, Deserialize)]
pub struct TwilioErrorBody {
    pub code: Option<u32>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioResource {
    sid: String,
}

/// Twilio REST dispatcher for SMS and voice
pub struct TwilioDispatcher {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
    message_template: String,
}

impl std::fmt::Debug for TwilioDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioDispatcher")
            .field("account_sid", &self.account_sid)
            .field("from_number", &mask_phone_number(&self.from_number))
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TwilioDispatcher {
    /// Create a new Twilio dispatcher
    ///
    /// # Arguments
    ///
    /// * `settings` - Account SID, auth token, sender number and API base URL
    /// * `message_template` - SMS body containing `{{code}}`
    /// * `timeout` - Upper bound on each HTTP request
    pub fn new(
        settings: &TwilioSettings,
        message_template: String,
        timeout: Duration,
    ) -> Result<Self, InfrastructureError> {
        if settings.account_sid.is_empty() {
            return Err(InfrastructureError::Config("TWILIO_ACCOUNT_SID not set".to_string()));
        }
        if settings.auth_token.is_empty() {
            return Err(InfrastructureError::Config("TWILIO_AUTH_TOKEN not set".to_string()));
        }
        if !settings.from_number.starts_with('+') || !is_valid_phone(&settings.from_number) {
            return Err(InfrastructureError::Config(
                "TWILIO_FROM_NUMBER must be in E.164 format (starting with '+')".to_string(),
            ));
        }
        if !message_template.contains(CODE_PLACEHOLDER) {
            return Err(InfrastructureError::Config(format!(
                "Message template must contain {}",
                CODE_PLACEHOLDER
            )));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let api_base = if settings.api_base.is_empty() {
            pv_shared::config::delivery::TWILIO_API_BASE.to_string()
        } else {
            settings.api_base.trim_end_matches('/').to_string()
        };

        info!(
            provider = "twilio",
            from = %mask_phone_number(&settings.from_number),
            "Twilio dispatcher initialized"
        );

        Ok(Self {
            http,
            account_sid: settings.account_sid.clone(),
            auth_token: settings.auth_token.clone(),
            from_number: settings.from_number.clone(),
            api_base,
            message_template,
        })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/Accounts/{}/{}", self.api_base, self.account_sid, resource)
    }

    /// SMS body for `code`
    pub fn render_sms(&self, code: &str) -> String {
        self.message_template.replace(CODE_PLACEHOLDER, code)
    }
}

/// TwiML for a call that reads `code` twice, one digit at a time
pub fn voice_twiml(code: &str) -> String {
    let spoken = code
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<Response><Say voice=\"alice\">Your verification code is {spoken}. Again, your code is {spoken}.</Say></Response>"
    )
}

/// Classify a failed Twilio response
pub fn map_error(status: StatusCode, body: Option<TwilioErrorBody>) -> DeliveryError {
    let body = body.unwrap_or_default();
    let message = match (body.code, body.message) {
        (Some(code), Some(message)) => format!("Twilio error {}: {}", code, message),
        (None, Some(message)) => message,
        (Some(code), None) => format!("Twilio error {} (HTTP {})", code, status.as_u16()),
        (None, None) => format!("Twilio returned HTTP {}", status.as_u16()),
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        return DeliveryError::RateLimitedByProvider { message };
    }
    if body
        .code
        .map_or(false, |code| INVALID_DESTINATION_CODES.contains(&code))
        || status == StatusCode::BAD_REQUEST
    {
        return DeliveryError::InvalidDestination { message };
    }
    DeliveryError::ProviderUnavailable { message }
}

#[async_trait]
impl ChannelDispatcher for TwilioDispatcher {
    async fn send(
        &self,
        destination: &PhoneNumber,
        channel: DeliveryChannel,
        code: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let (resource, content_key, content) = match channel {
            DeliveryChannel::Sms => ("Messages.json", "Body", self.render_sms(code)),
            DeliveryChannel::Voice => ("Calls.json", "Twiml", voice_twiml(code)),
        };
        let form = [
            ("To", destination.as_str()),
            ("From", self.from_number.as_str()),
            (content_key, content.as_str()),
        ];

        debug!(
            provider = "twilio",
            phone = %destination.masked(),
            channel = %channel,
            "Sending request to Twilio"
        );

        let response = self
            .http
            .post(self.endpoint(resource))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "twilio", error = %e, "Twilio request failed");
                DeliveryError::ProviderUnavailable {
                    message: if e.is_timeout() {
                        "Twilio request timed out".to_string()
                    } else {
                        format!("Twilio request failed: {}", e)
                    },
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<TwilioErrorBody>().await.ok();
            let failure = map_error(status, body);
            warn!(
                provider = "twilio",
                phone = %destination.masked(),
                status = status.as_u16(),
                kind = failure.kind(),
                error = %failure,
                "Twilio rejected request"
            );
            return Err(failure);
        }

        let resource = response.json::<TwilioResource>().await.map_err(|e| {
            DeliveryError::ProviderUnavailable {
                message: format!("Unreadable Twilio response: {}", e),
            }
        })?;

        Ok(DeliveryReceipt {
            message_id: resource.sid,
            provider: "twilio".to_string(),
            sent_at: Utc::now(),
        })
    }

    fn provider_name(&self) -> &str {
        "twilio"
    }
}
