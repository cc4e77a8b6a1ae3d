use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use pv_core::repositories::SessionStore;
use pv_core::services::ChannelDispatcher;
use pv_shared::phone::mask_phone_number;

use crate::app::AppState;
use crate::dto::{SendOtpRequest, SendOtpResponse};
use crate::handlers::{request_id, ApiError};

/// Handler for POST /api/auth/send-otp
///
/// Starts a new verification, superseding any pending one for the number.
///
/// # Request Body
///
/// ```json
/// {
///     "phone_number": "+15551234567",
///     "method": "sms"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "success": true,
///     "message": "Verification code sent via SMS",
///     "expires_at": "2025-08-14T10:10:00Z",
///     "resend_available_in": 60,
///     "method": "sms"
/// }
/// ```
///
/// A provider failure still returns 200 with a `delivery_warning`; the
/// session exists and the client may resend once the cooldown passes.
///
/// ## Errors
/// - 400 `VALIDATION_ERROR`, `INVALID_PHONE_NUMBER`
/// - 429 `SEND_LIMIT_EXCEEDED` (with `Retry-After`)
pub async fn send_otp<D, S>(
    req: HttpRequest,
    state: web::Data<AppState<D, S>>,
    body: web::Json<SendOtpRequest>,
) -> Result<HttpResponse, ApiError>
where
    D: ChannelDispatcher + ?Sized + 'static,
    S: SessionStore + 'static,
{
    let request_id = request_id(&req);
    let body = body.into_inner();

    if let Err(errors) = body.validate() {
        tracing::warn!(request_id = %request_id, errors = ?errors, "Invalid send-otp request");
        return Err(ApiError::validation(&errors, request_id));
    }

    tracing::info!(
        request_id = %request_id,
        phone = %mask_phone_number(&body.phone_number),
        method = ?body.method,
        "Processing send-otp request"
    );

    let result = state
        .service
        .send(&body.phone_number, body.channel())
        .await
        .map_err(|e| ApiError::domain(e, request_id.clone()))?;

    Ok(HttpResponse::Ok()
        .insert_header(("X-Request-ID", request_id))
        .json(SendOtpResponse::from(result)))
}
