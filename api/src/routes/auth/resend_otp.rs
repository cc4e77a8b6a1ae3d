use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use pv_core::repositories::SessionStore;
use pv_core::services::ChannelDispatcher;
use pv_shared::phone::mask_phone_number;

use crate::app::AppState;
use crate::dto::{ResendOtpRequest, SendOtpResponse};
use crate::handlers::{request_id, ApiError};

/// Handler for POST /api/auth/resend-otp
///
/// Issues a fresh code for the pending verification; the previous code
/// stops working. Without `method` the last channel is reused.
///
/// ## Errors
/// - 400 `VALIDATION_ERROR`, `INVALID_PHONE_NUMBER`
/// - 404 `NO_PENDING_VERIFICATION`
/// - 410 `VERIFICATION_EXPIRED`
/// - 429 `RESEND_TOO_SOON`, `SEND_LIMIT_EXCEEDED` (with `Retry-After`),
///   `RESEND_LIMIT_EXCEEDED`
pub async fn resend_otp<D, S>(
    req: HttpRequest,
    state: web::Data<AppState<D, S>>,
    body: web::Json<ResendOtpRequest>,
) -> Result<HttpResponse, ApiError>
where
    D: ChannelDispatcher + ?Sized + 'static,
    S: SessionStore + 'static,
{
    let request_id = request_id(&req);
    let body = body.into_inner();

    if let Err(errors) = body.validate() {
        tracing::warn!(request_id = %request_id, errors = ?errors, "Invalid resend-otp request");
        return Err(ApiError::validation(&errors, request_id));
    }

    tracing::info!(
        request_id = %request_id,
        phone = %mask_phone_number(&body.phone_number),
        "Processing resend-otp request"
    );

    let result = state
        .service
        .resend(&body.phone_number, body.channel())
        .await
        .map_err(|e| ApiError::domain(e, request_id.clone()))?;

    Ok(HttpResponse::Ok()
        .insert_header(("X-Request-ID", request_id))
        .json(SendOtpResponse::from(result)))
}
