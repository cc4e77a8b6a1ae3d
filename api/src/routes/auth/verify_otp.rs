use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use pv_core::repositories::SessionStore;
use pv_core::services::{ChannelDispatcher, VerifyCodeResult};
use pv_shared::phone::mask_phone_number;

use crate::app::AppState;
use crate::dto::{VerifyOtpRequest, VerifyOtpResponse};
use crate::handlers::{request_id, ApiError};

/// Handler for POST /api/auth/verify-otp
///
/// # Request Body
///
/// ```json
/// {
///     "phone_number": "+15551234567",
///     "code": "482913"
/// }
/// ```
///
/// # Response
///
/// A wrong code is not an error: the body carries `verified: false` and the
/// attempts left.
///
/// ```json
/// {
///     "verified": false,
///     "message": "Invalid verification code",
///     "attempts_remaining": 3
/// }
/// ```
///
/// ## Errors
/// - 400 `VALIDATION_ERROR`, `INVALID_PHONE_NUMBER`, `INVALID_CODE_FORMAT`
/// - 404 `NO_PENDING_VERIFICATION`
/// - 410 `VERIFICATION_EXPIRED`
/// - 429 `ATTEMPTS_EXCEEDED`
pub async fn verify_otp<D, S>(
    req: HttpRequest,
    state: web::Data<AppState<D, S>>,
    body: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse, ApiError>
where
    D: ChannelDispatcher + ?Sized + 'static,
    S: SessionStore + 'static,
{
    let request_id = request_id(&req);
    let body = body.into_inner();

    if let Err(errors) = body.validate() {
        tracing::warn!(request_id = %request_id, errors = ?errors, "Invalid verify-otp request");
        return Err(ApiError::validation(&errors, request_id));
    }

    tracing::info!(
        request_id = %request_id,
        phone = %mask_phone_number(&body.phone_number),
        "Processing verify-otp request"
    );

    let result = state
        .service
        .verify(&body.phone_number, &body.code)
        .await
        .map_err(|e| ApiError::domain(e, request_id.clone()))?;

    Ok(HttpResponse::Ok()
        .insert_header(("X-Request-ID", request_id))
        .json(to_response(result)))
}

fn to_response(result: VerifyCodeResult) -> VerifyOtpResponse {
    let message = if result.already_verified {
        "Phone number already verified"
    } else if result.verified {
        "Phone number verified"
    } else {
        "Invalid verification code"
    };
    VerifyOtpResponse {
        verified: result.verified,
        message: message.to_string(),
        attempts_remaining: result.attempts_remaining,
    }
}
