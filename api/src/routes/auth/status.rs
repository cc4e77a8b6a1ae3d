use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use pv_core::repositories::SessionStore;
use pv_core::services::ChannelDispatcher;

use crate::app::AppState;
use crate::dto::{StatusQuery, VerificationStatusResponse};
use crate::handlers::{request_id, ApiError};

/// Handler for GET /api/auth/verification-status?phone_number=...
///
/// Read-only; never counts as an attempt.
///
/// ## Errors
/// - 400 `VALIDATION_ERROR`, `INVALID_PHONE_NUMBER`
/// - 404 `NO_PENDING_VERIFICATION`
/// - 410 `VERIFICATION_EXPIRED`
pub async fn verification_status<D, S>(
    req: HttpRequest,
    state: web::Data<AppState<D, S>>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, ApiError>
where
    D: ChannelDispatcher + ?Sized + 'static,
    S: SessionStore + 'static,
{
    let request_id = request_id(&req);
    let query = query.into_inner();

    if let Err(errors) = query.validate() {
        return Err(ApiError::validation(&errors, request_id));
    }

    let status = state
        .service
        .status(&query.phone_number)
        .await
        .map_err(|e| ApiError::domain(e, request_id.clone()))?;

    Ok(HttpResponse::Ok()
        .insert_header(("X-Request-ID", request_id))
        .json(VerificationStatusResponse::from(status)))
}
