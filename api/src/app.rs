//! Application state and factory
//!
//! This module holds the shared state handed to every handler and builds
//! the Actix-web application around it.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error, HttpRequest, HttpResponse,
};
use tracing_actix_web::TracingLogger;

use pv_core::repositories::SessionStore;
use pv_core::services::{ChannelDispatcher, VerificationService};
use pv_shared::errors::{error_codes, ErrorResponse};

use crate::handlers::{request_id, ApiError};
use crate::middleware::IpRateLimiter;
use crate::routes::auth::{resend_otp, send_otp, verification_status, verify_otp};
use crate::routes::health::health;

/// Application state that holds shared services
pub struct AppState<D: ChannelDispatcher + ?Sized, S: SessionStore> {
    pub service: Arc<VerificationService<D, S>>,
}

impl<D: ChannelDispatcher + ?Sized, S: SessionStore> AppState<D, S> {
    pub fn new(service: Arc<VerificationService<D, S>>) -> Self {
        Self { service }
    }
}

/// Create and configure the application
///
/// `limiter` guards the code-issuing routes; pass `IpRateLimiter::disabled()`
/// to turn the per-IP throttle off. The same limiter must be handed to every
/// worker so they share counters.
pub fn create_app<D, S>(
    state: web::Data<AppState<D, S>>,
    limiter: IpRateLimiter,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    D: ChannelDispatcher + ?Sized + 'static,
    S: SessionStore + 'static,
{
    let json_config = web::JsonConfig::default()
        .limit(4096)
        .error_handler(|err, req| ApiError::malformed(err.to_string(), request_id(req)).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, req| ApiError::malformed(err.to_string(), request_id(req)).into());

    App::new()
        .app_data(state)
        .app_data(json_config)
        .app_data(query_config)
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health))
        .service(
            web::scope("/api/auth")
                .service(
                    web::resource("/send-otp")
                        .wrap(limiter.clone())
                        .route(web::post().to(send_otp::<D, S>)),
                )
                .service(
                    web::resource("/resend-otp")
                        .wrap(limiter)
                        .route(web::post().to(resend_otp::<D, S>)),
                )
                .route("/verify-otp", web::post().to(verify_otp::<D, S>))
                .route(
                    "/verification-status",
                    web::get().to(verification_status::<D, S>),
                ),
        )
        .default_service(web::to(not_found))
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::new(error_codes::NOT_FOUND, "The requested resource was not found")
            .with_request_id(request_id(&req)),
    )
}
