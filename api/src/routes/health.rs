use actix_web::HttpResponse;
use pv_shared::HealthResponse;

/// Liveness check
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::healthy(
        "phone-verify-api",
        env!("CARGO_PKG_VERSION"),
    ))
}
