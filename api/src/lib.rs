//! # PhoneVerify API
//!
//! actix-web adapter over `pv_core::VerificationService`: request DTOs,
//! route handlers, error-to-status mapping, per-IP throttling and the
//! application factory used by both the binary and the integration tests.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod telemetry;

pub use app::{create_app, AppState};
