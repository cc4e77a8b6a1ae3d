//! Type definitions shared by the HTTP layer

pub mod health;

pub use health::{HealthResponse, HealthStatus};
