//! # PhoneVerify Core
//!
//! Core business logic and domain layer for the PhoneVerify backend.
//! This crate contains the verification session entity, the OTP service and
//! its collaborator traits, the session store contract with an in-memory
//! implementation, and the error taxonomy shared by every layer above.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
