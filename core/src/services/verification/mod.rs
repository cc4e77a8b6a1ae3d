//! Verification service module for phone-number OTP verification
//!
//! This module provides the complete verification code workflow:
//! - Code generation and keyed hashing
//! - Session creation, resend with cooldown and caps
//! - Code verification with attempt tracking
//! - Delivery over a pluggable SMS/voice provider

mod code;
mod config;
mod service;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use code::{generate_code, CodeHasher};
pub use config::VerificationServiceConfig;
pub use service::VerificationService;
pub use traits::ChannelDispatcher;
pub use types::{SendCodeResult, VerificationStatus, VerifyCodeResult};
