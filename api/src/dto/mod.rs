pub mod otp;

pub use otp::*;
pub use pv_shared::errors::ErrorResponse;
