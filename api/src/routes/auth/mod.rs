//! OTP verification route handlers
//!
//! - `POST /api/auth/send-otp` starts a verification
//! - `POST /api/auth/resend-otp` reissues the code
//! - `POST /api/auth/verify-otp` checks a submitted code
//! - `GET /api/auth/verification-status` reports the live session

pub mod resend_otp;
pub mod send_otp;
pub mod status;
pub mod verify_otp;

pub use resend_otp::resend_otp;
pub use send_otp::send_otp;
pub use status::verification_status;
pub use verify_otp::verify_otp;
