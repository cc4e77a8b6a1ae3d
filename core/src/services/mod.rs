//! Business services containing domain logic and use cases.

pub mod janitor;
pub mod verification;

// Re-export commonly used types
pub use janitor::{JanitorConfig, PurgeResult, SessionJanitor};
pub use verification::{
    generate_code, ChannelDispatcher, CodeHasher, SendCodeResult, VerificationService,
    VerificationServiceConfig, VerificationStatus, VerifyCodeResult,
};
