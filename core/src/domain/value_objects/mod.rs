//! Value objects used by the verification domain.

pub mod delivery;
pub mod phone_number;

pub use delivery::{DeliveryChannel, DeliveryReceipt};
pub use phone_number::PhoneNumber;
