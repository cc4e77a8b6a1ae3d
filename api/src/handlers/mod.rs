pub mod error;

pub use error::{request_id, ApiError};
