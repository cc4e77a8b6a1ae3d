//! Cache module for Redis-backed session storage
//!
//! This module provides a Redis client with retry logic and the
//! `SessionStore` implementation built on it.

pub mod redis_client;
pub mod session_store;

#[cfg(test)]
mod tests;

pub use redis_client::RedisClient;
pub use session_store::RedisSessionStore;

// Re-export commonly used types
pub use pv_shared::config::CacheConfig;
