//! Shared library for the identicon service
//!
//! Common functionality used by the server and the command line tools:
//! - Configuration loading
//! - Error types
//! - Redis connectivity

pub mod cache;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use cache::RedisService;
pub use config::{CacheBackend, Config};
pub use error::{AppError, Result};
