//! LitGraph Common Library
//!
//! Shared code for the LitGraph engine and gateway:
//! - Error types and handling
//! - Configuration management
//! - Database pool, typed rows and the corpus repository
//! - Metrics and observability
//! - Redis cache for finished graph exports

pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
