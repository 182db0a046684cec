//! Cache configuration and constants.
//!
//! This module provides:
//! - Configuration constants (TTL floor, retry and sweep intervals, port)
//! - The [`CacheConfig`] struct built from those constants
//! - Logging level and format options

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{CacheConfig, LogFormat, LogLevel};
