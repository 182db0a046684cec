//! Resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - The process logger
//! - Per-nameserver DNS resolvers used by the default transport
//!
//! All initialization functions return proper error types for error handling.

mod logger;
mod resolver;

// Re-export public API
pub use logger::init_logger_with;
pub use resolver::init_nameserver_resolver;
