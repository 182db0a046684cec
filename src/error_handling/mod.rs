//! Error handling and resolver statistics.
//!
//! This module provides:
//! - Error type definitions for the resolver, its transport and logger setup
//! - Event counters describing what the cache has been doing
//!
//! Network failures are handled internally wherever possible (nameserver
//! failover, refresh retry). Public accessors never return an error: an
//! unknown or unresolved host simply has no addresses.

mod stats;
mod types;

// Re-export public API
pub use stats::ResolverStats;
pub use types::{InitializationError, ResolverError, ResolverEvent, TransportError};
