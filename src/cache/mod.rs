//! In-memory address cache.
//!
//! This module provides:
//! - [`AddressSet`]: round-robin list of addresses for one family
//! - `HostEntry`: the cached addresses of one hostname and the task keeping them fresh
//! - [`Resolver`]: the hostname registry callers talk to
//!
//! Locking: the registry map, the nameserver list and each address list have
//! their own reader/writer lock. Round-robin cursors and the nameserver
//! rotation counter are plain atomics outside those locks.

mod address_set;
mod host;
mod registry;

// Re-export public API
pub use address_set::AddressSet;
pub use registry::Resolver;
