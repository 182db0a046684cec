//! DNS querying.
//!
//! This module provides:
//! - [`Transport`]: one query against one nameserver, plus the OS resolver
//! - [`HickoryTransport`]: the default transport built on `hickory-resolver`
//! - [`NameserverClient`]: A/AAAA resolution with nameserver rotation,
//!   failover and TTL selection, and an uncached SRV lookup
//!
//! There is no deadline across a whole lookup: each exchange is bounded only
//! by the transport's own query timeout.

mod client;
mod transport;

// Re-export public API
pub use client::{effective_ttl, parse_nameservers, HostLookup, NameserverClient};
pub use transport::{Answer, HickoryTransport, QueryType, RecordData, SrvRecord, Transport};

#[cfg(test)]
pub(crate) mod test_helpers;
