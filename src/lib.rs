//! dns_cache: a self-refreshing, round-robin DNS cache.
//!
//! This library keeps the A and AAAA records of a set of hostnames in memory and
//! re-resolves each hostname in the background when its TTL runs out. Callers
//! pick addresses round-robin without ever waiting on the network, except for
//! the first lookup of a hostname.
//!
//! - Nameservers are tried in rotation; a failing one is skipped and the next
//!   lookup starts further along the list.
//! - With no nameservers configured, the operating system's resolver is used.
//! - Hostnames are registered explicitly with [`Resolver::add_host`], or
//!   implicitly on first lookup. Implicit hosts that go unused for 30 minutes
//!   are evicted.
//!
//! # Example
//!
//! ```no_run
//! use dns_cache::Resolver;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = Resolver::new("[upstreams]").with_nameservers(["9.9.9.9", "1.1.1.1"]);
//! resolver.add_host("api.example.com");
//!
//! let (ip, idx) = resolver.next_ip_with_index("api.example.com").await;
//! println!("next address: {ip:?} (#{idx})");
//!
//! resolver.dump_prefix(&mut std::io::stdout(), "myapp.")?;
//! resolver.stop();
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Create the [`Resolver`] from within
//! an async context.

#![warn(missing_docs)]

mod cache;
pub mod config;
pub mod dns;
mod error_handling;
pub mod initialization;

// Re-export public API
pub use cache::{AddressSet, Resolver};
pub use config::{CacheConfig, LogFormat, LogLevel};
pub use dns::{HickoryTransport, HostLookup, NameserverClient, SrvRecord, Transport};
pub use error_handling::{
    InitializationError, ResolverError, ResolverEvent, ResolverStats, TransportError,
};
pub use initialization::init_logger_with;
