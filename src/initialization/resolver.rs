//! DNS resolver initialization.
//!
//! This module builds the hickory resolvers used by
//! [`crate::dns::HickoryTransport`], one per nameserver.

use std::net::SocketAddr;
use std::time::Duration;

use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

/// Initializes a resolver that talks to exactly one nameserver over UDP.
///
/// The resolver is configured as a plain exchange client:
/// - no answer cache, so TTLs come straight from the nameserver
/// - a single attempt per query
/// - no hosts file and no search-domain expansion
///
/// # Arguments
///
/// * `nameserver` - Address of the nameserver, usually on port 53
/// * `timeout` - Per-query timeout
pub fn init_nameserver_resolver(nameserver: SocketAddr, timeout: Duration) -> TokioAsyncResolver {
    let mut config = ResolverConfig::new();
    config.add_name_server(NameServerConfig::new(nameserver, Protocol::Udp));

    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 1;
    opts.cache_size = 0;
    opts.use_hosts_file = false;
    // Names are always sent fully qualified
    opts.ndots = 0;

    TokioAsyncResolver::tokio(config, opts)
}
