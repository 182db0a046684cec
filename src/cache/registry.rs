//! Hostname registry.
//!
//! [`Resolver`] maps hostnames to their cache entries. Entries are created
//! explicitly with [`Resolver::add_host`] or implicitly by the first lookup of
//! an unknown hostname. Implicit entries that have not been read for a while
//! are evicted by a periodic sweep.

use std::collections::HashMap;
use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info};
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use super::host::HostEntry;
use crate::config::{CacheConfig, DUMP_KEY_ROOT};
use crate::dns::{HickoryTransport, NameserverClient, SrvRecord, Transport};
use crate::error_handling::{ResolverError, ResolverEvent, ResolverStats};

/// Self-refreshing DNS cache.
///
/// Every known hostname has a background task that re-resolves it when its
/// records' TTL runs out. Lookups are served from memory and never wait on the
/// network, except for the very first lookup of a hostname, which waits for
/// its first resolution attempt.
///
/// A `Resolver` must be created inside a Tokio runtime. Dropping it stops
/// every background task.
///
/// # Example
///
/// ```no_run
/// use dns_cache::Resolver;
///
/// # #[tokio::main]
/// # async fn main() {
/// let resolver = Resolver::new("[dns]").with_nameservers(["1.1.1.1", "8.8.8.8"]);
/// resolver.add_host("example.com");
///
/// if let Some(ip) = resolver.next_ip("example.com").await {
///     println!("connecting to {ip}");
/// }
/// resolver.stop();
/// # }
/// ```
pub struct Resolver {
    inner: Arc<Inner>,
    sweeper: CancellationToken,
}

struct Inner {
    tag: Arc<str>,
    config: CacheConfig,
    client: Arc<NameserverClient>,
    stats: Arc<ResolverStats>,
    hosts: RwLock<Hosts>,
}

struct Hosts {
    entries: HashMap<String, Arc<HostEntry>>,
    // Parent of every entry's token; replaced on stop
    lifetime: CancellationToken,
}

impl Resolver {
    /// Creates a resolver with the default configuration and the hickory transport.
    ///
    /// Until nameservers are configured, hostnames are resolved through the
    /// operating system's resolver.
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_config(tag, CacheConfig::default())
    }

    /// Creates a resolver with `config` and the hickory transport.
    pub fn with_config(tag: impl Into<String>, config: CacheConfig) -> Self {
        let transport = Arc::new(HickoryTransport::new(config.query_timeout));
        Self::with_transport(tag, config, transport)
    }

    /// Creates a resolver that sends its queries through `transport`.
    ///
    /// `config` is [normalized](CacheConfig::normalized) first.
    pub fn with_transport(
        tag: impl Into<String>,
        config: CacheConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let tag: Arc<str> = Arc::from(tag.into());
        let config = config.normalized();
        let stats = Arc::new(ResolverStats::new());
        let client = Arc::new(NameserverClient::new(
            Arc::clone(&tag),
            &config,
            transport,
            Arc::clone(&stats),
        ));

        let inner = Arc::new(Inner {
            tag,
            config,
            client,
            stats,
            hosts: RwLock::new(Hosts {
                entries: HashMap::new(),
                lifetime: CancellationToken::new(),
            }),
        });

        let sweeper = CancellationToken::new();
        tokio::spawn(sweep_loop(Arc::clone(&inner), sweeper.clone()));

        Self { inner, sweeper }
    }

    /// Sets the nameservers and returns the resolver, builder style.
    ///
    /// Entries that are not literal IP addresses are logged and skipped.
    pub fn with_nameservers<I, S>(self, nameservers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_nameservers(nameservers);
        self
    }

    /// Replaces the nameservers used by every subsequent refresh.
    pub fn set_nameservers<I, S>(&self, nameservers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.client.set_nameservers(nameservers);
    }

    /// Registers `host` explicitly. Explicit hosts are never evicted.
    ///
    /// Registering a known hostname does nothing.
    pub fn add_host(&self, host: &str) {
        let mut hosts = self.inner.write_hosts();
        if hosts.entries.contains_key(host) {
            return;
        }
        info!("{} Start resolving host {}", self.inner.tag, host);
        let entry = self.inner.spawn_entry(&hosts, host, true);
        hosts.entries.insert(host.to_string(), entry);
    }

    /// Forgets `host` and stops its refresh task.
    pub fn del_host(&self, host: &str) {
        let removed = self.inner.write_hosts().entries.remove(host);
        if let Some(entry) = removed {
            entry.stop();
        }
    }

    /// Next IPv4 address of `host` in round-robin order.
    ///
    /// Unknown hostnames are registered implicitly and resolved first.
    /// Returns `None` if the host has no IPv4 address.
    pub async fn next_ip(&self, host: &str) -> Option<Ipv4Addr> {
        self.next_ip_with_index(host).await.0
    }

    /// Like [`next_ip`](Self::next_ip), also returning the address' position
    /// in the host's list (0 when there is no address).
    pub async fn next_ip_with_index(&self, host: &str) -> (Option<Ipv4Addr>, usize) {
        self.inner.host_or_create(host).next_v4_with_index().await
    }

    /// Next IPv6 address of `host` in round-robin order.
    ///
    /// Unknown hostnames are registered implicitly and resolved first.
    pub async fn next_ip6(&self, host: &str) -> Option<Ipv6Addr> {
        self.next_ip6_with_index(host).await.0
    }

    /// Like [`next_ip6`](Self::next_ip6), also returning the address' position.
    pub async fn next_ip6_with_index(&self, host: &str) -> (Option<Ipv6Addr>, usize) {
        self.inner.host_or_create(host).next_v6_with_index().await
    }

    /// All cached addresses of a known host.
    ///
    /// Unknown hostnames yield two empty lists and are not registered.
    pub async fn ips(&self, host: &str) -> (Vec<Ipv4Addr>, Vec<Ipv6Addr>) {
        match self.inner.get(host) {
            Some(entry) => entry.addresses().await,
            None => (Vec::new(), Vec::new()),
        }
    }

    /// [`ips`](Self::ips) rendered as strings.
    pub async fn ips_str(&self, host: &str) -> (Vec<String>, Vec<String>) {
        let (v4, v6) = self.ips(host).await;
        (
            v4.iter().map(ToString::to_string).collect(),
            v6.iter().map(ToString::to_string).collect(),
        )
    }

    /// Uncached SRV lookup of `_service._proto.name`.
    ///
    /// # Errors
    ///
    /// Fails if no nameserver is configured or the query fails.
    pub async fn lookup_srv(
        &self,
        service: &str,
        proto: &str,
        name: &str,
    ) -> Result<Vec<SrvRecord>, ResolverError> {
        self.inner.client.lookup_srv(service, proto, name).await
    }

    /// Writes every cached address, one `key: value` line each.
    ///
    /// See [`dump_prefix`](Self::dump_prefix).
    pub fn dump<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.dump_prefix(w, "")
    }

    /// Writes every cached address as
    /// `<prefix>resolver.v4.<hostname>.<index>: <address>` (and `v6`).
    ///
    /// Hostnames are sorted, and so are the addresses of each family, so the
    /// output is stable between calls while the cache does not change.
    pub fn dump_prefix<W: Write>(&self, w: &mut W, prefix: &str) -> std::io::Result<()> {
        let mut entries: Vec<(String, Arc<HostEntry>)> = self
            .inner
            .read_hosts()
            .entries
            .iter()
            .map(|(name, entry)| (name.clone(), Arc::clone(entry)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, entry) in entries {
            let (v4, v6) = entry.snapshot();
            write_family(w, prefix, "v4", &name, &v4)?;
            write_family(w, prefix, "v6", &name, &v6)?;
        }
        Ok(())
    }

    /// Stops every background task and forgets every hostname.
    ///
    /// Later lookups start from scratch: hostnames are registered implicitly
    /// again and wait for a fresh first resolution. Eviction does not run
    /// after `stop`.
    pub fn stop(&self) {
        self.sweeper.cancel();
        let stopped = {
            let mut hosts = self.inner.write_hosts();
            let old = std::mem::replace(&mut hosts.lifetime, CancellationToken::new());
            old.cancel();
            let count = hosts.entries.len();
            for entry in hosts.entries.values() {
                entry.stop();
            }
            hosts.entries.clear();
            count
        };
        info!("{} Stopped resolver, dropped {} hosts", self.inner.tag, stopped);
        self.inner.stats.log_summary(&self.inner.tag);
    }

    /// Known hostnames, sorted.
    pub fn hosts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read_hosts().entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `host` is registered as an explicit host.
    pub fn is_explicit(&self, host: &str) -> bool {
        self.inner
            .get(host)
            .map(|entry| entry.is_explicit())
            .unwrap_or(false)
    }

    /// Event counters for this resolver.
    pub fn stats(&self) -> Arc<ResolverStats> {
        Arc::clone(&self.inner.stats)
    }

    /// Evicts implicit hosts that have not been read within the configured
    /// inactivity period. Returns the evicted hostnames.
    ///
    /// This runs periodically on its own; calling it directly forces a sweep.
    pub fn sweep_stale(&self) -> Vec<String> {
        self.inner.sweep_stale()
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        self.sweeper.cancel();
        self.inner.read_hosts().lifetime.cancel();
    }
}

impl Inner {
    fn read_hosts(&self) -> RwLockReadGuard<'_, Hosts> {
        self.hosts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_hosts(&self) -> RwLockWriteGuard<'_, Hosts> {
        self.hosts.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, host: &str) -> Option<Arc<HostEntry>> {
        self.read_hosts().entries.get(host).cloned()
    }

    fn spawn_entry(&self, hosts: &Hosts, host: &str, explicit: bool) -> Arc<HostEntry> {
        HostEntry::spawn(
            Arc::clone(&self.tag),
            host.to_string(),
            explicit,
            Arc::clone(&self.client),
            self.config.retry_interval,
            hosts.lifetime.child_token(),
        )
    }

    /// Returns the entry for `host`, creating an implicit one if needed.
    ///
    /// Double-checked under the write lock so racing first lookups share one entry.
    fn host_or_create(&self, host: &str) -> Arc<HostEntry> {
        if let Some(entry) = self.get(host) {
            return entry;
        }

        let mut hosts = self.write_hosts();
        if let Some(entry) = hosts.entries.get(host) {
            return Arc::clone(entry);
        }
        debug!("{} Implicitly resolving host {}", self.tag, host);
        let entry = self.spawn_entry(&hosts, host, false);
        hosts.entries.insert(host.to_string(), Arc::clone(&entry));
        entry
    }

    fn sweep_stale(&self) -> Vec<String> {
        let stale_after = self.config.stale_after;
        let candidates: Vec<String> = self
            .read_hosts()
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_evictable(stale_after))
            .map(|(name, _)| name.clone())
            .collect();
        if candidates.is_empty() {
            return candidates;
        }

        let mut removed = Vec::with_capacity(candidates.len());
        {
            let mut hosts = self.write_hosts();
            for name in candidates {
                // Skip hosts read again since the scan
                let evict = hosts
                    .entries
                    .get(&name)
                    .is_some_and(|entry| entry.is_evictable(stale_after));
                if !evict {
                    continue;
                }
                if let Some(entry) = hosts.entries.remove(&name) {
                    entry.stop();
                    self.stats.increment(ResolverEvent::HostEvicted);
                    removed.push(name);
                }
            }
        }

        if !removed.is_empty() {
            removed.sort();
            info!("{} Removed old hosts: {:?}", self.tag, removed);
        }
        removed
    }
}

async fn sweep_loop(inner: Arc<Inner>, shutdown: CancellationToken) {
    let period = inner.config.sweep_interval;
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                inner.sweep_stale();
            }
            _ = shutdown.cancelled() => {
                debug!("{} Stale host sweep shutting down", inner.tag);
                break;
            }
        }
    }
}

fn write_family<W: Write, A: ToString>(
    w: &mut W,
    prefix: &str,
    family: &str,
    host: &str,
    addrs: &[A],
) -> std::io::Result<()> {
    let mut rendered: Vec<String> = addrs.iter().map(ToString::to_string).collect();
    rendered.sort();
    for (idx, addr) in rendered.iter().enumerate() {
        writeln!(w, "{prefix}{DUMP_KEY_ROOT}.{family}.{host}.{idx}: {addr}")?;
    }
    Ok(())
}
