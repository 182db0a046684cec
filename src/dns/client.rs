//! Nameserver client with rotation and failover.
//!
//! [`NameserverClient`] resolves a hostname's A and AAAA records against one
//! nameserver at a time. Failed attempts advance a rotation counter shared by
//! every lookup, so the next lookup (for any host) starts one nameserver
//! further along.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, warn};

use super::transport::{Answer, QueryType, RecordData, SrvRecord, Transport};
use crate::config::CacheConfig;
use crate::error_handling::{ResolverError, ResolverEvent, ResolverStats};

/// Result of resolving one hostname.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostLookup {
    /// IPv4 addresses, in answer order
    pub v4: Vec<Ipv4Addr>,
    /// IPv6 addresses, in answer order
    pub v6: Vec<Ipv6Addr>,
    /// Seconds until the result should be refreshed
    pub ttl: u32,
}

/// Resolves hostnames against a rotating list of nameservers.
pub struct NameserverClient {
    tag: Arc<str>,
    nameservers: RwLock<Vec<IpAddr>>,
    rotation: AtomicUsize,
    transport: Arc<dyn Transport>,
    default_ttl: u32,
    dns_port: u16,
    stats: Arc<ResolverStats>,
}

impl NameserverClient {
    /// Creates a client with no nameservers; lookups go to the OS resolver
    /// until [`set_nameservers`](Self::set_nameservers) is called.
    pub fn new(
        tag: Arc<str>,
        config: &CacheConfig,
        transport: Arc<dyn Transport>,
        stats: Arc<ResolverStats>,
    ) -> Self {
        Self {
            tag,
            nameservers: RwLock::new(Vec::new()),
            rotation: AtomicUsize::new(0),
            transport,
            default_ttl: config.default_ttl_secs(),
            dns_port: config.dns_port,
            stats,
        }
    }

    /// Replaces the nameserver list.
    ///
    /// Entries that are not literal IP addresses are logged and dropped.
    /// Lookups already in flight keep the snapshot they started with.
    pub fn set_nameservers<I, S>(&self, nameservers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = parse_nameservers(&self.tag, nameservers);
        *self
            .nameservers
            .write()
            .unwrap_or_else(PoisonError::into_inner) = parsed;
    }

    /// Current nameserver list.
    pub fn nameservers(&self) -> Vec<IpAddr> {
        self.nameservers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shared event counters.
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Resolves `host` to its IPv4 and IPv6 addresses plus an effective TTL.
    ///
    /// With no nameservers configured the OS resolver is used and the TTL is
    /// the default. If the OS resolver fails the result is empty and still
    /// `Ok`: callers cannot observe that failure through the error channel.
    ///
    /// Otherwise each configured nameserver is tried at most once, starting
    /// at the shared rotation position.
    ///
    /// # Errors
    ///
    /// Returns the last [`ResolverError::Query`] if every nameserver failed.
    pub async fn lookup_host(&self, host: &str) -> Result<HostLookup, ResolverError> {
        let count = self.read_len();
        if count == 0 {
            return Ok(self.lookup_system(host).await);
        }

        let mut last_error = None;
        for _ in 0..count {
            let Some(nameserver) = self.current_nameserver() else {
                break;
            };
            match self.dual_query(nameserver, host).await {
                Ok(found) => return Ok(found),
                Err(e) => {
                    debug!("{} lookup of {} via {} failed: {}", self.tag, host, nameserver, e);
                    self.stats.increment(ResolverEvent::NameserverFailover);
                    self.rotation.fetch_add(1, Ordering::Relaxed);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ResolverError::NoNameservers))
    }

    /// Looks up SRV records for `_service._proto.name` against the nameserver
    /// at the current rotation position. Results are not cached.
    ///
    /// Records are sorted by priority (lower first), then by weight (higher first).
    /// When both `service` and `proto` are empty, `name` is queried as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NoNameservers`] if no nameserver is configured,
    /// or [`ResolverError::Query`] if the exchange fails.
    pub async fn lookup_srv(
        &self,
        service: &str,
        proto: &str,
        name: &str,
    ) -> Result<Vec<SrvRecord>, ResolverError> {
        let nameserver = self
            .current_nameserver()
            .ok_or(ResolverError::NoNameservers)?;

        let target = if service.is_empty() && proto.is_empty() {
            name.to_string()
        } else {
            format!("_{service}._{proto}.{name}")
        };

        let answers = self
            .transport
            .exchange(self.socket_addr(nameserver), &target, QueryType::Srv)
            .await
            .map_err(|source| ResolverError::Query { nameserver, source })?;

        let mut records: Vec<SrvRecord> = answers
            .into_iter()
            .filter_map(|answer| match answer.data {
                RecordData::Srv(srv) => Some(srv),
                _ => None,
            })
            .collect();
        records.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.weight.cmp(&a.weight)));
        Ok(records)
    }

    /// Queries A and AAAA concurrently against one nameserver.
    ///
    /// Both exchanges always run to completion; if either fails the whole
    /// attempt fails and nothing from it is used.
    async fn dual_query(&self, nameserver: IpAddr, host: &str) -> Result<HostLookup, ResolverError> {
        let server = self.socket_addr(nameserver);
        let (v4, v6) = tokio::join!(
            self.transport.exchange(server, host, QueryType::A),
            self.transport.exchange(server, host, QueryType::Aaaa),
        );
        let query_error = |source| ResolverError::Query { nameserver, source };
        let v4 = v4.map_err(query_error)?;
        let v6 = v6.map_err(query_error)?;

        let (v4, ttl4) = collect_addresses(v4, |data| match data {
            RecordData::A(ip) => Some(ip),
            _ => None,
        });
        let (v6, ttl6) = collect_addresses(v6, |data| match data {
            RecordData::Aaaa(ip) => Some(ip),
            _ => None,
        });

        Ok(HostLookup {
            v4,
            v6,
            ttl: effective_ttl(ttl4, ttl6, self.default_ttl),
        })
    }

    async fn lookup_system(&self, host: &str) -> HostLookup {
        self.stats.increment(ResolverEvent::FallbackLookup);
        let mut found = HostLookup {
            ttl: self.default_ttl,
            ..Default::default()
        };

        match self.transport.lookup_system(host).await {
            Ok(addrs) => {
                for addr in addrs {
                    match addr {
                        IpAddr::V4(ip) => found.v4.push(ip),
                        IpAddr::V6(ip) => found.v6.push(ip),
                    }
                }
            }
            Err(e) => {
                // Reported as an empty answer, not as an error
                debug!("{} OS resolver failed for {}: {}", self.tag, host, e);
                self.stats.increment(ResolverEvent::FallbackFailed);
            }
        }

        found
    }

    fn read_len(&self) -> usize {
        self.nameservers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn current_nameserver(&self) -> Option<IpAddr> {
        let nameservers = self
            .nameservers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if nameservers.is_empty() {
            return None;
        }
        let idx = self.rotation.load(Ordering::Relaxed) % nameservers.len();
        Some(nameservers[idx])
    }

    fn socket_addr(&self, nameserver: IpAddr) -> SocketAddr {
        SocketAddr::new(nameserver, self.dns_port)
    }
}

/// Keeps the literal IP entries of `nameservers`, logging the rest.
pub fn parse_nameservers<I, S>(tag: &str, nameservers: I) -> Vec<IpAddr>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    nameservers
        .into_iter()
        .filter_map(|ns| {
            let ns = ns.as_ref();
            match ns.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!(
                        "{} {}",
                        tag,
                        ResolverError::InvalidNameserver(ns.to_string())
                    );
                    None
                }
            }
        })
        .collect()
}

/// Picks the refresh TTL from the per-family minimum TTLs.
///
/// Only TTLs strictly above `floor` are candidates; the smallest candidate
/// wins, and `floor` is used when there is none. `None` means the family had
/// no records.
pub fn effective_ttl(ttl4: Option<u32>, ttl6: Option<u32>, floor: u32) -> u32 {
    [ttl4, ttl6]
        .into_iter()
        .flatten()
        .filter(|ttl| *ttl > floor)
        .min()
        .unwrap_or(floor)
}

fn collect_addresses<T>(
    answers: Vec<Answer>,
    pick: impl Fn(RecordData) -> Option<T>,
) -> (Vec<T>, Option<u32>) {
    let mut min_ttl: Option<u32> = None;
    let addrs = answers
        .into_iter()
        .filter_map(|answer| {
            let ttl = answer.ttl;
            let addr = pick(answer.data)?;
            min_ttl = Some(min_ttl.map_or(ttl, |m| m.min(ttl)));
            Some(addr)
        })
        .collect();
    (addrs, min_ttl)
}
