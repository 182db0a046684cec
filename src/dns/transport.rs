//! Single-exchange DNS transport.
//!
//! A [`Transport`] sends one query to one nameserver and hands back the answer
//! records with their TTLs. It also exposes the operating system's resolver,
//! which [`super::NameserverClient`] falls back to when no nameservers are
//! configured.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;

use crate::error_handling::TransportError;
use crate::initialization::init_nameserver_resolver;

/// Record type requested from a nameserver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// IPv4 host address
    A,
    /// IPv6 host address
    Aaaa,
    /// Service locator
    Srv,
}

impl From<QueryType> for RecordType {
    fn from(query: QueryType) -> Self {
        match query {
            QueryType::A => RecordType::A,
            QueryType::Aaaa => RecordType::AAAA,
            QueryType::Srv => RecordType::SRV,
        }
    }
}

/// A decoded SRV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    /// Lower values are tried first
    pub priority: u16,
    /// Relative weight among records of equal priority
    pub weight: u16,
    /// Service port on the target
    pub port: u16,
    /// Target hostname, fully qualified
    pub target: String,
}

/// Payload of one answer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// A record
    A(Ipv4Addr),
    /// AAAA record
    Aaaa(Ipv6Addr),
    /// SRV record
    Srv(SrvRecord),
}

/// One answer record and its TTL in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Record TTL in seconds
    pub ttl: u32,
    /// Record payload
    pub data: RecordData,
}

/// Performs single DNS exchanges and OS-level hostname lookups.
///
/// Implementations must treat "the name exists but has no records of this
/// type" (and NXDOMAIN) as a successful, empty answer. Only transport-level
/// failures and malformed responses are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one query for `name` to `nameserver` and returns the answer section.
    async fn exchange(
        &self,
        nameserver: SocketAddr,
        name: &str,
        query: QueryType,
    ) -> Result<Vec<Answer>, TransportError>;

    /// Resolves `host` through the operating system's resolver.
    async fn lookup_system(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// Default [`Transport`] built on `hickory-resolver` and `tokio::net::lookup_host`.
///
/// Keeps one uncached hickory resolver per nameserver address, created on first use.
pub struct HickoryTransport {
    timeout: Duration,
    resolvers: Mutex<HashMap<SocketAddr, TokioAsyncResolver>>,
}

impl HickoryTransport {
    /// Creates a transport whose exchanges time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            resolvers: Mutex::new(HashMap::new()),
        }
    }

    fn resolver_for(&self, nameserver: SocketAddr) -> TokioAsyncResolver {
        let mut resolvers = self
            .resolvers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        resolvers
            .entry(nameserver)
            .or_insert_with(|| init_nameserver_resolver(nameserver, self.timeout))
            .clone()
    }
}

#[async_trait]
impl Transport for HickoryTransport {
    async fn exchange(
        &self,
        nameserver: SocketAddr,
        name: &str,
        query: QueryType,
    ) -> Result<Vec<Answer>, TransportError> {
        let resolver = self.resolver_for(nameserver);
        let fqdn = fqdn(name);
        match resolver.lookup(fqdn.as_str(), query.into()).await {
            Ok(lookup) => Ok(lookup
                .records()
                .iter()
                .filter_map(|record| {
                    let data = match record.data()? {
                        RData::A(a) => RecordData::A(a.0),
                        RData::AAAA(aaaa) => RecordData::Aaaa(aaaa.0),
                        RData::SRV(srv) => RecordData::Srv(SrvRecord {
                            priority: srv.priority(),
                            weight: srv.weight(),
                            port: srv.port(),
                            target: srv.target().to_utf8(),
                        }),
                        // CNAMEs and anything else in the answer chain
                        _ => return None,
                    };
                    Some(Answer {
                        ttl: record.ttl(),
                        data,
                    })
                })
                .collect()),
            Err(e) => match e.kind() {
                // No records (or NXDOMAIN) is a valid, empty answer
                ResolveErrorKind::NoRecordsFound { .. } => Ok(Vec::new()),
                _ => {
                    let error_msg = e.to_string();
                    if error_msg.contains("timeout") || error_msg.contains("timed out") {
                        log::debug!("{query:?} query for {name} to {nameserver} timed out: {e}");
                    } else {
                        log::debug!("{query:?} query for {name} to {nameserver} failed: {e}");
                    }
                    Err(e.into())
                }
            },
        }
    }

    async fn lookup_system(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host(format!("{host}:0")).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Appends the root label unless `name` already ends with it.
pub(crate) fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}
