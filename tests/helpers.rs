// Shared test helpers for integration tests.
//
// Provides an in-memory DNS transport whose answers, failures and OS resolver
// results are scripted per test, and a constructor for resolvers using it.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dns_cache::dns::{Answer, QueryType, RecordData};
use dns_cache::{CacheConfig, Resolver, Transport, TransportError};

/// Scripted transport: every nameserver not marked down serves the same zones.
#[derive(Default)]
pub struct MockTransport {
    zones: Mutex<HashMap<String, Vec<Answer>>>,
    down: Mutex<HashSet<IpAddr>>,
    system: Mutex<HashMap<String, Vec<IpAddr>>>,
    queries: Mutex<Vec<(IpAddr, QueryType, String)>>,
}

#[allow(dead_code)] // Not every test file uses every helper
impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, host: &str, ttl: u32, v4: &[Ipv4Addr], v6: &[Ipv6Addr]) {
        let answers = v4
            .iter()
            .map(|ip| Answer {
                ttl,
                data: RecordData::A(*ip),
            })
            .chain(v6.iter().map(|ip| Answer {
                ttl,
                data: RecordData::Aaaa(*ip),
            }))
            .collect();
        self.zones.lock().unwrap().insert(host.to_string(), answers);
    }

    /// Serves A records and AAAA records with separate TTLs.
    pub fn serve_split_ttl(&self, host: &str, v4: (u32, Ipv4Addr), v6: (u32, Ipv6Addr)) {
        let answers = vec![
            Answer {
                ttl: v4.0,
                data: RecordData::A(v4.1),
            },
            Answer {
                ttl: v6.0,
                data: RecordData::Aaaa(v6.1),
            },
        ];
        self.zones.lock().unwrap().insert(host.to_string(), answers);
    }

    pub fn set_down(&self, nameserver: &str, down: bool) {
        let ip: IpAddr = nameserver.parse().expect("test nameserver must be an IP");
        let mut set = self.down.lock().unwrap();
        if down {
            set.insert(ip);
        } else {
            set.remove(&ip);
        }
    }

    pub fn set_system(&self, host: &str, addrs: &[IpAddr]) {
        self.system
            .lock()
            .unwrap()
            .insert(host.to_string(), addrs.to_vec());
    }

    /// Nameservers that received an A query for `host`, in order.
    pub fn a_queries_for(&self, host: &str) -> Vec<IpAddr> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, query, name)| *query == QueryType::A && name == host)
            .map(|(ns, _, _)| *ns)
            .collect()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exchange(
        &self,
        nameserver: SocketAddr,
        name: &str,
        query: QueryType,
    ) -> Result<Vec<Answer>, TransportError> {
        self.queries
            .lock()
            .unwrap()
            .push((nameserver.ip(), query, name.to_string()));
        assert_eq!(nameserver.port(), 53, "nameservers are queried on port 53");

        if self.down.lock().unwrap().contains(&nameserver.ip()) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("{nameserver} unreachable"),
            )));
        }

        let zones = self.zones.lock().unwrap();
        Ok(zones
            .get(name)
            .map(|answers| {
                answers
                    .iter()
                    .filter(|a| {
                        matches!(
                            (&a.data, query),
                            (RecordData::A(_), QueryType::A) | (RecordData::Aaaa(_), QueryType::Aaaa)
                        )
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn lookup_system(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        self.system.lock().unwrap().get(host).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("unknown host {host}"))
        })
    }
}

/// Creates a resolver with default timings over `transport`.
#[allow(dead_code)]
pub fn create_test_resolver(transport: &Arc<MockTransport>, nameservers: &[&str]) -> Resolver {
    create_test_resolver_with(transport, nameservers, CacheConfig::default())
}

/// Creates a resolver with custom timings over `transport`.
#[allow(dead_code)]
pub fn create_test_resolver_with(
    transport: &Arc<MockTransport>,
    nameservers: &[&str],
    config: CacheConfig,
) -> Resolver {
    Resolver::with_transport("[test]", config, transport.clone())
        .with_nameservers(nameservers.iter().copied())
}

#[allow(dead_code)]
pub fn v4(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(198, 51, 100, last)
}

#[allow(dead_code)]
pub fn v6(last: u16) -> Ipv6Addr {
    Ipv6Addr::new(0x2001, 0xdb8, 0x51, 0, 0, 0, 0, last)
}
