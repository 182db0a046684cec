// Scripted transport shared by unit tests.
//
// Answers are keyed by hostname; any nameserver not marked down serves every
// zone. System lookups succeed only for hostnames registered with
// `set_system`.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Mutex;

use async_trait::async_trait;

use super::transport::{Answer, QueryType, RecordData, SrvRecord, Transport};
use crate::error_handling::TransportError;

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    zones: Mutex<HashMap<String, Vec<Answer>>>,
    down: Mutex<HashSet<IpAddr>>,
    failing_aaaa: Mutex<HashSet<String>>,
    system: Mutex<HashMap<String, Vec<IpAddr>>>,
    calls: Mutex<Vec<(IpAddr, QueryType, String)>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Replaces the A records served for `host`, keeping other record types.
    pub(crate) fn set_v4(&self, host: &str, ttl: u32, addrs: &[Ipv4Addr]) {
        self.replace(host, |a| matches!(a.data, RecordData::A(_)), |answers| {
            answers.extend(addrs.iter().map(|ip| Answer {
                ttl,
                data: RecordData::A(*ip),
            }))
        });
    }

    /// Replaces the AAAA records served for `host`, keeping other record types.
    pub(crate) fn set_v6(&self, host: &str, ttl: u32, addrs: &[Ipv6Addr]) {
        self.replace(host, |a| matches!(a.data, RecordData::Aaaa(_)), |answers| {
            answers.extend(addrs.iter().map(|ip| Answer {
                ttl,
                data: RecordData::Aaaa(*ip),
            }))
        });
    }

    pub(crate) fn add_srv(&self, name: &str, ttl: u32, record: SrvRecord) {
        let mut zones = self.zones.lock().unwrap();
        zones.entry(name.to_string()).or_default().push(Answer {
            ttl,
            data: RecordData::Srv(record),
        });
    }

    pub(crate) fn set_down(&self, nameserver: IpAddr, down: bool) {
        let mut set = self.down.lock().unwrap();
        if down {
            set.insert(nameserver);
        } else {
            set.remove(&nameserver);
        }
    }

    pub(crate) fn fail_aaaa(&self, host: &str) {
        self.failing_aaaa.lock().unwrap().insert(host.to_string());
    }

    pub(crate) fn set_system(&self, host: &str, addrs: &[IpAddr]) {
        self.system
            .lock()
            .unwrap()
            .insert(host.to_string(), addrs.to_vec());
    }

    pub(crate) fn calls(&self) -> Vec<(IpAddr, QueryType, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Nameservers that received an A query, in order.
    pub(crate) fn a_queries(&self) -> Vec<IpAddr> {
        self.calls()
            .into_iter()
            .filter(|(_, query, _)| *query == QueryType::A)
            .map(|(ns, _, _)| ns)
            .collect()
    }

    fn replace(
        &self,
        host: &str,
        remove: impl Fn(&Answer) -> bool,
        fill: impl FnOnce(&mut Vec<Answer>),
    ) {
        let mut zones = self.zones.lock().unwrap();
        let answers = zones.entry(host.to_string()).or_default();
        answers.retain(|a| !remove(a));
        fill(answers);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(
        &self,
        nameserver: SocketAddr,
        name: &str,
        query: QueryType,
    ) -> Result<Vec<Answer>, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((nameserver.ip(), query, name.to_string()));

        if self.down.lock().unwrap().contains(&nameserver.ip()) {
            return Err(TransportError::Refused(format!("{nameserver} is down")));
        }
        if query == QueryType::Aaaa && self.failing_aaaa.lock().unwrap().contains(name) {
            return Err(TransportError::Refused("SERVFAIL".to_string()));
        }

        let zones = self.zones.lock().unwrap();
        let answers = zones.get(name).cloned().unwrap_or_default();
        Ok(answers
            .into_iter()
            .filter(|a| {
                matches!(
                    (&a.data, query),
                    (RecordData::A(_), QueryType::A)
                        | (RecordData::Aaaa(_), QueryType::Aaaa)
                        | (RecordData::Srv(_), QueryType::Srv)
                )
            })
            .collect())
    }

    async fn lookup_system(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        self.system.lock().unwrap().get(host).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("failed to lookup address information: {host}"),
            )
        })
    }
}
