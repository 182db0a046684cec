//! Per-host cache entry and its refresh task.
//!
//! A [`HostEntry`] moves through three states:
//! - initializing: created, first resolution not finished; readers wait
//! - active: readers are served from the cached address sets
//! - stopped: the refresh task has observed its cancellation token and exited

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::address_set::AddressSet;
use crate::dns::NameserverClient;
use crate::error_handling::ResolverEvent;

/// Cached addresses of one hostname, kept fresh by a background task.
pub(crate) struct HostEntry {
    tag: Arc<str>,
    name: String,
    explicit: bool,
    v4: AddressSet<Ipv4Addr>,
    v6: AddressSet<Ipv6Addr>,
    created: Instant,
    // Milliseconds after `created`
    last_access: AtomicU64,
    ready: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl HostEntry {
    /// Creates the entry and starts its refresh task.
    ///
    /// Must be called from within a Tokio runtime. The task stops when
    /// `cancel` is cancelled, either directly through [`stop`](Self::stop)
    /// or through its parent token.
    pub(crate) fn spawn(
        tag: Arc<str>,
        name: String,
        explicit: bool,
        client: Arc<NameserverClient>,
        retry_interval: Duration,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let (ready, _) = watch::channel(false);
        let entry = Arc::new(Self {
            tag,
            name,
            explicit,
            v4: AddressSet::new(),
            v6: AddressSet::new(),
            created: Instant::now(),
            last_access: AtomicU64::new(0),
            ready,
            cancel,
        });
        client.stats().increment(ResolverEvent::HostCreated);

        tokio::spawn(Arc::clone(&entry).refresh_loop(client, retry_interval));

        entry
    }

    pub(crate) async fn next_v4_with_index(&self) -> (Option<Ipv4Addr>, usize) {
        self.wait_ready().await;
        let next = self.v4.next_with_index();
        self.touch();
        next
    }

    pub(crate) async fn next_v6_with_index(&self) -> (Option<Ipv6Addr>, usize) {
        self.wait_ready().await;
        let next = self.v6.next_with_index();
        self.touch();
        next
    }

    /// Both address lists, once the first resolution has finished.
    ///
    /// Does not count as an access for staleness.
    pub(crate) async fn addresses(&self) -> (Vec<Ipv4Addr>, Vec<Ipv6Addr>) {
        self.wait_ready().await;
        self.snapshot()
    }

    /// Both address lists as they are right now, without waiting.
    pub(crate) fn snapshot(&self) -> (Vec<Ipv4Addr>, Vec<Ipv6Addr>) {
        (self.v4.list(), self.v6.list())
    }

    pub(crate) fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Whether the last round-robin read is more than `stale_after` ago.
    pub(crate) fn is_stale(&self, stale_after: Duration) -> bool {
        let last = self.created + Duration::from_millis(self.last_access.load(Ordering::Relaxed));
        Instant::now().saturating_duration_since(last) > stale_after
    }

    /// Implicit entries that went stale may be evicted; explicit ones never are.
    pub(crate) fn is_evictable(&self, stale_after: Duration) -> bool {
        !self.explicit && self.is_stale(stale_after)
    }

    pub(crate) fn stop(&self) {
        self.cancel.cancel();
    }

    async fn wait_ready(&self) {
        if *self.ready.borrow() {
            return;
        }
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`, so this only returns once ready
        let _ = rx.wait_for(|ready| *ready).await;
    }

    fn touch(&self) {
        let elapsed = u64::try_from(self.created.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_access.store(elapsed, Ordering::Relaxed);
    }

    async fn refresh_loop(self: Arc<Self>, client: Arc<NameserverClient>, retry_interval: Duration) {
        let mut wait = self.refresh(&client, retry_interval).await;
        self.ready.send_replace(true);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("{} Stop resolving host {}", self.tag, self.name);
                    return;
                }
                _ = tokio::time::sleep(wait) => {
                    wait = self.refresh(&client, retry_interval).await;
                }
            }
        }
    }

    /// Re-resolves the host and returns how long to wait before the next refresh.
    ///
    /// A failed lookup keeps the previous addresses.
    async fn refresh(&self, client: &NameserverClient, retry_interval: Duration) -> Duration {
        match client.lookup_host(&self.name).await {
            Ok(found) => {
                debug!(
                    "{} host: {} ips4: {:?} ips6: {:?} ttl: {}",
                    self.tag, self.name, found.v4, found.v6, found.ttl
                );
                self.v4.set_list(found.v4);
                self.v6.set_list(found.v6);
                client.stats().increment(ResolverEvent::RefreshSucceeded);
                Duration::from_secs(u64::from(found.ttl))
            }
            Err(e) => {
                error!(
                    "{} Error reloading ips for host {}: {}",
                    self.tag, self.name, e
                );
                client.stats().increment(ResolverEvent::RefreshFailed);
                retry_interval
            }
        }
    }
}
