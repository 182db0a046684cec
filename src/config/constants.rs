//! Configuration constants.
//!
//! This module defines the defaults used throughout the cache: TTL floor,
//! retry and eviction intervals, and the DNS wire port.

use std::time::Duration;

/// Default TTL in seconds.
///
/// Used as the floor when picking an effective TTL from A/AAAA answers, and as
/// the TTL reported for results coming from the OS resolver.
pub const DEFAULT_TTL_SECS: u64 = 60;

/// Delay before retrying a failed refresh, in seconds.
pub const RETRY_INTERVAL_SECS: u64 = 10;

/// Inactivity after which an implicitly created host becomes eligible for eviction.
pub const STALE_HOST_AFTER: Duration = Duration::from_secs(30 * 60);

/// How often the registry scans for stale implicit hosts.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shortest TTL floor, retry delay and sweep period a resolver accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Port nameservers are queried on.
pub const DNS_PORT: u16 = 53;

// Network operation timeouts
/// DNS query timeout in seconds
/// Most queries complete in <1s; 3s fails fast on unresponsive nameservers so
/// failover to the next one starts quickly
pub const DNS_TIMEOUT_SECS: u64 = 3;

/// First segment of every key written by the text dump.
pub const DUMP_KEY_ROOT: &str = "resolver";
