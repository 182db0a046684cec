//! Error type definitions.
//!
//! This module defines the error types returned by the resolver and its
//! transport, plus the event kinds tracked by [`super::ResolverStats`].

use std::net::IpAddr;

use hickory_resolver::error::ResolveError;
use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Failure of a single DNS exchange against one nameserver.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The hickory resolver reported a failure (timeout, refused, malformed response).
    #[error("DNS exchange failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Socket-level failure.
    #[error("DNS I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The nameserver answered but the transport rejected the response.
    #[error("DNS query refused: {0}")]
    Refused(String),
}

/// Errors surfaced by [`crate::dns::NameserverClient`] and [`crate::Resolver`].
#[derive(Error, Debug)]
pub enum ResolverError {
    /// A configured nameserver is not a literal IP address.
    #[error("nameserver {0} is not valid")]
    InvalidNameserver(String),

    /// A query against one nameserver failed.
    #[error("query to nameserver {nameserver} failed: {source}")]
    Query {
        /// Nameserver the query was sent to
        nameserver: IpAddr,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// An operation needed a nameserver but none is configured.
    #[error("no nameservers configured")]
    NoNameservers,
}

/// Notable events counted by [`super::ResolverStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ResolverEvent {
    /// A host refresh stored new addresses
    RefreshSucceeded,
    /// A host refresh failed and kept the previous addresses
    RefreshFailed,
    /// A nameserver attempt failed and the next one was tried
    NameserverFailover,
    /// A lookup went to the OS resolver (no nameservers configured)
    FallbackLookup,
    /// The OS resolver failed; reported as an empty result
    FallbackFailed,
    /// A host entry was created
    HostCreated,
    /// An implicit host entry was evicted for inactivity
    HostEvicted,
}

impl std::fmt::Display for ResolverEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ResolverEvent {
    /// Human-readable label used in logs and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverEvent::RefreshSucceeded => "Host refresh succeeded",
            ResolverEvent::RefreshFailed => "Host refresh failed",
            ResolverEvent::NameserverFailover => "Nameserver failover",
            ResolverEvent::FallbackLookup => "OS resolver lookup",
            ResolverEvent::FallbackFailed => "OS resolver failure",
            ResolverEvent::HostCreated => "Host created",
            ResolverEvent::HostEvicted => "Host evicted",
        }
    }
}
