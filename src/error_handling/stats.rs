//! Resolver statistics tracking.
//!
//! This module provides thread-safe counters for the events the cache goes
//! through: refreshes, failovers, fallbacks and host churn.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ResolverEvent;

/// Thread-safe resolver statistics tracker.
///
/// Tracks events using atomic counters, allowing concurrent access from every
/// host refresh task. All event types are initialized to zero on creation.
///
/// # Thread Safety
///
/// This struct is thread-safe and can be shared across multiple tasks using `Arc`.
#[derive(Debug)]
pub struct ResolverStats {
    events: HashMap<ResolverEvent, AtomicUsize>,
}

impl ResolverStats {
    /// Creates a tracker with every counter at zero.
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for event in ResolverEvent::iter() {
            events.insert(event, AtomicUsize::new(0));
        }

        ResolverStats { events }
    }

    /// Increment an event counter.
    pub fn increment(&self, event: ResolverEvent) {
        if let Some(counter) = self.events.get(&event) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in ResolverStats initialization.",
                event
            );
        }
    }

    /// Get the count for an event type.
    ///
    /// Returns 0 if the event type is not in the map (should never happen if properly initialized).
    pub fn get_count(&self, event: ResolverEvent) -> usize {
        self.events
            .get(&event)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total number of recorded events.
    pub fn total(&self) -> usize {
        self.events.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Non-zero counters, in declaration order.
    pub fn summary(&self) -> Vec<(ResolverEvent, usize)> {
        ResolverEvent::iter()
            .map(|event| (event, self.get_count(event)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Logs every non-zero counter at info level.
    pub fn log_summary(&self, tag: &str) {
        for (event, count) in self.summary() {
            log::info!("{} {}: {}", tag, event, count);
        }
    }
}

impl Default for ResolverStats {
    fn default() -> Self {
        Self::new()
    }
}
