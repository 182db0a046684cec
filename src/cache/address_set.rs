//! Round-robin address set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Ordered addresses of one family plus a round-robin cursor.
///
/// The list is replaced wholesale on refresh and guarded by a reader/writer
/// lock. The cursor is a separate atomic that is bumped after the read lock is
/// released. A reader racing a replacement can therefore apply a cursor value
/// computed for the old length to the new list, which skips or repeats one
/// address. The index is always reduced modulo the length seen under the lock,
/// so a read never goes out of bounds.
#[derive(Debug)]
pub struct AddressSet<A> {
    list: RwLock<Vec<A>>,
    cursor: AtomicUsize,
}

impl<A: Copy> AddressSet<A> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::from_list(Vec::new())
    }

    /// Creates a set holding `list`.
    pub fn from_list(list: Vec<A>) -> Self {
        Self {
            list: RwLock::new(list),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Replaces the addresses. The cursor is kept as is.
    pub fn set_list(&self, list: Vec<A>) {
        *self.list.write().unwrap_or_else(PoisonError::into_inner) = list;
    }

    /// Returns the next address in round-robin order and its position.
    ///
    /// An empty set yields `(None, 0)`.
    pub fn next_with_index(&self) -> (Option<A>, usize) {
        let (addr, idx) = {
            let list = self.list.read().unwrap_or_else(PoisonError::into_inner);
            if list.is_empty() {
                return (None, 0);
            }
            let idx = self.cursor.load(Ordering::Relaxed) % list.len();
            (list[idx], idx)
        };

        self.cursor.fetch_add(1, Ordering::Relaxed);

        (Some(addr), idx)
    }

    /// Copy of the current addresses.
    pub fn list(&self) -> Vec<A> {
        self.list
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of addresses currently held.
    pub fn len(&self) -> usize {
        self.list.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the set holds no address.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: Copy> Default for AddressSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Copy> FromIterator<A> for AddressSet<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self::from_list(iter.into_iter().collect())
    }
}
