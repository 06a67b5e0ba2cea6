//! Session-scoped, write-once route cache.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::geo::CoordKey;

use super::{RouteKey, RouteSummary};

/// Memoizes resolved routes by `(origin, destination, mode)`.
///
/// Entries keep insertion order and never expire; the cache lives exactly as
/// long as the session that owns it. The first value stored for a key wins.
#[derive(Debug, Default)]
pub struct RouteCache {
    entries: IndexMap<RouteKey, RouteSummary>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RouteKey) -> Option<&RouteSummary> {
        self.entries.get(key)
    }

    /// Store `value` under `key` unless a value is already present.
    /// Returns true if the value was stored.
    pub fn put(&mut self, key: RouteKey, value: RouteSummary) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn contains(&self, key: &RouteKey) -> bool {
        self.entries.contains_key(key)
    }

    /// First cached route between the two endpoints under any mode.
    pub fn find_pair(&self, origin: CoordKey, destination: CoordKey) -> Option<&RouteSummary> {
        self.entries
            .iter()
            .find(|(key, _)| key.origin == origin && key.destination == destination)
            .map(|(_, summary)| summary)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &RouteSummary)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
