//! Debounce-by-key: collapse bursts of calls for the same key into one flush.
//!
//! The debouncer never owns a timer. Each [`Debouncer::call`] hands back a
//! token and a deadline; the caller schedules a flush event carrying that
//! token. When the event fires, [`Debouncer::fire`] accepts only the most
//! recent token for the key, so every earlier flush is stale and dropped.
//! Calls for different keys never interact.

use std::collections::HashMap;
use std::hash::Hash;

/// Outcome of registering a call with the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceCall {
    /// Token the flush event must carry.
    pub token: u64,
    /// Absolute time at which the flush should fire.
    pub fire_at: u64,
    /// True when this call joined a burst that was already pending.
    pub coalesced: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingFlush {
    token: u64,
    fire_at: u64,
}

#[derive(Debug)]
pub struct Debouncer<K> {
    window_ms: u64,
    next_token: u64,
    pending: HashMap<K, PendingFlush>,
}

impl<K: Eq + Hash + Copy> Debouncer<K> {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            next_token: 1,
            pending: HashMap::new(),
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Register a call for `key` at time `now` (trailing edge: the flush moves
    /// to `now + window`).
    pub fn call(&mut self, key: K, now: u64) -> DebounceCall {
        let token = self.next_token;
        self.next_token += 1;
        let fire_at = now.saturating_add(self.window_ms);
        let previous = self.pending.insert(key, PendingFlush { token, fire_at });
        DebounceCall {
            token,
            fire_at,
            coalesced: previous.is_some(),
        }
    }

    /// Returns true if `token` is the live flush for `key`, clearing it.
    pub fn fire(&mut self, key: K, token: u64) -> bool {
        match self.pending.get(&key) {
            Some(flush) if flush.token == token => {
                self.pending.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Drop the pending flush for `key`. Returns true if one was pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    /// Drop every pending flush, returning how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Deadline of the pending flush for `key`, if any.
    pub fn deadline(&self, key: &K) -> Option<u64> {
        self.pending.get(key).map(|flush| flush.fire_at)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
