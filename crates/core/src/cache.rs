// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded TTL map used for metric deduplication and job-seen tracking.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::warn;

/// Bounded map with per-entry TTL.
///
/// Expired entries read as absent but stay resident until an insert at
/// capacity sweeps them out. The size limit is advisory: if the cache is
/// still over budget after the sweep, a warning is logged and the insert
/// proceeds anyway.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    max_size: usize,
    ttl: Option<Duration>,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    /// `ttl = None` disables expiry (entries live until removed).
    pub fn new(max_size: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
            ttl,
        }
    }

    fn is_expired(&self, entry: &Entry<V>) -> bool {
        match self.ttl {
            Some(ttl) => entry.inserted_at.elapsed() >= ttl,
            None => false,
        }
    }

    /// Look up a live entry. Expired entries are treated as a miss.
    pub fn get(&self, key: &K) -> Option<&V> {
        let entry = self.entries.get(key)?;
        if self.is_expired(entry) {
            return None;
        }
        Some(&entry.value)
    }

    /// Non-expired presence check.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.entries.len() >= self.max_size && !self.entries.contains_key(&key) {
            if let Some(ttl) = self.ttl {
                self.entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
            }
            if self.entries.len() >= self.max_size {
                warn!(
                    size = self.entries.len(),
                    max_size = self.max_size,
                    "cache over size budget"
                );
            }
        }
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// All resident keys, expired entries included. Set-difference callers
    /// want the raw population, not the live view.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Resident entry count, expired entries included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
