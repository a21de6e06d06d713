// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-state job caches with set-difference updates.
//!
//! Each polled state owns an independent cache of the last known detail
//! record per job id. A discovery pass diffs the fresh id list against
//! the cache: new ids need a detail query, vanished ids are dropped, and
//! ids present in both are served from cache without touching the
//! scheduler again.

use crate::job::{JobRecord, JobState};
use gs_core::TtlCache;
use std::collections::HashSet;
use std::time::Duration;

/// Default per-state cache capacity.
pub const STATE_CACHE_SIZE: usize = 100_000;

/// Result of one state update.
#[derive(Debug, Default)]
pub struct StateDiff {
    /// Ids that need a detail query, sorted for deterministic batching.
    pub to_query: Vec<String>,
    /// Cached records for ids still present in discovery.
    pub cached: Vec<JobRecord>,
}

/// Three independent caches keyed by job state.
pub struct JobStateCache {
    finished: TtlCache<String, JobRecord>,
    running: TtlCache<String, JobRecord>,
    pending: TtlCache<String, JobRecord>,
}

impl JobStateCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            finished: TtlCache::new(STATE_CACHE_SIZE, ttl),
            running: TtlCache::new(STATE_CACHE_SIZE, ttl),
            pending: TtlCache::new(STATE_CACHE_SIZE, ttl),
        }
    }

    fn cache_for(&mut self, state: JobState) -> Option<&mut TtlCache<String, JobRecord>> {
        match state {
            JobState::Finished => Some(&mut self.finished),
            JobState::Running => Some(&mut self.running),
            JobState::Queued => Some(&mut self.pending),
            _ => None,
        }
    }

    /// Diff the fresh discovery list against the state's cache.
    ///
    /// Ids that vanished from discovery are removed, so afterwards the
    /// cached key set is a subset of `current_ids`.
    pub fn update_for_state(&mut self, state: JobState, current_ids: &[String]) -> StateDiff {
        let Some(cache) = self.cache_for(state) else {
            return StateDiff::default();
        };

        let current: HashSet<&str> = current_ids.iter().map(String::as_str).collect();
        let resident: Vec<String> = cache.keys().cloned().collect();

        for id in &resident {
            if !current.contains(id.as_str()) {
                cache.remove(id);
            }
        }

        let resident: HashSet<&str> = resident.iter().map(String::as_str).collect();
        let mut to_query: Vec<String> = current
            .iter()
            .filter(|id| !resident.contains(*id))
            .map(|id| id.to_string())
            .collect();
        to_query.sort_unstable();

        let mut cached = Vec::new();
        for id in current_ids {
            if resident.contains(id.as_str()) {
                if let Some(record) = cache.get(id) {
                    cached.push(record.clone());
                }
            }
        }

        StateDiff { to_query, cached }
    }

    /// Store a freshly fetched detail record.
    pub fn store(&mut self, state: JobState, id: String, record: JobRecord) {
        if let Some(cache) = self.cache_for(state) {
            cache.insert(id, record);
        }
    }

    pub fn len(&self, state: JobState) -> usize {
        match state {
            JobState::Finished => self.finished.len(),
            JobState::Running => self.running.len(),
            JobState::Queued => self.pending.len(),
            _ => 0,
        }
    }
}

impl Default for JobStateCache {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
#[path = "state_cache_tests.rs"]
mod tests;
