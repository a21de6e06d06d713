// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fingerprint deduplication in front of the sink.
//!
//! A reading is emitted at most once per (identity, value revision)
//! inside the hit window: the cache keeps the last emitted timestamp per
//! fingerprint, and a record is forwarded only when its timestamp has
//! moved past that by the window.

use crate::sink::{MetricSink, SinkError};
use gs_core::{fingerprint, MetricRecord, TtlCache};
use std::time::Duration;
use tracing::debug;

/// Hit window: a fingerprint seen again within this many milliseconds is
/// dropped.
pub const DEDUP_WINDOW_MS: i64 = 5000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub emitted: usize,
    pub hits: usize,
}

/// Per-worker dedup pump.
pub struct DedupEmitter {
    cache: TtlCache<u64, i64>,
    window_ms: i64,
}

impl DedupEmitter {
    pub fn new(cache_max_size: usize, cache_ttl: Option<Duration>) -> Self {
        Self {
            cache: TtlCache::new(cache_max_size, cache_ttl),
            window_ms: DEDUP_WINDOW_MS,
        }
    }

    pub fn with_window_ms(mut self, window_ms: i64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Push a batch of records through the cache into the sink.
    ///
    /// Records whose name carries the dashed schema-header marker are
    /// discarded outright.
    pub async fn pump<S: MetricSink>(
        &mut self,
        records: impl IntoIterator<Item = MetricRecord>,
        sink: &S,
    ) -> Result<DedupStats, SinkError> {
        let mut stats = DedupStats::default();
        for record in records {
            if record.name.contains("----") {
                continue;
            }
            let key = fingerprint(&record.name, &record.tags);
            let last_seen = self.cache.get(&key).copied().unwrap_or(0);
            if record.timestamp >= last_seen + self.window_ms {
                self.cache.insert(key, record.timestamp);
                sink.publish(&record).await?;
                stats.emitted += 1;
            } else {
                stats.hits += 1;
            }
        }
        debug!(
            misses = stats.emitted,
            cache_size = self.cache.len(),
            "dedup pump finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;
