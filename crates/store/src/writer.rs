// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job-table writer worker.
//!
//! Consumes ticks of finished jobs from the durable queue, sanitises and
//! validates each record, and upserts it. A local dedup cache keyed by
//! job id keeps the writer idempotent across overlapping discovery
//! windows. Every iteration runs under a watchdog; expiry is fatal to
//! the worker so the supervisor can restart it cleanly.

use crate::job_store::{JobStore, StoreError};
use crate::sanitize::sanitize_job;
use crate::schema::prune_unknown_columns;
use gs_core::TtlCache;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Maximum wall-time for one queue iteration.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(300);

/// One tick's worth of job-table candidates.
#[derive(Debug, Clone)]
pub struct TickJobs {
    pub timestamp_ms: i64,
    pub jobs: Vec<Map<String, Value>>,
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("writer iteration exceeded {0:?}, terminating worker")]
    Watchdog(Duration),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Job states persisted to the table.
    pub eligible_states: Vec<String>,
    pub timezone: String,
    pub pbs_version: String,
    pub watchdog: Duration,
    pub cache_max_size: usize,
    pub cache_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            eligible_states: vec!["F".to_string()],
            timezone: "Europe/Rome".to_string(),
            pbs_version: "19.2.8".to_string(),
            watchdog: WATCHDOG_TIMEOUT,
            cache_max_size: 100_000,
            cache_timeout: Duration::from_secs(3600),
        }
    }
}

pub struct TableWriter<S: JobStore> {
    store: S,
    config: WriterConfig,
    columns: BTreeMap<String, String>,
    seen: TtlCache<String, ()>,
}

impl<S: JobStore> TableWriter<S> {
    pub fn new(store: S, config: WriterConfig, columns: BTreeMap<String, String>) -> Self {
        let seen = TtlCache::new(config.cache_max_size, Some(config.cache_timeout));
        Self {
            store,
            config,
            columns,
            seen,
        }
    }

    /// Consume the durable queue until it closes. A watchdog bounds each
    /// iteration; store errors on individual jobs are logged and skipped,
    /// a fired watchdog tears the worker down.
    pub async fn run(&mut self, rx: &mut mpsc::Receiver<TickJobs>) -> Result<(), WriterError> {
        while let Some(tick) = rx.recv().await {
            debug!("start watchdog timer");
            let watchdog = self.config.watchdog;
            match tokio::time::timeout(watchdog, self.process_tick(tick)).await {
                Ok(()) => debug!("cancel watchdog timer"),
                Err(_elapsed) => {
                    error!(
                        timeout_secs = watchdog.as_secs(),
                        "worker exceeded maximum execution time"
                    );
                    return Err(WriterError::Watchdog(watchdog));
                }
            }
        }
        Ok(())
    }

    async fn process_tick(&mut self, tick: TickJobs) {
        let eligible: Vec<Map<String, Value>> = tick
            .jobs
            .into_iter()
            .filter(|job| {
                job.get("job_state")
                    .and_then(Value::as_str)
                    .map(|s| self.config.eligible_states.iter().any(|e| e == s))
                    .unwrap_or(false)
            })
            .collect();
        info!(terminated = eligible.len(), "found terminated jobs");

        let mut inserted = 0usize;
        for job in eligible {
            let Some(job_id) = job.get("Job_Id").and_then(Value::as_str).map(str::to_string)
            else {
                warn!("job without Job_Id, skipping");
                continue;
            };
            if self.seen.get(&job_id).is_some() {
                continue;
            }

            let mut row =
                match sanitize_job(job, &self.config.timezone, &self.config.pbs_version) {
                    Ok(row) => row,
                    Err(err) => {
                        error!(job_id, %err, "failed to sanitise job record");
                        continue;
                    }
                };
            prune_unknown_columns(&mut row, &self.columns);

            match self.store.upsert_job(Value::Object(row).to_string()).await {
                Ok(()) => {
                    self.seen.insert(job_id, ());
                    inserted += 1;
                }
                Err(err) => {
                    error!(job_id, %err, "failed to persist job record");
                }
            }
        }
        info!(inserted, cache_size = self.seen.len(), "job table tick complete");
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
