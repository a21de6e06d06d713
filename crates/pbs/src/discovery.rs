// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job discovery and batched detail fetching.
//!
//! Per tick, each polled state is listed with `qselect`, diffed against
//! the state cache, and only unseen ids are fetched with `qstat` in
//! controller-sized batches. Cached records are forwarded before freshly
//! fetched ones; states are walked in F, R, Q order; under high server
//! load the R and Q states are shed for the tick (finished jobs stay
//! highest priority because persistence depends on them).

use crate::commands;
use crate::controller::{initial_timeout, next_timeout, AdaptiveController, ServerLoad};
use crate::job::{JobRecord, JobState};
use crate::repair::{job_entries, parse_concatenated};
use crate::state_cache::JobStateCache;
use gs_core::Clock;
use gs_exec::CommandRunner;
use std::time::Duration;
use tracing::{info, warn};

/// Fetcher settings; timeouts are the seconds embedded in the remote
/// `timeout N` wrappers.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// `qselect` discovery timeout.
    pub qselect_timeout: u64,
    /// How far back finished-job discovery looks (`TS + 10` in practice).
    pub finished_history_secs: u64,
    /// Detail-query timeout bounds; defaults pin them together.
    pub min_timeout: u64,
    pub max_timeout: u64,
    /// Pause after a failed detail batch.
    pub failure_pause: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            qselect_timeout: 60,
            finished_history_secs: 70,
            min_timeout: 180,
            max_timeout: 180,
            failure_pause: Duration::from_secs(10),
        }
    }
}

/// One tick's worth of job records.
#[derive(Debug, Default)]
pub struct TickOutput {
    pub timestamp_ms: i64,
    /// Every record seen this tick, in forwarding order (queue-0).
    pub all: Vec<JobRecord>,
    /// Finished-state records only, for the durable streams (queue-1/2).
    pub finished: Vec<JobRecord>,
}

/// Dual-rate collector: cheap per-state listing every tick, expensive
/// detail queries only for unseen ids.
pub struct JobFetcher<R: CommandRunner, C: Clock> {
    runner: R,
    clock: C,
    config: FetchConfig,
    controller: AdaptiveController,
    cache: JobStateCache,
    current_timeout: u64,
}

impl<R: CommandRunner, C: Clock> JobFetcher<R, C> {
    pub fn new(runner: R, clock: C, config: FetchConfig, controller: AdaptiveController) -> Self {
        let current_timeout = initial_timeout(
            controller.target_time(),
            config.min_timeout,
            config.max_timeout,
        );
        Self {
            runner,
            clock,
            config,
            controller,
            cache: JobStateCache::default(),
            current_timeout,
        }
    }

    pub fn server_load(&self) -> ServerLoad {
        self.controller.server_load()
    }

    /// Run one discovery tick across the polled states.
    pub async fn read(&mut self) -> TickOutput {
        let mut output = TickOutput {
            timestamp_ms: self.clock.epoch_ms(),
            ..TickOutput::default()
        };

        for state in JobState::DISCOVERED {
            if self.controller.server_load() == ServerLoad::High && state != JobState::Finished {
                info!(%state, "server load is high, skipping state");
                continue;
            }
            self.read_state(state, &mut output).await;
        }

        info!(total = output.all.len(), "jobs processed this tick");
        output
    }

    async fn read_state(&mut self, state: JobState, output: &mut TickOutput) {
        let list_cmd = match state {
            JobState::Finished => commands::qselect_finished(
                self.config.qselect_timeout,
                self.config.finished_history_secs,
            ),
            other => commands::qselect_state(self.config.qselect_timeout, other),
        };

        let listing = match self.runner.run(&list_cmd).await {
            Ok(out) if out.ok => out,
            Ok(out) => {
                warn!(%state, stderr = %out.stderr, "discovery listing failed");
                return;
            }
            Err(err) => {
                warn!(%state, %err, "discovery listing failed");
                return;
            }
        };

        let ids: Vec<String> = listing
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        info!(%state, jobs = ids.len(), "discovered jobs");

        let diff = self.cache.update_for_state(state, &ids);
        info!(
            %state,
            cached = diff.cached.len(),
            to_query = diff.to_query.len(),
            "state cache diff"
        );

        // cached records go out first
        for record in diff.cached {
            if state == JobState::Finished {
                output.finished.push(record.clone());
            }
            output.all.push(record);
        }

        if diff.to_query.is_empty() {
            return;
        }

        self.current_timeout = initial_timeout(
            self.controller.target_time(),
            self.config.min_timeout,
            self.config.max_timeout,
        );

        let to_query = diff.to_query;
        let mut position = 0;
        while position < to_query.len() {
            let batch = self.controller.batch_size();
            let end = usize::min(position + batch, to_query.len());
            let slice = &to_query[position..end];

            let cmd = commands::qstat_details(self.current_timeout, slice);
            let start = self.clock.now();
            let result = self.runner.run(&cmd).await;
            let elapsed = start.elapsed().as_secs_f64();

            match result {
                Ok(out) if out.ok => {
                    self.controller.adjust(elapsed, true);
                    self.current_timeout =
                        next_timeout(elapsed, self.config.min_timeout, self.config.max_timeout);

                    let payload = parse_concatenated(&out.stdout);
                    let entries = job_entries(&payload);
                    info!(
                        %state,
                        fetched = entries.len(),
                        remaining = to_query.len() - end,
                        "retrieved job details"
                    );

                    for (key, record) in entries {
                        self.cache.store(state, key, record.clone());
                        if state == JobState::Finished {
                            output.finished.push(record.clone());
                        }
                        output.all.push(record);
                    }
                    position = end;
                }
                other => {
                    let batch = self.controller.adjust(elapsed, false);
                    match other {
                        Ok(out) => warn!(
                            %state,
                            batch,
                            timeout = self.current_timeout,
                            stderr = %out.stderr,
                            "detail batch failed, batch size reduced"
                        ),
                        Err(err) => warn!(
                            %state,
                            batch,
                            timeout = self.current_timeout,
                            %err,
                            "detail batch failed, batch size reduced"
                        ),
                    }
                    self.current_timeout =
                        next_timeout(elapsed, self.config.min_timeout, self.config.max_timeout);
                    tokio::time::sleep(self.config.failure_pause).await;
                    position = end;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
