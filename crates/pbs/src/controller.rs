// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PID-style controller for the detail-query batch size.
//!
//! Tracks the wall-time of each `qstat` batch and steers the batch size
//! toward a target time. A rolling window of recent samples classifies
//! the scheduler as loaded, which makes discovery shed the lower-priority
//! states for a tick.

use std::collections::VecDeque;
use tracing::{debug, info};

pub const DEFAULT_P_GAIN: f64 = 0.5;
pub const DEFAULT_MIN_BATCH: usize = 25;
pub const DEFAULT_MAX_BATCH: usize = 500;
pub const DEFAULT_TARGET_TIME: f64 = 15.0;

const MAX_HISTORY: usize = 20;
const RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerLoad {
    Normal,
    High,
}

pub struct AdaptiveController {
    min_batch: usize,
    max_batch: usize,
    target_time: f64,
    p_gain: f64,
    batch: usize,
    history: VecDeque<(usize, f64)>,
    load: ServerLoad,
}

impl AdaptiveController {
    pub fn new(min_batch: usize, max_batch: usize, target_time: f64) -> Self {
        Self {
            min_batch,
            max_batch,
            target_time,
            p_gain: DEFAULT_P_GAIN,
            batch: max_batch,
            history: VecDeque::with_capacity(MAX_HISTORY),
            load: ServerLoad::Normal,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch
    }

    pub fn server_load(&self) -> ServerLoad {
        self.load
    }

    pub fn target_time(&self) -> f64 {
        self.target_time
    }

    /// Feed one batch outcome and get the next batch size.
    ///
    /// A failed batch halves the size and marks the server loaded. A
    /// successful batch nudges the size proportionally to the error
    /// against the target, capped at ±20% (±10% inside the acceptance
    /// band).
    pub fn adjust(&mut self, execution_time: f64, success: bool) -> usize {
        if !success {
            self.batch = self.min_batch.max((self.batch as f64 * 0.5) as usize);
            info!(batch = self.batch, "execution failed, reducing batch size");
            self.load = ServerLoad::High;
            return self.batch;
        }

        self.history.push_back((self.batch, execution_time));
        if self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }

        if self.history.len() >= RECENT_WINDOW {
            let recent = self.history.iter().rev().take(RECENT_WINDOW);
            let (mut sum_time, mut sum_batch) = (0.0, 0.0);
            for (batch, time) in recent {
                sum_time += time;
                sum_batch += *batch as f64;
            }
            let avg_time = sum_time / RECENT_WINDOW as f64;
            let avg_batch = sum_batch / RECENT_WINDOW as f64;

            self.load = if avg_time < self.target_time && avg_batch > self.max_batch as f64 * 0.8 {
                ServerLoad::Normal
            } else {
                ServerLoad::High
            };
            info!(
                load = ?self.load,
                avg_time, avg_batch, "server load classified"
            );
        }

        let lower = 0.7 * self.target_time;
        let upper = 1.3 * self.target_time;
        let batch = self.batch as f64;

        let adjustment: i64 = if (lower..=upper).contains(&execution_time) {
            let error = self.target_time - execution_time;
            let raw = (error * self.p_gain * batch / self.target_time) as i64;
            let cap = (0.1 * batch) as i64;
            raw.clamp(-cap, cap)
        } else if execution_time < lower {
            let ratio = self.target_time / execution_time.max(0.1);
            f64::min(batch * 0.2, (ratio - 1.0) * batch * self.p_gain) as i64
        } else {
            let ratio = execution_time / self.target_time;
            -(f64::min(batch * 0.2, (ratio - 1.0) * batch * self.p_gain) as i64)
        };

        let next = self.batch as i64 + adjustment;
        self.batch = (next.max(0) as usize).clamp(self.min_batch, self.max_batch);

        debug!(
            execution_time,
            target = self.target_time,
            adjustment,
            batch = self.batch,
            "batch size adjusted"
        );
        self.batch
    }
}

impl Default for AdaptiveController {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BATCH, DEFAULT_MAX_BATCH, DEFAULT_TARGET_TIME)
    }
}

/// Per-query timeout coupled to the last batch wall-time:
/// `clamp(3t + 15, min, max)`.
pub fn next_timeout(execution_time: f64, min_timeout: u64, max_timeout: u64) -> u64 {
    let raw = (execution_time * 3.0) as u64 + 15;
    raw.clamp(min_timeout, max_timeout)
}

/// Timeout used before any batch has completed:
/// `clamp(1.5 * target + 15, min, max)`.
pub fn initial_timeout(target_time: f64, min_timeout: u64, max_timeout: u64) -> u64 {
    let raw = (target_time * 1.5) as u64 + 15;
    raw.clamp(min_timeout, max_timeout)
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
