// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job snapshot statistics grouped by (project, queue, job_state).
//!
//! Keeps a one-tick latch of finished job ids so a job reported as
//! finished in consecutive ticks is only aggregated once.

use crate::group::GroupRollup;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// One job row, timestamps already converted to UTC epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobSample {
    pub id: String,
    pub state: String,
    pub project: String,
    pub queue: String,
    pub owner: String,
    pub ctime_ms: Option<i64>,
    pub stime_ms: Option<i64>,
    pub nodect: i64,
}

/// Stateful job aggregator with the finished-job latch.
#[derive(Debug, Default)]
pub struct JobStats {
    previous_finished: HashSet<String>,
}

impl JobStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate one tick. `now_secs` is the snapshot read time in epoch
    /// seconds; metrics come out as `<prefix>jobs.*`.
    pub fn rollup(
        &mut self,
        samples: Vec<JobSample>,
        now_secs: f64,
        prefix: &str,
    ) -> Vec<GroupRollup> {
        // latch the current finished set, drop the previous one
        let latched: HashSet<String> = samples
            .iter()
            .filter(|s| s.state == "F")
            .map(|s| s.id.clone())
            .collect();
        let seen_before = std::mem::replace(&mut self.previous_finished, latched);
        let samples: Vec<JobSample> = samples
            .into_iter()
            .filter(|s| !seen_before.contains(&s.id))
            .collect();
        let fresh_finished = samples.iter().filter(|s| s.state == "F").count();
        info!(fresh_finished, "new finished jobs this tick");

        let mut groups: BTreeMap<(String, String, String), Vec<&JobSample>> = BTreeMap::new();
        for sample in &samples {
            groups
                .entry((
                    sample.project.clone(),
                    sample.queue.clone(),
                    sample.state.clone(),
                ))
                .or_default()
                .push(sample);
        }

        groups
            .into_iter()
            .map(|((project, queue, state), members)| {
                let tot_jobs = members.len() as i64;
                let tot_nodes: i64 = members.iter().map(|s| s.nodect).sum();
                let tot_users = members
                    .iter()
                    .map(|s| s.owner.as_str())
                    .collect::<HashSet<_>>()
                    .len() as i64;

                let node_hours: Vec<f64> = members
                    .iter()
                    .filter_map(|s| {
                        s.ctime_ms.map(|ctime| {
                            (now_secs - ctime as f64 / 1000.0) / 3600.0 * s.nodect as f64
                        })
                    })
                    .collect();

                let waits: Vec<f64> = members
                    .iter()
                    .filter_map(|s| {
                        let ctime = s.ctime_ms?;
                        // missing start time reads as zero, like the source
                        let stime = s.stime_ms.unwrap_or(0);
                        let mut wait = (stime as f64 - ctime as f64) / 3_600_000.0;
                        if state == "R" && wait < 0.0 {
                            warn!(job = %s.id, stime, ctime, "negative wait time for running job");
                            wait = 0.0;
                        }
                        Some(wait)
                    })
                    .collect();

                let mut out = GroupRollup::new(vec![
                    ("project".to_string(), project),
                    ("queue".to_string(), queue),
                    ("job_state".to_string(), state),
                ]);
                out.push_int(format!("{prefix}jobs.tot_jobs"), tot_jobs);
                out.push_int(format!("{prefix}jobs.tot_nodes"), tot_nodes);
                out.push_float(format!("{prefix}jobs.tot_node_hour"), node_hours.iter().sum());
                out.push_float(format!("{prefix}jobs.avg_waiting_hour"), mean(&waits));
                out.push_float(
                    format!("{prefix}jobs.p95_waiting_hour"),
                    quantile(&waits, 0.95),
                );
                out.push_int(format!("{prefix}jobs.tot_users"), tot_users);
                out
            })
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolated quantile over the sorted values.
fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = pos - lower as f64;
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
