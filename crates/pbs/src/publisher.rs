// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The publisher-side sensors: node snapshots and job accounting.
//!
//! Both implement the shared [`Sensor`] contract so the tick-aligned
//! reader loop drives them. The job sensor additionally fans finished
//! jobs out to the durable table and energy queues before the metric
//! roll-ups are built.

use crate::commands::PBSNODES_CMD;
use crate::discovery::JobFetcher;
use crate::job::JobRecord;
use crate::nodes::parse_pbsnodes;
use async_trait::async_trait;
use gs_core::timeconv::{wall_to_epoch_ms, PBS_DATE_FORMAT};
use gs_core::{BaseTags, Clock, MetricRecord, SanitizeMode};
use gs_exec::CommandRunner;
use gs_rollup::{
    cpu_totals, gpu_totals, memory_totals, node_totals, utilisation, GroupRollup, JobSample,
    JobStats,
};
use gs_sink::{rollups_to_metrics, Sensor, SensorError};
use gs_store::TickJobs;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::warn;

/// Default grouping column for node roll-ups.
pub const DEFAULT_GROUP_BY: &str = "Qlist";

/// Node snapshot sensor: `pbsnodes` → grouped totals and utilisation.
pub struct NodeSensor<R: CommandRunner, C: Clock> {
    runner: R,
    clock: C,
    base: BaseTags,
    prefix: String,
    group_by: String,
}

impl<R: CommandRunner, C: Clock> NodeSensor<R, C> {
    pub fn new(runner: R, clock: C, base: BaseTags, prefix: &str) -> Self {
        Self {
            runner,
            clock,
            base,
            prefix: prefix.to_string(),
            group_by: DEFAULT_GROUP_BY.to_string(),
        }
    }
}

#[async_trait]
impl<R: CommandRunner, C: Clock> Sensor for NodeSensor<R, C> {
    async fn read(&mut self) -> Result<(i64, Vec<MetricRecord>), SensorError> {
        let timestamp_ms = self.clock.epoch_ms();

        let output = match self.runner.run(PBSNODES_CMD).await {
            Ok(out) if out.ok => out,
            Ok(out) => {
                warn!(stderr = %out.stderr, "node snapshot query failed");
                return Ok((timestamp_ms, Vec::new()));
            }
            Err(err) => {
                warn!(%err, "node snapshot query failed");
                return Ok((timestamp_ms, Vec::new()));
            }
        };

        let rows = match parse_pbsnodes(&output.stdout) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(%err, "node snapshot payload unparseable");
                return Ok((timestamp_ms, Vec::new()));
            }
        };
        if rows.is_empty() {
            warn!("empty node snapshot");
            return Ok((timestamp_ms, Vec::new()));
        }

        let mut rollups: Vec<GroupRollup> = Vec::new();
        rollups.extend(memory_totals(&rows, &self.group_by, &self.prefix));
        rollups.extend(cpu_totals(&rows, &self.group_by, &self.prefix));
        rollups.extend(gpu_totals(&rows, &self.group_by, &self.prefix));
        rollups.extend(node_totals(&rows, &self.group_by, &self.prefix));
        rollups.extend(utilisation(&rows, &self.group_by, &self.prefix));

        Ok((
            timestamp_ms,
            rollups_to_metrics(&rollups, timestamp_ms, &self.base, SanitizeMode::Scheduler),
        ))
    }
}

/// Turn one job record into an aggregation sample, converting the
/// scheduler's wall-clock timestamps on the way.
pub fn job_sample(record: &JobRecord, timezone: &str) -> JobSample {
    let epoch = |key: &str| {
        record
            .get_str(key)
            .and_then(|raw| wall_to_epoch_ms(raw, PBS_DATE_FORMAT, timezone).ok())
    };
    let nodect = record
        .fields
        .get("Resource_List")
        .and_then(|list| list.get("nodect"))
        .map(|v| match v {
            Value::Number(n) => n.as_i64().unwrap_or(0),
            Value::String(s) => s.parse().unwrap_or(0),
            _ => 0,
        })
        .unwrap_or(0);

    JobSample {
        id: record.id.clone(),
        state: record.get_str("job_state").unwrap_or("").to_string(),
        project: record.get_str("project").unwrap_or("").to_string(),
        queue: record.get_str("queue").unwrap_or("").to_string(),
        owner: record.get_str("Job_Owner").unwrap_or("").to_string(),
        ctime_ms: epoch("ctime"),
        stime_ms: epoch("stime"),
        nodect,
    }
}

/// Job accounting sensor: discovery → fan-out → grouped job stats.
pub struct JobSensor<R: CommandRunner, C: Clock> {
    fetcher: JobFetcher<R, C>,
    stats: JobStats,
    base: BaseTags,
    prefix: String,
    timezone: String,
    table_tx: mpsc::Sender<TickJobs>,
    energy_tx: mpsc::Sender<Map<String, Value>>,
}

impl<R: CommandRunner, C: Clock> JobSensor<R, C> {
    pub fn new(
        fetcher: JobFetcher<R, C>,
        base: BaseTags,
        prefix: &str,
        timezone: &str,
        table_tx: mpsc::Sender<TickJobs>,
        energy_tx: mpsc::Sender<Map<String, Value>>,
    ) -> Self {
        Self {
            fetcher,
            stats: JobStats::new(),
            base,
            prefix: prefix.to_string(),
            timezone: timezone.to_string(),
            table_tx,
            energy_tx,
        }
    }

    fn fields_of(record: &JobRecord) -> Map<String, Value> {
        record.fields.clone()
    }
}

#[async_trait]
impl<R: CommandRunner, C: Clock> Sensor for JobSensor<R, C> {
    async fn read(&mut self) -> Result<(i64, Vec<MetricRecord>), SensorError> {
        let tick = self.fetcher.read().await;

        // durable streams first: persistence must not wait on metrics
        let finished: Vec<Map<String, Value>> =
            tick.finished.iter().map(Self::fields_of).collect();
        self.table_tx
            .send(TickJobs {
                timestamp_ms: tick.timestamp_ms,
                jobs: finished.clone(),
            })
            .await
            .map_err(|_| SensorError("job table queue closed".to_string()))?;
        for job in finished {
            self.energy_tx
                .send(job)
                .await
                .map_err(|_| SensorError("job energy queue closed".to_string()))?;
        }

        if tick.all.is_empty() {
            warn!("empty job snapshot");
            return Ok((tick.timestamp_ms, Vec::new()));
        }

        let samples: Vec<JobSample> = tick
            .all
            .iter()
            .map(|record| job_sample(record, &self.timezone))
            .collect();
        let rollups = self
            .stats
            .rollup(samples, tick.timestamp_ms as f64 / 1000.0, &self.prefix);

        Ok((
            tick.timestamp_ms,
            rollups_to_metrics(&rollups, tick.timestamp_ms, &self.base, SanitizeMode::Scheduler),
        ))
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
