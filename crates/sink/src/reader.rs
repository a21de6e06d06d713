// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tick-aligned sensor loop shared by all publishers.

use crate::dedup::{DedupEmitter, DedupStats};
use crate::sink::{MetricSink, SinkError};
use async_trait::async_trait;
use gs_core::{Clock, MetricRecord};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// A sensor failure the worker cannot recover from (e.g. a dead
/// interactive session). The reader loop propagates it so the process
/// can exit and be respawned clean.
#[derive(Debug, Error)]
#[error("fatal sensor failure: {0}")]
pub struct SensorError(pub String);

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// A data source that produces one batch of normalised records per tick.
#[async_trait]
pub trait Sensor: Send {
    async fn read(&mut self) -> Result<(i64, Vec<MetricRecord>), SensorError>;
}

/// Delay until the next tick boundary: `TS - (now mod TS)`.
pub fn tick_delay(now_ms: i64, ts_secs: u64) -> Duration {
    let period_ms = ts_secs as i64 * 1000;
    if period_ms <= 0 {
        return Duration::ZERO;
    }
    let rem = now_ms.rem_euclid(period_ms);
    Duration::from_millis((period_ms - rem) as u64)
}

/// Pulls a sensor each tick, deduplicates, and hands records to the sink.
pub struct SensorReader<S, K, C> {
    sensor: S,
    sink: K,
    clock: C,
    dedup: DedupEmitter,
    ts_secs: u64,
    worker_id: String,
}

impl<S: Sensor, K: MetricSink, C: Clock> SensorReader<S, K, C> {
    pub fn new(
        worker_id: &str,
        sensor: S,
        sink: K,
        clock: C,
        dedup: DedupEmitter,
        ts_secs: u64,
    ) -> Self {
        Self {
            sensor,
            sink,
            clock,
            dedup,
            ts_secs,
            worker_id: worker_id.to_string(),
        }
    }

    /// One read/convert/publish pass.
    pub async fn run_once(&mut self) -> Result<DedupStats, ReaderError> {
        let read_start = self.clock.now();
        let (_timestamp, records) = self.sensor.read().await?;
        let read_secs = read_start.elapsed().as_secs_f64();

        let convert_start = self.clock.now();
        let count = records.len();
        let stats = self.dedup.pump(records, &self.sink).await?;
        let convert_secs = convert_start.elapsed().as_secs_f64();
        let rate = if convert_secs > 0.0 {
            count as f64 / convert_secs
        } else {
            0.0
        };

        debug!(
            worker = %self.worker_id,
            read_secs,
            sensors = count,
            convert_secs,
            rate,
            emitted = stats.emitted,
            hits = stats.hits,
            "tick complete"
        );
        Ok(stats)
    }

    /// Tick-aligned loop; returns only on a fatal sensor or sink error.
    pub async fn run(&mut self) -> Result<(), ReaderError> {
        loop {
            let delay = tick_delay(self.clock.epoch_ms(), self.ts_secs);
            tokio::time::sleep(delay).await;
            self.run_once().await?;
        }
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
