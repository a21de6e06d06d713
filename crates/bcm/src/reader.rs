// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cmsh-backed sensor.

use crate::normalize::{parse_rows, rows_to_metrics};
use async_trait::async_trait;
use gs_core::{BaseTags, Clock, MetricRecord};
use gs_exec::ShellSession;
use gs_sink::{Sensor, SensorError};
use std::collections::HashMap;
use tracing::debug;

/// Monitoring query issued each tick.
pub const BCM_TOOL_CMD: &str = r#"latestmonitoringdata -u -d ";" --raw -c compute,gpu"#;

/// Prompt substring that frames a response.
pub const BCM_STOP_SEQUENCE: &str = "->device]%";

/// Field count of a monitoring row.
pub const BCM_COLUMNS: usize = 8;

/// Header lines dropped from each response.
const SKIP_LINES: usize = 1;

/// Reads monitoring rows from a persistent cluster-manager shell.
///
/// Session failures surface as [`SensorError`]: the session's prompt
/// state is unknowable afterwards, so the worker exits and the
/// supervisor restarts it with a fresh child.
pub struct BcmReader<C: Clock> {
    session: ShellSession,
    tool_cmd: String,
    units: HashMap<String, String>,
    base: BaseTags,
    clock: C,
}

impl<C: Clock> BcmReader<C> {
    pub fn new(
        session: ShellSession,
        tool_cmd: &str,
        units: HashMap<String, String>,
        base: BaseTags,
        clock: C,
    ) -> Self {
        Self {
            session,
            tool_cmd: tool_cmd.to_string(),
            units,
            base,
            clock,
        }
    }

    pub async fn close(self) {
        self.session.close().await;
    }
}

#[async_trait]
impl<C: Clock> Sensor for BcmReader<C> {
    async fn read(&mut self) -> Result<(i64, Vec<MetricRecord>), SensorError> {
        let read_time_ms = self.clock.epoch_ms();
        let raw = self
            .session
            .run(&self.tool_cmd)
            .await
            .map_err(|e| SensorError(e.to_string()))?;
        let rows = parse_rows(&raw, SKIP_LINES);
        debug!(rows = rows.len(), "monitoring rows this tick");
        Ok((
            read_time_ms,
            rows_to_metrics(&rows, read_time_ms, &self.units, &self.base),
        ))
    }
}
