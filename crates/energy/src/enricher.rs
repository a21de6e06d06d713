// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job-energy worker: consumes finished jobs, integrates their power
//! draw, and writes the energy payload back onto the job row.

use crate::config::NodeEnergyMap;
use crate::expr::PowerExpr;
use crate::integrate::{integrate_nodes, NodeSeries};
use crate::nodeset::expand_nodes;
use crate::series::{EnergyError, Sample, SeriesSource};
use gs_core::timeconv::{wall_to_epoch_ms, PBS_DATE_FORMAT};
use gs_store::JobStore;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct EnricherConfig {
    /// `J` or `Wh`; anything else falls back to joules with a note.
    pub unit: String,
    /// Timezone of the scheduler's wall-clock timestamps.
    pub timezone: String,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            unit: "J".to_string(),
            timezone: "Europe/Rome".to_string(),
        }
    }
}

/// Result of one job's integration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyReport {
    /// Total energy in the configured unit; `None` when no node had data.
    pub total: Option<f64>,
    pub per_node: Vec<(String, f64)>,
    pub unit: String,
    pub quality_score: f64,
    pub message: String,
}

pub struct EnergyEnricher<Q: SeriesSource, S: JobStore> {
    source: Q,
    store: S,
    nodes: NodeEnergyMap,
    config: EnricherConfig,
}

impl<Q: SeriesSource, S: JobStore> EnergyEnricher<Q, S> {
    pub fn new(source: Q, store: S, nodes: NodeEnergyMap, config: EnricherConfig) -> Self {
        Self {
            source,
            store,
            nodes,
            config,
        }
    }

    /// Consume the finished-job queue until it closes. Failures on a
    /// single job are logged and skipped; the worker stays up.
    pub async fn run(&self, rx: &mut mpsc::Receiver<Map<String, Value>>) -> Result<(), EnergyError> {
        while let Some(job) = rx.recv().await {
            let job_id = job
                .get("Job_Id")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            if let Err(err) = self.enrich(job).await {
                error!(job_id, %err, "energy enrichment failed");
            }
        }
        Ok(())
    }

    async fn enrich(&self, job: Map<String, Value>) -> Result<(), EnergyError> {
        let Some(job_id) = job.get("Job_Id").and_then(Value::as_str) else {
            warn!("job without Job_Id on the energy queue, skipping");
            return Ok(());
        };
        let Some(start_ms) = self.epoch_field(&job, "stime")? else {
            warn!(job_id, "job without stime, skipping energy");
            return Ok(());
        };
        let Some(end_ms) = self.epoch_field(&job, "mtime")? else {
            warn!(job_id, "job without mtime, skipping energy");
            return Ok(());
        };

        info!(job_id, "calculating energy for job");
        let nodes = job_nodes(&job);
        let report = self.report_for_nodes(&nodes, start_ms, end_ms).await?;
        info!(job_id, message = %report.message, "job energy computed");

        let total: Value = match report.total {
            Some(total) => json!(total),
            None => json!("NA"),
        };
        let payload = json!({
            "job_id": job_id,
            "data_quality_(%)": report.quality_score,
            "version": "v0.1",
            "total_energy_consumption": total,
            "message": report.message,
            "unit": report.unit,
        })
        .to_string();

        self.store
            .set_energy(payload, job_id, start_ms, end_ms)
            .await?;
        Ok(())
    }

    /// Integrate every node of a job over `[start, end]`.
    pub async fn report_for_nodes(
        &self,
        nodes: &[String],
        start_ms: i64,
        end_ms: i64,
    ) -> Result<EnergyReport, EnergyError> {
        let mut message = String::new();
        let mut with_data: Vec<NodeSeries> = Vec::new();
        let mut missing: Vec<String> = Vec::new();

        for node in nodes {
            let Some(node_config) = self.nodes.get(node) else {
                message.push_str(&format!(
                    "The node '{node}' does not support energy measurements; "
                ));
                missing.push(node.clone());
                continue;
            };

            let samples = if node_config.power_metrics.len() == 1 {
                self.source
                    .fetch(&node_config.power_metrics[0], node, start_ms, end_ms)
                    .await?
            } else {
                let mut per_metric = Vec::with_capacity(node_config.power_metrics.len());
                for metric in &node_config.power_metrics {
                    let series = self.source.fetch(metric, node, start_ms, end_ms).await?;
                    per_metric.push((metric.clone(), series));
                }
                let expr = PowerExpr::parse(&node_config.total_power)?;
                combine_metrics(&per_metric, &expr)
            };

            if samples.is_empty() {
                missing.push(node.clone());
            } else {
                with_data.push(NodeSeries {
                    node: node.clone(),
                    samples,
                });
            }
        }

        for node in &missing {
            if self.nodes.contains_key(node.as_str()) {
                message.push_str(&format!("Missing data for node: {node}; "));
            }
        }

        let quality_score = if nodes.is_empty() {
            0.0
        } else {
            with_data.len() as f64 / nodes.len() as f64 * 100.0
        };
        message.push_str(&format!("Missing nodes (%): {:.6}; ", 100.0 - quality_score));
        message.push_str(&format!("Quality score (%): {quality_score:.6}; "));

        let (unit, conversion) = match self.config.unit.as_str() {
            "J" => ("J", 1.0),
            "Wh" => ("Wh", 1.0 / 3600.0),
            _ => {
                message.push_str(
                    "Invalid unit. Supported units are 'J' (Joules) and 'Wh' (Watt-hours). \
                     The default 'J' unit is used. ",
                );
                ("J", 1.0)
            }
        };

        if with_data.is_empty() {
            return Ok(EnergyReport {
                total: None,
                per_node: Vec::new(),
                unit: unit.to_string(),
                quality_score: 0.0,
                message,
            });
        }

        let (per_node, total) = integrate_nodes(&with_data);
        Ok(EnergyReport {
            total: Some(total * conversion),
            per_node: per_node
                .into_iter()
                .map(|(node, energy)| (node, energy * conversion))
                .collect(),
            unit: unit.to_string(),
            quality_score,
            message,
        })
    }

    /// Epoch milliseconds from a field that may still be a wall-clock
    /// string (records arrive raw off the discovery queue) or already an
    /// integer.
    fn epoch_field(
        &self,
        job: &Map<String, Value>,
        key: &str,
    ) -> Result<Option<i64>, EnergyError> {
        match job.get(key) {
            Some(Value::String(raw)) => Ok(Some(wall_to_epoch_ms(
                raw,
                PBS_DATE_FORMAT,
                &self.config.timezone,
            )?)),
            Some(Value::Number(n)) => Ok(n.as_i64()),
            _ => Ok(None),
        }
    }
}

/// The job's node list: the compact `nodes` field when present, else the
/// hosts named in `exec_host` (`"node1299/0*48+node1300/0*48"`).
pub fn job_nodes(job: &Map<String, Value>) -> Vec<String> {
    if let Some(compact) = job.get("nodes").and_then(Value::as_str) {
        return expand_nodes(compact);
    }
    let Some(exec_host) = job.get("exec_host").and_then(Value::as_str) else {
        return Vec::new();
    };
    let mut nodes = Vec::new();
    for segment in exec_host.split('+') {
        let host = segment.split('/').next().unwrap_or(segment).to_string();
        if !host.is_empty() && !nodes.contains(&host) {
            nodes.push(host);
        }
    }
    nodes
}

/// Align several metric series on exact timestamps and evaluate the
/// total-power expression where every metric has a sample.
fn combine_metrics(per_metric: &[(String, Vec<Sample>)], expr: &PowerExpr) -> Vec<Sample> {
    let mut rows: HashMap<i64, HashMap<String, f64>> = HashMap::new();
    for (metric, samples) in per_metric {
        for sample in samples {
            rows.entry(sample.timestamp_ms)
                .or_default()
                .insert(metric.clone(), sample.value);
        }
    }

    let mut combined: Vec<Sample> = rows
        .into_iter()
        .filter(|(_, values)| values.len() == per_metric.len())
        .filter_map(|(timestamp_ms, values)| match expr.eval(&values) {
            Ok(value) => Some(Sample {
                timestamp_ms,
                value,
            }),
            Err(err) => {
                warn!(timestamp_ms, %err, "total_power evaluation failed for a row");
                None
            }
        })
        .collect();
    combined.sort_by_key(|s| s.timestamp_ms);
    combined
}

#[cfg(test)]
#[path = "enricher_tests.rs"]
mod tests;
