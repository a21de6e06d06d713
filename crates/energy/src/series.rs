// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The time-series store the enricher reads power samples from.

use async_trait::async_trait;
use gs_store::StoreError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnergyError {
    #[error("cannot read node config {path}: {source}")]
    Config {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed node config: {0}")]
    ConfigFormat(#[from] serde_json::Error),
    #[error("series query failed: {0}")]
    Query(String),
    #[error(transparent)]
    Expr(#[from] crate::expr::ExprError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Time(#[from] gs_core::timeconv::TimeConvError),
}

/// One power sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: f64,
}

/// Read access to per-node metric series over a time window.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(
        &self,
        metric: &str,
        node: &str,
        start_ms: i64,
        stop_ms: i64,
    ) -> Result<Vec<Sample>, EnergyError>;
}

/// HTTP client for the time-series store's datapoint query endpoint.
pub struct HttpSeriesSource {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
}

impl HttpSeriesSource {
    pub fn new(host: &str, port: u16, user: &str, password: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{host}:{port}"),
            user: user.to_string(),
            password: password.to_string(),
        }
    }
}

#[async_trait]
impl SeriesSource for HttpSeriesSource {
    async fn fetch(
        &self,
        metric: &str,
        node: &str,
        start_ms: i64,
        stop_ms: i64,
    ) -> Result<Vec<Sample>, EnergyError> {
        let body = json!({
            "start_absolute": start_ms,
            "end_absolute": stop_ms,
            "metrics": [{
                "name": metric,
                "tags": { "node": [node] }
            }]
        });

        let response = self
            .client
            .post(format!("{}/api/v1/datapoints/query", self.base_url))
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| EnergyError::Query(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EnergyError::Query(format!(
                "{} querying {metric} for {node}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| EnergyError::Query(e.to_string()))?;

        let mut samples = Vec::new();
        if let Some(values) = payload
            .pointer("/queries/0/results/0/values")
            .and_then(Value::as_array)
        {
            for pair in values {
                let (Some(ts), Some(value)) = (
                    pair.get(0).and_then(Value::as_i64),
                    pair.get(1).and_then(Value::as_f64),
                ) else {
                    continue;
                };
                samples.push(Sample {
                    timestamp_ms: ts,
                    value,
                });
            }
        }
        samples.sort_by_key(|s| s.timestamp_ms);
        Ok(samples)
    }
}

/// Scripted series for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeSeriesSource {
    series: std::sync::Arc<parking_lot::Mutex<std::collections::HashMap<(String, String), Vec<Sample>>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeSeriesSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, metric: &str, node: &str, samples: Vec<Sample>) {
        self.series
            .lock()
            .insert((metric.to_string(), node.to_string()), samples);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl SeriesSource for FakeSeriesSource {
    async fn fetch(
        &self,
        metric: &str,
        node: &str,
        start_ms: i64,
        stop_ms: i64,
    ) -> Result<Vec<Sample>, EnergyError> {
        Ok(self
            .series
            .lock()
            .get(&(metric.to_string(), node.to_string()))
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.timestamp_ms >= start_ms && s.timestamp_ms <= stop_ms)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}
