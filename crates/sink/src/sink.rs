// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The downstream sink contract and its in-process implementations.
//!
//! The external message bus itself lives outside this repository; what is
//! fixed here is the wire format: each metric serialises to JSON
//! `{name, value, timestamp, tags}` published under a routing key built
//! from the flattened tag pairs.

use async_trait::async_trait;
use gs_core::{routing_key, MetricRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink closed")]
    Closed,
    #[error("serialisation failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One publishable unit: routing key plus serialised record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    pub topic: String,
    pub payload: MetricRecord,
}

/// Build the frame for a record.
pub fn wire_frame(record: &MetricRecord) -> WireFrame {
    WireFrame {
        topic: routing_key(&record.tags, &record.name),
        payload: record.clone(),
    }
}

/// Where normalised metrics go.
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn publish(&self, record: &MetricRecord) -> Result<(), SinkError>;
}

/// Hands records to another worker over a channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<MetricRecord>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<MetricRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MetricSink for ChannelSink {
    async fn publish(&self, record: &MetricRecord) -> Result<(), SinkError> {
        self.tx
            .send(record.clone())
            .await
            .map_err(|_| SinkError::Closed)
    }
}

/// Writes one frame per line; the stand-in transport for local runs.
pub struct NdjsonSink<W> {
    writer: tokio::sync::Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> NdjsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(writer),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MetricSink for NdjsonSink<W> {
    async fn publish(&self, record: &MetricRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&wire_frame(record))?;
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Swallows everything.
#[derive(Debug, Clone, Default)]
pub struct NullSink;

#[async_trait]
impl MetricSink for NullSink {
    async fn publish(&self, _record: &MetricRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Captures published records for assertions.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeSink {
    records: std::sync::Arc<parking_lot::Mutex<Vec<MetricRecord>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MetricRecord> {
        self.records.lock().clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl MetricSink for FakeSink {
    async fn publish(&self, record: &MetricRecord) -> Result<(), SinkError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
