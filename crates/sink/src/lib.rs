// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gs-sink: metric normalisation, deduplication and the downstream sink.

pub mod dedup;
pub mod normalize;
pub mod reader;
pub mod schema;
pub mod sink;

pub use dedup::{DedupEmitter, DedupStats, DEDUP_WINDOW_MS};
pub use normalize::{rollups_to_metrics, values_response_to_metrics};
pub use schema::{list_schema, parse_lines, Converter, MapColumn, Schema};
pub use reader::{tick_delay, ReaderError, Sensor, SensorError, SensorReader};
pub use sink::{wire_frame, ChannelSink, MetricSink, NdjsonSink, NullSink, SinkError, WireFrame};

#[cfg(any(test, feature = "test-support"))]
pub use sink::FakeSink;
