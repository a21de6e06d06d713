// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sink::FakeSink;
use gs_core::BaseTags;

fn record(name: &str, timestamp: i64) -> MetricRecord {
    let tags = BaseTags::new("e4", "galileo", "node1", "bcm_pub", "data").to_map();
    MetricRecord::new(name, 1.5f64, timestamp, tags)
}

fn emitter() -> DedupEmitter {
    DedupEmitter::new(1000, None)
}

#[tokio::test]
async fn repeat_within_window_is_a_hit() {
    let sink = FakeSink::new();
    let mut dedup = emitter();

    let stats = dedup
        .pump([record("power", 1000), record("power", 2000)], &sink)
        .await
        .unwrap();
    assert_eq!(stats, DedupStats { emitted: 1, hits: 1 });
    assert_eq!(sink.records().len(), 1);
}

#[tokio::test]
async fn repeat_past_the_window_is_emitted() {
    let sink = FakeSink::new();
    let mut dedup = emitter();

    dedup.pump([record("power", 1000)], &sink).await.unwrap();
    let stats = dedup.pump([record("power", 7000)], &sink).await.unwrap();
    assert_eq!(stats.emitted, 1);
    assert_eq!(sink.records().len(), 2);
}

#[tokio::test]
async fn window_boundary_is_inclusive() {
    let sink = FakeSink::new();
    let mut dedup = emitter();

    dedup.pump([record("power", 1000)], &sink).await.unwrap();
    let stats = dedup.pump([record("power", 6000)], &sink).await.unwrap();
    assert_eq!(stats.emitted, 1);
}

#[tokio::test]
async fn different_identities_do_not_collide() {
    let sink = FakeSink::new();
    let mut dedup = emitter();

    let stats = dedup
        .pump([record("power", 1000), record("temp", 1000)], &sink)
        .await
        .unwrap();
    assert_eq!(stats.emitted, 2);
}

#[tokio::test]
async fn schema_header_rows_are_discarded() {
    let sink = FakeSink::new();
    let mut dedup = emitter();

    let stats = dedup
        .pump([record("--------", 1000), record("power", 1000)], &sink)
        .await
        .unwrap();
    assert_eq!(stats, DedupStats { emitted: 1, hits: 0 });
    assert_eq!(sink.records()[0].name, "power");
}

#[tokio::test]
async fn custom_window_is_respected() {
    let sink = FakeSink::new();
    let mut dedup = emitter().with_window_ms(100);

    dedup.pump([record("power", 1000)], &sink).await.unwrap();
    let stats = dedup.pump([record("power", 1100)], &sink).await.unwrap();
    assert_eq!(stats.emitted, 1);
}
