// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gs_core::BaseTags;

fn record() -> MetricRecord {
    let tags = BaseTags::new("e4", "galileo", "login01", "pbs_pub", "data").to_map();
    MetricRecord::new("v19.totals.cpus_alloc", 48i64, 1_710_000_000_000, tags)
}

#[test]
fn frame_topic_is_the_routing_key() {
    let frame = wire_frame(&record());
    assert_eq!(
        frame.topic,
        "org/e4/cluster/galileo/node/login01/plugin/pbs_pub/chnl/data/v19.totals.cpus_alloc"
    );
}

#[test]
fn frame_payload_serialises_the_canonical_shape() {
    let frame = wire_frame(&record());
    let json = serde_json::to_value(&frame.payload).unwrap();
    assert_eq!(json["name"], "v19.totals.cpus_alloc");
    assert_eq!(json["value"], 48);
    assert_eq!(json["timestamp"], 1_710_000_000_000i64);
    assert_eq!(json["tags"]["org"], "e4");
}

#[tokio::test]
async fn channel_sink_hands_records_off() {
    let (sink, mut rx) = ChannelSink::new(4);
    sink.publish(&record()).await.unwrap();
    let received = rx.recv().await.unwrap();
    assert_eq!(received, record());
}

#[tokio::test]
async fn channel_sink_reports_closed_receiver() {
    let (sink, rx) = ChannelSink::new(4);
    drop(rx);
    let err = sink.publish(&record()).await.unwrap_err();
    assert!(matches!(err, SinkError::Closed));
}

#[tokio::test]
async fn ndjson_sink_writes_one_frame_per_line() {
    let sink = NdjsonSink::new(Vec::new());
    sink.publish(&record()).await.unwrap();
    sink.publish(&record()).await.unwrap();

    let buffer = sink.writer.into_inner();
    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let frame: WireFrame = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(frame.payload, record());
}

#[tokio::test]
async fn fake_sink_captures_records() {
    let sink = FakeSink::new();
    sink.publish(&record()).await.unwrap();
    assert_eq!(sink.records().len(), 1);
}
