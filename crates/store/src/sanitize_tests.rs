// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn finished_job() -> Map<String, Value> {
    json!({
        "Job_Id": "4732778",
        "job_state": "F",
        "queue": "compute",
        "ctime": "Tue Mar 12 10:27:52 2024",
        "mtime": "Wed Mar 13 13:10:13 2024",
        "stime": "Tue Mar 12 13:04:41 2024",
        "history_timestamp": 1710331813,
        "resources_used": {"ncpus": 48, "mem": "1622428kb"},
        "Resource_List": {"nodect": 1},
        "Variable_List": {"PBS_O_HOME": "/home/user123"},
        "forward_x11_port": null
    })
    .as_object()
    .unwrap()
    .clone()
}

#[test]
fn blobs_become_serialised_text() {
    let row = sanitize_job(finished_job(), "Europe/Rome", "19.2.8").unwrap();
    let used = row["resources_used"].as_str().unwrap();
    let parsed: Value = serde_json::from_str(used).unwrap();
    assert_eq!(parsed["ncpus"], 48);
    assert!(row["Resource_List"].is_string());
    assert!(row["Variable_List"].is_string());
}

#[test]
fn timestamps_become_utc_epoch_millis() {
    let row = sanitize_job(finished_job(), "Europe/Rome", "19.2.8").unwrap();
    // CET: 10:27:52 local == 09:27:52Z
    assert_eq!(row["ctime"], json!(1_710_235_672_000i64));
    assert!(row["mtime"].is_i64());
    assert!(row["stime"].is_i64());
}

#[test]
fn history_timestamp_is_promoted_to_millis() {
    let row = sanitize_job(finished_job(), "Europe/Rome", "19.2.8").unwrap();
    assert_eq!(row["history_timestamp"], json!(1_710_331_813_000i64));
}

#[test]
fn zero_history_timestamp_becomes_null() {
    let mut job = finished_job();
    job.insert("history_timestamp".to_string(), json!(0));
    let row = sanitize_job(job, "Europe/Rome", "19.2.8").unwrap();
    assert!(row["history_timestamp"].is_null());
}

#[test]
fn missing_stime_falls_back_to_mtime() {
    let mut job = finished_job();
    job.remove("stime");
    let row = sanitize_job(job, "Europe/Rome", "19.2.8").unwrap();
    assert_eq!(row["stime"], row["mtime"]);
    assert!(row["stime"].is_i64());
}

#[test]
fn version_is_annotated() {
    let row = sanitize_job(finished_job(), "Europe/Rome", "19.2.8").unwrap();
    assert_eq!(row["pbs_version"], "19.2.8");
}

#[test]
fn key_columns_are_stamped() {
    let row = sanitize_job(finished_job(), "Europe/Rome", "19.2.8").unwrap();
    assert_eq!(row["job_id"], "4732778");
    assert_eq!(row["start_time"], row["stime"]);
    assert_eq!(row["end_time"], row["mtime"]);
}

#[yare::parameterized(
    null_port = { json!(null), json!(null) },
    numeric_port = { json!(6010), json!(6010) },
    string_port = { json!("6010"), json!(6010) },
    true_port = { json!("true"), json!(1) },
    false_port = { json!("false"), json!(0) },
    garbage_port = { json!("no"), json!(null) },
    object_port = { json!({"x": 1}), json!(null) },
)]
fn forward_x11_port_is_coerced(input: Value, expected: Value) {
    let mut job = finished_job();
    job.insert("forward_x11_port".to_string(), input);
    let row = sanitize_job(job, "Europe/Rome", "19.2.8").unwrap();
    assert_eq!(row["forward_x11_port"], expected);
}

#[test]
fn unparseable_timestamp_is_an_error() {
    let mut job = finished_job();
    job.insert("ctime".to_string(), json!("yesterday-ish"));
    assert!(matches!(
        sanitize_job(job, "Europe/Rome", "19.2.8"),
        Err(SanitizeError::Timestamp { field: "ctime", .. })
    ));
}
