// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn escaped_slashes_survive() {
    let payload = r#"{"Error_Path":"login01:\/home\/user123\/job.e473"}"#;
    let value = repair_payload(payload).unwrap();
    assert_eq!(value["Error_Path"], "login01:/home/user123/job.e473");
}

#[test]
fn even_backslash_runs_collapse_to_one_escape() {
    // six backslashes collapse to one, leaving a plain `\n` escape
    let payload = "{\"path\":\"a\\\\\\\\\\\\nb\"}";
    let value = repair_payload(payload).unwrap();
    assert_eq!(value["path"], "a\nb");
}

#[test]
fn odd_backslash_runs_keep_a_trailing_escape() {
    // three backslashes become an escaped backslash
    let payload = "{\"path\":\"a\\\\\\b\"}";
    let value = repair_payload(payload).unwrap();
    assert_eq!(value["path"], "a\\b");
}

#[test]
fn raw_quotes_inside_values_are_escaped() {
    let payload = r#"{"comment":"Job run at "Tue 13:04" and finished","queue":"compute"}"#;
    let value = repair_payload(payload).unwrap();
    assert_eq!(value["comment"], "Job run at \"Tue 13:04\" and finished");
    assert_eq!(value["queue"], "compute");
}

#[test]
fn invalid_escapes_are_stripped() {
    let payload = r#"{"arg":"\q\z"}"#;
    let value = repair_payload(payload).unwrap();
    assert_eq!(value["arg"], "qz");
}

#[test]
fn already_valid_documents_pass_through() {
    let payload = r#"{"a":"say \"hi\"","n":3,"t":"tab\there"}"#;
    let value = repair_payload(payload).unwrap();
    assert_eq!(value["a"], "say \"hi\"");
    assert_eq!(value["n"], 3);
    assert_eq!(value["t"], "tab\there");
}

#[test]
fn decode_error_reports_line() {
    let err = repair_payload("{\n\"broken\": ,\n}").unwrap_err();
    let RepairError::Decode { line, .. } = err;
    assert_eq!(line, 2);
}

#[test]
fn concatenated_documents_merge_jobs() {
    let content = concat!(
        r#"{"pbs_version":"19.2.8","Jobs":{"1.srv":{"job_state":"F"}}}"#,
        "### EOF ###",
        r#"{"Jobs":{"2.srv":{"job_state":"R"}}}"#,
    );
    let merged = parse_concatenated(content);
    assert_eq!(merged["pbs_version"], "19.2.8");
    assert_eq!(merged["Jobs"]["1.srv"]["job_state"], "F");
    assert_eq!(merged["Jobs"]["2.srv"]["job_state"], "R");
}

#[test]
fn malformed_middle_document_is_skipped() {
    let content = concat!(
        r#"{"Jobs":{"1":{"job_state":"F"}}}"#,
        "### EOF ###",
        "{this is not json}",
        "### EOF ###",
        r#"{"Jobs":{"2":{"job_state":"Q"}}}"#,
    );
    let merged = parse_concatenated(content);
    let jobs = merged["Jobs"].as_object().unwrap();
    assert_eq!(jobs.len(), 2);
}

#[test]
fn blank_segments_are_ignored() {
    let merged = parse_concatenated("### EOF ###\n  \n### EOF ###");
    assert_eq!(merged, json!({}));
}

#[test]
fn jobs_from_payload_strips_server_suffixes() {
    let merged = parse_concatenated(
        r#"{"Jobs":{"4732778.login02":{"job_state":"F","queue":"compute"}}}"#,
    );
    let jobs = jobs_from_payload(&merged);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, "4732778");
    assert_eq!(jobs[0].get_str("queue"), Some("compute"));
}

#[test]
fn jobs_from_payload_without_jobs_key_is_empty() {
    assert!(jobs_from_payload(&json!({"nodes": {}})).is_empty());
}
