// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SNAPSHOT: &str = r#"{
  "nodes": {
    "node1299": {
      "state": "job-busy",
      "resources_available": {
        "ncpus": 48,
        "ngpus": 4,
        "mem": "196608000kb",
        "Qlist": "q1",
        "vnode": "node1299"
      },
      "resources_assigned": {
        "ncpus": 48,
        "ngpus": 2,
        "mem": "98304000kb"
      }
    },
    "node1300": {
      "state": "free",
      "resources_available": {
        "ncpus": 48,
        "mem": "196608000kb",
        "Qlist": "q1",
        "vnode": "node1300"
      },
      "resources_assigned": {}
    }
  }
}"#;

#[test]
fn rows_carry_resources_and_state() {
    let rows = parse_pbsnodes(SNAPSHOT).unwrap();
    assert_eq!(rows.len(), 2);

    let busy = rows.iter().find(|r| r.node == "node1299").unwrap();
    assert_eq!(busy.state, "job-busy");
    assert_eq!(busy.qlist, "q1");
    assert_eq!(busy.cpus_avail, 48);
    assert_eq!(busy.cpus_assigned, 48);
    assert_eq!(busy.mem_avail, 196_608_000);
    assert_eq!(busy.mem_assigned, 98_304_000);
    assert_eq!(busy.gpus_assigned, 2);

    let free = rows.iter().find(|r| r.node == "node1300").unwrap();
    assert_eq!(free.cpus_assigned, 0);
    assert_eq!(free.gpus_avail, 0);
    assert_eq!(free.mem_assigned, 0);
}

#[test]
fn missing_qlist_reads_as_zero_label() {
    let rows = parse_pbsnodes(r#"{"nodes":{"n1":{"state":"free","resources_available":{"ncpus":4}}}}"#).unwrap();
    assert_eq!(rows[0].qlist, "0");
}

#[test]
fn empty_payload_has_no_rows() {
    assert!(parse_pbsnodes(r#"{"pbs_version":"19.2.8"}"#).unwrap().is_empty());
}

#[yare::parameterized(
    kb_suffix = { "1622428kb", Some(1_622_428) },
    plain = { "48", Some(48) },
    no_digits = { "kb", None },
    zero = { "0", Some(0) },
)]
fn leading_numbers(raw: &str, expected: Option<i64>) {
    assert_eq!(extract_number(raw), expected);
}
