// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    v19 = { "19.2.8", "v19." },
    v22 = { "22.05.2", "v22." },
    bare = { "19", "v19." },
)]
fn prefix_takes_the_major_version(version: &str, expected: &str) {
    assert_eq!(metric_prefix(version), expected);
}

#[test]
fn rollup_accumulates_metrics_in_order() {
    let mut rollup = GroupRollup::new(vec![("Qlist".to_string(), "q1".to_string())]);
    rollup.push_int("a", 1);
    rollup.push_float("b", 2.5);
    let names: Vec<&str> = rollup.metrics.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(rollup.value("a"), Some(&MetricValue::Int(1)));
    assert_eq!(rollup.value("missing"), None);
}
