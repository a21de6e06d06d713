// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const RESPONSE: &str = "\
Entity;Measurable;Parameter;Type;Value;Age;State;Info
node001;CPUUsage;;cpu;42.5;10s;ok;
node001;Power;psu/1;pow;350;1m;ok;
short;row
";

fn base() -> BaseTags {
    BaseTags::new("e4", "galileo", "", "bcm_pub", "data")
}

fn units() -> std::collections::HashMap<String, String> {
    [("CPUUsage", "%"), ("Power", "W")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn rows_parse_with_header_skipped() {
    let rows = parse_rows(RESPONSE, 1);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].entity, "node001");
    assert_eq!(rows[0].measurable, "CPUUsage");
    assert_eq!(rows[1].parameter, "psu/1");
}

#[test]
fn wrong_field_counts_are_dropped() {
    let rows = parse_rows("a;b;c\n", 0);
    assert!(rows.is_empty());
}

#[test]
fn records_carry_age_corrected_timestamps() {
    let rows = parse_rows(RESPONSE, 1);
    let records = rows_to_metrics(&rows, 1_000_000, &units(), &base());

    assert_eq!(records[0].timestamp, 1_000_000 - 10_000);
    assert_eq!(records[1].timestamp, 1_000_000 - 60_000);
}

#[test]
fn tags_use_the_bcm_character_mapping() {
    let rows = parse_rows(RESPONSE, 1);
    let records = rows_to_metrics(&rows, 0, &units(), &base());

    let power = &records[1];
    assert_eq!(power.name, "Power");
    assert_eq!(power.tags["node"], "node001");
    // slash survives as a pipe on the BCM path
    assert_eq!(power.tags["parameter"], "psu|1");
    assert_eq!(power.tags["unit"], "W");
    // empty parameter reads as NA
    assert_eq!(records[0].tags["parameter"], "NA");
}

#[test]
fn unknown_measurable_has_na_unit() {
    let rows = parse_rows("n;Mystery;;t;1;0s;ok;\n", 0);
    let records = rows_to_metrics(&rows, 0, &units(), &base());
    assert_eq!(records[0].tags["unit"], "NA");
}

#[test]
fn values_narrow_to_int_float_or_text() {
    let rows = parse_rows(
        "n;A;;t;350;0s;ok;\nn;B;;t;42.5;0s;ok;\nn;C;;t;on;0s;ok;\n",
        0,
    );
    let records = rows_to_metrics(&rows, 0, &units(), &base());
    assert_eq!(records[0].value, gs_core::MetricValue::Int(350));
    assert_eq!(records[1].value, gs_core::MetricValue::Float(42.5));
    assert_eq!(records[2].value, gs_core::MetricValue::Text("on".to_string()));
}

#[test]
fn baseline_node_tag_is_replaced_in_place() {
    let rows = parse_rows(RESPONSE, 1);
    let records = rows_to_metrics(&rows, 0, &units(), &base());
    let keys: Vec<&str> = records[0].tags.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["org", "cluster", "node", "plugin", "chnl", "parameter", "type", "unit"]
    );
}
