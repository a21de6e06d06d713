// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node snapshot rows from `pbsnodes -a -F json`.
//!
//! Memory figures keep the scheduler's unit: kb strings are reduced to
//! their leading integer.

use crate::repair::{repair_payload, RepairError};
use gs_rollup::NodeRow;
use serde_json::Value;

/// Leading integer of a resource figure (`"1622428kb"` → `1622428`).
pub fn extract_number(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn field_i64(section: Option<&Value>, key: &str) -> i64 {
    section
        .and_then(|s| s.get(key))
        .map(|v| match v {
            Value::Number(n) => n.as_i64().unwrap_or(0),
            Value::String(s) => extract_number(s).unwrap_or(0),
            _ => 0,
        })
        .unwrap_or(0)
}

fn field_str(section: Option<&Value>, key: &str) -> String {
    section
        .and_then(|s| s.get(key))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        // missing resources read as zero, like the numeric fields
        .unwrap_or_else(|| "0".to_string())
}

/// Decode the snapshot payload into rows, one per node.
pub fn parse_pbsnodes(payload: &str) -> Result<Vec<NodeRow>, RepairError> {
    let value = repair_payload(payload)?;
    let Some(nodes) = value.get("nodes").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::with_capacity(nodes.len());
    for (name, node) in nodes {
        let avail = node.get("resources_available");
        let assigned = node.get("resources_assigned");
        rows.push(NodeRow {
            node: name.clone(),
            state: node
                .get("state")
                .and_then(Value::as_str)
                .unwrap_or("state-unknown")
                .to_string(),
            qlist: field_str(avail, "Qlist"),
            vnode: field_str(avail, "vnode"),
            cpus_avail: field_i64(avail, "ncpus"),
            cpus_assigned: field_i64(assigned, "ncpus"),
            mem_avail: field_i64(avail, "mem"),
            mem_assigned: field_i64(assigned, "mem"),
            gpus_avail: field_i64(avail, "ngpus"),
            gpus_assigned: field_i64(assigned, "ngpus"),
        });
    }
    Ok(rows)
}

#[cfg(test)]
#[path = "nodes_tests.rs"]
mod tests;
