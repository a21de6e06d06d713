// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node snapshot aggregation: CPU, memory, GPU and node-count totals per
//! grouping label, plus derived cluster utilisation.

use crate::group::GroupRollup;
use std::collections::BTreeMap;

/// One compute node in a snapshot tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeRow {
    pub node: String,
    pub state: String,
    pub qlist: String,
    pub vnode: String,
    pub cpus_avail: i64,
    pub cpus_assigned: i64,
    pub mem_avail: i64,
    pub mem_assigned: i64,
    pub gpus_avail: i64,
    pub gpus_assigned: i64,
}

impl NodeRow {
    fn group_value(&self, group_by: &str) -> &str {
        match group_by {
            "Qlist" => &self.qlist,
            "state" => &self.state,
            "vnode" => &self.vnode,
            _ => &self.node,
        }
    }

    fn is_down(&self) -> bool {
        DOWN_STATES.contains(&self.state.as_str())
    }
}

/// States that make a node's resources ineligible.
pub const DOWN_STATES: [&str; 5] = [
    "down,offline",
    "state-unknown,offline",
    "offline",
    "down",
    "state-unknown,down",
];

/// Node-count states reported individually, in emission order.
const NODE_STATES: [(&str, &str); 7] = [
    ("down,offline", "total_nodes_down_offline"),
    ("job-busy", "total_nodes_alloc"),
    ("free", "total_nodes_free"),
    ("state-unknown,offline", "total_nodes_state-unknown_offline"),
    ("offline", "total_nodes_offline"),
    ("down", "total_nodes_state-down"),
    ("state-unknown,down", "total_nodes_state-unknown_down"),
];

fn grouped<'a>(rows: &'a [NodeRow], group_by: &str) -> BTreeMap<String, Vec<&'a NodeRow>> {
    let mut groups: BTreeMap<String, Vec<&NodeRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.group_value(group_by).to_string())
            .or_default()
            .push(row);
    }
    groups
}

/// `cpus_alloc`, `cpus_idle`, `cpus_config`, `cpus_down`, `cpus_eligible`.
pub fn cpu_totals(rows: &[NodeRow], group_by: &str, prefix: &str) -> Vec<GroupRollup> {
    grouped(rows, group_by)
        .into_iter()
        .map(|(label, members)| {
            let alloc: i64 = members.iter().map(|r| r.cpus_assigned).sum();
            let idle: i64 = members.iter().map(|r| r.cpus_avail - r.cpus_assigned).sum();
            let config: i64 = members.iter().map(|r| r.cpus_avail).sum();
            let down: i64 = members
                .iter()
                .filter(|r| r.is_down())
                .map(|r| r.cpus_avail)
                .sum();

            let mut out = GroupRollup::new(vec![(group_by.to_string(), label)]);
            out.push_int(format!("{prefix}totals.cpus_alloc"), alloc);
            out.push_int(format!("{prefix}totals.cpus_idle"), idle);
            out.push_int(format!("{prefix}totals.cpus_config"), config);
            out.push_int(format!("{prefix}totals.cpus_down"), down);
            out.push_int(format!("{prefix}totals.cpus_eligible"), config - down);
            out
        })
        .collect()
}

/// Memory totals; `memory_alloc` only counts nodes busy with a job.
pub fn memory_totals(rows: &[NodeRow], group_by: &str, prefix: &str) -> Vec<GroupRollup> {
    grouped(rows, group_by)
        .into_iter()
        .map(|(label, members)| {
            let config: i64 = members.iter().map(|r| r.mem_avail).sum();
            let down: i64 = members
                .iter()
                .filter(|r| r.is_down())
                .map(|r| r.mem_avail)
                .sum();
            let alloc: i64 = members
                .iter()
                .filter(|r| r.state == "job-busy")
                .map(|r| r.mem_avail)
                .sum();

            let mut out = GroupRollup::new(vec![(group_by.to_string(), label)]);
            out.push_int(format!("{prefix}totals.memory_config"), config);
            out.push_int(format!("{prefix}totals.memory_down"), down);
            out.push_int(format!("{prefix}totals.memory_alloc"), alloc);
            out.push_int(format!("{prefix}totals.memory_eligible"), config - down);
            out.push_int(format!("{prefix}totals.memory_idle"), config - alloc);
            out
        })
        .collect()
}

/// GPU totals; idle is eligible minus allocated.
pub fn gpu_totals(rows: &[NodeRow], group_by: &str, prefix: &str) -> Vec<GroupRollup> {
    grouped(rows, group_by)
        .into_iter()
        .map(|(label, members)| {
            let alloc: i64 = members.iter().map(|r| r.gpus_assigned).sum();
            let config: i64 = members.iter().map(|r| r.gpus_avail).sum();
            let down: i64 = members
                .iter()
                .filter(|r| r.is_down())
                .map(|r| r.gpus_avail)
                .sum();
            let eligible = config - down;

            let mut out = GroupRollup::new(vec![(group_by.to_string(), label)]);
            out.push_int(format!("{prefix}totals.gpus_alloc"), alloc);
            out.push_int(format!("{prefix}totals.gpus_config"), config);
            out.push_int(format!("{prefix}totals.gpus_down"), down);
            out.push_int(format!("{prefix}totals.gpus_eligible"), eligible);
            out.push_int(format!("{prefix}totals.gpus_idle"), eligible - alloc);
            out
        })
        .collect()
}

/// Distinct node counts per state plus config/down/eligible totals.
pub fn node_totals(rows: &[NodeRow], group_by: &str, prefix: &str) -> Vec<GroupRollup> {
    grouped(rows, group_by)
        .into_iter()
        .map(|(label, members)| {
            let config = members.len() as i64;
            let down = members.iter().filter(|r| r.is_down()).count() as i64;

            let mut out = GroupRollup::new(vec![(group_by.to_string(), label)]);
            out.push_int(format!("{prefix}totals.total_nodes_config"), config);
            out.push_int(format!("{prefix}totals.total_nodes_down"), down);
            out.push_int(format!("{prefix}totals.total_nodes_eligible"), config - down);
            for (state, name) in NODE_STATES {
                let count = members.iter().filter(|r| r.state == state).count() as i64;
                out.push_int(format!("{prefix}totals.{name}"), count);
            }
            out
        })
        .collect()
}

/// Cluster utilisation per group: `100 * alloc / eligible`, zero when the
/// denominator is zero.
pub fn utilisation(rows: &[NodeRow], group_by: &str, prefix: &str) -> Vec<GroupRollup> {
    fn ratio(alloc: i64, eligible: i64) -> f64 {
        if eligible == 0 {
            0.0
        } else {
            alloc as f64 * 100.0 / eligible as f64
        }
    }

    grouped(rows, group_by)
        .into_iter()
        .map(|(label, members)| {
            let cpu_alloc: i64 = members.iter().map(|r| r.cpus_assigned).sum();
            let cpu_config: i64 = members.iter().map(|r| r.cpus_avail).sum();
            let cpu_down: i64 = members
                .iter()
                .filter(|r| r.is_down())
                .map(|r| r.cpus_avail)
                .sum();

            let mem_alloc: i64 = members
                .iter()
                .filter(|r| r.state == "job-busy")
                .map(|r| r.mem_avail)
                .sum();
            let mem_config: i64 = members.iter().map(|r| r.mem_avail).sum();
            let mem_down: i64 = members
                .iter()
                .filter(|r| r.is_down())
                .map(|r| r.mem_avail)
                .sum();

            let gpu_alloc: i64 = members.iter().map(|r| r.gpus_assigned).sum();
            let gpu_config: i64 = members.iter().map(|r| r.gpus_avail).sum();
            let gpu_down: i64 = members
                .iter()
                .filter(|r| r.is_down())
                .map(|r| r.gpus_avail)
                .sum();

            let mut out = GroupRollup::new(vec![(group_by.to_string(), label)]);
            out.push_float(
                format!("{prefix}cluster_cpu_util"),
                ratio(cpu_alloc, cpu_config - cpu_down),
            );
            out.push_float(
                format!("{prefix}cluster_mem_util"),
                ratio(mem_alloc, mem_config - mem_down),
            );
            out.push_float(
                format!("{prefix}cluster_gpu_util"),
                ratio(gpu_alloc, gpu_config - gpu_down),
            );
            out
        })
        .collect()
}

#[cfg(test)]
#[path = "nodes_tests.rs"]
mod tests;
