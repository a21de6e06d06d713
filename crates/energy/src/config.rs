// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-node power configuration, loaded once at startup.
//!
//! The config file holds groups of nodes (compact range notation) with
//! the power metrics they expose and the arithmetic that combines those
//! metrics into total node power.

use crate::nodeset::expand_nodes;
use crate::series::EnergyError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One group entry as written in the config file.
#[derive(Debug, Deserialize)]
struct NodeGroup {
    nodes: Vec<String>,
    power_metrics: Vec<String>,
    total_power: String,
}

/// Power metrics and combination expression for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePowerConfig {
    pub power_metrics: Vec<String>,
    pub total_power: String,
}

/// Node name → its power configuration.
pub type NodeEnergyMap = HashMap<String, NodePowerConfig>;

/// Load the config file and expand each group to one entry per node.
pub fn load_node_config(path: &Path) -> Result<NodeEnergyMap, EnergyError> {
    let text = std::fs::read_to_string(path).map_err(|source| EnergyError::Config {
        path: path.display().to_string(),
        source,
    })?;
    let groups: Vec<NodeGroup> = serde_json::from_str(&text)?;

    let mut map = NodeEnergyMap::new();
    for group in groups {
        let compact = group.nodes.join(",");
        for node in expand_nodes(&compact) {
            map.insert(
                node,
                NodePowerConfig {
                    power_metrics: group.power_metrics.clone(),
                    total_power: group.total_power.clone(),
                },
            );
        }
    }
    Ok(map)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
