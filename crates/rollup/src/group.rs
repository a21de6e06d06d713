// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Grouped roll-up output shared by the node and job aggregations.

use gs_core::MetricValue;

/// One aggregated group: the grouping-column values (which become tags)
/// plus the computed metrics in emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRollup {
    pub tags: Vec<(String, String)>,
    pub metrics: Vec<(String, MetricValue)>,
}

impl GroupRollup {
    pub fn new(tags: Vec<(String, String)>) -> Self {
        Self {
            tags,
            metrics: Vec::new(),
        }
    }

    pub fn push_int(&mut self, name: impl Into<String>, value: i64) {
        self.metrics.push((name.into(), MetricValue::Int(value)));
    }

    pub fn push_float(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.push((name.into(), MetricValue::Float(value)));
    }

    pub fn value(&self, name: &str) -> Option<&MetricValue> {
        self.metrics.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Metric name prefix derived from the scheduler version
/// (`"19.2.8"` → `"v19."`).
pub fn metric_prefix(version: &str) -> String {
    let major: String = version.chars().take_while(char::is_ascii_digit).collect();
    format!("v{major}.")
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
