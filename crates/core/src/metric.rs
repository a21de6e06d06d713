// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical metric record shared by all publishers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered tag map. Insertion order is load-bearing: the downstream
/// routing key is built by walking the entries in order.
pub type TagMap = IndexMap<String, String>;

/// Scalar payload of a metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{}", v),
            MetricValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// One normalised sample on its way to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub name: String,
    pub value: MetricValue,
    /// Milliseconds since the Unix epoch, UTC.
    pub timestamp: i64,
    pub tags: TagMap,
}

impl MetricRecord {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<MetricValue>,
        timestamp: i64,
        tags: TagMap,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            timestamp,
            tags,
        }
    }
}

/// Baseline tag set carried by every metric a publisher emits.
///
/// The five invariant tags are inserted in a fixed order; domain tags are
/// appended after them. Re-inserting an existing key overwrites the value
/// in place without changing its position.
#[derive(Debug, Clone)]
pub struct BaseTags {
    tags: TagMap,
}

impl BaseTags {
    pub fn new(org: &str, cluster: &str, node: &str, plugin: &str, chnl: &str) -> Self {
        let mut tags = TagMap::new();
        tags.insert("org".to_string(), org.to_string());
        tags.insert("cluster".to_string(), cluster.to_string());
        tags.insert("node".to_string(), node.to_string());
        tags.insert("plugin".to_string(), plugin.to_string());
        tags.insert("chnl".to_string(), chnl.to_string());
        Self { tags }
    }

    /// Add or overwrite a tag.
    pub fn set(&mut self, key: &str, value: &str) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Fresh copy of the tag map for a new record.
    pub fn to_map(&self) -> TagMap {
        self.tags.clone()
    }

    pub fn as_map(&self) -> &TagMap {
        &self.tags
    }
}

#[cfg(test)]
#[path = "metric_tests.rs"]
mod tests;
