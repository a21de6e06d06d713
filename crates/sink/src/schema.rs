// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema-driven parsing of separated tabular command output.
//!
//! Collectors describe a command's columns either as an ordered label
//! list (with gaps for columns to skip) or as a label→(index, converter)
//! map that cherry-picks columns. A line is accepted only when its field
//! count matches the schema length; everything else (banners, partial
//! rows) falls through silently.

use gs_core::{MetricValue, TagMap};
use indexmap::IndexMap;

/// How a picked column's text is narrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Text,
    Int,
    Float,
}

impl Converter {
    fn convert(self, raw: &str) -> MetricValue {
        match self {
            Converter::Text => MetricValue::Text(raw.to_string()),
            Converter::Int => raw
                .parse::<i64>()
                .map(MetricValue::Int)
                .unwrap_or_else(|_| MetricValue::Text(raw.to_string())),
            Converter::Float => raw
                .parse::<f64>()
                .map(MetricValue::Float)
                .unwrap_or_else(|_| MetricValue::Text(raw.to_string())),
        }
    }
}

/// One entry of a map schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapColumn {
    pub label: String,
    pub index: usize,
    pub converter: Converter,
}

/// Column description for one command's output.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Ordered labels; `None` skips the column at that position.
    List(Vec<Option<String>>),
    /// Picked columns by position.
    Map(Vec<MapColumn>),
}

impl Schema {
    /// The field count a line must have to be accepted.
    pub fn len(&self) -> usize {
        match self {
            Schema::List(labels) => labels.len(),
            Schema::Map(columns) => columns.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn parse_line(&self, fields: &[&str]) -> IndexMap<String, MetricValue> {
        match self {
            Schema::List(labels) => labels
                .iter()
                .zip(fields)
                .filter_map(|(label, field)| {
                    label
                        .as_ref()
                        .map(|l| (l.clone(), MetricValue::Text(field.to_string())))
                })
                .collect(),
            Schema::Map(columns) => columns
                .iter()
                .filter_map(|column| {
                    fields
                        .get(column.index)
                        .map(|field| (column.label.clone(), column.converter.convert(field)))
                })
                .collect(),
        }
    }
}

/// Parse a command's output buffer into one record per accepted line.
pub fn parse_lines(
    buffer: &str,
    schema: &Schema,
    sep: char,
    skip_lines: usize,
) -> Vec<IndexMap<String, MetricValue>> {
    buffer
        .lines()
        .skip(skip_lines)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(sep).map(str::trim).collect();
            if fields.len() != schema.len() {
                return None;
            }
            Some(schema.parse_line(&fields))
        })
        .collect()
}

/// Convenience for list schemas written inline.
pub fn list_schema(labels: &[Option<&str>]) -> Schema {
    Schema::List(
        labels
            .iter()
            .map(|l| l.map(|s| s.to_string()))
            .collect(),
    )
}

/// Rows to tag-map form for callers that feed the normaliser directly.
pub fn record_tags(record: &IndexMap<String, MetricValue>) -> TagMap {
    record
        .iter()
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
