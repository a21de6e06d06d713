// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring rows into canonical metric records.

use crate::age::convert_age_to_ms;
use gs_core::{sanitize, sanitize_opt, BaseTags, MetricRecord, MetricValue, SanitizeMode};
use std::collections::HashMap;

/// One `latestmonitoringdata` row:
/// `Entity;Measurable;Parameter;Type;Value;Age;State;Info`.
#[derive(Debug, Clone, PartialEq)]
pub struct BcmRow {
    pub entity: String,
    pub measurable: String,
    pub parameter: String,
    pub kind: String,
    pub value: String,
    pub age: String,
    pub state: String,
    pub info: String,
}

/// Split the raw response into rows, dropping the leading header lines
/// and anything with the wrong field count.
pub fn parse_rows(raw: &str, skipline: usize) -> Vec<BcmRow> {
    raw.lines()
        .skip(skipline)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(';').map(str::trim).collect();
            let [entity, measurable, parameter, kind, value, age, state, info] = fields.as_slice()
            else {
                return None;
            };
            Some(BcmRow {
                entity: entity.to_string(),
                measurable: measurable.to_string(),
                parameter: parameter.to_string(),
                kind: kind.to_string(),
                value: value.to_string(),
                age: age.to_string(),
                state: state.to_string(),
                info: info.to_string(),
            })
        })
        .collect()
}

fn parse_value(raw: &str) -> MetricValue {
    if let Ok(int) = raw.parse::<i64>() {
        return MetricValue::Int(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return MetricValue::Float(float);
    }
    MetricValue::Text(raw.to_string())
}

/// Build one record per row: the timestamp is the read time minus the
/// reading's age, the unit comes from the metrics table, and tags use
/// the BCM character mapping.
pub fn rows_to_metrics(
    rows: &[BcmRow],
    read_time_ms: i64,
    units: &HashMap<String, String>,
    base: &BaseTags,
) -> Vec<MetricRecord> {
    rows.iter()
        .map(|row| {
            let mut tags = base.to_map();
            tags.insert(
                "node".to_string(),
                sanitize(SanitizeMode::Bcm, &row.entity),
            );
            tags.insert(
                "parameter".to_string(),
                sanitize(SanitizeMode::Bcm, &row.parameter),
            );
            tags.insert("type".to_string(), sanitize(SanitizeMode::Bcm, &row.kind));
            tags.insert(
                "unit".to_string(),
                sanitize_opt(SanitizeMode::Bcm, units.get(&row.measurable).map(String::as_str)),
            );

            MetricRecord::new(
                sanitize(SanitizeMode::Bcm, &row.measurable),
                parse_value(&row.value),
                read_time_ms - convert_age_to_ms(&row.age),
                tags,
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
