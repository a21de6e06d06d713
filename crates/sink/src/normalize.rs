// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Normalisers: grouped roll-ups and vendor values-responses into the
//! canonical metric record.

use chrono::{LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use gs_core::{sanitize, BaseTags, MetricRecord, MetricValue, SanitizeMode};
use gs_rollup::GroupRollup;
use serde_json::Value;
use tracing::warn;

/// Flatten grouped roll-ups into one record per metric, tagging each with
/// its sanitised group labels on top of the baseline tags.
pub fn rollups_to_metrics(
    rollups: &[GroupRollup],
    timestamp_ms: i64,
    base: &BaseTags,
    mode: SanitizeMode,
) -> Vec<MetricRecord> {
    let mut out = Vec::new();
    for rollup in rollups {
        for (name, value) in &rollup.metrics {
            let mut tags = base.to_map();
            for (key, val) in &rollup.tags {
                tags.insert(key.clone(), sanitize(mode, val));
            }
            out.push(MetricRecord::new(
                sanitize(mode, name),
                value.clone(),
                timestamp_ms,
                tags,
            ));
        }
    }
    out
}

/// Normalise a vendor values-response body.
///
/// The body carries a series list (`id` → name and units) and chart
/// elements (`timestamp` plus `values` keyed by series id). Timestamps
/// are local wall-clock in the given timezone, `%Y/%m/%d %H:%M`.
pub fn values_response_to_metrics(
    body: &Value,
    kind: &str,
    timezone: &str,
    base: &BaseTags,
) -> Vec<MetricRecord> {
    let series: std::collections::HashMap<&str, (&str, &str)> = body
        .get("seriesList")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|s| {
                    let id = s.get("id").and_then(Value::as_str)?;
                    let name = s.get("name").and_then(Value::as_str)?;
                    let units = s.get("units").and_then(Value::as_str).unwrap_or("");
                    Some((id, (name, units)))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut out = Vec::new();
    let Some(elements) = body.get("chartElementList").and_then(Value::as_array) else {
        return out;
    };

    for element in elements {
        let Some(raw_ts) = element.get("timestamp").and_then(Value::as_str) else {
            continue;
        };
        let Some(timestamp_ms) = local_chart_time_ms(raw_ts, timezone) else {
            warn!(raw_ts, "unparseable chart timestamp");
            continue;
        };
        let Some(values) = element.get("values").and_then(Value::as_object) else {
            continue;
        };
        for (series_id, value) in values {
            let Some((name, units)) = series.get(series_id.as_str()) else {
                warn!(series_id = %series_id, "value for unknown series");
                continue;
            };
            let mut tags = base.to_map();
            tags.insert(
                "type".to_string(),
                sanitize(SanitizeMode::Scheduler, kind),
            );
            tags.insert(
                "units".to_string(),
                sanitize(SanitizeMode::Scheduler, units),
            );
            let value: MetricValue = match value {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => i.into(),
                    None => n.as_f64().unwrap_or(f64::NAN).into(),
                },
                Value::String(s) => s.as_str().into(),
                other => other.to_string().into(),
            };
            out.push(MetricRecord::new(
                sanitize(SanitizeMode::Scheduler, name),
                value,
                timestamp_ms,
                tags,
            ));
        }
    }
    out
}

fn local_chart_time_ms(raw: &str, timezone: &str) -> Option<i64> {
    let tz: Tz = timezone.parse().ok()?;
    let naive = NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M").ok()?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.timestamp_millis()),
        LocalResult::Ambiguous(dt, _) => Some(dt.timestamp_millis()),
        LocalResult::None => None,
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
