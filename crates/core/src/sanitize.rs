// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tag and metric-name sanitisation plus routing-key construction.

use crate::metric::TagMap;

/// Sentinel for an empty or missing tag value.
pub const NA: &str = "NA";

/// Which character mapping a publisher applies.
///
/// Both replace space, `+` and `#` with `_`. They differ on `/`: the
/// scheduler path flattens it to `_`, the BCM path keeps it readable as
/// `|` (cmsh parameters routinely contain slashes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeMode {
    Scheduler,
    Bcm,
}

/// Replace reserved characters in a tag value or metric name.
///
/// Empty input maps to the `"NA"` sentinel.
pub fn sanitize(mode: SanitizeMode, raw: &str) -> String {
    if raw.is_empty() {
        return NA.to_string();
    }
    raw.chars()
        .map(|c| match c {
            ' ' | '+' | '#' => '_',
            '/' => match mode {
                SanitizeMode::Scheduler => '_',
                SanitizeMode::Bcm => '|',
            },
            other => other,
        })
        .collect()
}

/// Like [`sanitize`], treating `None` as missing.
pub fn sanitize_opt(mode: SanitizeMode, raw: Option<&str>) -> String {
    match raw {
        Some(s) => sanitize(mode, s),
        None => NA.to_string(),
    }
}

/// Build the downstream routing key: flattened tag pairs joined by `/`
/// with the metric name appended. Space, `+` and `#` are replaced by `_`
/// (the `/` separator is structural here and left alone).
pub fn routing_key(tags: &TagMap, name: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(tags.len() * 2 + 1);
    for (k, v) in tags {
        parts.push(k);
        parts.push(v);
    }
    parts.push(name);
    parts
        .join("/")
        .chars()
        .map(|c| match c {
            ' ' | '+' | '#' => '_',
            other => other,
        })
        .collect()
}

/// Read a configured topic prefix (`org/e4/cluster/galileo`) back into
/// its key/value pairs.
pub fn topic_pairs(topic: &str) -> TagMap {
    let parts: Vec<&str> = topic.split('/').collect();
    let mut pairs = TagMap::new();
    for chunk in parts.chunks(2) {
        if let [key, value] = chunk {
            pairs.insert(key.to_string(), value.to_string());
        }
    }
    pairs
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
