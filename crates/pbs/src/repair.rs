// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repairs for the scheduler's malformed JSON output.
//!
//! `qstat -xfF json` emits one JSON document per invocation, concatenated
//! with a literal sentinel, and the documents themselves carry broken
//! escaping: doubled backslashes, raw quotes inside string values, and
//! escape sequences JSON does not define. Three passes run in order:
//!
//! 1. collapse runs of two or more backslashes to one,
//! 2. escape interior quotes inside `":"` value positions,
//! 3. strip any `\X` where `X` is not a valid JSON escape.

use crate::job::JobRecord;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Sentinel between concatenated documents.
pub const OBJECT_SEPARATOR: &str = "### EOF ###";

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("JSON decode failed at line {line}: {message}")]
    Decode { line: usize, message: String },
}

/// Collapse each maximal run of 2+ backslashes to a single backslash
/// (an odd run keeps one extra, preserving a trailing escape).
fn collapse_backslash_runs(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut run = 1usize;
        while chars.peek() == Some(&'\\') {
            chars.next();
            run += 1;
        }
        out.push('\\');
        if run > 1 && run % 2 == 1 {
            out.push('\\');
        }
    }
    out
}

/// Escape raw quotes inside `":"` value positions.
///
/// A value region opens at `":"` and closes at the first `"` followed by
/// `,` or `}`. A region that runs into another `":"` opener has no
/// terminator and is left untouched.
fn escape_quotes_in_values(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let opens_value =
            i + 2 < bytes.len() && bytes[i] == b'"' && bytes[i + 1] == b':' && bytes[i + 2] == b'"';
        if !opens_value {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let start = i + 3;
        let mut j = start;
        let mut end = None;
        while j < bytes.len() {
            let escaped = j > start && bytes[j - 1] == b'\\';
            if bytes[j] == b'"' && !escaped {
                if j + 1 < bytes.len() && (bytes[j + 1] == b',' || bytes[j + 1] == b'}') {
                    end = Some(j);
                    break;
                }
                if j + 2 < bytes.len() && bytes[j + 1] == b':' && bytes[j + 2] == b'"' {
                    // another opener begins before a terminator
                    break;
                }
            }
            j += 1;
        }

        match end {
            Some(end) => {
                out.extend_from_slice(&bytes[i..start]);
                let mut k = start;
                while k < end {
                    let escaped = k > start && bytes[k - 1] == b'\\';
                    if bytes[k] == b'"' && !escaped {
                        out.extend_from_slice(b"\\\"");
                    } else {
                        out.push(bytes[k]);
                    }
                    k += 1;
                }
                out.push(b'"');
                i = end + 1;
            }
            None => {
                out.push(bytes[i]);
                out.push(bytes[i + 1]);
                i += 2;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Drop backslashes that do not introduce a valid JSON escape.
fn strip_invalid_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next) if matches!(next, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                out.push('\\');
                out.push(next);
                chars.next();
            }
            _ => {}
        }
    }
    out
}

fn repair(input: &str) -> String {
    strip_invalid_escapes(&escape_quotes_in_values(&collapse_backslash_runs(input)))
}

/// Repair one document and parse it.
pub fn repair_payload(raw: &str) -> Result<Value, RepairError> {
    let repaired = repair(raw);
    serde_json::from_str(repaired.trim()).map_err(|e| {
        let line = e.line();
        let content = repaired.lines().nth(line.saturating_sub(1)).unwrap_or("");
        warn!(line, content, "problematic JSON line");
        RepairError::Decode {
            line,
            message: e.to_string(),
        }
    })
}

/// Parse concatenated documents and deep-merge their `Jobs` maps.
/// A malformed document is logged and skipped; the rest still merge.
pub fn parse_concatenated(content: &str) -> Value {
    let mut merged = Value::Null;
    for raw in content.split(OBJECT_SEPARATOR) {
        if raw.trim().is_empty() {
            continue;
        }
        let obj = match repair_payload(raw) {
            Ok(obj) => obj,
            Err(err) => {
                warn!(%err, "skipping malformed scheduler document");
                continue;
            }
        };
        if merged.is_null() {
            merged = obj;
            continue;
        }
        if let Some(jobs) = obj.get("Jobs").and_then(Value::as_object) {
            if let Some(root) = merged.as_object_mut() {
                let target = root
                    .entry("Jobs".to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Some(target) = target.as_object_mut() {
                    for (k, v) in jobs {
                        target.insert(k.clone(), v.clone());
                    }
                }
            }
        }
    }
    match merged {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

/// Pull `(discovery key, record)` pairs out of a merged payload. The key
/// keeps the server suffix: it is what `qselect` reported and what the
/// state cache indexes by.
pub fn job_entries(payload: &Value) -> Vec<(String, JobRecord)> {
    payload
        .get("Jobs")
        .and_then(Value::as_object)
        .map(|jobs| {
            jobs.iter()
                .filter_map(|(k, v)| JobRecord::from_entry(k, v.clone()).map(|r| (k.clone(), r)))
                .collect()
        })
        .unwrap_or_default()
}

/// Pull the job records out of a merged payload.
pub fn jobs_from_payload(payload: &Value) -> Vec<JobRecord> {
    job_entries(payload).into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
#[path = "repair_tests.rs"]
mod tests;
