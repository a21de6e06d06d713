// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record sanitisation for the table writer.

use gs_core::timeconv::{wall_to_epoch_ms, TimeConvError, PBS_DATE_FORMAT};
use serde_json::{Map, Value};
use thiserror::Error;

/// Nested blobs persisted as serialised JSON text.
const JSON_KEYS: [&str; 3] = ["resources_used", "Resource_List", "Variable_List"];

/// Wall-clock timestamps converted to UTC epoch milliseconds.
const TIMESTAMP_KEYS: [&str; 6] = ["ctime", "etime", "mtime", "qtime", "stime", "obittime"];

/// Epoch-second fields promoted to milliseconds (zero becomes null).
const MILLIS_KEYS: [&str; 1] = ["history_timestamp"];

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("timestamp field {field}: {source}")]
    Timestamp {
        field: &'static str,
        source: TimeConvError,
    },
}

/// Prepare one job record for the table.
///
/// Serialises the opaque blobs, converts every timestamp to integer UTC
/// milliseconds, defaults a missing `stime` to `mtime`, annotates the
/// scheduler version, coerces `forward_x11_port`, and stamps the
/// lowercase `job_id` / `start_time` / `end_time` key columns.
pub fn sanitize_job(
    mut job: Map<String, Value>,
    timezone: &str,
    pbs_version: &str,
) -> Result<Map<String, Value>, SanitizeError> {
    for key in JSON_KEYS {
        if let Some(value) = job.get(key) {
            let text = value.to_string();
            job.insert(key.to_string(), Value::String(text));
        }
    }

    for key in MILLIS_KEYS {
        if let Some(value) = job.get(key) {
            let promoted = match value.as_i64() {
                Some(0) | None => Value::Null,
                Some(secs) => Value::from(secs * 1000),
            };
            job.insert(key.to_string(), promoted);
        }
    }

    for key in TIMESTAMP_KEYS {
        let Some(Value::String(raw)) = job.get(key) else {
            continue;
        };
        let epoch = wall_to_epoch_ms(raw, PBS_DATE_FORMAT, timezone)
            .map_err(|source| SanitizeError::Timestamp { field: key, source })?;
        job.insert(key.to_string(), Value::from(epoch));
    }

    // a job that never started still needs a start time for the row key
    if !job.contains_key("stime") {
        let mtime = job.get("mtime").cloned().unwrap_or(Value::Null);
        job.insert("stime".to_string(), mtime);
    }

    job.insert(
        "pbs_version".to_string(),
        Value::String(pbs_version.to_string()),
    );

    let port = job.get("forward_x11_port").cloned().unwrap_or(Value::Null);
    job.insert("forward_x11_port".to_string(), coerce_int(port));

    let job_id = job
        .get("Job_Id")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(job_id) = job_id {
        job.insert("job_id".to_string(), Value::String(job_id));
    }
    let stime = job.get("stime").cloned().unwrap_or(Value::Null);
    job.insert("start_time".to_string(), stime);
    let mtime = job.get("mtime").cloned().unwrap_or(Value::Null);
    job.insert("end_time".to_string(), mtime);

    Ok(job)
}

/// Integer coercion with boolean spellings; anything else becomes null.
fn coerce_int(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Value::Number(n),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" => Value::from(1),
            "false" => Value::from(0),
            other => other
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::Null),
        },
        _ => Value::Null,
    }
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
