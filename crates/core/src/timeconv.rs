// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock timestamps in a named timezone to UTC epoch milliseconds.
//!
//! Schedulers report times as local wall-clock strings; the job table
//! stores integer UTC milliseconds.

use chrono::{LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

/// PBS timestamp format, e.g. `"Tue Mar 12 10:27:52 2024"`.
pub const PBS_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

#[derive(Debug, Error)]
pub enum TimeConvError {
    #[error("unparseable timestamp {raw:?}: {source}")]
    Parse {
        raw: String,
        source: chrono::ParseError,
    },
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
    #[error("ambiguous or non-existent local time {0:?} (DST fold)")]
    AmbiguousLocalTime(String),
}

/// Convert a wall-clock string in the given timezone to UTC epoch ms.
///
/// Day numbers in scheduler output may be space-padded; runs of
/// whitespace are collapsed before parsing.
pub fn wall_to_epoch_ms(raw: &str, format: &str, timezone: &str) -> Result<i64, TimeConvError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| TimeConvError::UnknownTimezone(timezone.to_string()))?;

    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let naive = NaiveDateTime::parse_from_str(&normalized, format).map_err(|source| {
        TimeConvError::Parse {
            raw: raw.to_string(),
            source,
        }
    })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.timestamp_millis()),
        LocalResult::Ambiguous(..) | LocalResult::None => {
            Err(TimeConvError::AmbiguousLocalTime(raw.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "timeconv_tests.rs"]
mod tests;
