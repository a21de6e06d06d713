// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The measurable→unit lookup table.
//!
//! Loaded eagerly at startup from the `|`-separated metrics table and
//! injected into the reader as an immutable map.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitMapError {
    #[error("cannot read metrics table {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("metrics table {path} is missing the {column} column")]
    MissingColumn { path: String, column: &'static str },
}

/// Parse the `Name`/`Unit` columns of the metrics table.
pub fn load_unit_map(path: &Path) -> Result<HashMap<String, String>, UnitMapError> {
    let text = std::fs::read_to_string(path).map_err(|source| UnitMapError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut lines = text.lines();
    let header: Vec<&str> = lines
        .next()
        .unwrap_or_default()
        .split('|')
        .map(str::trim)
        .collect();
    let name_idx = header.iter().position(|h| *h == "Name").ok_or_else(|| {
        UnitMapError::MissingColumn {
            path: path.display().to_string(),
            column: "Name",
        }
    })?;
    let unit_idx = header.iter().position(|h| *h == "Unit").ok_or_else(|| {
        UnitMapError::MissingColumn {
            path: path.display().to_string(),
            column: "Unit",
        }
    })?;

    let mut map = HashMap::new();
    for line in lines {
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        let (Some(name), Some(unit)) = (fields.get(name_idx), fields.get(unit_idx)) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        map.insert(name.to_string(), unit.to_string());
    }
    Ok(map)
}

#[cfg(test)]
#[path = "units_tests.rs"]
mod tests;
