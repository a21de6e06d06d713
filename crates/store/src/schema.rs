// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CQL schema loading, parsing and load-time validation.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Secondary indexes ensured at startup.
pub const SECONDARY_INDEXES: [&str; 4] = ["Exit_status", "queue", "project", "Job_Owner"];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot read schema file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// Keyspace declaration.
pub fn keyspace_ddl(keyspace: &str) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS \"{keyspace}\" WITH replication = \
         {{'class' : 'SimpleStrategy', 'replication_factor' : 2}}"
    )
}

/// Read `pbs_schema_<version>` from the schema directory and join its
/// lines into one statement.
pub fn load_schema(dir: &Path, version: &str) -> Result<String, SchemaError> {
    let path = dir.join(format!("pbs_schema_{version}"));
    let text = std::fs::read_to_string(&path).map_err(|source| SchemaError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string())
}

/// Substitute the per-cluster table name into the loaded definition.
pub fn table_ddl(definition: &str, table: &str) -> String {
    definition.replace("{table}", &format!("\"{table}\""))
}

/// Column name → CQL type, parsed from the table definition.
///
/// Only the column list between the first parenthesis pair is read; the
/// PRIMARY KEY clause is skipped. Quoted identifiers lose their quotes so
/// the map keys compare against JSON payload keys.
pub fn schema_columns(definition: &str) -> BTreeMap<String, String> {
    let mut columns = BTreeMap::new();
    let mut sections = definition.split('(');
    let _preamble = sections.next();
    let Some(body) = sections.next() else {
        return columns;
    };

    for entry in body.split(',') {
        if entry.contains("PRIMARY") {
            continue;
        }
        let mut parts = entry.split_whitespace();
        let Some(name) = parts.next() else { continue };
        let cql_type: Vec<&str> = parts.collect();
        if cql_type.is_empty() {
            continue;
        }
        let name = name.trim_matches(|c| c == ',' || c == '"');
        columns.insert(
            name.to_string(),
            cql_type.join(" ").trim_end_matches(',').to_string(),
        );
    }
    columns
}

/// Drop payload keys the table does not declare. Never fails; schema
/// drift costs a field, not a row.
pub fn prune_unknown_columns(
    job: &mut Map<String, Value>,
    columns: &BTreeMap<String, String>,
) -> Vec<String> {
    let unknown: Vec<String> = job
        .keys()
        .filter(|k| !columns.contains_key(*k))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        warn!(fields = ?unknown, "new elements found in job payload, dropping");
        for key in &unknown {
            job.remove(key);
        }
    }
    unknown
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
