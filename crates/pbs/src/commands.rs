// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler command lines, issued verbatim over the executor.

use crate::job::JobState;

/// Node snapshot query.
pub const PBSNODES_CMD: &str = "bash -c 'pbsnodes -a -F json'";

/// Discovery of recently finished jobs. The history window bounds how far
/// back `qselect -x` looks for terminated jobs.
pub fn qselect_finished(cmd_timeout: u64, history_secs: u64) -> String {
    format!(
        r#"timeout {cmd_timeout} qselect -x -tm.gt.$(date -d "{history_secs} seconds ago" "+%Y%m%d%H%M") -s F"#
    )
}

/// Discovery of live jobs in one state.
pub fn qselect_state(cmd_timeout: u64, state: JobState) -> String {
    format!("timeout {cmd_timeout} qselect -s {state}")
}

/// Batched detail query for a slice of job ids.
pub fn qstat_details(query_timeout: u64, ids: &[String]) -> String {
    format!(
        "timeout {query_timeout} qstat -xfF json -J {}",
        ids.join(" ")
    )
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
