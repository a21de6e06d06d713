// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job states and the merged detail record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Scheduler job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Running,
    Finished,
    Held,
    Waiting,
    Exiting,
    Transiting,
}

impl JobState {
    pub fn as_char(self) -> char {
        match self {
            JobState::Queued => 'Q',
            JobState::Running => 'R',
            JobState::Finished => 'F',
            JobState::Held => 'H',
            JobState::Waiting => 'W',
            JobState::Exiting => 'E',
            JobState::Transiting => 'T',
        }
    }

    /// The states the discovery loop polls, in forwarding order.
    pub const DISCOVERED: [JobState; 3] = [JobState::Finished, JobState::Running, JobState::Queued];
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for JobState {
    type Err = UnknownJobState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Q" => Ok(JobState::Queued),
            "R" => Ok(JobState::Running),
            "F" => Ok(JobState::Finished),
            "H" => Ok(JobState::Held),
            "W" => Ok(JobState::Waiting),
            "E" => Ok(JobState::Exiting),
            "T" => Ok(JobState::Transiting),
            other => Err(UnknownJobState(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job state {0:?}")]
pub struct UnknownJobState(pub String);

/// Strip the server suffix from a scheduler job id
/// (`"4732778.login02"` → `"4732778"`).
pub fn strip_server_suffix(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

/// One job detail record. The field tree is heterogeneous; only the
/// handful of fields named by the pipeline are type-narrowed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl JobRecord {
    /// Build a record from a `Jobs` entry, stamping the stripped id into
    /// the field map as `Job_Id`.
    pub fn from_entry(key: &str, value: Value) -> Option<Self> {
        let mut fields = match value {
            Value::Object(map) => map,
            _ => return None,
        };
        let id = strip_server_suffix(key).to_string();
        fields.insert("Job_Id".to_string(), Value::String(id.clone()));
        Some(Self { id, fields })
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn state(&self) -> Option<JobState> {
        self.get_str("job_state").and_then(|s| s.parse().ok())
    }

    pub fn is_finished(&self) -> bool {
        self.state() == Some(JobState::Finished)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
