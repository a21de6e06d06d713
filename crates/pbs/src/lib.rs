// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gs-pbs: PBS job accounting pipeline.
//!
//! Discovers jobs by state with `qselect`, fetches detail records in
//! adaptively sized `qstat` batches, caches per-state results, and fans
//! records out to the metrics and durable job-table streams.

pub mod commands;
pub mod controller;
pub mod discovery;
pub mod job;
pub mod nodes;
pub mod publisher;
pub mod repair;
pub mod state_cache;

pub use controller::{AdaptiveController, ServerLoad};
pub use discovery::{FetchConfig, JobFetcher, TickOutput};
pub use job::{strip_server_suffix, JobRecord, JobState};
pub use nodes::{extract_number, parse_pbsnodes};
pub use publisher::{job_sample, JobSensor, NodeSensor, DEFAULT_GROUP_BY};
pub use repair::{job_entries, jobs_from_payload, parse_concatenated, repair_payload, RepairError};
pub use state_cache::{JobStateCache, StateDiff};
