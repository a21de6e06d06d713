// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gs-store: the durable job table.
//!
//! Loads a per-scheduler-version CQL schema, sanitises finished job
//! records against it, and upserts them into a wide-column store through
//! the [`JobStore`] trait.

pub mod job_store;
pub mod sanitize;
pub mod schema;
pub mod writer;

pub use job_store::{JobStore, ScyllaJobStore, StoreConfig, StoreError};
pub use sanitize::{sanitize_job, SanitizeError};
pub use schema::{
    keyspace_ddl, load_schema, prune_unknown_columns, schema_columns, table_ddl, SchemaError,
    SECONDARY_INDEXES,
};
pub use writer::{TableWriter, TickJobs, WriterConfig, WriterError};

#[cfg(any(test, feature = "test-support"))]
pub use job_store::FakeJobStore;
