// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wide-column store behind the job table.
//!
//! [`ScyllaJobStore`] owns the CQL session and two prepared statements:
//! the JSON upsert and the energy update. Both are safe for concurrent
//! execution; each worker still owns its own store instance.

use crate::schema::{keyspace_ddl, table_ddl, SECONDARY_INDEXES};
use async_trait::async_trait;
use scylla::prepared_statement::PreparedStatement;
use scylla::{ExecutionProfile, Session, SessionBuilder};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(String),
}

/// Connection settings for the job-table cluster.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `host` or `host:port`.
    pub host: String,
    pub user: String,
    pub password: String,
    pub request_timeout: Duration,
}

/// Upsert surface the writer and enricher workers share.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// `INSERT INTO <table> JSON ?`.
    async fn upsert_job(&self, row_json: String) -> Result<(), StoreError>;

    /// `UPDATE <table> SET energy = ? WHERE job_id = ? AND start_time = ?
    /// AND end_time = ?`.
    async fn set_energy(
        &self,
        payload_json: String,
        job_id: &str,
        start_time_ms: i64,
        end_time_ms: i64,
    ) -> Result<(), StoreError>;
}

pub struct ScyllaJobStore {
    session: Session,
    insert: PreparedStatement,
    update: PreparedStatement,
}

fn db_err(err: impl std::fmt::Display) -> StoreError {
    StoreError::Db(err.to_string())
}

impl ScyllaJobStore {
    /// Connect and make sure keyspace, table, indexes and prepared
    /// statements exist.
    pub async fn connect(
        config: &StoreConfig,
        keyspace: &str,
        table: &str,
        table_definition: &str,
    ) -> Result<Self, StoreError> {
        let profile = ExecutionProfile::builder()
            .request_timeout(Some(config.request_timeout))
            .build();
        let session = SessionBuilder::new()
            .known_node(&config.host)
            .user(&config.user, &config.password)
            .default_execution_profile_handle(profile.into_handle())
            .build()
            .await
            .map_err(db_err)?;
        info!(host = %config.host, keyspace, table, "connected to the job table cluster");

        session
            .query_unpaged(keyspace_ddl(keyspace), ())
            .await
            .map_err(db_err)?;
        session
            .use_keyspace(keyspace, true)
            .await
            .map_err(db_err)?;
        session
            .query_unpaged(table_ddl(table_definition, table), ())
            .await
            .map_err(db_err)?;

        for column in SECONDARY_INDEXES {
            debug!(keyspace, table, column, "ensuring secondary index");
            session
                .query_unpaged(
                    format!("CREATE INDEX IF NOT EXISTS ON \"{keyspace}\".\"{table}\" (\"{column}\")"),
                    (),
                )
                .await
                .map_err(db_err)?;
        }

        let insert = session
            .prepare(format!("INSERT INTO \"{table}\" JSON ?"))
            .await
            .map_err(db_err)?;
        let update = session
            .prepare(format!(
                "UPDATE \"{table}\" SET energy = ? WHERE job_id = ? AND start_time = ? AND end_time = ?"
            ))
            .await
            .map_err(db_err)?;

        Ok(Self {
            session,
            insert,
            update,
        })
    }
}

#[async_trait]
impl JobStore for ScyllaJobStore {
    async fn upsert_job(&self, row_json: String) -> Result<(), StoreError> {
        self.session
            .execute_unpaged(&self.insert, (row_json,))
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_energy(
        &self,
        payload_json: String,
        job_id: &str,
        start_time_ms: i64,
        end_time_ms: i64,
    ) -> Result<(), StoreError> {
        self.session
            .execute_unpaged(
                &self.update,
                (payload_json, job_id, start_time_ms, end_time_ms),
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

/// In-memory store for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeJobStore {
    inner: std::sync::Arc<parking_lot::Mutex<FakeJobStoreInner>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeJobStoreInner {
    rows: Vec<String>,
    energy_updates: Vec<(String, String, i64, i64)>,
    fail: bool,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self) -> Self {
        self.inner.lock().fail = true;
        self
    }

    pub fn rows(&self) -> Vec<String> {
        self.inner.lock().rows.clone()
    }

    pub fn energy_updates(&self) -> Vec<(String, String, i64, i64)> {
        self.inner.lock().energy_updates.clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl JobStore for FakeJobStore {
    async fn upsert_job(&self, row_json: String) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.fail {
            return Err(StoreError::Db("injected failure".to_string()));
        }
        inner.rows.push(row_json);
        Ok(())
    }

    async fn set_energy(
        &self,
        payload_json: String,
        job_id: &str,
        start_time_ms: i64,
        end_time_ms: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.fail {
            return Err(StoreError::Db("injected failure".to_string()));
        }
        inner
            .energy_updates
            .push((payload_json, job_id.to_string(), start_time_ms, end_time_ms));
        Ok(())
    }
}
