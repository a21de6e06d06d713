// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job_store::FakeJobStore;
use crate::schema::schema_columns;
use serde_json::json;

const DEFINITION: &str = r#"CREATE TABLE IF NOT EXISTS {table} ( job_id text, start_time bigint, end_time bigint, "Job_Id" text, job_state text, queue text, ctime bigint, mtime bigint, stime bigint, pbs_version text, PRIMARY KEY (job_id, start_time, end_time) );"#;

fn job(id: &str, state: &str) -> serde_json::Map<String, serde_json::Value> {
    json!({
        "Job_Id": id,
        "job_state": state,
        "queue": "compute",
        "ctime": "Tue Mar 12 10:27:52 2024",
        "mtime": "Wed Mar 13 13:10:13 2024",
        "stime": "Tue Mar 12 13:04:41 2024"
    })
    .as_object()
    .unwrap()
    .clone()
}

fn writer(store: FakeJobStore) -> TableWriter<FakeJobStore> {
    TableWriter::new(
        store,
        WriterConfig::default(),
        schema_columns(DEFINITION),
    )
}

fn tick(jobs: Vec<serde_json::Map<String, serde_json::Value>>) -> TickJobs {
    TickJobs {
        timestamp_ms: 1_710_000_000_000,
        jobs,
    }
}

async fn run_ticks(writer: &mut TableWriter<FakeJobStore>, ticks: Vec<TickJobs>) {
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    for t in ticks {
        tx.send(t).await.unwrap();
    }
    drop(tx);
    writer.run(&mut rx).await.unwrap();
}

#[tokio::test]
async fn only_eligible_states_are_persisted() {
    let store = FakeJobStore::new();
    let mut writer = writer(store.clone());

    run_ticks(&mut writer, vec![tick(vec![job("1", "F"), job("2", "R")])]).await;

    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    let row: serde_json::Value = serde_json::from_str(&rows[0]).unwrap();
    assert_eq!(row["Job_Id"], "1");
    assert_eq!(row["job_state"], "F");
}

#[tokio::test]
async fn repeats_are_deduplicated_by_job_id() {
    let store = FakeJobStore::new();
    let mut writer = writer(store.clone());

    run_ticks(
        &mut writer,
        vec![tick(vec![job("1", "F")]), tick(vec![job("1", "F")])],
    )
    .await;

    assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn rows_are_sanitised_and_pruned() {
    let store = FakeJobStore::new();
    let mut writer = writer(store.clone());

    let mut record = job("1", "F");
    record.insert("surprise_field".to_string(), json!("x"));
    run_ticks(&mut writer, vec![tick(vec![record])]).await;

    let row: serde_json::Value = serde_json::from_str(&store.rows()[0]).unwrap();
    assert!(row.get("surprise_field").is_none());
    assert!(row["stime"].is_i64());
    assert_eq!(row["pbs_version"], "19.2.8");
    assert_eq!(row["job_id"], "1");
}

#[tokio::test]
async fn store_failures_skip_the_job_but_keep_the_worker_alive() {
    let store = FakeJobStore::new().failing();
    let mut writer = writer(store.clone());

    run_ticks(&mut writer, vec![tick(vec![job("1", "F")])]).await;
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn queue_close_ends_the_worker_cleanly() {
    let store = FakeJobStore::new();
    let mut writer = writer(store);
    let (tx, mut rx) = tokio::sync::mpsc::channel::<TickJobs>(1);
    drop(tx);
    assert!(writer.run(&mut rx).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn watchdog_expiry_is_fatal() {
    // a store that never answers
    struct StuckStore;

    #[async_trait::async_trait]
    impl JobStore for StuckStore {
        async fn upsert_job(&self, _row: String) -> Result<(), StoreError> {
            std::future::pending().await
        }
        async fn set_energy(
            &self,
            _p: String,
            _j: &str,
            _s: i64,
            _e: i64,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    let mut writer = TableWriter::new(
        StuckStore,
        WriterConfig {
            watchdog: Duration::from_millis(50),
            ..WriterConfig::default()
        },
        schema_columns(DEFINITION),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel(1);
    tx.send(tick(vec![job("1", "F")])).await.unwrap();
    let err = writer.run(&mut rx).await.unwrap_err();
    assert!(matches!(err, WriterError::Watchdog(_)));
}
