// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pbspub: PBS job-accounting and node-metrics publisher.
//!
//! Per configured cluster, four workers run side by side: the node
//! snapshot reader, the job discovery reader (which also feeds the
//! durable queues), the job-table writer, and the job-energy enricher.
//! Workers are isolated; the first one to fail takes the process down so
//! the supervisor can respawn everything clean.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use anyhow::{bail, Context};
use clap::Parser;
use gs_core::{topic_pairs, BaseTags, SystemClock};
use gs_energy::{load_node_config, EnergyEnricher, EnricherConfig, HttpSeriesSource};
use gs_exec::{runner_for_host, RetryPolicy, SshConfig};
use gs_pbs::controller::AdaptiveController;
use gs_pbs::discovery::{FetchConfig, JobFetcher};
use gs_pbs::publisher::{JobSensor, NodeSensor};
use gs_rollup::metric_prefix;
use gs_sink::{DedupEmitter, NdjsonSink, SensorReader};
use gs_store::{
    load_schema, schema_columns, ScyllaJobStore, StoreConfig, TableWriter, WriterConfig,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};

#[derive(Debug, Clone, Parser)]
#[command(name = "pbspub", version, about = "PBS metric publisher")]
struct Opts {
    /// Sampling period in seconds
    #[arg(long = "ts", default_value_t = 60)]
    ts: u64,

    /// Topic prefix carrying the org pair
    #[arg(long = "mqtt-topic")]
    mqtt_topic: String,

    /// PBS hosts, comma separated `<cluster>:<login host>`
    #[arg(long = "pbs-hosts")]
    pbs_hosts: String,

    /// Username to log in to the PBS hosts
    #[arg(long = "pbs-host-user")]
    pbs_host_user: String,

    /// Password for the PBS hosts
    #[arg(long = "pbs-host-passw")]
    pbs_host_passw: Option<String>,

    /// Private key for passwordless login on the PBS hosts
    #[arg(long = "pbs-host-key")]
    pbs_host_key: Option<PathBuf>,

    /// Timezone of the scheduler's timestamps
    #[arg(long = "pbs-timezone", default_value = "Europe/Rome")]
    pbs_timezone: String,

    /// Scheduler version; selects the table schema and metric prefix
    #[arg(long = "pbs-version", default_value = "19.2.8")]
    pbs_version: String,

    /// qselect command override (kept for compatibility; the batched
    /// fetcher builds its own per-state commands)
    #[arg(long = "pbs-qselect-cmd")]
    pbs_qselect_cmd: Option<String>,

    /// Detail-query timeout, seconds
    #[arg(long = "pbs-parser-timeout", default_value_t = 180)]
    pbs_parser_timeout: u64,

    /// Discovery command timeout, seconds
    #[arg(long = "pbs-qselect-cmd-timeout", default_value_t = 60)]
    pbs_qselect_cmd_timeout: u64,

    /// Target wall-time per detail batch, seconds
    #[arg(long = "pbs-qstat-cmd-target-time", default_value_t = 15.0)]
    pbs_qstat_cmd_target_time: f64,

    #[arg(long = "pbs-qstat-cmd-min-batch", default_value_t = 25)]
    pbs_qstat_cmd_min_batch: usize,

    #[arg(long = "pbs-qstat-cmd-max-batch", default_value_t = 500)]
    pbs_qstat_cmd_max_batch: usize,

    /// Insert-dedup cache capacity
    #[arg(long = "cache-max-size", default_value_t = 100_000)]
    cache_max_size: usize,

    /// Insert-dedup cache entry lifetime, seconds
    #[arg(long = "cache-timeout", default_value_t = 3600)]
    cache_timeout: u64,

    /// Wide-column host, `<host>:<port>`
    #[arg(long = "cass-host")]
    cass_host: String,

    #[arg(long = "cass-user")]
    cass_user: String,

    #[arg(long = "cass-passw")]
    cass_passw: String,

    /// Statement timeout, seconds
    #[arg(long = "cass-timeout", default_value_t = 60)]
    cass_timeout: u64,

    #[arg(long = "cass-keyspace-name")]
    cass_keyspace_name: String,

    /// Directory holding the `pbs_schema_<version>` files
    #[arg(long = "schema-dir", default_value = "./schemas")]
    schema_dir: PathBuf,

    /// Time-series store for power samples
    #[arg(long = "examon-db-ip")]
    examon_db_ip: String,

    #[arg(long = "examon-db-port", default_value_t = 3000)]
    examon_db_port: u16,

    #[arg(long = "examon-db-user")]
    examon_db_user: String,

    #[arg(long = "examon-db-pwd")]
    examon_db_pwd: String,

    /// Per-node power metric configuration
    #[arg(long = "node-config-file")]
    node_config_file: PathBuf,

    /// Energy unit for the job table, `J` or `Wh`
    #[arg(long = "job-energy-unit", default_value = "J")]
    job_energy_unit: String,
}

fn parse_hosts(raw: &str) -> anyhow::Result<Vec<(String, String)>> {
    let mut hosts = Vec::new();
    for entry in raw.split(',') {
        let Some((cluster, login)) = entry.split_once(':') else {
            bail!("malformed --pbs-hosts entry {entry:?}, expected <cluster>:<host>");
        };
        hosts.push((cluster.to_string(), login.to_string()));
    }
    Ok(hosts)
}

fn ssh_config(opts: &Opts, host: &str) -> SshConfig {
    SshConfig {
        host: host.to_string(),
        port: 22,
        username: opts.pbs_host_user.clone(),
        password: opts.pbs_host_passw.clone(),
        key_file: opts.pbs_host_key.clone(),
        connect_timeout: Duration::from_secs(10),
        command_timeout: Duration::from_secs(opts.pbs_parser_timeout),
        retry: RetryPolicy::default(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    info!(?opts, "starting pbs publisher");

    let topic = topic_pairs(&opts.mqtt_topic);
    let org = topic.get("org").map(String::as_str).unwrap_or("").to_string();
    let prefix = metric_prefix(&opts.pbs_version);
    let hosts = parse_hosts(&opts.pbs_hosts)?;

    let table_definition = load_schema(&opts.schema_dir, &opts.pbs_version)
        .context("failed to load the job table schema")?;
    let columns = schema_columns(&table_definition);
    let node_config =
        load_node_config(&opts.node_config_file).context("failed to load the node config")?;

    let store_config = StoreConfig {
        host: opts.cass_host.clone(),
        user: opts.cass_user.clone(),
        password: opts.cass_passw.clone(),
        request_timeout: Duration::from_secs(opts.cass_timeout),
    };

    let mut workers: JoinSet<anyhow::Result<()>> = JoinSet::new();

    for (cluster, login) in hosts {
        let base = BaseTags::new(&org, &cluster, &login, "pbs_pub", "data");
        let table = format!("job_info_{cluster}");

        let (table_tx, mut table_rx) = tokio::sync::mpsc::channel(16);
        let (energy_tx, mut energy_rx) = tokio::sync::mpsc::channel(1024);

        // node snapshot worker
        {
            let runner = runner_for_host(ssh_config(&opts, &login));
            let sensor = NodeSensor::new(runner, SystemClock, base.clone(), &prefix);
            let dedup = DedupEmitter::new(
                opts.cache_max_size,
                Some(Duration::from_secs(opts.cache_timeout)),
            );
            let worker_id = format!("sinfo:{login}");
            let ts = opts.ts;
            workers.spawn(async move {
                let sink = NdjsonSink::new(tokio::io::stdout());
                let mut reader =
                    SensorReader::new(&worker_id, sensor, sink, SystemClock, dedup, ts);
                reader.run().await.context(worker_id)
            });
        }

        // job discovery worker
        {
            let runner = runner_for_host(ssh_config(&opts, &login));
            let controller = AdaptiveController::new(
                opts.pbs_qstat_cmd_min_batch,
                opts.pbs_qstat_cmd_max_batch,
                opts.pbs_qstat_cmd_target_time,
            );
            let fetch_config = FetchConfig {
                qselect_timeout: opts.pbs_qselect_cmd_timeout,
                finished_history_secs: opts.ts + 10,
                min_timeout: opts.pbs_parser_timeout,
                max_timeout: opts.pbs_parser_timeout,
                failure_pause: Duration::from_secs(10),
            };
            let fetcher = JobFetcher::new(runner, SystemClock, fetch_config, controller);
            let sensor = JobSensor::new(
                fetcher,
                base.clone(),
                &prefix,
                &opts.pbs_timezone,
                table_tx,
                energy_tx,
            );
            let dedup = DedupEmitter::new(
                opts.cache_max_size,
                Some(Duration::from_secs(opts.cache_timeout)),
            );
            let worker_id = format!("squeue:{login}");
            let ts = opts.ts;
            workers.spawn(async move {
                let sink = NdjsonSink::new(tokio::io::stdout());
                let mut reader =
                    SensorReader::new(&worker_id, sensor, sink, SystemClock, dedup, ts);
                reader.run().await.context(worker_id)
            });
        }

        // job-table writer worker
        {
            let store_config = store_config.clone();
            let keyspace = opts.cass_keyspace_name.clone();
            let table = table.clone();
            let table_definition = table_definition.clone();
            let columns = columns.clone();
            let writer_config = WriterConfig {
                eligible_states: vec!["F".to_string()],
                timezone: opts.pbs_timezone.clone(),
                pbs_version: opts.pbs_version.clone(),
                watchdog: Duration::from_secs(300),
                cache_max_size: opts.cache_max_size,
                cache_timeout: Duration::from_secs(opts.cache_timeout),
            };
            workers.spawn(async move {
                let store =
                    ScyllaJobStore::connect(&store_config, &keyspace, &table, &table_definition)
                        .await
                        .context("job-table writer startup")?;
                let mut writer = TableWriter::new(store, writer_config, columns);
                writer
                    .run(&mut table_rx)
                    .await
                    .context("job-table writer")?;
                Ok(())
            });
        }

        // job-energy worker
        {
            let store_config = store_config.clone();
            let keyspace = opts.cass_keyspace_name.clone();
            let table = table.clone();
            let table_definition = table_definition.clone();
            let node_config = node_config.clone();
            let enricher_config = EnricherConfig {
                unit: opts.job_energy_unit.clone(),
                timezone: opts.pbs_timezone.clone(),
            };
            let series = HttpSeriesSource::new(
                &opts.examon_db_ip,
                opts.examon_db_port,
                &opts.examon_db_user,
                &opts.examon_db_pwd,
            );
            workers.spawn(async move {
                let store =
                    ScyllaJobStore::connect(&store_config, &keyspace, &table, &table_definition)
                        .await
                        .context("job-energy worker startup")?;
                let enricher = EnergyEnricher::new(series, store, node_config, enricher_config);
                enricher
                    .run(&mut energy_rx)
                    .await
                    .context("job-energy worker")?;
                Ok(())
            });
        }
    }

    // delayed start: let the writers settle before the first sample
    tokio::time::sleep(Duration::from_secs(opts.ts + 5)).await;

    // workers run forever; the first one to stop takes the process down
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {
                error!("worker finished unexpectedly, shutting down");
                std::process::exit(1);
            }
            Ok(Err(err)) => {
                error!(%err, "worker failed, shutting down");
                std::process::exit(1);
            }
            Err(join_err) => {
                error!(%join_err, "worker crashed, shutting down");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
