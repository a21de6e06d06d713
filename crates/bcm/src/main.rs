// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bcmpub: Bright Cluster Manager metric publisher.
//!
//! Owns one persistent `cmsh` session, polls the monitoring data each
//! tick, and publishes deduplicated metric records.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use anyhow::Context;
use clap::Parser;
use gs_bcm::{load_unit_map, BcmReader, BCM_COLUMNS, BCM_STOP_SEQUENCE, BCM_TOOL_CMD};
use gs_core::{topic_pairs, BaseTags, SystemClock};
use gs_exec::{ShellSession, ShellSessionConfig};
use gs_sink::{DedupEmitter, NdjsonSink, SensorReader};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "bcmpub", version, about = "BCM metric publisher")]
struct Opts {
    /// Sampling period in seconds
    #[arg(long = "ts", default_value_t = 20)]
    ts: u64,

    /// Topic prefix carrying the org/cluster pairs
    #[arg(long = "mqtt-topic")]
    mqtt_topic: String,

    /// Path to the cluster-manager shell
    #[arg(long = "bcm-shell", default_value = "/cm/local/apps/cmd/bin/cmsh")]
    bcm_shell: String,

    /// Remote host running the shell; local when omitted
    #[arg(long = "bcm-host")]
    bcm_host: Option<String>,

    /// Username for the remote host
    #[arg(long = "bcm-username")]
    bcm_username: Option<String>,

    /// Monitoring query issued each tick
    #[arg(long = "bcm-tool-cmd", default_value = BCM_TOOL_CMD)]
    bcm_tool_cmd: String,

    /// Measurable→unit table
    #[arg(long = "metrics-csv", default_value = "./metrics.csv")]
    metrics_csv: PathBuf,

    /// Per-read timeout on the shell session, seconds
    #[arg(long = "parser-timeout", default_value_t = 60)]
    parser_timeout: u64,

    /// Dedup cache capacity
    #[arg(long = "cache-max-size", default_value_t = 1_000_000)]
    cache_max_size: usize,

    /// Dedup cache entry lifetime, seconds
    #[arg(long = "cache-timeout", default_value_t = 604_800)]
    cache_timeout: u64,
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
    info!(?opts, "starting bcm publisher");

    let topic = topic_pairs(&opts.mqtt_topic);
    let org = topic.get("org").map(String::as_str).unwrap_or("");
    let cluster = topic.get("cluster").map(String::as_str).unwrap_or("");
    let base = BaseTags::new(org, cluster, "", "bcm_pub", "data");

    let shell_cmd = match (&opts.bcm_host, &opts.bcm_username) {
        (Some(host), Some(user)) => format!("ssh -q -tt {user}@{host} {}", opts.bcm_shell),
        _ => opts.bcm_shell.clone(),
    };

    let session = ShellSession::connect(ShellSessionConfig {
        shell_cmd,
        stop_sequence: BCM_STOP_SEQUENCE.to_string(),
        column_count: BCM_COLUMNS,
        separator: ';',
        read_timeout: Duration::from_secs(opts.parser_timeout),
    })
    .await
    .context("failed to start the cluster-manager shell")?;

    let units = load_unit_map(&opts.metrics_csv).context("failed to load the metrics table")?;
    info!(measurables = units.len(), "unit map loaded");

    let reader = BcmReader::new(session, &opts.bcm_tool_cmd, units, base, SystemClock);
    let dedup = DedupEmitter::new(
        opts.cache_max_size,
        Some(Duration::from_secs(opts.cache_timeout)),
    );
    let sink = NdjsonSink::new(tokio::io::stdout());

    let mut worker = SensorReader::new("bcm_pub", reader, sink, SystemClock, dedup, opts.ts);
    worker.run().await.context("bcm worker failed")?;
    Ok(())
}
