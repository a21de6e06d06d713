//! Startup errors exit non-zero with a usable message.

use crate::prelude::*;

#[test]
fn pbspub_without_required_flags_fails() {
    let output = pbspub_cmd().output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--pbs-hosts") || stderr.contains("required"));
}

#[test]
fn pbspub_with_malformed_hosts_fails_at_startup() {
    let output = pbspub_cmd()
        .args([
            "--mqtt-topic",
            "org/e4",
            "--pbs-hosts",
            "no-colon-here",
            "--pbs-host-user",
            "svc",
            "--cass-host",
            "127.0.0.1:9042",
            "--cass-user",
            "cassandra",
            "--cass-passw",
            "cassandra",
            "--cass-keyspace-name",
            "Test_PBS",
            "--examon-db-ip",
            "127.0.0.1",
            "--examon-db-user",
            "examon",
            "--examon-db-pwd",
            "x",
            "--node-config-file",
            "/no/such/node_config.json",
        ])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn bcmpub_with_missing_metrics_table_fails_at_startup() {
    let output = bcmpub_cmd()
        .args([
            "--mqtt-topic",
            "org/e4/cluster/main",
            "--bcm-shell",
            "/bin/cat",
            "--metrics-csv",
            "/no/such/metrics.csv",
            "--parser-timeout",
            "1",
        ])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn unknown_flags_are_rejected() {
    let output = pbspub_cmd().arg("--definitely-not-a-flag").output().unwrap();
    assert!(!output.status.success());
}
