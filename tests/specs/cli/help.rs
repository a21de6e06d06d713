//! Help and version output for the publisher binaries.

use crate::prelude::*;

#[test]
fn pbspub_help_lists_the_config_surface() {
    let output = pbspub_cmd().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--ts",
        "--pbs-hosts",
        "--pbs-timezone",
        "--pbs-qstat-cmd-target-time",
        "--cass-host",
        "--cass-keyspace-name",
        "--examon-db-ip",
        "--node-config-file",
        "--job-energy-unit",
        "--mqtt-topic",
    ] {
        assert!(stdout.contains(flag), "missing flag {flag}");
    }
}

#[test]
fn bcmpub_help_lists_the_config_surface() {
    let output = bcmpub_cmd().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--ts",
        "--mqtt-topic",
        "--bcm-shell",
        "--bcm-tool-cmd",
        "--metrics-csv",
        "--cache-max-size",
        "--cache-timeout",
    ] {
        assert!(stdout.contains(flag), "missing flag {flag}");
    }
}

#[test]
fn binaries_report_their_version() {
    let output = pbspub_cmd().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("pbspub"));

    let output = bcmpub_cmd().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("bcmpub"));
}
