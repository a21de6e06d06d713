// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn loopback_names_are_local() {
    assert!(is_local_host("localhost"));
    assert!(is_local_host("127.0.0.1"));
}

#[test]
fn remote_names_are_not_local() {
    assert!(!is_local_host("login01.cluster.example.com"));
}

#[test]
fn own_hostname_is_local() {
    if let Ok(name) = std::fs::read_to_string("/proc/sys/kernel/hostname") {
        assert!(is_local_host(name.trim()));
    }
}

#[test]
fn retry_policy_defaults() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.attempts, 6);
    assert_eq!(policy.pause, Duration::from_secs(60));
}

#[tokio::test]
async fn local_host_gets_a_forked_shell() {
    let runner = runner_for_host(SshConfig::new("localhost", "nobody"));
    let out = runner.run("printf local").await.unwrap();
    assert!(out.ok);
    assert_eq!(out.stdout, "local");
}
