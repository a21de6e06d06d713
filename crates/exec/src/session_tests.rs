// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write as _;

/// A bash stand-in for cmsh: echoes "ready" for mode switches and a
/// framed monitoring block for the `data` command.
const FAKE_CMSH: &str = r#"
while IFS= read -r line; do
  case "$line" in
    data)
      echo "[c->device]% data"
      echo "lead-row"
      echo "node1;Power;p;t;120.5;10s;ok;info"
      echo "node2;Power;p;t;130.5;10s;ok;info"
      echo "bad;row"
      echo "[c->device]%"
      ;;
    *) echo "ready" ;;
  esac
done
"#;

fn fake_shell() -> (tempfile::TempDir, ShellSessionConfig) {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fake_cmsh.sh");
    let mut file = std::fs::File::create(&script).unwrap();
    file.write_all(FAKE_CMSH.as_bytes()).unwrap();
    let config = ShellSessionConfig {
        shell_cmd: format!("bash {}", script.display()),
        stop_sequence: "->device]%".to_string(),
        column_count: 8,
        separator: ';',
        read_timeout: Duration::from_secs(2),
    };
    (dir, config)
}

#[tokio::test]
async fn run_collects_column_matched_rows_until_stop_sequence() {
    let (_dir, config) = fake_shell();
    let mut session = ShellSession::connect(config).await.unwrap();

    let output = session.run("data").await.unwrap();
    assert_eq!(
        output,
        "node1;Power;p;t;120.5;10s;ok;info\nnode2;Power;p;t;130.5;10s;ok;info\n"
    );

    session.close().await;
}

#[tokio::test]
async fn child_exit_is_a_session_failure() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("dead.sh");
    std::fs::write(&script, "exit 0\n").unwrap();
    let config = ShellSessionConfig {
        shell_cmd: format!("bash {}", script.display()),
        stop_sequence: "->device]%".to_string(),
        column_count: 8,
        separator: ';',
        read_timeout: Duration::from_millis(200),
    };

    let err = ShellSession::connect(config).await.unwrap_err();
    assert!(matches!(err, ExecError::SessionFailed(_)));
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let config = ShellSessionConfig {
        shell_cmd: "/no/such/interactive-shell".to_string(),
        stop_sequence: "%".to_string(),
        column_count: 1,
        separator: ';',
        read_timeout: Duration::from_millis(200),
    };
    let err = ShellSession::connect(config).await.unwrap_err();
    assert!(matches!(err, ExecError::Spawn(_)));
}
