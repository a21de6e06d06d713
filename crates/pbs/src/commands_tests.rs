// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn finished_discovery_embeds_window_and_timeout() {
    let cmd = qselect_finished(60, 70);
    assert_eq!(
        cmd,
        r#"timeout 60 qselect -x -tm.gt.$(date -d "70 seconds ago" "+%Y%m%d%H%M") -s F"#
    );
}

#[test]
fn state_discovery_uses_the_state_letter() {
    assert_eq!(
        qselect_state(60, JobState::Running),
        "timeout 60 qselect -s R"
    );
    assert_eq!(
        qselect_state(30, JobState::Queued),
        "timeout 30 qselect -s Q"
    );
}

#[test]
fn detail_query_joins_ids_with_spaces() {
    let ids = vec!["1".to_string(), "2".to_string(), "3".to_string()];
    assert_eq!(
        qstat_details(75, &ids),
        "timeout 75 qstat -xfF json -J 1 2 3"
    );
}
