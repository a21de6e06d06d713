// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ranges_and_singles_expand() {
    assert_eq!(
        expand_nodes("r242n[09-11,15],r999n01"),
        ["r242n09", "r242n10", "r242n11", "r242n15", "r999n01"]
    );
}

#[test]
fn plain_list_splits_on_commas() {
    assert_eq!(expand_nodes("a,b,c"), ["a", "b", "c"]);
}

#[test]
fn single_name_passes_through() {
    assert_eq!(expand_nodes("node1299"), ["node1299"]);
}

#[test]
fn numbers_are_zero_padded_to_two() {
    assert_eq!(expand_nodes("n[8-10]"), ["n08", "n09", "n10"]);
}

#[test]
fn multiple_groups_multiply_out() {
    assert_eq!(
        expand_nodes("r[1-2]n[01-02]"),
        ["r01n01", "r01n02", "r02n01", "r02n02"]
    );
}

#[test]
fn suffix_after_group_is_kept() {
    assert_eq!(expand_nodes("n[01-02]-ib"), ["n01-ib", "n02-ib"]);
}

#[test]
fn empty_input_expands_to_nothing() {
    assert!(expand_nodes("").is_empty());
}
