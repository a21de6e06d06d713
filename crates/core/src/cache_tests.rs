// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn get_returns_inserted_value() {
    let mut cache: TtlCache<String, u32> = TtlCache::new(10, None);
    cache.insert("4732778".to_string(), 7);
    assert_eq!(cache.get(&"4732778".to_string()), Some(&7));
    assert_eq!(cache.len(), 1);
}

#[test]
fn missing_key_is_none() {
    let cache: TtlCache<String, u32> = TtlCache::new(10, None);
    assert_eq!(cache.get(&"nope".to_string()), None);
}

#[test]
fn expired_entry_reads_as_miss_but_stays_resident() {
    let mut cache: TtlCache<&str, u32> = TtlCache::new(10, Some(Duration::ZERO));
    cache.insert("k", 1);
    assert_eq!(cache.get(&"k"), None);
    // still resident: keys()/len() see the raw population
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.keys().count(), 1);
}

#[test]
fn insert_at_capacity_sweeps_expired_entries() {
    let mut cache: TtlCache<u32, u32> = TtlCache::new(2, Some(Duration::ZERO));
    cache.insert(1, 1);
    cache.insert(2, 2);
    // both entries are expired; the next insert sweeps them
    cache.insert(3, 3);
    assert_eq!(cache.len(), 1);
}

#[test]
fn insert_over_budget_still_succeeds() {
    let mut cache: TtlCache<u32, u32> = TtlCache::new(2, None);
    cache.insert(1, 1);
    cache.insert(2, 2);
    cache.insert(3, 3);
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(&3), Some(&3));
}

#[test]
fn overwrite_does_not_trigger_sweep() {
    let mut cache: TtlCache<u32, u32> = TtlCache::new(1, None);
    cache.insert(1, 1);
    cache.insert(1, 2);
    assert_eq!(cache.get(&1), Some(&2));
    assert_eq!(cache.len(), 1);
}

#[test]
fn remove_returns_value() {
    let mut cache: TtlCache<&str, u32> = TtlCache::new(10, None);
    cache.insert("a", 1);
    assert_eq!(cache.remove(&"a"), Some(1));
    assert!(cache.is_empty());
}
