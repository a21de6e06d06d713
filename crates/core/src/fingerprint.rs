// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Order-independent metric fingerprints for deduplication.

use crate::metric::TagMap;
use sha2::{Digest, Sha256};

/// Stable hash over the tag set and metric name.
///
/// Tag pairs are sorted before hashing so two records with the same tags
/// in different insertion order collapse to one fingerprint. Collisions
/// are tolerated: deduplication is best-effort.
pub fn fingerprint(name: &str, tags: &TagMap) -> u64 {
    let mut pairs: Vec<(&str, &str)> = tags
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    pairs.sort_unstable();

    let mut hasher = Sha256::new();
    for (k, v) in pairs {
        hasher.update(k.as_bytes());
        hasher.update([0x1f]);
        hasher.update(v.as_bytes());
        hasher.update([0x1e]);
    }
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
