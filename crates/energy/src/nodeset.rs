// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compact node-range expansion: `r242n[09-11,15]` → flat host list.

/// Width numbers are zero-padded to inside expanded ranges.
const RANGE_PAD: usize = 2;

/// Expand a comma-separated node list with optional `[..]` ranges.
///
/// Commas inside brackets separate range items; commas outside separate
/// nodes. A name may carry several bracket groups, which multiply out.
pub fn expand_nodes(compact: &str) -> Vec<String> {
    split_outside_brackets(compact)
        .into_iter()
        .flat_map(|part| expand_one(&part))
        .collect()
}

fn split_outside_brackets(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in input.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn expand_one(name: &str) -> Vec<String> {
    let Some(open) = name.find('[') else {
        return vec![name.to_string()];
    };
    let Some(close) = name[open..].find(']').map(|i| open + i) else {
        return vec![name.to_string()];
    };

    let prefix = &name[..open];
    let group = &name[open + 1..close];
    let rest = &name[close + 1..];

    let mut out = Vec::new();
    for number in expand_range_items(group) {
        let expanded = format!("{prefix}{number:0width$}{rest}", width = RANGE_PAD);
        // later bracket groups multiply out recursively
        out.extend(expand_one(&expanded));
    }
    out
}

fn expand_range_items(group: &str) -> Vec<u64> {
    let mut numbers = Vec::new();
    for item in group.split(',') {
        let bounds: Vec<&str> = item.split('-').collect();
        match bounds.as_slice() {
            [single] => {
                if let Ok(n) = single.trim().parse::<u64>() {
                    numbers.push(n);
                }
            }
            [low, high] => {
                if let (Ok(low), Ok(high)) = (low.trim().parse::<u64>(), high.trim().parse::<u64>())
                {
                    numbers.extend(low..=high);
                }
            }
            _ => {}
        }
    }
    numbers
}

#[cfg(test)]
#[path = "nodeset_tests.rs"]
mod tests;
