// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Power-to-energy integration.
//!
//! Node series are aligned on the union timeline with linear
//! interpolation; rows where any node has no coverage are dropped, then
//! each node's power is integrated with the trapezoid rule. Energy comes
//! out in joules.

use crate::series::Sample;

/// One node's evaluated total-power series, sorted by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSeries {
    pub node: String,
    pub samples: Vec<Sample>,
}

/// Trapezoid integral of a single series, seconds on the x axis.
pub fn trapezoid(samples: &[Sample]) -> f64 {
    samples
        .windows(2)
        .map(|pair| {
            let dt = (pair[1].timestamp_ms - pair[0].timestamp_ms) as f64 / 1000.0;
            (pair[0].value + pair[1].value) / 2.0 * dt
        })
        .sum()
}

/// Linear interpolation at `t`; `None` outside the series' coverage.
fn interpolate(samples: &[Sample], t: i64) -> Option<f64> {
    let first = samples.first()?;
    let last = samples.last()?;
    if t < first.timestamp_ms || t > last.timestamp_ms {
        return None;
    }
    let idx = samples.partition_point(|s| s.timestamp_ms < t);
    if idx < samples.len() && samples[idx].timestamp_ms == t {
        return Some(samples[idx].value);
    }
    let before = samples.get(idx.checked_sub(1)?)?;
    let after = samples.get(idx)?;
    let span = (after.timestamp_ms - before.timestamp_ms) as f64;
    if span == 0.0 {
        return Some(before.value);
    }
    let frac = (t - before.timestamp_ms) as f64 / span;
    Some(before.value + frac * (after.value - before.value))
}

/// Integrate every node over the shared timeline.
///
/// Returns per-node energies (joules) and their sum. Timeline rows that
/// any node cannot cover are dropped for all nodes, so the energies stay
/// comparable.
pub fn integrate_nodes(series: &[NodeSeries]) -> (Vec<(String, f64)>, f64) {
    if series.is_empty() {
        return (Vec::new(), 0.0);
    }

    let mut timeline: Vec<i64> = series
        .iter()
        .flat_map(|s| s.samples.iter().map(|sample| sample.timestamp_ms))
        .collect();
    timeline.sort_unstable();
    timeline.dedup();

    // keep rows every node covers
    let shared: Vec<i64> = timeline
        .into_iter()
        .filter(|t| {
            series
                .iter()
                .all(|s| interpolate(&s.samples, *t).is_some())
        })
        .collect();

    let mut energies = Vec::with_capacity(series.len());
    let mut total = 0.0;
    for node_series in series {
        let aligned: Vec<Sample> = shared
            .iter()
            .filter_map(|t| {
                interpolate(&node_series.samples, *t).map(|value| Sample {
                    timestamp_ms: *t,
                    value,
                })
            })
            .collect();
        let energy = trapezoid(&aligned);
        total += energy;
        energies.push((node_series.node.clone(), energy));
    }
    (energies, total)
}

#[cfg(test)]
#[path = "integrate_tests.rs"]
mod tests;
