// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gs-core: shared types for the gridscope metric publishers.

pub mod cache;
pub mod clock;
pub mod fingerprint;
pub mod metric;
pub mod sanitize;
pub mod timeconv;

pub use cache::TtlCache;
pub use clock::{Clock, FakeClock, SystemClock};
pub use fingerprint::fingerprint;
pub use metric::{BaseTags, MetricRecord, MetricValue, TagMap};
pub use sanitize::{routing_key, sanitize, sanitize_opt, topic_pairs, SanitizeMode, NA};
pub use timeconv::{wall_to_epoch_ms, TimeConvError, PBS_DATE_FORMAT};
