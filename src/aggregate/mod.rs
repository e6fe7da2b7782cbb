//! Aggregation layer: fan-out search, merge, dedupe.

mod dedupe;
mod search;

pub use dedupe::dedupe_candidates;
pub use search::{Aggregator, SearchOutcome};
