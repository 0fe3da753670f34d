//! Transfer bookkeeping
//!
//! Aggregated statistics across all concurrent transfers, and the registry
//! that remembers which local file produced each finished upload.

pub mod stats;
pub mod tags;

pub use stats::{FinishOutcome, StatsSnapshot, TransferStats, TransferStatsAggregator};
pub use tags::TagRegistry;
