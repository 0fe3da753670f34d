//! Transfer Statistics Aggregator
//!
//! Running counts, sizes and speeds across every concurrent transfer,
//! one [`TransferStats`] per direction. All SDK notifications arrive on the
//! event thread, so `&mut self` is the only synchronisation needed.

use serde::Serialize;
use tracing::{debug, warn};

use crate::sdk::{TransferDirection, TransferInfo};

/// Statistics for one direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStats {
    /// Transfers started and not yet finished
    pub active_count: u32,
    /// Transfers started since the last idle reset
    pub lifetime_count: u32,
    /// Sum of declared sizes since the last idle reset
    pub total_bytes_expected: u64,
    /// Sum of reported deltas since the last idle reset
    pub total_bytes_transferred: u64,
    /// Last reported speed in bytes/second
    pub speed: u64,
}

impl TransferStats {
    /// Completion percentage (0-100)
    pub fn progress_percent(&self) -> f64 {
        if self.total_bytes_expected == 0 {
            return 0.0;
        }
        (self.total_bytes_transferred as f64 / self.total_bytes_expected as f64) * 100.0
    }
}

/// Read-only copy handed to the presentation layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub uploads: TransferStats,
    pub downloads: TransferStats,
}

/// What a finish event did to the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// Transfers remain queued in at least one direction
    Busy,
    /// The last queued transfer finished; all statistics were reset
    Drained,
}

#[derive(Debug, Default)]
pub struct TransferStatsAggregator {
    uploads: TransferStats,
    downloads: TransferStats,
}

impl TransferStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn direction_mut(&mut self, direction: TransferDirection) -> &mut TransferStats {
        match direction {
            TransferDirection::Upload => &mut self.uploads,
            TransferDirection::Download => &mut self.downloads,
        }
    }

    pub fn on_start(&mut self, transfer: &TransferInfo) {
        let stats = self.direction_mut(transfer.direction);
        stats.active_count += 1;
        stats.lifetime_count += 1;
        stats.total_bytes_expected += transfer.total_bytes;
        // A fresh transfer has not reported a rate yet
        stats.speed = 0;
        debug!(
            "Transfer started ({:?}, tag {}): active {}",
            transfer.direction, transfer.tag, stats.active_count
        );
    }

    pub fn on_update(&mut self, transfer: &TransferInfo) {
        let stats = self.direction_mut(transfer.direction);
        stats.total_bytes_transferred += transfer.delta_bytes;
        stats.speed = transfer.speed;
    }

    pub fn on_finish(&mut self, transfer: &TransferInfo) -> FinishOutcome {
        let stats = self.direction_mut(transfer.direction);
        stats.total_bytes_transferred += transfer.delta_bytes;
        stats.speed = transfer.speed;

        match stats.active_count.checked_sub(1) {
            Some(n) => stats.active_count = n,
            None => {
                warn!(
                    "Transfer finished ({:?}, tag {}) with active count already 0",
                    transfer.direction, transfer.tag
                );
                return FinishOutcome::Busy;
            }
        }

        if self.is_idle() {
            debug!("All transfers finished, resetting statistics");
            self.uploads = TransferStats::default();
            self.downloads = TransferStats::default();
            FinishOutcome::Drained
        } else {
            FinishOutcome::Busy
        }
    }

    /// No transfer of either direction is queued
    pub fn is_idle(&self) -> bool {
        self.uploads.active_count == 0 && self.downloads.active_count == 0
    }

    pub fn get(&self, direction: TransferDirection) -> TransferStats {
        match direction {
            TransferDirection::Upload => self.uploads,
            TransferDirection::Download => self.downloads,
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uploads: self.uploads,
            downloads: self.downloads,
        }
    }
}
