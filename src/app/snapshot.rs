//! Read-only state published to the presentation layer

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::config::AccountUsage;
use crate::nodes::RecentFile;
use crate::session::SessionState;
use crate::transfer::StatsSnapshot;

use super::effects::TrayStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session: SessionState,
    pub stats: StatsSnapshot,
    /// Most recent first
    pub recent_files: Vec<RecentFile>,
    pub usage: Option<AccountUsage>,
    pub paused: bool,
    pub tray_status: Option<TrayStatus>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            session: SessionState::LoggedOut,
            stats: StatsSnapshot::default(),
            recent_files: Vec::new(),
            usage: None,
            paused: false,
            tray_status: None,
        }
    }
}

/// Shared handle; the event loop writes, readers clone
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<Snapshot>>,
}

impl SnapshotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Snapshot {
        self.inner.read().clone()
    }

    pub(crate) fn publish(&self, snapshot: Snapshot) {
        *self.inner.write() = snapshot;
    }
}
