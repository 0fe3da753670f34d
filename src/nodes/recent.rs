//! Recently changed files list

use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sdk::NodeHandle;

/// Entry in the "recently changed" list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFile {
    pub name: String,
    pub handle: NodeHandle,
    /// Local origin, when it could be resolved
    pub local_path: Option<PathBuf>,
    pub added_at: DateTime<Utc>,
}

impl RecentFile {
    pub fn new(name: impl Into<String>, handle: NodeHandle, local_path: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            handle,
            local_path,
            added_at: Utc::now(),
        }
    }
}

/// Bounded list, most recent first. Re-adding a node moves it to the front.
#[derive(Debug)]
pub struct RecentFiles {
    entries: VecDeque<RecentFile>,
    capacity: usize,
}

impl RecentFiles {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, file: RecentFile) {
        self.entries.retain(|f| f.handle != file.handle);
        self.entries.push_front(file);
        self.entries.truncate(self.capacity);
    }

    pub fn to_vec(&self) -> Vec<RecentFile> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
