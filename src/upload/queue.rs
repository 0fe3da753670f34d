//! Upload Queue Coordinator
//!
//! At most one destination-selection prompt is outstanding. While it is,
//! newly submitted paths are appended to the queue and the prompt is
//! surfaced again instead of a second one being opened.

use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::FolderLimits;
use crate::error::CoreError;
use crate::sdk::{NodeHandle, NodeKind, NodeTree};

use super::limits::FolderProbe;

/// What `enqueue` did with the submitted paths
#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Nothing was submitted
    Ignored,
    /// A prompt was already outstanding; it must be brought to the front
    Raised,
    /// No usable default destination; a prompt must be opened
    Prompted,
    /// Sent straight to the cached default destination
    Dispatched(Dispatch),
}

/// Result of sending the queue to a destination
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub destination: NodeHandle,
    /// Paths accepted for upload, in queue order
    pub submitted: Vec<PathBuf>,
    /// Display names of paths rejected by the folder limits
    pub excluded: Vec<String>,
}

pub struct UploadQueueCoordinator {
    pending: VecDeque<PathBuf>,
    selecting: bool,
    limits: FolderLimits,
    probe: Box<dyn FolderProbe>,
}

impl UploadQueueCoordinator {
    pub fn new(limits: FolderLimits, probe: Box<dyn FolderProbe>) -> Self {
        Self {
            pending: VecDeque::new(),
            selecting: false,
            limits,
            probe,
        }
    }

    /// Queue paths for upload.
    ///
    /// `default_destination` is the cached preference; it is only used when it
    /// still resolves in `tree`.
    pub fn enqueue(
        &mut self,
        paths: Vec<PathBuf>,
        default_destination: Option<NodeHandle>,
        tree: &dyn NodeTree,
    ) -> Result<EnqueueOutcome, CoreError> {
        if paths.is_empty() {
            return Ok(EnqueueOutcome::Ignored);
        }

        info!("Queueing {} paths for upload", paths.len());
        self.pending.extend(paths);

        if self.selecting {
            debug!(
                "Destination selection already open, {} paths pending",
                self.pending.len()
            );
            return Ok(EnqueueOutcome::Raised);
        }

        if let Some(handle) = default_destination {
            if tree.node(handle).is_some() {
                return self.dispatch(handle, tree).map(EnqueueOutcome::Dispatched);
            }
            warn!("Default upload folder {} no longer exists", handle);
        }

        self.selecting = true;
        Ok(EnqueueOutcome::Prompted)
    }

    /// The user picked a destination
    pub fn on_destination_selected(
        &mut self,
        handle: NodeHandle,
        tree: &dyn NodeTree,
    ) -> Result<Dispatch, CoreError> {
        if !self.selecting {
            warn!("Destination {} selected with no prompt outstanding", handle);
        }
        self.selecting = false;
        self.dispatch(handle, tree)
    }

    /// The user dismissed the prompt; everything not yet sent is dropped.
    /// Returns the number of dropped paths.
    pub fn on_selection_cancelled(&mut self) -> usize {
        self.selecting = false;
        let dropped = self.pending.len();
        self.pending.clear();
        info!("Upload destination selection cancelled, dropped {} paths", dropped);
        dropped
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Forget everything (logout)
    pub fn reset(&mut self) {
        self.pending.clear();
        self.selecting = false;
    }

    fn dispatch(&mut self, handle: NodeHandle, tree: &dyn NodeTree) -> Result<Dispatch, CoreError> {
        let node = match tree.node(handle) {
            Some(node) => node,
            None => {
                self.pending.clear();
                return Err(CoreError::InvalidDestination(handle));
            }
        };
        if node.kind == NodeKind::File {
            self.pending.clear();
            return Err(CoreError::DestinationNotFolder(handle));
        }

        let mut dispatch = Dispatch {
            destination: handle,
            ..Default::default()
        };

        while let Some(path) = self.pending.pop_front() {
            if self.probe.exceeds_limits(&path, &self.limits) {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned());
                warn!("Not uploading {:?}: folder too large", path);
                dispatch.excluded.push(name);
                continue;
            }
            dispatch.submitted.push(path);
        }

        info!(
            "Dispatching {} uploads to {} ({} excluded)",
            dispatch.submitted.len(),
            handle,
            dispatch.excluded.len()
        );
        Ok(dispatch)
    }
}
