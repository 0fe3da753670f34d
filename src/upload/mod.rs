//! User-initiated uploads
//!
//! Buffers paths submitted from the shell or the UI, resolves the destination
//! folder (cached default or interactive selection) and hands the validated
//! entries to the SDK in queue order.

pub mod limits;
pub mod queue;

pub use limits::{FolderProbe, WalkdirProbe};
pub use queue::{Dispatch, EnqueueOutcome, UploadQueueCoordinator};
