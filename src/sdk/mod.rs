//! Storage SDK boundary
//!
//! Typed view of the external sync/transfer SDK: the events it delivers on
//! the event thread, the commands the core issues back, and read-only access
//! to the current remote filesystem snapshot.

pub mod client;
pub mod events;
pub mod types;

pub use client::{NodeInfo, NodeTree, SdkClient, SdkCommand, SnapshotTree};
pub use events::SdkEvent;
pub use types::{
    AccountDetails, ErrorCode, LocalNode, LocalNodeLink, NodeDescriptor, NodeHandle, NodeKind,
    TransferDirection, TransferInfo, TransferTag,
};
pub use types::{narrow_name, wide_name};
