//! SDK data types

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Remote node handle
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeHandle(pub u64);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transfer tag assigned by the SDK.
///
/// Unique while the transfer is in flight, may be reused afterwards.
/// Zero on a node means "not created by this client".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferTag(pub i32);

impl TransferTag {
    pub const NONE: TransferTag = TransferTag(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TransferTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Upload,
    Download,
}

/// Result code carried by every SDK reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Ok,
    Failed { code: i32, message: String },
}

impl ErrorCode {
    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        ErrorCode::Failed {
            code,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ErrorCode::Ok)
    }

    /// Human-readable description (empty for `Ok`)
    pub fn message(&self) -> &str {
        match self {
            ErrorCode::Ok => "",
            ErrorCode::Failed { message, .. } => message,
        }
    }
}

/// Snapshot of a transfer as reported by start/update/finish events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInfo {
    pub direction: TransferDirection,
    pub tag: TransferTag,
    /// File name (not full path)
    pub file_name: String,
    /// Local path (source for uploads, destination for downloads)
    pub path: PathBuf,
    /// Remote node, known for downloads
    #[serde(default)]
    pub node_handle: Option<NodeHandle>,
    /// Declared total size
    pub total_bytes: u64,
    /// Bytes transferred so far for this transfer
    pub transferred_bytes: u64,
    /// Bytes transferred since the previous event for this transfer
    pub delta_bytes: u64,
    /// Instantaneous speed in bytes/second
    pub speed: u64,
}

/// Account details reply payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    pub pro_level: u8,
    pub storage_max: u64,
    pub storage_used: u64,
    pub transfer_max: u64,
    pub transfer_used: u64,
}

/// One element of a synced folder's local tree.
///
/// `U` is the code unit of the host filesystem names: `u8` for UTF-8 hosts,
/// `u16` for hosts whose names (and separators) are wide units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNode<U> {
    pub name: Vec<U>,
    pub parent: Option<Arc<LocalNode<U>>>,
}

impl<U> LocalNode<U> {
    pub fn root(name: Vec<U>) -> Arc<Self> {
        Arc::new(Self { name, parent: None })
    }

    pub fn child(parent: &Arc<Self>, name: Vec<U>) -> Arc<Self> {
        Arc::new(Self {
            name,
            parent: Some(parent.clone()),
        })
    }
}

/// Name segment for a narrow (UTF-8) local tree
pub fn narrow_name(name: &str) -> Vec<u8> {
    name.as_bytes().to_vec()
}

/// Name segment for a wide (UTF-16) local tree
pub fn wide_name(name: &str) -> Vec<u16> {
    name.encode_utf16().collect()
}

/// Link from a remote node to its local counterpart inside a synced folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalNodeLink {
    Narrow(Arc<LocalNode<u8>>),
    Wide(Arc<LocalNode<u16>>),
}

/// Changed node reported in a node-update batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub handle: NodeHandle,
    pub kind: NodeKind,
    pub tag: TransferTag,
    pub removed: bool,
    pub sync_deleted: bool,
    pub display_name: String,
    pub local_link: Option<LocalNodeLink>,
}

impl NodeDescriptor {
    pub fn file(handle: u64, tag: i32, display_name: impl Into<String>) -> Self {
        Self {
            handle: NodeHandle(handle),
            kind: NodeKind::File,
            tag: TransferTag(tag),
            removed: false,
            sync_deleted: false,
            display_name: display_name.into(),
            local_link: None,
        }
    }

    pub fn folder(handle: u64, tag: i32, display_name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Folder,
            ..Self::file(handle, tag, display_name)
        }
    }

    pub fn with_local_link(mut self, link: LocalNodeLink) -> Self {
        self.local_link = Some(link);
        self
    }

    /// Removed locally or remotely; carries no reconciliation work
    pub fn is_gone(&self) -> bool {
        self.removed || self.sync_deleted
    }
}
