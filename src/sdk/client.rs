//! Commands issued to the SDK and read access to its node snapshot

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::Credential;

use super::types::{NodeHandle, NodeKind};

/// Call into the SDK. All of them are asynchronous: results come back as
/// [`super::SdkEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkCommand {
    /// Log in with a stored session
    ResumeSession(Credential),
    FetchNodes,
    GetAccountDetails,
    Logout,
    PauseTransfers(bool),
    /// Start synchronizing a local folder with a remote folder
    SyncFolder {
        local_path: PathBuf,
        remote: NodeHandle,
    },
    /// Tear down every active sync
    StopSyncs,
    /// Upload a file or folder into `parent`
    Upload {
        local_path: PathBuf,
        parent: NodeHandle,
    },
    /// Create a public link for a node
    ExportNode(NodeHandle),
    /// Bytes per second, `None` for unlimited
    SetUploadLimit(Option<u64>),
}

/// Node as seen in the current filesystem snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub handle: NodeHandle,
    pub kind: NodeKind,
    pub name: String,
    pub parent: Option<NodeHandle>,
}

/// Read-only lookup into the SDK's remote filesystem snapshot
pub trait NodeTree {
    fn node(&self, handle: NodeHandle) -> Option<NodeInfo>;

    /// Whether the node's direct parent is the rubbish bin
    fn is_in_rubbish(&self, handle: NodeHandle) -> bool;
}

/// SDK collaborator
pub trait SdkClient: NodeTree + Send {
    fn submit(&mut self, command: SdkCommand);
}

/// In-memory [`NodeTree`], used when the host mirrors the tree itself
#[derive(Debug, Default, Clone)]
pub struct SnapshotTree {
    nodes: HashMap<NodeHandle, NodeInfo>,
    rubbish: Option<NodeHandle>,
}

impl SnapshotTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rubbish(rubbish: NodeHandle) -> Self {
        let mut tree = Self::new();
        tree.rubbish = Some(rubbish);
        tree.insert(NodeInfo {
            handle: rubbish,
            kind: NodeKind::Folder,
            name: "Rubbish Bin".to_string(),
            parent: None,
        });
        tree
    }

    pub fn insert(&mut self, info: NodeInfo) {
        self.nodes.insert(info.handle, info);
    }

    pub fn add_folder(&mut self, handle: u64, name: &str, parent: Option<u64>) {
        self.insert(NodeInfo {
            handle: NodeHandle(handle),
            kind: NodeKind::Folder,
            name: name.to_string(),
            parent: parent.map(NodeHandle),
        });
    }

    pub fn add_file(&mut self, handle: u64, name: &str, parent: Option<u64>) {
        self.insert(NodeInfo {
            handle: NodeHandle(handle),
            kind: NodeKind::File,
            name: name.to_string(),
            parent: parent.map(NodeHandle),
        });
    }

    pub fn remove(&mut self, handle: NodeHandle) -> Option<NodeInfo> {
        self.nodes.remove(&handle)
    }
}

impl NodeTree for SnapshotTree {
    fn node(&self, handle: NodeHandle) -> Option<NodeInfo> {
        self.nodes.get(&handle).cloned()
    }

    fn is_in_rubbish(&self, handle: NodeHandle) -> bool {
        match (self.rubbish, self.nodes.get(&handle)) {
            (Some(rubbish), Some(node)) => node.parent == Some(rubbish),
            _ => false,
        }
    }
}
