//! Node-Update Reconciler
//!
//! Classifies every node of an update batch:
//! - removed / sync-deleted nodes are skipped
//! - `tag == 0` means the node was created outside this client; those are
//!   only counted
//! - files with a tag came from this client; their local path is resolved
//!   from the synced-folder link first, then from the [`TagRegistry`]

use std::path::PathBuf;

use tracing::{debug, info};

use crate::sdk::{NodeDescriptor, NodeKind};
use crate::transfer::TagRegistry;

use super::path_utils::link_path;
use super::recent::RecentFile;

/// Result of reconciling one batch
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Locally originated files, in batch order
    pub recent: Vec<RecentFile>,
    /// Local paths whose shell state must be refreshed
    pub changed_paths: Vec<PathBuf>,
    /// Nodes created or updated outside this client
    pub external_count: usize,
}

impl ReconcileReport {
    pub fn has_external_changes(&self) -> bool {
        self.external_count > 0
    }
}

pub struct NodeUpdateReconciler {
    separator: char,
}

impl NodeUpdateReconciler {
    pub fn new() -> Self {
        Self::with_separator(std::path::MAIN_SEPARATOR)
    }

    /// Use a specific separator when rebuilding synced paths
    pub fn with_separator(separator: char) -> Self {
        Self { separator }
    }

    /// Reconcile a batch. `None` is a full reload and yields an empty report.
    pub fn reconcile(
        &self,
        batch: Option<&[NodeDescriptor]>,
        tags: &mut TagRegistry,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let Some(nodes) = batch else {
            debug!("Full node reload, nothing to reconcile");
            return report;
        };

        for node in nodes {
            if node.is_gone() {
                continue;
            }

            if node.tag.is_none() {
                report.external_count += 1;
                continue;
            }

            if node.kind != NodeKind::File {
                continue;
            }

            let local_path = self.resolve_local_path(node, tags);
            match &local_path {
                Some(path) => {
                    debug!(
                        "Local change {} (tag {}) -> {:?}",
                        node.display_name, node.tag, path
                    );
                    report.changed_paths.push(path.clone());
                }
                None => {
                    info!(
                        "No local origin for {} (tag {})",
                        node.display_name, node.tag
                    );
                }
            }

            report
                .recent
                .push(RecentFile::new(node.display_name.clone(), node.handle, local_path));
        }

        debug!(
            "Reconciled {} nodes: {} local, {} external",
            nodes.len(),
            report.recent.len(),
            report.external_count
        );

        report
    }

    fn resolve_local_path(&self, node: &NodeDescriptor, tags: &mut TagRegistry) -> Option<PathBuf> {
        // The tag is consumed whichever source supplies the path
        let recorded = tags.take(node.tag);
        match &node.local_link {
            Some(link) => Some(link_path(link, self.separator)),
            None => recorded,
        }
    }
}

impl Default for NodeUpdateReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{narrow_name, LocalNode, LocalNodeLink, NodeHandle, TransferTag};

    fn registry() -> TagRegistry {
        TagRegistry::new(64)
    }

    #[test]
    fn test_tagged_file_resolved_from_registry() {
        let mut tags = registry();
        tags.record(TransferTag(7), "/local/x.txt".into());
        let batch = vec![NodeDescriptor::file(100, 7, "x.txt")];

        let report = NodeUpdateReconciler::with_separator('/').reconcile(Some(batch.as_slice()), &mut tags);

        assert_eq!(report.recent.len(), 1);
        assert_eq!(report.recent[0].handle, NodeHandle(100));
        assert_eq!(report.recent[0].local_path, Some(PathBuf::from("/local/x.txt")));
        assert_eq!(report.changed_paths, vec![PathBuf::from("/local/x.txt")]);
        assert!(!report.has_external_changes());
        assert!(tags.is_empty());
    }

    #[test]
    fn test_all_external() {
        let mut tags = registry();
        let batch = vec![
            NodeDescriptor::file(1, 0, "a"),
            NodeDescriptor::folder(2, 0, "b"),
            NodeDescriptor::file(3, 0, "c"),
        ];

        let report = NodeUpdateReconciler::new().reconcile(Some(batch.as_slice()), &mut tags);
        assert!(report.recent.is_empty());
        assert!(report.changed_paths.is_empty());
        assert_eq!(report.external_count, 3);
    }

    #[test]
    fn test_removed_nodes_skipped() {
        let mut tags = registry();
        tags.record(TransferTag(4), "/local/y".into());
        let mut removed = NodeDescriptor::file(1, 4, "y");
        removed.removed = true;
        let mut deleted_external = NodeDescriptor::file(2, 0, "z");
        deleted_external.sync_deleted = true;

        let report =
            NodeUpdateReconciler::new().reconcile(Some([removed, deleted_external].as_slice()), &mut tags);
        assert!(report.recent.is_empty());
        assert_eq!(report.external_count, 0);
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_synced_link_wins_over_registry() {
        let mut tags = registry();
        tags.record(TransferTag(9), "/elsewhere/doc.txt".into());
        let root = LocalNode::root(narrow_name("/home/me/Sync"));
        let leaf = LocalNode::child(&root, narrow_name("doc.txt"));
        let batch =
            vec![NodeDescriptor::file(5, 9, "doc.txt").with_local_link(LocalNodeLink::Narrow(leaf))];

        let report = NodeUpdateReconciler::with_separator('/').reconcile(Some(batch.as_slice()), &mut tags);
        assert_eq!(report.changed_paths, vec![PathBuf::from("/home/me/Sync/doc.txt")]);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_reused_tag_after_synced_upload_is_unresolved() {
        let mut tags = registry();
        tags.record(TransferTag(5), "/sync/a.txt".into());
        let root = LocalNode::root(narrow_name("/sync"));
        let leaf = LocalNode::child(&root, narrow_name("a.txt"));
        let reconciler = NodeUpdateReconciler::with_separator('/');

        let first = vec![NodeDescriptor::file(100, 5, "a.txt").with_local_link(LocalNodeLink::Narrow(leaf))];
        let report = reconciler.reconcile(Some(first.as_slice()), &mut tags);
        assert_eq!(report.changed_paths, vec![PathBuf::from("/sync/a.txt")]);
        assert!(tags.is_empty());

        let later = vec![NodeDescriptor::file(200, 5, "other.bin")];
        let report = reconciler.reconcile(Some(later.as_slice()), &mut tags);
        assert!(report.changed_paths.is_empty());
        assert_eq!(report.recent.len(), 1);
        assert!(report.recent[0].local_path.is_none());
    }

    #[test]
    fn test_unresolved_file_still_recent() {
        let mut tags = registry();
        let batch = vec![NodeDescriptor::file(8, 12, "lost.bin")];

        let report = NodeUpdateReconciler::new().reconcile(Some(batch.as_slice()), &mut tags);
        assert_eq!(report.recent.len(), 1);
        assert!(report.recent[0].local_path.is_none());
        assert!(report.changed_paths.is_empty());
    }

    #[test]
    fn test_tagged_folder_ignored() {
        let mut tags = registry();
        let report = NodeUpdateReconciler::new()
            .reconcile(Some([NodeDescriptor::folder(1, 3, "dir")].as_slice()), &mut tags);
        assert!(report.recent.is_empty());
        assert_eq!(report.external_count, 0);
    }

    #[test]
    fn test_full_reload_is_empty() {
        let mut tags = registry();
        let report = NodeUpdateReconciler::new().reconcile(None, &mut tags);
        assert!(report.recent.is_empty());
        assert!(!report.has_external_changes());
    }
}
