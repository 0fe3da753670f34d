//! Transfer tag → local path registry
//!
//! Node creation for an upload is reported after (and separately from) the
//! transfer-finish event. The finish handler records the local path under the
//! transfer's tag so the node-update handler can find it later.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::sdk::TransferTag;

/// Pending upload origins, keyed by transfer tag.
///
/// An entry lives until its node update consumes it, or until it is the
/// oldest entry when the registry is full.
pub struct TagRegistry {
    paths: HashMap<TransferTag, PathBuf>,
    /// Insertion order, oldest first
    order: VecDeque<TransferTag>,
    capacity: usize,
}

impl TagRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            paths: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Remember the local origin of a finished upload.
    ///
    /// A reused tag replaces the previous path.
    pub fn record(&mut self, tag: TransferTag, path: PathBuf) {
        if tag.is_none() {
            warn!("Ignoring upload origin without tag: {:?}", path);
            return;
        }

        debug!("Recording upload origin: tag {} -> {:?}", tag, path);

        if self.paths.insert(tag, path).is_some() {
            self.order.retain(|t| *t != tag);
        }
        self.order.push_back(tag);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.paths.remove(&oldest);
                warn!(
                    "Tag registry full ({} entries), evicted tag {}",
                    self.capacity, oldest
                );
            }
        }
    }

    /// Look up without consuming
    pub fn get(&self, tag: TransferTag) -> Option<&Path> {
        self.paths.get(&tag).map(PathBuf::as_path)
    }

    /// Consume the entry once its node update has been observed
    pub fn take(&mut self, tag: TransferTag) -> Option<PathBuf> {
        let path = self.paths.remove(&tag)?;
        self.order.retain(|t| *t != tag);
        debug!("Resolved upload origin: tag {} -> {:?}", tag, path);
        Some(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_take() {
        let mut registry = TagRegistry::new(16);
        registry.record(TransferTag(7), "/local/x.txt".into());

        assert_eq!(registry.get(TransferTag(7)), Some(Path::new("/local/x.txt")));
        assert_eq!(registry.take(TransferTag(7)), Some(PathBuf::from("/local/x.txt")));
        assert!(registry.take(TransferTag(7)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reused_tag_replaces_path() {
        let mut registry = TagRegistry::new(16);
        registry.record(TransferTag(3), "/a".into());
        registry.record(TransferTag(3), "/b".into());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(TransferTag(3)), Some(Path::new("/b")));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut registry = TagRegistry::new(2);
        registry.record(TransferTag(1), "/1".into());
        registry.record(TransferTag(2), "/2".into());
        registry.record(TransferTag(3), "/3".into());

        assert_eq!(registry.len(), 2);
        assert!(registry.get(TransferTag(1)).is_none());
        assert!(registry.get(TransferTag(2)).is_some());
        assert!(registry.get(TransferTag(3)).is_some());
    }

    #[test]
    fn test_refreshing_tag_moves_it_to_back() {
        let mut registry = TagRegistry::new(2);
        registry.record(TransferTag(1), "/1".into());
        registry.record(TransferTag(2), "/2".into());
        registry.record(TransferTag(1), "/1b".into());
        registry.record(TransferTag(3), "/3".into());

        assert!(registry.get(TransferTag(2)).is_none());
        assert_eq!(registry.get(TransferTag(1)), Some(Path::new("/1b")));
    }

    #[test]
    fn test_zero_tag_ignored() {
        let mut registry = TagRegistry::new(4);
        registry.record(TransferTag::NONE, "/x".into());
        assert!(registry.is_empty());
    }
}
