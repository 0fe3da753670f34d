//! Folder size limits for uploads

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::config::FolderLimits;

/// Decides whether a local path is too large to upload as a new folder
pub trait FolderProbe: Send {
    fn exceeds_limits(&self, path: &Path, limits: &FolderLimits) -> bool;
}

/// Counts entries on disk, stopping as soon as a limit is crossed
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkdirProbe;

impl FolderProbe for WalkdirProbe {
    fn exceeds_limits(&self, path: &Path, limits: &FolderLimits) -> bool {
        if !path.is_dir() {
            return false;
        }

        let mut folders = 0usize;
        let mut files = 0usize;

        for entry in WalkDir::new(path).min_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry under {:?}: {}", path, e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                folders += 1;
            } else {
                files += 1;
            }

            if folders > limits.max_folders || files > limits.max_files {
                debug!(
                    "{:?} exceeds upload limits ({} folders, {} files so far)",
                    path, folders, files
                );
                return true;
            }
        }

        false
    }
}
