//! Synced folder startup
//!
//! Each configured pair is validated against the remote snapshot and the
//! local disk before it is handed to the SDK. Pairs that no longer hold are
//! dropped from the preferences; the rest start normally.

use std::fmt;

use tracing::{error, info};

use crate::app::{Effect, MessageLevel};
use crate::config::{Preferences, SyncedFolder};
use crate::sdk::{NodeTree, SdkCommand};

/// Why a synced folder was disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDrift {
    RemoteMissing,
    RemoteInRubbish,
    LocalMissing,
}

impl fmt::Display for SyncDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SyncDrift::RemoteMissing => "the remote folder doesn't exist",
            SyncDrift::RemoteInRubbish => "the remote folder is in your Trash folder",
            SyncDrift::LocalMissing => "the local folder doesn't exist",
        };
        f.write_str(reason)
    }
}

fn check_folder(folder: &SyncedFolder, tree: &dyn NodeTree) -> Result<(), SyncDrift> {
    if tree.node(folder.remote).is_none() {
        return Err(SyncDrift::RemoteMissing);
    }
    if tree.is_in_rubbish(folder.remote) {
        return Err(SyncDrift::RemoteInRubbish);
    }
    if !folder.local_path.is_dir() {
        return Err(SyncDrift::LocalMissing);
    }
    Ok(())
}

/// Build the effects that (re)start every valid synced folder.
///
/// `already_active` stops the running syncs first. Disabled pairs are removed
/// from `prefs` and a save is requested once.
pub fn start_syncs(
    prefs: &mut Preferences,
    tree: &dyn NodeTree,
    already_active: bool,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    if already_active {
        effects.push(Effect::Sdk(SdkCommand::StopSyncs));
    }

    let configured = std::mem::take(&mut prefs.synced_folders);
    let total = configured.len();
    let mut kept = Vec::with_capacity(total);

    for folder in configured {
        match check_folder(&folder, tree) {
            Ok(()) => {
                info!("Sync \"{}\" added: {:?} <-> {}", folder.name, folder.local_path, folder.remote);
                effects.push(Effect::Sdk(SdkCommand::SyncFolder {
                    local_path: folder.local_path.clone(),
                    remote: folder.remote,
                }));
                kept.push(folder);
            }
            Err(drift) => {
                error!("Disabling sync \"{}\": {}", folder.name, drift);
                effects.push(Effect::message(
                    MessageLevel::Error,
                    format!(
                        "Your sync \"{}\" has been disabled because {}",
                        folder.name, drift
                    ),
                ));
            }
        }
    }

    let removed = total - kept.len();
    prefs.synced_folders = kept;
    if removed > 0 {
        effects.push(Effect::SavePreferences);
    }

    effects
}
