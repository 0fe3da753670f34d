//! Inputs of the event loop

use std::path::PathBuf;

use crate::config::Credential;
use crate::sdk::{NodeHandle, SdkEvent};

/// Everything the event loop reacts to, delivered on one ordered channel
#[derive(Debug, Clone)]
pub enum AppEvent {
    Sdk(SdkEvent),
    Ui(UiCommand),
    /// A new version was installed in the background
    UpdateInstalled,
    /// The deferred restart delay elapsed
    RebootTimerElapsed,
}

impl From<SdkEvent> for AppEvent {
    fn from(event: SdkEvent) -> Self {
        AppEvent::Sdk(event)
    }
}

impl From<UiCommand> for AppEvent {
    fn from(command: UiCommand) -> Self {
        AppEvent::Ui(command)
    }
}

/// Calls from the presentation layer into the core
#[derive(Debug, Clone)]
pub enum UiCommand {
    /// Interactive setup logged in and loaded the tree
    SetupCompleted(Credential),
    /// Local files or folders to upload
    Upload(Vec<PathBuf>),
    DestinationSelected {
        handle: NodeHandle,
        /// Remember the folder for later uploads
        make_default: bool,
    },
    DestinationCancelled,
    SetPaused(bool),
    Logout,
    Restart,
    Exit,
    /// Create a public link and copy it to the clipboard
    CopyFileLink(NodeHandle),
    /// KB/s, `None` for unlimited
    SetUploadLimit(Option<u32>),
    SetNotifications(bool),
}
