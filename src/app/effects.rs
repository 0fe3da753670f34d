//! Side effects requested by the event handlers
//!
//! Handlers never call out directly: they return a list of [`Effect`]s that
//! the runtime executes in order once the handler has run to completion.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::config::AccountUsage;
use crate::nodes::RecentFile;
use crate::sdk::{SdkCommand, TransferDirection};
use crate::transfer::StatsSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Sdk(SdkCommand),
    Ui(UiEffect),
    /// Persist the current preferences
    SavePreferences,
    /// Tell the shell a local item changed (refreshes overlay icons)
    NotifyItemChanged(PathBuf),
    StartShellIntegration,
    StopShellIntegration,
    StartTransferBridge(u16),
    StopTransferBridge,
    /// Fire a restart after the delay, whatever the transfer state is then
    ScheduleReboot(Duration),
    /// Relaunch the application now
    Restart,
    /// Leave the event loop
    Exit,
}

impl Effect {
    pub fn message(level: MessageLevel, text: impl Into<String>) -> Self {
        Effect::Ui(UiEffect::Message(Message::new(level, text)))
    }
}

/// Calls into the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEffect {
    /// Run the interactive setup (login) flow
    StartSetup,
    /// This build is no longer allowed to run
    ShowExpired,
    Message(Message),
    /// Open the destination folder prompt for pending uploads
    ShowFolderSelector,
    /// Bring the outstanding destination prompt to the foreground
    RaiseFolderSelector,
    CopyToClipboard { text: String },
    StatsChanged { stats: StatsSnapshot },
    TransferProgress(TransferProgress),
    RecentFileAdded { file: RecentFile },
    UsageChanged { usage: AccountUsage },
    PausedChanged { paused: bool },
    TrayStatusChanged { status: TrayStatus },
}

/// Progress of the transfer that produced the latest event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    pub direction: TransferDirection,
    pub file_name: String,
    pub transferred_bytes: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    /// Suppressed when notifications are disabled
    Warning,
    Error,
    /// Passive balloon; suppressed when notifications are disabled
    Notification,
}

impl MessageLevel {
    pub fn is_passive(&self) -> bool {
        matches!(self, MessageLevel::Warning | MessageLevel::Notification)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub level: MessageLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
}

impl Message {
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            title: None,
            text: text.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Overall state shown by the tray icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrayStatus {
    LoggingIn,
    Synced,
    Syncing,
    Paused,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passive_levels() {
        assert!(MessageLevel::Warning.is_passive());
        assert!(MessageLevel::Notification.is_passive());
        assert!(!MessageLevel::Info.is_passive());
        assert!(!MessageLevel::Error.is_passive());
    }

    #[test]
    fn test_ui_effect_serialization() {
        let effect = UiEffect::PausedChanged { paused: true };
        let json = serde_json::to_string(&effect).unwrap();
        assert!(json.contains("pausedChanged"));
        assert!(json.contains("true"));
    }
}
