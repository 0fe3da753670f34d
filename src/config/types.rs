//! Preference and settings types

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sdk::{AccountDetails, NodeHandle};

/// Current preferences file version
pub const PREFERENCES_VERSION: u32 = 1;

/// Stored session used to resume a login without asking for the password
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub email: String,
    pub session: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            session: session.into(),
        }
    }
}

// Session tokens never reach the logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("session", &"<redacted>")
            .finish()
    }
}

/// A configured (local folder, remote folder) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedFolder {
    pub local_path: PathBuf,
    pub remote: NodeHandle,
    /// Display name used in user-facing messages
    pub name: String,
}

/// Cached quota and usage figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUsage {
    pub account_type: u8,
    pub storage_total: u64,
    pub storage_used: u64,
    pub transfer_total: u64,
    pub transfer_used: u64,
}

impl From<AccountDetails> for AccountUsage {
    fn from(details: AccountDetails) -> Self {
        Self {
            account_type: details.pro_level,
            storage_total: details.storage_max,
            storage_used: details.storage_used,
            transfer_total: details.transfer_max,
            transfer_used: details.transfer_used,
        }
    }
}

/// Persisted preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Present while logged in
    #[serde(default)]
    pub credential: Option<Credential>,
    #[serde(default)]
    pub default_upload_folder: Option<NodeHandle>,
    #[serde(default)]
    pub synced_folders: Vec<SyncedFolder>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub last_execution_ms: Option<i64>,
    #[serde(default = "default_true")]
    pub show_notifications: bool,
    /// KB/s, `None` = unlimited
    #[serde(default)]
    pub upload_limit_kb: Option<u32>,
    #[serde(default)]
    pub account: Option<AccountUsage>,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            credential: None,
            default_upload_folder: None,
            synced_folders: Vec::new(),
            last_execution_ms: None,
            show_notifications: true,
            upload_limit_kb: None,
            account: None,
        }
    }
}

impl Preferences {
    pub fn is_logged_in(&self) -> bool {
        self.credential.is_some()
    }

    /// Forget everything tied to the account
    pub fn unlink(&mut self) {
        self.credential = None;
        self.account = None;
    }

    /// Upload limit in bytes per second
    pub fn upload_limit_bytes(&self) -> Option<u64> {
        self.upload_limit_kb.map(|kb| u64::from(kb) * 1024)
    }
}

/// Entry-count limits for uploading a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderLimits {
    pub max_folders: usize,
    pub max_files: usize,
}

impl Default for FolderLimits {
    fn default() -> Self {
        Self {
            max_folders: 5_000,
            max_files: 10_000,
        }
    }
}

/// Tunables of the event core
#[derive(Debug, Clone)]
pub struct CoreSettings {
    /// Delay before a requested restart fires
    pub reboot_delay: Duration,
    /// Port of the local transfer bridge listener
    pub bridge_port: u16,
    pub folder_limits: FolderLimits,
    /// Entries kept in the recently changed list
    pub recent_files_limit: usize,
    /// Upper bound of pending tag → path entries
    pub tag_registry_capacity: usize,
    /// Builds past this instant refuse to start
    pub trial_deadline: Option<DateTime<Utc>>,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            reboot_delay: Duration::from_secs(10),
            bridge_port: 2973,
            folder_limits: FolderLimits::default(),
            recent_files_limit: 3,
            tag_registry_capacity: 4096,
            trial_deadline: None,
        }
    }
}
