//! Configuration Management Module
//!
//! Persisted preferences (credential, upload folder, synced folders, usage
//! cache) and the core's tunable settings.

pub mod storage;
pub mod types;

pub use storage::{
    config_dir, log_dir, preferences_file, JsonPreferencesStore, MemoryPreferencesStore,
    PreferencesStore, StorageError,
};
pub use types::{
    AccountUsage, CoreSettings, Credential, FolderLimits, Preferences, SyncedFolder,
    PREFERENCES_VERSION,
};
