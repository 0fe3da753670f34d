//! Preferences Storage
//!
//! Handles reading/writing the preferences file to disk.
//! Config location: ~/.traysync on macOS/Linux, %APPDATA%\TraySync on Windows

use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::types::{Preferences, PREFERENCES_VERSION};

/// Preferences storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preferences version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

/// Get the configuration directory
/// Returns %APPDATA%\TraySync on Windows, ~/.traysync on macOS/Linux
pub fn config_dir() -> Result<PathBuf, StorageError> {
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("TraySync"));
        }
        dirs::home_dir()
            .map(|home| home.join(".traysync"))
            .ok_or(StorageError::NoConfigDir)
    }

    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .map(|home| home.join(".traysync"))
            .ok_or(StorageError::NoConfigDir)
    }
}

/// Get the log directory for storing application logs
pub fn log_dir() -> Result<PathBuf, StorageError> {
    Ok(config_dir()?.join("logs"))
}

/// Get the preferences file path
pub fn preferences_file() -> Result<PathBuf, StorageError> {
    Ok(config_dir()?.join("preferences.json"))
}

/// Preferences persistence interface
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// Load preferences, falling back to defaults when none are stored
    async fn load(&self) -> Result<Preferences, StorageError>;

    /// Replace the stored preferences
    async fn save(&self, prefs: &Preferences) -> Result<(), StorageError>;
}

/// JSON file backed preferences
pub struct JsonPreferencesStore {
    path: PathBuf,
}

impl JsonPreferencesStore {
    /// Create a store at the default path
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            path: preferences_file()?,
        })
    }

    /// Create a store with custom path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    async fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Copy the current file aside with a timestamp suffix
    pub async fn backup(&self) -> Result<PathBuf, StorageError> {
        let backup_path = self.path.with_extension(format!(
            "json.backup.{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));

        if self.exists().await {
            fs::copy(&self.path, &backup_path).await?;
        }

        Ok(backup_path)
    }
}

#[async_trait]
impl PreferencesStore for JsonPreferencesStore {
    /// Corrupted files are backed up and replaced by defaults
    async fn load(&self) -> Result<Preferences, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => match serde_json::from_str::<Preferences>(&contents) {
                Ok(prefs) => {
                    if prefs.version > PREFERENCES_VERSION {
                        return Err(StorageError::VersionTooNew {
                            found: prefs.version,
                            supported: PREFERENCES_VERSION,
                        });
                    }
                    Ok(prefs)
                }
                Err(e) => {
                    tracing::warn!("Preferences file corrupted: {}", e);

                    match self.backup().await {
                        Ok(backup_path) => {
                            tracing::warn!(
                                "Corrupted preferences backed up to {:?}, using defaults",
                                backup_path
                            );
                        }
                        Err(backup_err) => {
                            tracing::error!(
                                "Failed to backup corrupted preferences: {}",
                                backup_err
                            );
                        }
                    }

                    Ok(Preferences::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn save(&self, prefs: &Preferences) -> Result<(), StorageError> {
        self.ensure_dir().await?;

        // Temp file in the same directory, renamed over the target
        let temp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(prefs)?;

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("Preferences saved to {:?}", self.path);
        Ok(())
    }
}

/// Preferences store that only keeps the last saved value in memory
/// (used when the config directory is unavailable)
#[derive(Default)]
pub struct MemoryPreferencesStore {
    prefs: Mutex<Preferences>,
}

impl MemoryPreferencesStore {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }

    /// Last saved value
    pub fn current(&self) -> Preferences {
        self.prefs.lock().clone()
    }
}

#[async_trait]
impl PreferencesStore for MemoryPreferencesStore {
    async fn load(&self) -> Result<Preferences, StorageError> {
        Ok(self.prefs.lock().clone())
    }

    async fn save(&self, prefs: &Preferences) -> Result<(), StorageError> {
        *self.prefs.lock() = prefs.clone();
        Ok(())
    }
}
