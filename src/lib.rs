//! TraySync - application state and transfer reconciliation core
//!
//! Drives the login → fetch-nodes → ready lifecycle of a cloud storage SDK,
//! keeps transfer statistics, serialises user uploads against the destination
//! prompt and maps finished uploads back to the remote nodes they create.

pub mod app;
pub mod config;
pub mod error;
pub mod nodes;
pub mod sdk;
pub mod session;
pub mod transfer;
pub mod upload;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use app::{AppContext, AppEvent, AppRuntime, RunOutcome, SnapshotHandle, UiCommand};
pub use config::{CoreSettings, Preferences, PreferencesStore};
pub use error::CoreError;

/// Install the global tracing subscriber (`RUST_LOG` overrides the default `info`)
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Open the preferences file and load it.
///
/// Without a usable config directory the preferences live in memory for this
/// run only.
pub async fn open_preferences() -> (Arc<dyn PreferencesStore>, Preferences) {
    let store: Arc<dyn PreferencesStore> = match config::JsonPreferencesStore::new() {
        Ok(store) => {
            tracing::info!("Preferences file: {:?}", store.path());
            Arc::new(store)
        }
        Err(e) => {
            tracing::error!("Failed to get config directory: {}", e);
            Arc::new(config::MemoryPreferencesStore::default())
        }
    };

    let prefs = match store.load().await {
        Ok(prefs) => prefs,
        Err(e) => {
            tracing::error!("Failed to load preferences, using defaults: {}", e);
            Preferences::default()
        }
    };
    (store, prefs)
}
