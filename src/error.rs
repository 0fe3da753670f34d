//! Core error types

use thiserror::Error;

use crate::config::StorageError;
use crate::sdk::NodeHandle;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid upload destination: {0}")]
    InvalidDestination(NodeHandle),

    #[error("Upload destination {0} is a file, not a folder")]
    DestinationNotFolder(NodeHandle),

    #[error("Transfer bridge failed to start on port {port}: {reason}")]
    BridgeStartFailed { port: u16, reason: String },

    #[error("Preferences storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Event channel closed")]
    ChannelClosed,
}

// Presentation layers forward errors as plain strings
impl serde::Serialize for CoreError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
