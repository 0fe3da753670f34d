//! Events delivered by the SDK on the event thread

use super::types::{AccountDetails, ErrorCode, NodeDescriptor, TransferInfo};

/// Asynchronous SDK notification.
///
/// Closed set: every variant has exactly one handler in the app context.
#[derive(Debug, Clone)]
pub enum SdkEvent {
    /// Reply to a (resumed-session) login request
    LoginFinished { error: ErrorCode },
    /// Reply to fetch-nodes
    FetchNodesFinished { error: ErrorCode },
    /// Logout completed, user-initiated or forced by the server
    LogoutFinished { error: ErrorCode },
    /// Reply to an account-details request
    AccountDetailsFinished {
        error: ErrorCode,
        details: Option<AccountDetails>,
    },
    /// Reply to a public link export
    ExportFinished {
        error: ErrorCode,
        link: Option<String>,
    },
    /// Reply to pause/resume; `paused` is the state the SDK applied
    PauseTransfersFinished { error: ErrorCode, paused: bool },
    TransferStarted(TransferInfo),
    TransferUpdated(TransferInfo),
    TransferFinished {
        transfer: TransferInfo,
        error: ErrorCode,
    },
    /// The transfer keeps retrying inside the SDK
    TransferTemporaryError {
        transfer: TransferInfo,
        error: ErrorCode,
    },
    /// Batch of changed remote nodes; `None` means a full reload with no detail
    NodesUpdated(Option<Vec<NodeDescriptor>>),
    /// Incremental detail was lost; the tree must be fetched again
    ReloadNeeded,
}

impl SdkEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SdkEvent::LoginFinished { .. } => "login",
            SdkEvent::FetchNodesFinished { .. } => "fetch_nodes",
            SdkEvent::LogoutFinished { .. } => "logout",
            SdkEvent::AccountDetailsFinished { .. } => "account_details",
            SdkEvent::ExportFinished { .. } => "export",
            SdkEvent::PauseTransfersFinished { .. } => "pause_transfers",
            SdkEvent::TransferStarted(_) => "transfer_start",
            SdkEvent::TransferUpdated(_) => "transfer_update",
            SdkEvent::TransferFinished { .. } => "transfer_finish",
            SdkEvent::TransferTemporaryError { .. } => "transfer_temporary_error",
            SdkEvent::NodesUpdated(_) => "nodes_update",
            SdkEvent::ReloadNeeded => "reload_needed",
        }
    }
}
