//! Session lifecycle: login, tree loading, synced folder startup and logout

pub mod state;
pub mod syncs;
pub mod trial;

pub use state::{SessionState, SessionStateMachine, RUNNING_MESSAGE};
pub use syncs::{start_syncs, SyncDrift};
pub use trial::{check_trial, TrialStatus};
