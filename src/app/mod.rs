//! Application context and event loop
//!
//! [`AppContext`] is the reducer over every SDK event and UI command;
//! [`AppRuntime`] feeds it from a single ordered channel and executes the
//! effects it returns.

pub mod context;
pub mod effects;
pub mod events;
pub mod runtime;
pub mod snapshot;

pub use context::AppContext;
pub use effects::{Effect, Message, MessageLevel, TransferProgress, TrayStatus, UiEffect};
pub use events::{AppEvent, UiCommand};
pub use runtime::{AppRuntime, Platform, Presenter, RunOutcome, EVENT_CHANNEL_CAPACITY};
pub use snapshot::{Snapshot, SnapshotHandle};
