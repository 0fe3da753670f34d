//! Remote node reconciliation
//!
//! Turns batched node-update notifications into "recently changed" entries,
//! resolving each locally uploaded file back to the path it came from.

pub mod path_utils;
pub mod recent;
pub mod reconciler;

pub use path_utils::{join_reverse, link_path};
pub use recent::{RecentFile, RecentFiles};
pub use reconciler::{NodeUpdateReconciler, ReconcileReport};
