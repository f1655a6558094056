//! Two-sided reconciliation of basename sets.
//!
//! Deletions are never observed directly. A basename recorded on one side
//! in the previous [`RunState`](crate::state::RunState) that is no longer
//! present there now is taken as a user deletion and propagated to the
//! other side. Everything present on the source but missing from the
//! destination is copied across.
//!
//! Identity is the basename alone: two files with the same name in
//! different subdirectories, or with different content, are the same
//! logical file here.

mod apply;
mod plan;

pub use apply::SyncReport;
pub use plan::{plan, SyncAction, SyncPlan};
