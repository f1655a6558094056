pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod fileops;
pub mod hasher;
pub mod locate;
pub mod progress;
pub mod reconcile;
pub mod scanner;
pub mod state;
pub mod tags;

pub use config::{AppConfig, CopierConfig, SyncConfig};
pub use dedup::{ContentIndex, CopyReport, UniqCopier};
pub use engine::SyncEngine;
pub use error::{Error, FileFailure, FileOp};
pub use fileops::{DryRunFs, FileOps, LocalFs};
pub use progress::{ProgressReporter, SilentReporter};
pub use reconcile::SyncReport;
pub use state::{RunState, StateStore};
