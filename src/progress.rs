use std::path::Path;

/// Trait for reporting run progress.
///
/// The CLI implements it with indicatif; library callers and tests use
/// [`SilentReporter`]. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &Path) {}
    fn on_scan_complete(&self, _root: &Path, _files_found: usize, _duration_secs: f64) {}
    fn on_hash_start(&self, _total_files: usize) {}
    fn on_hash_progress(&self, _files_hashed: usize, _total_files: usize) {}
    fn on_hash_complete(&self, _files_hashed: usize, _duration_secs: f64) {}
    fn on_apply_start(&self, _total_actions: usize) {}
    fn on_apply_progress(&self, _actions_done: usize, _total_actions: usize) {}
    fn on_apply_complete(&self, _failures: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
