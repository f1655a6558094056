use crate::config::SyncConfig;
use crate::error::Error;
use crate::fileops::{DryRunFs, FileOps};
use crate::progress::ProgressReporter;
use crate::reconcile::{self, SyncReport};
use crate::scanner::TreeScanner;
use crate::state::StateStore;
use crate::tags;
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};

pub struct SyncEngine {
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Run one reconciliation:
    /// 1. Scan every source root and the destination
    /// 2. Load the previous run state
    /// 3. Plan copies and deletions, then apply them
    /// 4. Persist the new state (skipped on dry runs)
    ///
    /// A missing or unreadable root, or any unreadable directory below one,
    /// fails the run before anything is modified.
    pub fn run(
        &self,
        ops: &dyn FileOps,
        reporter: &dyn ProgressReporter,
    ) -> Result<SyncReport, Error> {
        let scanner = TreeScanner::new(&self.config.extension, &self.config.ignore_patterns)?;

        let mut source_files = Vec::new();
        for source_dir in &self.config.source_dirs {
            source_files.extend(scan_tree(&scanner, source_dir, reporter)?);
        }
        let dest_files = scan_tree(&scanner, &self.config.dest_dir, reporter)?;
        info!(
            "{} source files, {} destination files",
            source_files.len(),
            dest_files.len()
        );

        let store = StateStore::new(&self.config.state_path);
        let previous = store.load();

        if tracing::enabled!(Level::DEBUG) {
            for path in &source_files {
                tags::log_track_details(path);
            }
        }

        let plan = reconcile::plan(&source_files, &dest_files, &self.config.dest_dir, &previous);
        debug!(
            "Inferred deletions: {:?} from source, {:?} from destination",
            plan.source_deletions, plan.dest_deletions
        );

        let report = if self.config.dry_run {
            plan.apply(&DryRunFs, reporter)
        } else {
            plan.apply(ops, reporter)
        };

        if self.config.dry_run {
            info!("Dry run, run state left untouched");
        } else {
            store.save(&report.new_state)?;
        }

        info!(
            "{} copied, {} deleted from source, {} deleted from destination, {} orphans, {} errors",
            format!("{}", report.copied.len()).green(),
            format!("{}", report.deleted_from_source.len()).yellow(),
            format!("{}", report.deleted_from_dest.len()).yellow(),
            format!("{}", report.orphans.len()).cyan(),
            format!("{}", report.failures.len()).red(),
        );
        Ok(report)
    }
}

/// Scan one root, reporting timing through `reporter`.
pub(crate) fn scan_tree(
    scanner: &TreeScanner,
    root: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<PathBuf>, Error> {
    let start = Instant::now();
    reporter.on_scan_start(root);
    let files = scanner.scan(root)?;
    let duration = start.elapsed();
    reporter.on_scan_complete(root, files.len(), duration.as_secs_f64());
    debug!(
        "Scanned {} in {:.2}s: {} files",
        root.display(),
        duration.as_secs_f64(),
        files.len()
    );
    Ok(files)
}
