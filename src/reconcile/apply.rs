use super::plan::{SyncAction, SyncPlan};
use crate::error::{FileFailure, FileOp};
use crate::fileops::FileOps;
use crate::progress::ProgressReporter;
use crate::state::RunState;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Default)]
pub struct SyncReport {
    pub copied: Vec<String>,
    pub deleted_from_source: Vec<String>,
    pub deleted_from_dest: Vec<String>,
    pub orphans: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub new_state: RunState,
}

impl SyncReport {
    pub fn mutation_count(&self) -> usize {
        self.copied.len() + self.deleted_from_source.len() + self.deleted_from_dest.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl SyncPlan {
    /// Carry out the plan. A failure on one file is logged and recorded,
    /// and the state to persist is adjusted so the next run retries it;
    /// the remaining actions still run.
    pub fn apply(self, ops: &dyn FileOps, reporter: &dyn ProgressReporter) -> SyncReport {
        let total = self.mutation_count();
        let start = Instant::now();
        reporter.on_apply_start(total);

        let mut report = SyncReport {
            new_state: self.projected,
            ..SyncReport::default()
        };
        let mut done = 0;

        for action in self.actions {
            match action {
                SyncAction::DeleteFromSource { path, name } => {
                    info!("Deleting {} from source", name);
                    match ops.remove(&path) {
                        Ok(()) => report.deleted_from_source.push(name),
                        Err(err) => {
                            error!("Error deleting {}: {}", path.display(), err);
                            // Still on the source. Keep it recorded on the
                            // destination too so the deletion is inferred again.
                            report.new_state.source.insert(name.clone());
                            report.new_state.dest.insert(name);
                            report.failures.push(FileFailure::new(path, FileOp::Delete, &err));
                        }
                    }
                }
                SyncAction::CopyToDest { from, to, name } => {
                    info!("Copying {} to destination", name);
                    if let Err(err) = ops.copy(&from, &to) {
                        error!("Error copying {} to {}: {}", from.display(), to.display(), err);
                        report.new_state.dest.remove(&name);
                        report.failures.push(FileFailure::new(from, FileOp::Copy, &err));
                    } else {
                        report.copied.push(name);
                    }
                }
                SyncAction::DeleteFromDest { path, name } => {
                    info!("Deleting {} from destination", name);
                    match ops.remove(&path) {
                        Ok(()) => report.deleted_from_dest.push(name),
                        Err(err) => {
                            error!("Error deleting {}: {}", path.display(), err);
                            report.new_state.dest.insert(name.clone());
                            report.new_state.source.insert(name);
                            report.failures.push(FileFailure::new(path, FileOp::Delete, &err));
                        }
                    }
                }
                SyncAction::Orphan { path, name } => {
                    warn!(
                        "Found {} on destination that was never on the source, skipping ({})",
                        name,
                        path.display()
                    );
                    report.orphans.push(path);
                    continue;
                }
            }
            done += 1;
            reporter.on_apply_progress(done, total);
        }

        reporter.on_apply_complete(report.failures.len(), start.elapsed().as_secs_f64());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::super::plan;
    use super::*;
    use crate::progress::SilentReporter;
    use std::cell::RefCell;
    use std::io;
    use std::path::Path;

    /// Records calls and fails for configured basenames.
    #[derive(Default)]
    struct ScriptedFs {
        fail: Vec<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedFs {
        fn check(&self, op: &str, path: &Path) -> io::Result<()> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.calls.borrow_mut().push(format!("{} {}", op, name));
            if self.fail.contains(&name.as_str()) {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "scripted failure"))
            } else {
                Ok(())
            }
        }
    }

    impl FileOps for ScriptedFs {
        fn copy(&self, from: &Path, _to: &Path) -> io::Result<u64> {
            self.check("copy", from).map(|_| 0)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            self.check("remove", path)
        }
    }

    fn paths(root: &str, names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| Path::new(root).join(n)).collect()
    }

    #[test]
    fn test_apply_runs_every_mutation() {
        let previous = RunState::new(["a.mp3", "b.mp3"], ["a.mp3", "b.mp3"]);
        let plan = plan(
            &paths("/app", &["b.mp3", "new.mp3"]),
            &paths("/player", &["a.mp3"]),
            Path::new("/player"),
            &previous,
        );
        let fs = ScriptedFs::default();

        let report = plan.apply(&fs, &SilentReporter);

        assert_eq!(
            *fs.calls.borrow(),
            vec!["remove b.mp3", "copy new.mp3", "remove a.mp3"]
        );
        assert_eq!(report.deleted_from_source, vec!["b.mp3"]);
        assert_eq!(report.copied, vec!["new.mp3"]);
        assert_eq!(report.deleted_from_dest, vec!["a.mp3"]);
        assert_eq!(report.new_state, RunState::new(["new.mp3"], ["new.mp3"]));
        assert!(!report.has_failures());
    }

    #[test]
    fn test_copy_failure_is_retried_next_run() {
        let plan = plan(
            &paths("/app", &["bad.mp3", "good.mp3"]),
            &[],
            Path::new("/player"),
            &RunState::default(),
        );
        let fs = ScriptedFs {
            fail: vec!["bad.mp3"],
            ..ScriptedFs::default()
        };

        let report = plan.apply(&fs, &SilentReporter);

        assert_eq!(report.copied, vec!["good.mp3"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].op, FileOp::Copy);
        assert!(!report.new_state.dest.contains("bad.mp3"));
        assert!(report.new_state.source.contains("bad.mp3"));

        // Next run: bad.mp3 is still only on the source and gets copied.
        let retry = super::super::plan(
            &paths("/app", &["bad.mp3", "good.mp3"]),
            &paths("/player", &["good.mp3"]),
            Path::new("/player"),
            &report.new_state,
        );
        assert_eq!(retry.mutation_count(), 1);
        assert!(matches!(retry.actions[0], SyncAction::CopyToDest { .. }));
    }

    #[test]
    fn test_failed_destination_delete_is_retried_next_run() {
        let previous = RunState::new(["b.mp3"], ["b.mp3"]);
        let plan = plan(
            &[],
            &paths("/player", &["b.mp3"]),
            Path::new("/player"),
            &previous,
        );
        let fs = ScriptedFs {
            fail: vec!["b.mp3"],
            ..ScriptedFs::default()
        };

        let report = plan.apply(&fs, &SilentReporter);
        assert_eq!(report.failures[0].op, FileOp::Delete);
        assert_eq!(report.new_state, previous);

        let retry = super::super::plan(
            &[],
            &paths("/player", &["b.mp3"]),
            Path::new("/player"),
            &report.new_state,
        );
        assert!(matches!(retry.actions[0], SyncAction::DeleteFromDest { .. }));
    }

    #[test]
    fn test_failed_source_delete_is_retried_next_run() {
        let previous = RunState::new(["b.mp3"], ["b.mp3"]);
        let plan = plan(
            &paths("/app", &["b.mp3"]),
            &[],
            Path::new("/player"),
            &previous,
        );
        let fs = ScriptedFs {
            fail: vec!["b.mp3"],
            ..ScriptedFs::default()
        };

        let report = plan.apply(&fs, &SilentReporter);
        assert_eq!(report.new_state, previous);

        let retry = super::super::plan(
            &paths("/app", &["b.mp3"]),
            &[],
            Path::new("/player"),
            &report.new_state,
        );
        assert!(matches!(retry.actions[0], SyncAction::DeleteFromSource { .. }));
    }

    #[test]
    fn test_orphans_are_collected_without_calls() {
        let plan = plan(
            &[],
            &paths("/player", &["stray.mp3"]),
            Path::new("/player"),
            &RunState::default(),
        );
        let fs = ScriptedFs::default();

        let report = plan.apply(&fs, &SilentReporter);

        assert!(fs.calls.borrow().is_empty());
        assert_eq!(report.orphans, vec![PathBuf::from("/player/stray.mp3")]);
        assert_eq!(report.mutation_count(), 0);
    }
}
