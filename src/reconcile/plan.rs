use crate::scanner::basename;
use crate::state::RunState;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// The destination copy was deleted by the user; remove the source file.
    DeleteFromSource { path: PathBuf, name: String },
    /// New on the source side.
    CopyToDest {
        from: PathBuf,
        to: PathBuf,
        name: String,
    },
    /// The source copy was deleted by the user; remove the destination file.
    DeleteFromDest { path: PathBuf, name: String },
    /// On the destination but never seen on the source. Reported only.
    Orphan { path: PathBuf, name: String },
}

impl SyncAction {
    pub fn name(&self) -> &str {
        match self {
            SyncAction::DeleteFromSource { name, .. }
            | SyncAction::CopyToDest { name, .. }
            | SyncAction::DeleteFromDest { name, .. }
            | SyncAction::Orphan { name, .. } => name,
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, SyncAction::Orphan { .. })
    }
}

/// The filesystem changes one run should make, and the state to record if
/// every one of them succeeds.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub actions: Vec<SyncAction>,
    pub source_deletions: BTreeSet<String>,
    pub dest_deletions: BTreeSet<String>,
    pub projected: RunState,
}

impl SyncPlan {
    pub fn mutation_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_mutation()).count()
    }

    pub fn orphan_count(&self) -> usize {
        self.actions.len() - self.mutation_count()
    }
}

/// Work out what to copy and delete from the current scans and the state
/// recorded by the previous run. Pure: touches no files.
///
/// Source files are visited first. Destination files are then judged
/// against the source names as scanned, before the source pass removed
/// anything from its working copy. Orphan detection depends on that.
pub fn plan(
    source_files: &[PathBuf],
    dest_files: &[PathBuf],
    dest_dir: &Path,
    previous: &RunState,
) -> SyncPlan {
    let source_names: BTreeSet<String> = source_files.iter().map(|p| basename(p)).collect();
    let dest_names: BTreeSet<String> = dest_files.iter().map(|p| basename(p)).collect();

    let source_deletions: BTreeSet<String> =
        previous.source.difference(&source_names).cloned().collect();
    let dest_deletions: BTreeSet<String> =
        previous.dest.difference(&dest_names).cloned().collect();

    let mut working_source = source_names.clone();
    let mut working_dest = dest_names;
    let mut actions = Vec::new();

    for path in source_files {
        let name = basename(path);
        if dest_deletions.contains(&name) {
            working_source.remove(&name);
            actions.push(SyncAction::DeleteFromSource {
                path: path.clone(),
                name,
            });
        } else if !working_dest.contains(&name) {
            working_dest.insert(name.clone());
            actions.push(SyncAction::CopyToDest {
                from: path.clone(),
                to: dest_dir.join(&name),
                name,
            });
        }
    }

    for path in dest_files {
        let name = basename(path);
        if source_deletions.contains(&name) {
            working_dest.remove(&name);
            actions.push(SyncAction::DeleteFromDest {
                path: path.clone(),
                name,
            });
        } else if !source_names.contains(&name) {
            actions.push(SyncAction::Orphan {
                path: path.clone(),
                name,
            });
        }
    }

    SyncPlan {
        actions,
        source_deletions,
        dest_deletions,
        projected: RunState {
            source: working_source,
            dest: working_dest,
        },
    }
}
