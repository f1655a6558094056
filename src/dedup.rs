//! Copy files whose content is not yet anywhere under the destination.
//!
//! Identity here is the content digest, not the name. Copies land flat in
//! the destination root under the source basename; if two different
//! source files share a basename, the one copied last wins.

use crate::config::CopierConfig;
use crate::engine::scan_tree;
use crate::error::{Error, FileFailure, FileOp};
use crate::fileops::{DryRunFs, FileOps};
use crate::hasher::{hash_file, ContentDigest};
use crate::progress::ProgressReporter;
use crate::scanner::{basename, TreeScanner};
use colored::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Content digest to the first destination path seen holding it.
#[derive(Debug, Default)]
pub struct ContentIndex {
    entries: HashMap<ContentDigest, PathBuf>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false and keeps the existing path if `digest` is already known.
    pub fn insert(&mut self, digest: ContentDigest, path: PathBuf) -> bool {
        if self.entries.contains_key(&digest) {
            return false;
        }
        self.entries.insert(digest, path);
        true
    }

    pub fn get(&self, digest: &ContentDigest) -> Option<&Path> {
        self.entries.get(digest).map(PathBuf::as_path)
    }

    pub fn contains(&self, digest: &ContentDigest) -> bool {
        self.entries.contains_key(digest)
    }

    /// Forget every digest recorded for `path`, e.g. after it was overwritten.
    pub fn evict_path(&mut self, path: &Path) {
        self.entries.retain(|_, known| known != path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Duplicate {
    pub path: PathBuf,
    pub dupe_of: PathBuf,
    pub digest: ContentDigest,
}

#[derive(Debug, Default)]
pub struct CopyReport {
    pub indexed: usize,
    pub copied: Vec<(PathBuf, PathBuf)>,
    pub duplicates: Vec<Duplicate>,
    pub failures: Vec<FileFailure>,
}

impl CopyReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct UniqCopier {
    config: CopierConfig,
}

impl UniqCopier {
    pub fn new(config: CopierConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        ops: &dyn FileOps,
        reporter: &dyn ProgressReporter,
    ) -> Result<CopyReport, Error> {
        // The copier never deletes, so unreadable subtrees are skipped.
        let scanner = TreeScanner::new(&self.config.extension, &self.config.ignore_patterns)?
            .skip_unreadable(true);
        let ops: &dyn FileOps = if self.config.dry_run { &DryRunFs } else { ops };
        let mut report = CopyReport::default();

        info!("Scanning destination dir for {} files...", self.config.extension);
        let dest_files = scan_tree(&scanner, &self.config.dest_dir, reporter)?;
        info!("Inspecting {} files in destination dir...", dest_files.len());
        let mut index = self.build_index(&dest_files, reporter, &mut report);
        report.indexed = index.len();

        info!("Scanning source dir for {} files...", self.config.extension);
        let src_files = scan_tree(&scanner, &self.config.src_dir, reporter)?;
        info!("Inspecting {} files in source dir...", src_files.len());

        let start = Instant::now();
        reporter.on_hash_start(src_files.len());
        for (n, src) in src_files.iter().enumerate() {
            self.copy_if_unique(src, ops, &mut index, &mut report);
            reporter.on_hash_progress(n + 1, src_files.len());
        }
        reporter.on_hash_complete(src_files.len(), start.elapsed().as_secs_f64());

        info!(
            "{} copied, {} duplicates skipped, {} errors",
            format!("{}", report.copied.len()).green(),
            format!("{}", report.duplicates.len()).yellow(),
            format!("{}", report.failures.len()).red(),
        );
        Ok(report)
    }

    /// Hash every destination file. Unreadable files are reported and left
    /// out of the index.
    fn build_index(
        &self,
        dest_files: &[PathBuf],
        reporter: &dyn ProgressReporter,
        report: &mut CopyReport,
    ) -> ContentIndex {
        let start = Instant::now();
        let mut index = ContentIndex::new();
        reporter.on_hash_start(dest_files.len());

        for (n, path) in dest_files.iter().enumerate() {
            match hash_file(path) {
                Ok(digest) => {
                    if self.config.print_dest_files {
                        info!("{}:\t{}", digest.short(), path.display());
                    }
                    if !index.insert(digest, path.clone()) {
                        debug!("{} duplicates content already indexed", path.display());
                    }
                }
                Err(err) => {
                    error!("Error hashing {}: {}", path.display(), err);
                    report.failures.push(FileFailure::new(path, FileOp::Hash, &err));
                }
            }
            reporter.on_hash_progress(n + 1, dest_files.len());
        }

        reporter.on_hash_complete(dest_files.len(), start.elapsed().as_secs_f64());
        index
    }

    fn copy_if_unique(
        &self,
        src: &Path,
        ops: &dyn FileOps,
        index: &mut ContentIndex,
        report: &mut CopyReport,
    ) {
        let digest = match hash_file(src) {
            Ok(digest) => digest,
            Err(err) => {
                error!("Error hashing {}: {}", src.display(), err);
                report.failures.push(FileFailure::new(src, FileOp::Hash, &err));
                return;
            }
        };

        if let Some(existing) = index.get(&digest) {
            if self.config.print_dupe_notifications {
                info!(
                    "Skipping duplicate: {}:\t{}\t(dupe of {})",
                    digest.short(),
                    src.display(),
                    existing.display()
                );
            }
            report.duplicates.push(Duplicate {
                path: src.to_path_buf(),
                dupe_of: existing.to_path_buf(),
                digest,
            });
            return;
        }

        let target = self.config.dest_dir.join(basename(src));
        if self.config.print_new_files {
            info!("{}:\t{} --> {}", digest.short(), src.display(), target.display());
        }

        let overwriting = target.exists();
        if overwriting {
            warn!(
                "{} already exists with different content and will be overwritten",
                target.display()
            );
        }

        match ops.copy(src, &target) {
            Ok(_) => {
                if overwriting {
                    index.evict_path(&target);
                }
                index.insert(digest, target.clone());
                report.copied.push((src.to_path_buf(), target));
            }
            Err(err) => {
                error!("Error copying {} to {}: {}", src.display(), target.display(), err);
                report.failures.push(FileFailure::new(src, FileOp::Copy, &err));
            }
        }
    }
}
