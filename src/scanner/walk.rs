use crate::error::Error;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{error, trace};
use walkdir::{DirEntry, WalkDir};

/// Recursive, extension-filtered directory walker.
///
/// Only regular files are yielded; symlinks are not followed and never
/// reported. Entries are visited in file-name order so two walks of an
/// unchanged tree produce the same sequence.
///
/// An unreadable directory fails the scan: to the reconciler a missed
/// subtree is indistinguishable from deleted files. Callers that never
/// infer deletions can skip unreadable entries below the root with
/// [`TreeScanner::skip_unreadable`].
#[derive(Debug, Clone)]
pub struct TreeScanner {
    extension: String,
    ignore_patterns: Vec<Pattern>,
    skip_unreadable: bool,
}

impl TreeScanner {
    pub fn new(extension: &str, ignore_globs: &[String]) -> Result<Self, Error> {
        let ignore_patterns = ignore_globs
            .iter()
            .map(|glob| {
                Pattern::new(glob).map_err(|source| Error::InvalidPattern {
                    pattern: glob.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            extension: extension.trim_start_matches('.').to_string(),
            ignore_patterns,
            skip_unreadable: false,
        })
    }

    pub fn mp3() -> Self {
        Self {
            extension: "mp3".to_string(),
            ignore_patterns: Vec::new(),
            skip_unreadable: false,
        }
    }

    /// Log and skip unreadable entries below the root instead of failing.
    /// An unreadable root is always an error.
    pub fn skip_unreadable(mut self, skip: bool) -> Self {
        self.skip_unreadable = skip;
        self
    }

    /// Lazily walk `root`. Fails up front if `root` is not a directory;
    /// entries that cannot be read are yielded as [`Error::Walk`].
    pub fn walk<'a>(
        &'a self,
        root: &Path,
    ) -> Result<impl Iterator<Item = Result<PathBuf, Error>> + 'a, Error> {
        if !root.is_dir() {
            return Err(Error::DirectoryNotFound(root.to_path_buf()));
        }

        let files = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_ignored(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.matches_extension(entry.path()) {
                        trace!("Found {}", entry.path().display());
                        Some(Ok(entry.into_path()))
                    } else {
                        None
                    }
                }
                Err(err) => Some(Err(Error::Walk(err))),
            });

        Ok(files)
    }

    /// Eager variant of [`TreeScanner::walk`], sorted by full path.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, Error> {
        let mut files = Vec::new();
        for item in self.walk(root)? {
            match item {
                Ok(path) => files.push(path),
                Err(Error::Walk(err)) if self.skip_unreadable && err.depth() > 0 => {
                    error!("Skipping unreadable entry under {}: {}", root.display(), err);
                }
                Err(err) => return Err(err),
            }
        }
        files.sort();
        Ok(files)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(entry.path()))
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

/// The file name component of `path`, used as the reconciliation key.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_walk_filters_extension_case_insensitively() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("show").join("season1");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("a.mp3"), "a").unwrap();
        fs::write(nested.join("b.MP3"), "b").unwrap();
        fs::write(nested.join("notes.txt"), "c").unwrap();
        fs::write(tmp.path().join("mp3"), "no extension").unwrap();

        let files = TreeScanner::mp3().scan(tmp.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| basename(p)).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.mp3".to_string()));
        assert!(names.contains(&"b.MP3".to_string()));
    }

    #[test]
    fn test_walk_skips_directories_named_like_files() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("album.mp3")).unwrap();
        fs::write(tmp.path().join("album.mp3").join("track.mp3"), "t").unwrap();

        let files = TreeScanner::mp3().scan(tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(basename(&files[0]), "track.mp3");
    }

    #[test]
    fn test_missing_root_is_directory_not_found() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("nope");
        match TreeScanner::mp3().scan(&missing) {
            Err(Error::DirectoryNotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected DirectoryNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_file_root_is_directory_not_found() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("x.mp3");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            TreeScanner::mp3().scan(&file),
            Err(Error::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_ignore_patterns_prune_subtrees() {
        let tmp = tempdir().unwrap();
        let trash = tmp.path().join("trash");
        fs::create_dir_all(&trash).unwrap();
        fs::write(trash.join("old.mp3"), "old").unwrap();
        fs::write(tmp.path().join("keep.mp3"), "keep").unwrap();

        let pattern = format!("{}/trash", tmp.path().display());
        let scanner = TreeScanner::new("mp3", &[pattern]).unwrap();
        let files = scanner.scan(tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(basename(&files[0]), "keep.mp3");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = TreeScanner::new("mp3", &["[".to_string()]);
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_leading_dot_in_extension_is_accepted() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a.mp3"), "a").unwrap();
        let scanner = TreeScanner::new(".mp3", &[]).unwrap();
        assert_eq!(scanner.scan(tmp.path()).unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_reported() {
        let tmp = tempdir().unwrap();
        let real = tmp.path().join("real.mp3");
        fs::write(&real, "r").unwrap();
        std::os::unix::fs::symlink(&real, tmp.path().join("link.mp3")).unwrap();

        let files = TreeScanner::mp3().scan(tmp.path()).unwrap();
        assert_eq!(files, vec![real]);
    }

    /// Removes all permission bits from `dir`. Returns false, with the bits
    /// restored, when the current user can read it anyway (e.g. root).
    #[cfg(unix)]
    fn lock(dir: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(dir).is_ok() {
            unlock(dir);
            return false;
        }
        true
    }

    #[cfg(unix)]
    fn unlock(dir: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_root_is_an_error() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("app");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.mp3"), "a").unwrap();
        if !lock(&root) {
            return;
        }

        let strict = TreeScanner::mp3().scan(&root);
        let lenient = TreeScanner::mp3().skip_unreadable(true).scan(&root);
        unlock(&root);

        assert!(matches!(strict, Err(Error::Walk(_))));
        assert!(matches!(lenient, Err(Error::Walk(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdir_fails_unless_skipped() {
        let tmp = tempdir().unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.mp3"), "h").unwrap();
        fs::write(tmp.path().join("open.mp3"), "o").unwrap();
        if !lock(&locked) {
            return;
        }

        let strict = TreeScanner::mp3().scan(tmp.path());
        let lenient = TreeScanner::mp3().skip_unreadable(true).scan(tmp.path());
        unlock(&locked);

        assert!(matches!(strict, Err(Error::Walk(_))));
        assert_eq!(lenient.unwrap(), vec![tmp.path().join("open.mp3")]);
    }
}
