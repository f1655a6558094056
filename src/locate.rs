use crate::error::Error;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Finds the source directories when none is given on the command line.
pub trait SourceLocator {
    fn locate(&self) -> Result<Vec<PathBuf>, Error>;
}

/// Looks for the Podcast Time app's package directory under `%APPDATA%`.
pub struct PodcastTimeLocator {
    app_data: Option<PathBuf>,
    marker: String,
}

impl PodcastTimeLocator {
    pub fn from_env(marker: &str) -> Self {
        Self {
            app_data: env::var_os("APPDATA").map(PathBuf::from),
            marker: marker.to_lowercase(),
        }
    }

    pub fn with_app_data(app_data: impl Into<PathBuf>, marker: &str) -> Self {
        Self {
            app_data: Some(app_data.into()),
            marker: marker.to_lowercase(),
        }
    }

    /// `%APPDATA%` normally points at `...\AppData\Roaming`. Step up to
    /// `AppData` and, where present, straight into `Local\Packages` to keep
    /// the walk short.
    fn search_root(app_data: &Path) -> PathBuf {
        let leaf = app_data
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !matches!(leaf.as_str(), "roaming" | "local" | "locallow") {
            return app_data.to_path_buf();
        }

        let mut root = app_data
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| app_data.to_path_buf());
        let local = root.join("Local");
        if local.is_dir() {
            root = local;
            let packages = root.join("Packages");
            if packages.is_dir() {
                root = packages;
            }
        }
        root
    }
}

impl SourceLocator for PodcastTimeLocator {
    fn locate(&self) -> Result<Vec<PathBuf>, Error> {
        let app_data = self.app_data.as_ref().ok_or(Error::MissingEnv("APPDATA"))?;
        let root = Self::search_root(app_data);
        info!("Searching {} for the app's directory...", root.display());

        let mut found = Vec::new();
        let mut walker = WalkDir::new(&root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.contains(&self.marker) {
                info!("Found app directory {}", entry.path().display());
                found.push(entry.into_path());
                walker.skip_current_dir();
            }
        }

        if found.is_empty() {
            return Err(Error::SourceNotFound(format!(
                "no directory matching '{}' under {}",
                self.marker,
                root.display()
            )));
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MARKER: &str = "marekchlebik.podcasttime";

    #[test]
    fn test_finds_package_dir_from_roaming() {
        let tmp = tempdir().unwrap();
        let app_data = tmp.path().join("AppData");
        let roaming = app_data.join("Roaming");
        let package = app_data
            .join("Local")
            .join("Packages")
            .join("4924MarekChlebik.PodcastTime_hy1rn8tk6kd4y");
        fs::create_dir_all(&roaming).unwrap();
        fs::create_dir_all(package.join("LocalState").join("MarekChlebik.PodcastTime.inner")).unwrap();
        fs::create_dir_all(app_data.join("Local").join("Packages").join("Other.App")).unwrap();

        let found = PodcastTimeLocator::with_app_data(&roaming, MARKER)
            .locate()
            .unwrap();
        assert_eq!(found, vec![package]);
    }

    #[test]
    fn test_search_root_without_known_leaf_is_unchanged() {
        let tmp = tempdir().unwrap();
        assert_eq!(PodcastTimeLocator::search_root(tmp.path()), tmp.path());
    }

    #[test]
    fn test_nothing_found_is_source_not_found() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Roaming")).unwrap();
        let result = PodcastTimeLocator::with_app_data(tmp.path().join("Roaming"), MARKER).locate();
        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }

    #[test]
    fn test_missing_app_data_is_reported() {
        let locator = PodcastTimeLocator {
            app_data: None,
            marker: MARKER.to_string(),
        };
        assert!(matches!(locator.locate(), Err(Error::MissingEnv("APPDATA"))));
    }
}
