use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Basenames seen on each side at the end of the last successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub source: BTreeSet<String>,
    pub dest: BTreeSet<String>,
}

impl RunState {
    pub fn new<S, D>(source: S, dest: D) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            source: source.into_iter().map(Into::into).collect(),
            dest: dest.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.dest.is_empty()
    }
}

/// On-disk layout. Field names are shared with state files written by
/// earlier versions of the tool and must not change.
#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    app_mp3_list: Vec<String>,
    mp3_player_mp3_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous run's state. Absent, unreadable or malformed
    /// records all yield an empty state, as on a first run.
    pub fn load(&self) -> RunState {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No previous run state at {}", self.path.display());
                return RunState::default();
            }
            Err(err) => {
                warn!(
                    "Could not read run state {}: {}; treating as first run",
                    self.path.display(),
                    err
                );
                return RunState::default();
            }
        };

        match serde_json::from_slice::<StateRecord>(&data) {
            Ok(record) => {
                debug!(
                    "Loaded run state from {} (saved {})",
                    self.path.display(),
                    record.saved_at.as_deref().unwrap_or("unknown")
                );
                RunState::new(record.app_mp3_list, record.mp3_player_mp3_list)
            }
            Err(err) => {
                warn!(
                    "Malformed run state {}: {}; treating as first run",
                    self.path.display(),
                    err
                );
                RunState::default()
            }
        }
    }

    /// Replace the stored state. The record is written to a temporary file
    /// in the same directory and renamed over the old one.
    pub fn save(&self, state: &RunState) -> Result<(), Error> {
        let record = StateRecord {
            app_mp3_list: state.source.iter().cloned().collect(),
            mp3_player_mp3_list: state.dest.iter().cloned().collect(),
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        let data = serde_json::to_vec_pretty(&record)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| Error::StatePersist {
            path: self.path.clone(),
            source: err.error,
        })?;

        info!(
            "Saved run state ({} source, {} destination) to {}",
            state.source.len(),
            state.dest.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_empty() {
        let tmp = tempdir().unwrap();
        let store = StateStore::new(tmp.path().join("previous_run.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_missing_field_loads_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("previous_run.json");
        fs::write(&path, r#"{"app_mp3_list": ["a.mp3"]}"#).unwrap();
        assert!(StateStore::new(&path).load().is_empty());
    }

    #[test]
    fn test_garbage_loads_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("previous_run.json");
        fs::write(&path, "not json at all").unwrap();
        assert!(StateStore::new(&path).load().is_empty());
    }

    #[test]
    fn test_reads_record_written_by_older_versions() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("previous_run.json");
        fs::write(
            &path,
            r#"{"app_mp3_list": ["b.mp3", "a.mp3", "a.mp3"], "mp3_player_mp3_list": ["a.mp3"]}"#,
        )
        .unwrap();

        let state = StateStore::new(&path).load();
        assert_eq!(state, RunState::new(["a.mp3", "b.mp3"], ["a.mp3"]));
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempdir().unwrap();
        let store = StateStore::new(tmp.path().join("nested").join("previous_run.json"));
        let state = RunState::new(["x.mp3", "y.mp3"], ["x.mp3"]);

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_save_writes_compatible_field_names() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("previous_run.json");
        StateStore::new(&path)
            .save(&RunState::new(["s.mp3"], ["d.mp3"]))
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["app_mp3_list"], serde_json::json!(["s.mp3"]));
        assert_eq!(value["mp3_player_mp3_list"], serde_json::json!(["d.mp3"]));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("previous_run.json");
        let store = StateStore::new(&path);
        store.save(&RunState::new(["a.mp3"], ["a.mp3"])).unwrap();
        store.save(&RunState::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(store.load().is_empty());
    }
}
