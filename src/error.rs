use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Source directory not found: {0}")]
    SourceNotFound(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("Error walking directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Error encoding run state: {0}")]
    StateEncode(#[from] serde_json::Error),

    #[error("Error persisting run state to {}: {}", .path.display(), .source)]
    StatePersist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The operation that failed for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Hash,
    Copy,
    Delete,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileOp::Hash => "hash",
            FileOp::Copy => "copy",
            FileOp::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// A per-file error that was logged and recovered from.
///
/// These never abort a run; they are collected into the run report so the
/// caller can decide whether the outcome is acceptable.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub op: FileOp,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, op: FileOp, err: &io::Error) -> Self {
        Self {
            path: path.into(),
            op,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for {}: {}", self.op, self.path.display(), self.message)
    }
}
