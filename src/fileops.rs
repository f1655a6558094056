use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Filesystem mutations performed by the reconciler and the copier.
///
/// `LocalFs` is the real implementation; tests substitute their own to
/// exercise per-file failure handling.
pub trait FileOps {
    /// Copy bytes exactly, replacing `to` if it exists. Returns bytes copied.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Permanently remove a file.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileOps for LocalFs {
    /// The bytes land in a temporary file next to `to`, which is renamed
    /// over `to` once complete. On error `to` is exactly as it was and the
    /// temporary file is dropped.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let mut source = File::open(from)?;
        let permissions = source.metadata()?.permissions();

        let dir = match to.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        let bytes = io::copy(&mut source, tmp.as_file_mut())?;
        tmp.as_file().set_permissions(permissions)?;
        tmp.as_file().sync_all()?;
        tmp.persist(to).map_err(|err| err.error)?;

        debug!("Copied {} bytes: {} -> {}", bytes, from.display(), to.display());
        Ok(bytes)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Logs what would happen and touches nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunFs;

impl FileOps for DryRunFs {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        info!("[dry run] would copy {} -> {}", from.display(), to.display());
        Ok(0)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        info!("[dry run] would delete {}", path.display());
        Ok(())
    }
}
