//! Count-based retention over base backups and archived backup history files
//!
//! Both directories are pruned the same way: list the direct entries, order
//! them newest first by name, keep only the entries that pass the category's
//! validity check, and delete everything past the first `keep`.
//!
//! Entries that fail the validity check are invisible to retention: they are
//! never counted towards `keep` and never deleted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{KeeperError, KeeperResult};

/// Marker file written by pg_basebackup into every complete base backup
pub const BACKUP_LABEL: &str = "backup_label";

/// Suffix of backup history files in the WAL archive
pub const ARCHIVE_SUFFIX: &str = ".backup";

/// The two kinds of artifact under retention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A base backup directory containing `backup_label`
    BaseBackup,
    /// A regular file in the WAL archive ending in `.backup`
    ArchiveFile,
}

impl EntryKind {
    /// Check whether `path` is an artifact of this kind
    pub fn is_valid(self, path: &Path) -> bool {
        match self {
            Self::BaseBackup => path.join(BACKUP_LABEL).is_file(),
            Self::ArchiveFile => {
                path.is_file()
                    && path
                        .file_name()
                        .is_some_and(|name| name.to_string_lossy().ends_with(ARCHIVE_SUFFIX))
            }
        }
    }

    /// Human-readable name for log messages
    pub fn label(self) -> &'static str {
        match self {
            Self::BaseBackup => "base backup",
            Self::ArchiveFile => "archive file",
        }
    }

    fn remove(self, path: &Path) -> io::Result<()> {
        // A symlinked backup directory is unlinked, not followed.
        let is_link = fs::symlink_metadata(path)?.file_type().is_symlink();
        match self {
            Self::BaseBackup if !is_link => fs::remove_dir_all(path),
            _ => fs::remove_file(path),
        }
    }
}

/// List the valid entries of `root`, newest first
///
/// A missing `root` yields no entries. Any other listing failure, including
/// `root` not being a directory, is an error.
pub fn list_entries(root: &Path, kind: EntryKind) -> KeeperResult<Vec<PathBuf>> {
    let read_dir = match fs::read_dir(root) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                "{} does not exist, no {}s to consider",
                root.display(),
                kind.label()
            );
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(KeeperError::Io(format!(
                "Failed to read {}: {}",
                root.display(),
                e
            )))
        }
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| {
            KeeperError::Io(format!(
                "Failed to read directory entry in {}: {}",
                root.display(),
                e
            ))
        })?;
        entries.push(entry.path());
    }

    // Sort by name, newest first
    entries.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    entries.retain(|path| kind.is_valid(path));

    debug!(
        "Found {} {}(s) in {}",
        entries.len(),
        kind.label(),
        root.display()
    );
    Ok(entries)
}

/// Split newest-first `entries` into the retained head and the purge tail
pub fn split_retained(mut entries: Vec<PathBuf>, keep: usize) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let purge = entries.split_off(keep.min(entries.len()));
    (entries, purge)
}

/// Delete every valid entry of `root` beyond the newest `keep`
///
/// Entries are deleted newest to oldest of the purge set. The first failed
/// deletion aborts the run: entries already deleted stay deleted and the
/// remaining ones are left in place.
///
/// Returns the deleted paths.
pub fn prune(root: &Path, kind: EntryKind, keep: usize) -> KeeperResult<Vec<PathBuf>> {
    prune_with(root, kind, keep, |path| kind.remove(path))
}

/// `prune` with a caller-supplied deletion
pub fn prune_with<F>(
    root: &Path,
    kind: EntryKind,
    keep: usize,
    mut remove: F,
) -> KeeperResult<Vec<PathBuf>>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let (kept, purge) = split_retained(list_entries(root, kind)?, keep);
    debug!(
        "Keeping {} {}(s), purging {}",
        kept.len(),
        kind.label(),
        purge.len()
    );

    let mut deleted = Vec::with_capacity(purge.len());
    for path in purge {
        info!("Cleaning up {}", path.display());
        remove(&path).map_err(|e| {
            KeeperError::Io(format!(
                "Failed to delete {} {}: {}",
                kind.label(),
                path.display(),
                e
            ))
        })?;
        deleted.push(path);
    }

    Ok(deleted)
}

/// The oldest valid entry of `root`, if any
pub fn oldest_entry(root: &Path, kind: EntryKind) -> KeeperResult<Option<PathBuf>> {
    Ok(list_entries(root, kind)?.pop())
}
