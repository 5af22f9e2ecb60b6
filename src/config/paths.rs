//! Default storage locations for basekeeper
//!
//! Base backups and the WAL archive live side by side under one backup root.
//!
//! ## Path Resolution Order
//!
//! 1. `BASEKEEPER_BACKUP_DIR` environment variable (if set)
//! 2. `/var/backup`
//!
//! Explicit `--pgbase-path` / `--pgarchive-path` values always win over both.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Backup root used when nothing else is configured
pub const DEFAULT_BACKUP_DIR: &str = "/var/backup";

/// Environment variable that relocates the backup root
pub const BACKUP_DIR_ENV: &str = "BASEKEEPER_BACKUP_DIR";

/// Manages the default directories used by basekeeper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPaths {
    /// Root directory holding `pgbase/` and `pgarchive/`
    backup_dir: PathBuf,
}

impl BackupPaths {
    /// Create a new BackupPaths instance
    ///
    /// Path resolution:
    /// 1. `BASEKEEPER_BACKUP_DIR` env var (explicit override)
    /// 2. `/var/backup`
    pub fn new() -> Self {
        Self::from_env_value(std::env::var_os(BACKUP_DIR_ENV))
    }

    /// Resolve from the value of `BASEKEEPER_BACKUP_DIR`; unset or empty
    /// falls back to `/var/backup`
    pub fn from_env_value(value: Option<OsString>) -> Self {
        let backup_dir = value
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR));

        Self { backup_dir }
    }

    /// Create BackupPaths with a custom root directory (useful for testing)
    pub fn with_backup_dir(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    /// Get the backup root (/var/backup/ or equivalent)
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Get the base backup directory (/var/backup/pgbase/)
    pub fn pgbase_dir(&self) -> PathBuf {
        self.backup_dir.join("pgbase")
    }

    /// Get the WAL archive directory (/var/backup/pgarchive/)
    pub fn pgarchive_dir(&self) -> PathBuf {
        self.backup_dir.join("pgarchive")
    }
}

impl Default for BackupPaths {
    fn default() -> Self {
        Self::new()
    }
}
