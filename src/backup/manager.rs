//! Backup cycle orchestration
//!
//! One cycle is strictly sequential: create a base backup, prune base
//! backups, prune archived history files, then clean the WAL archive. The
//! first failure aborts the cycle; later steps never run.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use super::cleanup::clean_archive;
use super::invoker::{backup_name, run_base_backup};
use super::retention::{prune, EntryKind};
use crate::config::RunConfig;
use crate::error::KeeperResult;
use crate::runner::ToolRunner;

/// Outcome of a completed backup cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Name (and label) of the base backup created by this cycle
    pub backup_name: String,
    /// Directory the base backup was written to
    pub backup_path: PathBuf,
    /// Base backup directories removed by retention
    pub purged_base_backups: Vec<PathBuf>,
    /// Backup history files removed by retention
    pub purged_archive_files: Vec<PathBuf>,
    /// History file handed to the archive cleanup tool, if it ran
    pub cleanup_boundary: Option<String>,
}

impl CycleReport {
    /// Get a one-line summary of the cycle
    pub fn summary(&self) -> String {
        let cleanup = match &self.cleanup_boundary {
            Some(boundary) => format!("WAL archive cleaned up to {}", boundary),
            None => "WAL archive cleanup skipped".to_string(),
        };
        format!(
            "Created base backup {}; purged {} base backup(s) and {} archive file(s); {}",
            self.backup_name,
            self.purged_base_backups.len(),
            self.purged_archive_files.len(),
            cleanup
        )
    }
}

/// Runs backup cycles for one configuration
pub struct BackupManager<R: ToolRunner> {
    /// Resolved configuration
    config: RunConfig,
    /// Executes pg_basebackup and pg_archivecleanup
    runner: R,
}

impl<R: ToolRunner> BackupManager<R> {
    /// Create a new BackupManager
    pub fn new(config: RunConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Create a base backup named after `timestamp`
    pub fn create_backup(&self, timestamp: NaiveDateTime) -> KeeperResult<PathBuf> {
        run_base_backup(
            &self.runner,
            &self.config.pg_basebackup,
            &self.config.pgbase_path,
            timestamp,
        )
    }

    /// Delete base backups beyond the retention count
    pub fn prune_base_backups(&self) -> KeeperResult<Vec<PathBuf>> {
        prune(&self.config.pgbase_path, EntryKind::BaseBackup, self.config.keep)
    }

    /// Delete backup history files beyond the retention count
    pub fn prune_archive_files(&self) -> KeeperResult<Vec<PathBuf>> {
        prune(&self.config.pgarchive_path, EntryKind::ArchiveFile, self.config.keep)
    }

    /// Remove WAL segments older than the oldest surviving history file
    pub fn clean_archive(&self) -> KeeperResult<Option<String>> {
        clean_archive(
            &self.runner,
            &self.config.pg_archivecleanup,
            &self.config.pgarchive_path,
        )
    }

    /// Run a full cycle stamped with the current local time
    pub fn run_cycle(&self) -> KeeperResult<CycleReport> {
        self.run_cycle_at(Local::now().naive_local())
    }

    /// Run a full cycle stamped with `timestamp`
    pub fn run_cycle_at(&self, timestamp: NaiveDateTime) -> KeeperResult<CycleReport> {
        let backup_path = self.create_backup(timestamp)?;
        let purged_base_backups = self.prune_base_backups()?;
        let purged_archive_files = self.prune_archive_files()?;
        let cleanup_boundary = self.clean_archive()?;

        let report = CycleReport {
            backup_name: backup_name(timestamp),
            backup_path,
            purged_base_backups,
            purged_archive_files,
            cleanup_boundary,
        };
        info!("{}", report.summary());

        Ok(report)
    }
}
