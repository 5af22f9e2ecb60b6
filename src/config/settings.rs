//! Settings for basekeeper
//!
//! A `Settings` value is a partial configuration: every field is optional so
//! that a settings file, environment variables and command-line flags can be
//! layered on top of each other. `Settings::resolve` fills the gaps with
//! defaults and produces the validated `RunConfig` every step receives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::BackupPaths;
use crate::error::{KeeperError, KeeperResult};

/// Number of base backups and archive files kept by default
pub const DEFAULT_KEEP: usize = 5;

/// Service account the cycle runs as by default
pub const DEFAULT_USER: &str = "postgres";

/// Base backup tool, looked up through `PATH`
pub const DEFAULT_PG_BASEBACKUP: &str = "pg_basebackup";

/// Layered, possibly incomplete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Path to the pg_archivecleanup binary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pg_archivecleanup: Option<PathBuf>,

    /// Path to the pg_basebackup binary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pg_basebackup: Option<PathBuf>,

    /// Directory holding one subdirectory per base backup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pgbase_path: Option<PathBuf>,

    /// Directory holding the WAL archive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pgarchive_path: Option<PathBuf>,

    /// Retention count, applied to both directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep: Option<usize>,

    /// User to run the cycle as
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Group to run the cycle as (defaults to the user's primary group)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Fully resolved configuration for one backup cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub pg_archivecleanup: PathBuf,
    pub pg_basebackup: PathBuf,
    pub pgbase_path: PathBuf,
    pub pgarchive_path: PathBuf,
    pub keep: usize,
    pub user: String,
    pub group: Option<String>,
}

impl Settings {
    /// Load settings from a JSON or YAML file
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML, everything else
    /// as JSON. Unknown keys are rejected.
    pub fn load(path: &Path) -> KeeperResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            KeeperError::Io(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml")
            });

        let settings = if is_yaml {
            serde_yaml::from_str(&contents).map_err(|e| {
                KeeperError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            serde_json::from_str(&contents).map_err(|e| {
                KeeperError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        };

        Ok(settings)
    }

    /// Layer `overrides` on top of `self`; any value set in `overrides` wins
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            pg_archivecleanup: overrides.pg_archivecleanup.or(self.pg_archivecleanup),
            pg_basebackup: overrides.pg_basebackup.or(self.pg_basebackup),
            pgbase_path: overrides.pgbase_path.or(self.pgbase_path),
            pgarchive_path: overrides.pgarchive_path.or(self.pgarchive_path),
            keep: overrides.keep.or(self.keep),
            user: overrides.user.or(self.user),
            group: overrides.group.or(self.group),
        }
    }

    /// Fill in defaults and validate
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::Config` when no archive cleanup tool was given or
    /// when the user name is empty.
    pub fn resolve(self, paths: &BackupPaths) -> KeeperResult<RunConfig> {
        let pg_archivecleanup = self.pg_archivecleanup.ok_or_else(|| {
            KeeperError::Config("--pg-archivecleanup is required".into())
        })?;

        let user = self.user.unwrap_or_else(|| DEFAULT_USER.to_string());
        if user.trim().is_empty() {
            return Err(KeeperError::Config("user name must not be empty".into()));
        }

        let group = self.group.filter(|group| !group.trim().is_empty());

        Ok(RunConfig {
            pg_archivecleanup,
            pg_basebackup: self
                .pg_basebackup
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PG_BASEBACKUP)),
            pgbase_path: self.pgbase_path.unwrap_or_else(|| paths.pgbase_dir()),
            pgarchive_path: self.pgarchive_path.unwrap_or_else(|| paths.pgarchive_dir()),
            keep: self.keep.unwrap_or(DEFAULT_KEEP),
            user,
            group,
        })
    }
}
