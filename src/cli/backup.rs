//! The backup command
//!
//! Turns parsed arguments into a `RunConfig`, drops privileges, and runs one
//! backup cycle.

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use crate::backup::{BackupManager, CycleReport};
use crate::config::{BackupPaths, RunConfig, Settings};
use crate::error::KeeperResult;
use crate::identity::{drop_privileges, IdentitySwitcher, SystemIdentity};
use crate::runner::{SystemToolRunner, ToolRunner};

/// Arguments of a backup cycle
///
/// Every value can also come from a `BASEKEEPER_*` environment variable or
/// the settings file given with `--config`, in that order of precedence.
#[derive(Args, Debug, Clone, Default)]
pub struct BackupArgs {
    /// Path to the pg_archivecleanup binary (required)
    #[arg(long = "pg-archivecleanup", env = "BASEKEEPER_PG_ARCHIVECLEANUP", value_name = "PATH")]
    pub pg_archivecleanup: Option<PathBuf>,

    /// Path to the pg_basebackup binary [default: pg_basebackup]
    #[arg(long = "pg-basebackup", env = "BASEKEEPER_PG_BASEBACKUP", value_name = "PATH")]
    pub pg_basebackup: Option<PathBuf>,

    /// Target path to store the base backups [default: /var/backup/pgbase]
    #[arg(long = "pgbase-path", env = "BASEKEEPER_PGBASE_PATH", value_name = "PATH")]
    pub pgbase_path: Option<PathBuf>,

    /// Path to the WAL archive [default: /var/backup/pgarchive]
    #[arg(long = "pgarchive-path", env = "BASEKEEPER_PGARCHIVE_PATH", value_name = "PATH")]
    pub pgarchive_path: Option<PathBuf>,

    /// Number of backups to keep [default: 5]
    #[arg(long, env = "BASEKEEPER_KEEP", value_name = "COUNT")]
    pub keep: Option<usize>,

    /// Username to run backups as [default: postgres]
    #[arg(long, env = "BASEKEEPER_USER", value_name = "NAME")]
    pub user: Option<String>,

    /// Group to run backups as [default: the user's primary group from the
    /// passwd entry, not a group named after the user]
    #[arg(long, env = "BASEKEEPER_GROUP", value_name = "NAME")]
    pub group: Option<String>,

    /// Settings file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long, env = "BASEKEEPER_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl BackupArgs {
    /// Settings given directly on the command line or via the environment
    fn overrides(&self) -> Settings {
        Settings {
            pg_archivecleanup: self.pg_archivecleanup.clone(),
            pg_basebackup: self.pg_basebackup.clone(),
            pgbase_path: self.pgbase_path.clone(),
            pgarchive_path: self.pgarchive_path.clone(),
            keep: self.keep,
            user: self.user.clone(),
            group: self.group.clone(),
        }
    }

    /// Layer the arguments over the settings file, if any
    pub fn settings(&self) -> KeeperResult<Settings> {
        let base = match &self.config {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                Settings::load(path)?
            }
            None => Settings::default(),
        };

        Ok(base.merge(self.overrides()))
    }

    /// Resolve the final configuration against `paths`
    pub fn resolve(&self, paths: &BackupPaths) -> KeeperResult<RunConfig> {
        self.settings()?.resolve(paths)
    }
}

/// Drop privileges and run one backup cycle
pub fn run_backup<S, R>(config: RunConfig, switcher: &S, runner: R) -> KeeperResult<CycleReport>
where
    S: IdentitySwitcher + ?Sized,
    R: ToolRunner,
{
    drop_privileges(switcher, &config.user, config.group.as_deref())?;
    BackupManager::new(config, runner).run_cycle()
}

/// Handle the backup command against the real system
pub fn handle_backup_command(args: &BackupArgs) -> KeeperResult<CycleReport> {
    let config = args.resolve(&BackupPaths::new())?;
    debug!("Resolved configuration: {:?}", config);

    run_backup(config, &SystemIdentity, SystemToolRunner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeeperError;
    use crate::identity::Identity;
    use crate::runner::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    struct RefusingSwitcher;

    impl IdentitySwitcher for RefusingSwitcher {
        fn resolve(&self, user: &str, _group: Option<&str>) -> KeeperResult<Identity> {
            Err(KeeperError::unknown_user(user))
        }

        fn apply(&self, _identity: &Identity) -> KeeperResult<()> {
            Ok(())
        }
    }

    struct StaySwitcher;

    impl IdentitySwitcher for StaySwitcher {
        fn resolve(&self, _user: &str, _group: Option<&str>) -> KeeperResult<Identity> {
            Ok(Identity { uid: 26, gid: 26 })
        }

        fn apply(&self, _identity: &Identity) -> KeeperResult<()> {
            Ok(())
        }
    }

    fn test_config(temp: &TempDir) -> RunConfig {
        let args = BackupArgs {
            pg_archivecleanup: Some(PathBuf::from("/usr/bin/pg_archivecleanup")),
            pgbase_path: Some(temp.path().join("pgbase")),
            pgarchive_path: Some(temp.path().join("pgarchive")),
            keep: Some(2),
            ..BackupArgs::default()
        };
        args.resolve(&BackupPaths::with_backup_dir(temp.path())).unwrap()
    }

    #[test]
    fn test_unknown_user_aborts_before_backup() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().creating_backups();

        let err = run_backup(test_config(&temp), &RefusingSwitcher, &runner).unwrap_err();

        assert!(err.is_identity());
        assert!(runner.calls().is_empty());
        assert!(!temp.path().join("pgbase").exists());
    }

    #[test]
    fn test_run_backup_after_switch() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().creating_backups();

        let report = run_backup(test_config(&temp), &StaySwitcher, &runner).unwrap();

        assert!(report.backup_path.join("backup_label").exists());
        assert!(report.cleanup_boundary.is_none());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_flags_override_settings_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("basekeeper.json");
        fs::write(
            &file,
            r#"{"pg_archivecleanup": "/opt/pg/bin/pg_archivecleanup", "keep": 9, "user": "backup"}"#,
        )
        .unwrap();

        let args = BackupArgs {
            keep: Some(1),
            config: Some(file),
            ..BackupArgs::default()
        };
        let config = args
            .resolve(&BackupPaths::with_backup_dir(temp.path()))
            .unwrap();

        assert_eq!(config.keep, 1);
        assert_eq!(config.user, "backup");
        assert_eq!(
            config.pg_archivecleanup,
            PathBuf::from("/opt/pg/bin/pg_archivecleanup")
        );
        assert_eq!(config.pgbase_path, temp.path().join("pgbase"));
    }

    #[test]
    fn test_missing_settings_file() {
        let temp = TempDir::new().unwrap();
        let args = BackupArgs {
            config: Some(temp.path().join("absent.yaml")),
            ..BackupArgs::default()
        };

        assert!(matches!(args.settings(), Err(KeeperError::Io(_))));
    }
}
