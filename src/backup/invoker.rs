//! Base backup creation
//!
//! Each backup lands in its own directory under the base backup root, named
//! after the local time it was started (`YYYYMMDDHHMMSS`). With a fixed-width
//! name, lexicographic order is chronological order.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::error::KeeperResult;
use crate::runner::{ToolCommand, ToolRunner};

/// strftime format of backup directory names
pub const BACKUP_NAME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Backup name for a local timestamp
pub fn backup_name(timestamp: NaiveDateTime) -> String {
    timestamp.format(BACKUP_NAME_FORMAT).to_string()
}

/// Build the base backup command line for `target`, labelled `label`
pub fn base_backup_command(tool: &Path, target: &Path, label: &str) -> ToolCommand {
    ToolCommand::new(tool)
        .arg("-D")
        .arg(target)
        .arg("-l")
        .arg(label)
}

/// Run the base backup tool into a new timestamped directory
///
/// Returns the path of the directory the tool was asked to create.
pub fn run_base_backup<R: ToolRunner>(
    runner: &R,
    tool: &Path,
    base_root: &Path,
    timestamp: NaiveDateTime,
) -> KeeperResult<PathBuf> {
    let name = backup_name(timestamp);
    let target = base_root.join(&name);

    info!("Creating base backup {}", target.display());
    runner.run(&base_backup_command(tool, &target, &name))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;
    use chrono::NaiveDate;
    use std::ffi::OsString;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(4, 5, 9)
            .unwrap()
    }

    #[test]
    fn test_backup_name_is_fixed_width() {
        assert_eq!(backup_name(timestamp()), "20240307040509");
        assert_eq!(backup_name(timestamp()).len(), 14);
    }

    #[test]
    fn test_backup_names_sort_chronologically() {
        let earlier = backup_name(timestamp());
        let later = backup_name(timestamp() + chrono::Duration::seconds(1));
        assert!(earlier < later);
    }

    #[test]
    fn test_run_base_backup_arguments() {
        let runner = RecordingRunner::new();

        let target = run_base_backup(
            &runner,
            Path::new("pg_basebackup"),
            Path::new("/var/backup/pgbase"),
            timestamp(),
        )
        .unwrap();

        assert_eq!(target, PathBuf::from("/var/backup/pgbase/20240307040509"));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program(), Path::new("pg_basebackup"));
        let expected: Vec<OsString> = vec![
            "-D".into(),
            "/var/backup/pgbase/20240307040509".into(),
            "-l".into(),
            "20240307040509".into(),
        ];
        assert_eq!(calls[0].args(), expected.as_slice());
    }

    #[test]
    fn test_run_base_backup_failure() {
        let runner = RecordingRunner::failing("pg_basebackup", 1);

        let err = run_base_backup(
            &runner,
            Path::new("pg_basebackup"),
            Path::new("/var/backup/pgbase"),
            timestamp(),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "pg_basebackup returned with non-zero exit code 1"
        );
    }
}
