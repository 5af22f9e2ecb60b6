//! Base backup creation and retention
//!
//! One backup cycle consists of four steps, run strictly in order:
//!
//! 1. `invoker`: run pg_basebackup into `<pgbase>/<YYYYMMDDHHMMSS>`
//! 2. `retention`: keep the newest `keep` base backups (directories with a
//!    `backup_label`)
//! 3. `retention`: keep the newest `keep` backup history files (`*.backup`)
//!    in the WAL archive
//! 4. `cleanup`: run pg_archivecleanup against the oldest surviving history
//!    file
//!
//! `BackupManager` ties the steps together.
//!
//! # Example
//!
//! ```rust,ignore
//! use basekeeper::backup::BackupManager;
//! use basekeeper::runner::SystemToolRunner;
//!
//! let manager = BackupManager::new(config, SystemToolRunner);
//! let report = manager.run_cycle()?;
//! println!("{}", report.summary());
//! ```

pub mod cleanup;
pub mod invoker;
pub mod retention;
mod manager;

pub use manager::{BackupManager, CycleReport};
pub use retention::EntryKind;
