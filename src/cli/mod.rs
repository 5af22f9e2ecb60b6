//! CLI command handlers
//!
//! This module bridges clap argument parsing with the backup cycle.

pub mod backup;

pub use backup::{handle_backup_command, run_backup, BackupArgs};
