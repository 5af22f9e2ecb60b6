//! basekeeper - scheduled PostgreSQL base backups with retention
//!
//! This library drives one backup cycle: drop privileges to the database
//! service account, take a base backup with pg_basebackup, prune old base
//! backups and backup history files, and let pg_archivecleanup remove WAL
//! segments no surviving backup needs.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Default paths, settings files and the resolved run configuration
//! - `error`: Custom error types
//! - `identity`: Privilege dropping
//! - `runner`: External tool invocation
//! - `backup`: Backup creation, retention and archive cleanup
//! - `cli`: Command-line arguments and the backup command
//! - `logging`: Log output setup
//!
//! # Example
//!
//! ```rust,ignore
//! use basekeeper::config::{BackupPaths, Settings};
//!
//! let config = Settings::load(path)?.resolve(&BackupPaths::new())?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod runner;

pub use error::{KeeperError, KeeperResult};
