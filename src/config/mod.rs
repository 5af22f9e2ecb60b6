//! Configuration module for basekeeper
//!
//! This module provides configuration management including:
//! - Default backup root resolution
//! - Settings file loading and layering
//! - The resolved per-run configuration

pub mod paths;
pub mod settings;

pub use paths::BackupPaths;
pub use settings::{RunConfig, Settings};
