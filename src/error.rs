//! Custom error types for basekeeper
//!
//! This module defines the error hierarchy for a backup cycle using thiserror
//! for ergonomic error definitions. Every variant is fatal for the run.

use thiserror::Error;

/// The main error type for basekeeper operations
#[derive(Error, Debug)]
pub enum KeeperError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown user or group
    #[error("Identity error: {0}")]
    Identity(String),

    /// The OS refused to switch the process identity
    #[error("Failed to {operation}: {reason}")]
    Privilege {
        operation: &'static str,
        reason: String,
    },

    /// External tool exited with a non-zero status
    #[error("{tool} returned with non-zero exit code {code}")]
    ToolFailed { tool: String, code: i32 },

    /// External tool was killed before it could exit
    #[error("{tool} was terminated by a signal")]
    ToolTerminated { tool: String },

    /// External tool could not be started at all
    #[error("Failed to run {tool}: {reason}")]
    ToolSpawn { tool: String, reason: String },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl KeeperError {
    /// Create an error for a user missing from the passwd database
    pub fn unknown_user(name: impl Into<String>) -> Self {
        Self::Identity(format!("unknown user '{}'", name.into()))
    }

    /// Create an error for a group missing from the group database
    pub fn unknown_group(name: impl Into<String>) -> Self {
        Self::Identity(format!("unknown group '{}'", name.into()))
    }

    /// Check if this error came from an external tool
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            Self::ToolFailed { .. } | Self::ToolTerminated { .. } | Self::ToolSpawn { .. }
        )
    }

    /// Check if this error happened before any filesystem mutation
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity(_) | Self::Privilege { .. })
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for KeeperError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for KeeperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for KeeperError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for basekeeper operations
pub type KeeperResult<T> = Result<T, KeeperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeeperError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_tool_failed_display() {
        let err = KeeperError::ToolFailed {
            tool: "pg_basebackup".into(),
            code: 1,
        };
        assert_eq!(
            err.to_string(),
            "pg_basebackup returned with non-zero exit code 1"
        );
        assert!(err.is_tool_failure());
        assert!(!err.is_identity());
    }

    #[test]
    fn test_unknown_user_error() {
        let err = KeeperError::unknown_user("nobody-here");
        assert_eq!(err.to_string(), "Identity error: unknown user 'nobody-here'");
        assert!(err.is_identity());
    }

    #[test]
    fn test_privilege_error() {
        let err = KeeperError::Privilege {
            operation: "setuid",
            reason: "EPERM: Operation not permitted".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to setuid: EPERM: Operation not permitted"
        );
        assert!(err.is_identity());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let keeper_err: KeeperError = io_err.into();
        assert!(matches!(keeper_err, KeeperError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let keeper_err: KeeperError = json_err.into();
        assert!(matches!(keeper_err, KeeperError::Config(_)));
    }
}
