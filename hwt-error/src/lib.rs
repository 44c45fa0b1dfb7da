//! Unified error handling for hwtree
//!
//! This crate provides the single error type shared by the engine and the shell.
//! Persisted-state parse problems never surface here: they are recovered locally
//! with documented defaults. What does surface are I/O failures of the settings
//! file and user actions that cannot be carried out.

use std::io;
use std::path::PathBuf;

/// Result type alias using HwTreeError
pub type Result<T> = std::result::Result<T, HwTreeError>;

/// Unified error type for all hwtree operations
#[derive(thiserror::Error, Debug)]
pub enum HwTreeError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Configuration and Settings Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Tree Errors
    // ============================================================================
    #[error("Invalid identifier segment {segment:?}: {reason}")]
    InvalidIdentifier {
        segment: String,
        reason: &'static str,
    },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Hardware not found: {0}")]
    HardwareNotFound(String),

    #[error("Not a sensor node: {0}")]
    NotSensor(String),

    // ============================================================================
    // Virtual Sensor Errors
    // ============================================================================
    #[error("Capacity exceeded: at most {max} virtual sensor containers are supported")]
    CapacityExceeded {
        max: usize,
    },

    #[error("Not a virtual sensor node: {0}")]
    NotVirtual(String),
}

impl HwTreeError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a node-not-found error from anything displayable
    pub fn node_not_found(what: impl std::fmt::Display) -> Self {
        Self::NodeNotFound(what.to_string())
    }

    /// True for failures caused by a rejected user action rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. }
                | Self::NotVirtual(_)
                | Self::NotSensor(_)
                | Self::NodeNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_display() {
        let err = HwTreeError::CapacityExceeded { max: 32 };
        assert_eq!(
            err.to_string(),
            "Capacity exceeded: at most 32 virtual sensor containers are supported"
        );
        assert!(err.is_user_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: HwTreeError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_invalid_identifier_display() {
        let err = HwTreeError::InvalidIdentifier {
            segment: "a/b".to_string(),
            reason: "contains '/'",
        };
        assert_eq!(err.to_string(), "Invalid identifier segment \"a/b\": contains '/'");
    }
}
