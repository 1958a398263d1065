//! Unified error handling for rustpio
//!
//! This crate provides the single error type used across all rustpio
//! components. It uses thiserror for ergonomic error definitions with proper
//! Display and Error trait impls.

use std::io;

/// Result type alias using RustpioError
pub type Result<T> = std::result::Result<T, RustpioError>;

/// Unified error type for all rustpio operations
#[derive(thiserror::Error, Debug)]
pub enum RustpioError {
    // ============================================================================
    // Argument Validation Errors
    // ============================================================================
    #[error("Invalid {what}: {value}")]
    InvalidArgument {
        what: &'static str,
        value: i64,
    },

    // ============================================================================
    // Driver Errors
    // ============================================================================
    /// The native driver reported a failure for a forwarded operation.
    #[error("Driver error {code} ({name})")]
    Driver {
        code: i32,
        name: &'static str,
    },

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    // ============================================================================
    // Driver Lifecycle Errors
    // ============================================================================
    #[error("Driver not initialized")]
    NotInitialized,

    #[error("Driver already initialized")]
    AlreadyInitialized,

    // ============================================================================
    // Daemon Transport Errors
    // ============================================================================
    #[error("Daemon connection failed: {0}")]
    DaemonConnection(String),

    #[error("Daemon protocol error: {0}")]
    Protocol(String),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RustpioError {
    /// Create an invalid-argument error for a named parameter
    pub fn invalid_argument(what: &'static str, value: impl Into<i64>) -> Self {
        Self::InvalidArgument {
            what,
            value: value.into(),
        }
    }

    /// Create a resource-exhausted error from a string
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Create a daemon connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::DaemonConnection(msg.into())
    }

    /// Create a protocol error from a string
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}
