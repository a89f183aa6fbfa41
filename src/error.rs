//! Error handling module for batchchain
//!
//! Provides the chain subsystem's error taxonomy using thiserror.
//! Every fallible store, editor and runner operation reports one of these.
//!
//! Variants carry owned strings rather than source errors so that outcomes can
//! be cloned into run reports and compared in tests.

use std::path::Path;
use thiserror::Error;

/// Main error type for chain storage, editing and execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// No chain with this name exists in the store
    #[error("Chain not found: {name}")]
    NotFound { name: String },

    /// Attempted mutation of a built-in chain
    #[error("Chain '{name}' is built in and cannot be modified")]
    Immutable { name: String },

    /// Name is empty or contains a path separator
    #[error("Invalid chain name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Target name is already used by another chain
    #[error("A chain named '{name}' already exists")]
    AlreadyExists { name: String },

    /// Restore requested for a chain that has no built-in definition
    #[error("Chain '{name}' has no built-in default")]
    NoDefault { name: String },

    /// Durable storage could not be updated
    #[error("Failed to write chain '{name}': {reason}")]
    Write { name: String, reason: String },

    /// A stored chain could not be read or parsed
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    /// Step index does not refer to a real step
    #[error("Step index {index} out of range (chain has {len} steps)")]
    OutOfRange { index: usize, len: usize },

    /// An editing operation was requested with no chain open
    #[error("No chain is loaded")]
    NoChainLoaded,

    /// A batch run needs an empty workspace to start from
    #[error("Please save and close the current project first")]
    WorkspaceNotEmpty,

    /// A batch file could not be imported
    #[error("Failed to import {path}: {reason}")]
    Import { path: String, reason: String },

    /// A step failed while the chain was applied
    #[error("Applying chain '{chain}' failed: {reason}")]
    ApplyFailed { chain: String, reason: String },

    /// The user cancelled the run or dismissed the progress window
    #[error("Run aborted by user")]
    Aborted,
}

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;

// Convenient error constructors
impl ChainError {
    /// Create a not-found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an immutability error
    pub fn immutable(name: impl Into<String>) -> Self {
        Self::Immutable { name: name.into() }
    }

    /// Create an invalid-name error
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage write error
    pub fn write(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a storage read error
    pub fn read(path: &Path, reason: impl ToString) -> Self {
        Self::Read {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an import error for one batch file
    pub fn import(path: &Path, reason: impl ToString) -> Self {
        Self::Import {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an apply failure
    pub fn apply_failed(chain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ApplyFailed {
            chain: chain.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for conditions the user should be told about.
    ///
    /// Failed and aborted runs stop silently; lookup and name problems are
    /// reported.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidName { .. }
                | Self::AlreadyExists { .. }
                | Self::NoChainLoaded
                | Self::WorkspaceNotEmpty
                | Self::Write { .. }
                | Self::Read { .. }
        )
    }
}
