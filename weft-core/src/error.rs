//! Error types for weft operations
//!
//! "Could not ask" failures are `Err` values. "Asked, and the answer was no"
//! is a [`crate::MutationResponse`] with `success: false`, never an error.

use thiserror::Error;

use crate::operation::{Operation, OperationKind};

/// Failures crossing the renderer-to-host boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The name is not in the allow-list. A programming error in the UI.
    #[error("Unauthorized operation: '{operation}' is not allowed")]
    Unauthorized { operation: String },

    /// The privileged process could not be reached.
    #[error("Transport failure calling '{operation}': {reason}")]
    Transport { operation: String, reason: String },

    /// The privileged handler ran and raised. `code` is the handler's
    /// machine-readable identifier, carried unchanged.
    #[error("Remote failure in '{operation}' ({code}): {message}")]
    Remote {
        operation: String,
        code: String,
        message: String,
    },

    /// The host answered with a payload that does not fit the contract.
    #[error("Malformed response from '{operation}': {reason}")]
    MalformedResponse { operation: String, reason: String },
}

impl BridgeError {
    pub fn transport(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn remote(
        operation: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Remote {
            operation: operation.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Handler code of a remote failure.
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::Remote { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn malformed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Name of the operation the failure concerns.
    pub fn operation(&self) -> &str {
        match self {
            Self::Unauthorized { operation }
            | Self::Transport { operation, .. }
            | Self::Remote { operation, .. }
            | Self::MalformedResponse { operation, .. } => operation,
        }
    }
}

/// Input validation errors, raised before a call crosses the boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid amount for {field}: '{value}' - {reason}")]
    InvalidAmount {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Operation '{operation}' is not a {expected} operation")]
    WrongOperationKind {
        operation: Operation,
        expected: OperationKind,
    },
}

/// Cache store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Master error type for all weft errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeftError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl WeftError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Bridge(err) if err.is_unauthorized())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Bridge(err) if err.is_transport())
    }
}

/// Result type alias for weft operations.
pub type WeftResult<T> = Result<T, WeftError>;

// =============================================================================
// TESTS
// =============================================================================
