//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the engine reports to its callers. Division by a zero
//! working-day count is deliberately absent: the calculator returns zero and
//! logs instead of failing.

use thiserror::Error;

use crate::store::StoreError;

/// The main error type for the payroll engine.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::Conflict {
///     message: "already timed out today".to_string(),
/// };
/// assert_eq!(error.to_string(), "Conflict: already timed out today");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or holds out-of-range values.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Required attendance settings are missing or unusable.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is missing, phrased for an administrator.
        message: String,
    },

    /// An attendance settings update was rejected.
    #[error("Invalid settings field '{field}': {message}")]
    InvalidSettings {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The operation conflicts with existing state and was not applied.
    #[error("Conflict: {message}")]
    Conflict {
        /// An actionable description of the conflict.
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity.
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The persistent store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A background task could not complete.
    #[error("Internal error: {message}")]
    Internal {
        /// Internal detail, never shown to end users.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::Configuration`] error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::Conflict`] error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::NotFound`] error.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
