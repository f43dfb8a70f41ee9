//! Error types and fault containment for the hot-path operations.
//!
//! The public classification, obfuscation and connection-parsing entry
//! points never hand an error to the instrumented application. Malformed
//! input degrades to sentinel values inside each component, and anything
//! that still goes wrong is caught here by [`contain`] and replaced with the
//! operation's fallback result. `DbSightError` is reserved for the fallible
//! surfaces around the hot path: configuration, parameter substitution and
//! the CLI.

use thiserror::Error;

/// Main error type for dbsight operations.
///
/// # Security
/// Error messages never embed raw connection strings; use
/// [`crate::connection::redact_connection_string`] before adding one to a
/// context string.
#[derive(Debug, Error)]
pub enum DbSightError {
    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A command parameter could not be rendered back into SQL text
    #[error("Unsupported parameter type: {name} has type {db_type}")]
    UnsupportedParameter { name: String, db_type: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with DbSightError
pub type Result<T> = std::result::Result<T, DbSightError>;

impl DbSightError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unsupported parameter error
    pub fn unsupported_parameter(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self::UnsupportedParameter {
            name: name.into(),
            db_type: db_type.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }
}

/// Runs `op`, converting a panic into `fallback()`.
///
/// Every public hot-path operation is wrapped in this so that an internal
/// fault can never unwind into the host application's request handling.
/// The fault is logged at `warn` with the operation name only; the input
/// text may contain customer data and is never logged.
pub(crate) fn contain<T>(
    operation: &'static str,
    op: impl FnOnce() -> T,
    fallback: impl FnOnce() -> T,
) -> T {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(op)) {
        Ok(value) => value,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::warn!(operation, %reason, "Internal fault contained");
            fallback()
        }
    }
}
