//! Error types for task-sequence.
//!
//! Callers mostly care about one distinction: [`TaskSequenceError::NotAvailable`]
//! means the code is not running inside the host (or the host object could not
//! be created), while [`TaskSequenceError::NativeInvocationFailure`] carries
//! whatever the host object reported, untranslated.

use thiserror::Error;
use ts_dispatch::DispatchError;

use crate::message::MessageType;

/// The main error type for task-sequence operations.
#[derive(Debug, Error)]
pub enum TaskSequenceError {
    /// The native object could not be resolved or constructed.
    #[error("{class} is not available: {reason}")]
    NotAvailable {
        /// The class identifier that was requested.
        class: String,
        /// Why the bind attempt failed.
        reason: String,
    },

    /// The native object reported a failure.
    #[error("native invocation failed: {0}")]
    NativeInvocationFailure(#[source] DispatchError),

    /// A message box returned a code that is not a valid answer for its layout.
    #[error("message box with layout {layout:?} returned unexpected code {code}")]
    UnexpectedResult {
        /// The layout that was shown.
        layout: MessageType,
        /// The raw code returned by the dialog engine.
        code: u32,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Result type alias for task-sequence operations.
pub type Result<T> = std::result::Result<T, TaskSequenceError>;

impl TaskSequenceError {
    /// Create a not-available error.
    pub fn not_available(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotAvailable {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error means the host object is not available.
    #[must_use]
    pub const fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable { .. })
    }

    /// Check if this error was reported by the native object.
    #[must_use]
    pub const fn is_native_failure(&self) -> bool {
        matches!(self, Self::NativeInvocationFailure(_))
    }
}

impl From<DispatchError> for TaskSequenceError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotAvailable { class, reason } => Self::NotAvailable { class, reason },
            other => Self::NativeInvocationFailure(other),
        }
    }
}

impl From<toml::de::Error> for TaskSequenceError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}
