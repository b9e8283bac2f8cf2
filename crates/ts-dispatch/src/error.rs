//! Error types for the ts-dispatch crate.
//!
//! This module provides a unified error type [`DispatchError`] that covers
//! resolving, constructing and invoking native automation objects.

/// The error type for dispatch operations.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The binder could not resolve or construct its native object.
    ///
    /// The reason is the failure recorded by the first (and only) bind attempt.
    #[error("native object '{class}' is not available: {reason}")]
    NotAvailable {
        /// The class identifier that was requested.
        class: String,
        /// Why the bind attempt failed.
        reason: String,
    },

    /// No class with this identifier is registered in the current environment.
    #[error("class '{class}' is not registered")]
    ClassNotRegistered {
        /// The class identifier that was requested.
        class: String,
    },

    /// The class was resolved but constructing an instance failed.
    #[error("failed to construct '{class}': {reason}")]
    Construction {
        /// The class identifier that was requested.
        class: String,
        /// Description of the construction fault.
        reason: String,
    },

    /// The native object has no member with this name.
    #[error("unknown member '{member}'")]
    UnknownMember {
        /// The member name that was requested.
        member: String,
    },

    /// The native object reported a failure while executing a member.
    #[error("invoking '{member}' failed: {reason}")]
    Invocation {
        /// The member that was invoked.
        member: String,
        /// Failure description as reported by the native side.
        reason: String,
    },

    /// An argument or return value did not have the expected shape.
    #[error("type mismatch in '{member}': expected {expected}")]
    TypeMismatch {
        /// The member that was invoked.
        member: String,
        /// Description of the expected type.
        expected: &'static str,
    },

    /// Platform-specific error on Windows.
    #[cfg(windows)]
    #[error("Windows error: {message} (hresult: {code:#010x})")]
    Windows {
        /// Description of the error.
        message: String,
        /// The failing HRESULT.
        code: i32,
    },
}

/// A specialized Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

impl DispatchError {
    /// Create a not-available error.
    pub fn not_available(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotAvailable {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// Create an invocation error.
    pub fn invocation(member: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invocation {
            member: member.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown member error.
    pub fn unknown_member(member: impl Into<String>) -> Self {
        Self::UnknownMember {
            member: member.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(member: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch {
            member: member.into(),
            expected,
        }
    }

    /// Check if this error means the native object could not be bound.
    #[must_use]
    pub const fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable { .. })
    }
}
