//! Error types for request dispatch.

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed business fault raised by a handler or behavior.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Dispatch errors.
///
/// Faults raised by handler or behavior logic travel as [`DispatchError::Handler`]
/// and keep their concrete type, so callers can recover it with
/// [`DispatchError::handler_fault`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request was absent or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No handler is registered for the request type.
    #[error("Handler not found for request type {request_type}")]
    HandlerNotFound {
        /// Fully qualified name of the request type
        request_type: &'static str,
    },

    /// Fault raised inside a handler or behavior.
    #[error(transparent)]
    Handler(BoxError),

    /// Cooperative cancellation was observed.
    #[error("Operation was cancelled")]
    Cancelled,

    /// The resolver could not supply a dependency.
    #[error("Failed to resolve {type_name}: {reason}")]
    Resolution {
        /// Name of the type being resolved
        type_name: &'static str,
        /// Why resolution failed
        reason: String,
    },

    /// A type-erased registry entry did not match the requested type.
    #[error("Type mismatch: expected {expected}")]
    TypeMismatch {
        /// Name of the expected type
        expected: &'static str,
    },
}

impl DispatchError {
    /// Wrap a business fault.
    pub fn handler<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Handler(Box::new(error))
    }

    /// Create an invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a resolution error.
    pub fn resolution<S: Into<String>>(type_name: &'static str, reason: S) -> Self {
        Self::Resolution {
            type_name,
            reason: reason.into(),
        }
    }

    /// Borrow the original handler fault if it has type `E`.
    pub fn handler_fault<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Handler(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Take ownership of the original handler fault if it has type `E`.
    pub fn into_handler_fault<E>(self) -> Result<E, Self>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Handler(inner) => match inner.downcast::<E>() {
                Ok(fault) => Ok(*fault),
                Err(inner) => Err(Self::Handler(inner)),
            },
            other => Err(other),
        }
    }

    /// Check if this error is a missing handler.
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }

    /// Check if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error came from handler or behavior logic.
    pub fn is_handler_fault(&self) -> bool {
        matches!(self, Self::Handler(_))
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::HandlerNotFound { .. } => "handler_not_found",
            Self::Handler(_) => "handler_fault",
            Self::Cancelled => "cancelled",
            Self::Resolution { .. } => "resolution",
            Self::TypeMismatch { .. } => "type_mismatch",
        }
    }
}
