//! Error classification shared across the Calarm crates.
//!
//! Transport-facing error types implement [`ErrorClassification`] so the
//! message consumer can decide on acknowledgement, retry and alerting
//! without matching on concrete variants.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use calarm_common::error::{ErrorClassification, ErrorSeverity};
//!
//! enum HandlerError {
//!     Unavailable,
//!     Rejected,
//! }
//!
//! impl ErrorClassification for HandlerError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Unavailable)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Unavailable => ErrorSeverity::Warning,
//!             Self::Rejected => ErrorSeverity::Error,
//!         }
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         None
//!     }
//! }
//!
//! assert!(HandlerError::Unavailable.is_retryable());
//! assert!(!HandlerError::Rejected.is_critical());
//! ```

use std::fmt;
use std::time::Duration;

/// Classification contract for errors that cross a transport boundary.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if the same
    /// notification is delivered again, such as store lock contention or a
    /// temporarily unavailable database.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for monitoring, alerting, and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `None` when no specific delay is suggested and the caller's
    /// own backoff policy applies.
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
