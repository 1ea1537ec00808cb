/*!
 * Error Taxonomy
 * Platform-independent error categories shared by every subsystem
 *
 * Subsystems keep their own `thiserror` enums (`SignalError`, `ProcessError`); each one maps
 * onto an `ErrorCategory` so callers can branch on the category without knowing which
 * native code produced the failure.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Category of a failure, independent of the native error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing executable, missing process, missing kernel object
    NotFound,
    /// The OS refused the operation
    PermissionDenied,
    /// Allocation or handle-table failure
    ResourceExhausted,
    /// POSIX semantic with no native equivalent
    NotSupported,
    /// A bound elapsed; surfaced only where a timeout is not already a valid outcome
    Timeout,
    /// Uncategorized native failure, kept for diagnostics only
    Generic,
}

impl ErrorCategory {
    /// Categorize a native I/O error
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ErrorCategory::NotFound,
            io::ErrorKind::PermissionDenied => ErrorCategory::PermissionDenied,
            io::ErrorKind::OutOfMemory => ErrorCategory::ResourceExhausted,
            io::ErrorKind::Unsupported => ErrorCategory::NotSupported,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorCategory::Timeout,
            _ => ErrorCategory::Generic,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::NotFound => "not found",
            ErrorCategory::PermissionDenied => "permission denied",
            ErrorCategory::ResourceExhausted => "resource exhausted",
            ErrorCategory::NotSupported => "not supported",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Generic => "generic failure",
        };
        f.write_str(name)
    }
}

/// Errors that can report their platform-independent category
pub trait Categorized {
    fn category(&self) -> ErrorCategory;
}

impl Categorized for io::Error {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::from_io(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_categories() {
        let not_found = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(not_found.category(), ErrorCategory::NotFound);

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(denied.category(), ErrorCategory::PermissionDenied);

        let other = io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(other.category(), ErrorCategory::Generic);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::NotSupported.to_string(), "not supported");
        assert_eq!(ErrorCategory::NotFound.to_string(), "not found");
    }
}
