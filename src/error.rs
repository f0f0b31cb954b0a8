//! # Error Types
//!
//! Comprehensive error handling for AnyFS filesystem operations.
//!
//! ## Overview
//!
//! All AnyFS operations return `Result<T, FsError>`. The [`FsError`] enum provides
//! detailed, contextual error variants that include:
//!
//! - **Path information** — Which file/directory caused the error
//! - **Operation context** — What operation was attempted
//! - **Specific details** — Quota limits, invalid data descriptions, etc.
//!
//! ## Error Categories
//!
//! | Category | Variants | Description |
//! |----------|----------|-------------|
//! | Path/File | `NotFound`, `AlreadyExists`, `NotAFile`, `NotADirectory`, `DirectoryNotEmpty` | Path existence and type errors |
//! | Permission | `PermissionDenied` | Access control errors |
//! | Resource | `SizeLimitExceeded` | Limit violations |
//! | Data | `InvalidData`, `Serialization`, `Deserialization` | Content problems |
//! | Operation | `NotSupported`, `Conflict`, `NotImplementedByBackend` | Backend/operation failures |
//!
//! ## Quick Example
//!
//! ```rust
//! use fsroute::FsError;
//! use std::path::PathBuf;
//!
//! // Errors include the path that caused the problem
//! let err = FsError::NotFound { path: PathBuf::from("/missing.txt") };
//! assert!(err.to_string().contains("/missing.txt"));
//!
//! // Permission errors include the operation
//! let err = FsError::PermissionDenied {
//!     path: PathBuf::from("/secret"),
//!     operation: "read",
//! };
//! assert!(err.to_string().contains("read"));
//! ```
//!
//! ## Conversion from std::io::Error
//!
//! [`FsError`] implements `From<std::io::Error>` for easy interoperability:
//!
//! ```rust
//! use fsroute::FsError;
//! use std::io::{Error, ErrorKind};
//!
//! let io_err = Error::new(ErrorKind::NotFound, "file not found");
//! let fs_err: FsError = io_err.into();
//! assert!(matches!(fs_err, FsError::NotFound { .. }));
//! ```

use std::path::PathBuf;

/// Comprehensive filesystem error type.
///
/// All AnyFS operations return `Result<T, FsError>`. Each variant includes
/// relevant context (paths, operations, limits) to make debugging easier.
///
/// # Non-Exhaustive
///
/// This enum is marked `#[non_exhaustive]`, meaning new variants may be added
/// in future versions without breaking changes. Always include a wildcard arm
/// when pattern matching:
///
/// ```rust
/// use fsroute::FsError;
/// use std::path::PathBuf;
///
/// fn handle_error(err: FsError) {
///     match err {
///         FsError::NotFound { path } => println!("Not found: {}", path.display()),
///         FsError::PermissionDenied { path, operation } => {
///             println!("Permission denied for {} on {}", operation, path.display())
///         }
///         other => println!("Other error: {}", other),
///     }
/// }
/// ```
///
/// # Display Format
///
/// All variants implement `Display` with human-readable messages:
///
/// ```rust
/// use fsroute::FsError;
/// use std::path::PathBuf;
///
/// let err = FsError::SizeLimitExceeded { requested: 150, limit: 100 };
/// let msg = err.to_string();
/// assert!(msg.contains("150") && msg.contains("100"));
/// ```
///
/// # Error Source Chain
///
/// The [`Io`](FsError::Io) variant wraps `std::io::Error` with the `#[source]`
/// attribute, enabling error chain traversal via `std::error::Error::source()`.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Path/File Errors
    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Path already exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: PathBuf,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a file but found something else.
    #[error("not a file: {path}")]
    NotAFile {
        /// The path that is not a file.
        path: PathBuf,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: PathBuf,
    },

    /// Directory is not empty when it should be.
    #[error("directory not empty: {path}")]
    DirectoryNotEmpty {
        /// The path to the non-empty directory.
        path: PathBuf,
    },

    /// File handle is invalid or closed.
    #[error("invalid handle: {}", handle.0)]
    InvalidHandle {
        /// The invalid handle.
        handle: crate::Handle,
    },

    // Permission/Access Errors
    /// Permission denied for operation.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The path where permission was denied.
        path: PathBuf,
        /// The operation that was denied.
        operation: &'static str,
    },

    // Data Errors
    /// Invalid data encountered.
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The path with invalid data.
        path: PathBuf,
        /// Details about the invalid data.
        details: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    // Backend/Operation Errors
    /// Operation is not supported.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// Conflict detected (e.g., concurrent modification).
    #[error("conflict: {path}")]
    Conflict {
        /// The path with a conflict.
        path: PathBuf,
    },

    /// The active backend does not implement a capability the router needs.
    #[error("{backend} does not implement {operation}()")]
    NotImplementedByBackend {
        /// The backend's type name.
        backend: &'static str,
        /// The missing operation.
        operation: &'static str,
    },

    /// A `VirtualFs` write would exceed its configured size cap.
    #[error("size limit exceeded: requested {requested} bytes, cap is {limit} bytes")]
    SizeLimitExceeded {
        /// The total size the write would have produced.
        requested: u64,
        /// The configured cap.
        limit: u64,
    },

    /// Operation attempted on a closed or unknown virtual file descriptor.
    #[error("bad file descriptor: {}", handle.0)]
    BadFileDescriptor {
        /// The invalid handle.
        handle: crate::Handle,
    },

    /// A caller-supplied argument was malformed (bad mode string, non-UTF8
    /// content where UTF-8 was required, an unresolvable path, and so on).
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of what was wrong with the argument.
        message: String,
    },

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        // Convert common io::ErrorKind to more specific FsError variants when possible
        match error.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound {
                path: PathBuf::new(),
            },
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied {
                path: PathBuf::new(),
                operation: "io",
            },
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists {
                path: PathBuf::new(),
                operation: "io",
            },
            _ => FsError::Io {
                operation: "io",
                path: PathBuf::new(),
                source: error,
            },
        }
    }
}

impl From<FsError> for std::io::Error {
    /// Map an `FsError` back onto `std::io::Error`, preserving `ErrorKind`
    /// where the router's callers rely on `std::io::Result`-shaped code
    /// (e.g. code ported from `std::fs` call sites to `fsroute` call sites).
    fn from(error: FsError) -> Self {
        use std::io::ErrorKind;

        let kind = match &error {
            FsError::NotFound { .. } => ErrorKind::NotFound,
            FsError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            FsError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            FsError::InvalidArgument { .. } => ErrorKind::InvalidInput,
            FsError::Io { ref source, .. } => source.kind(),
            _ => ErrorKind::Other,
        };
        std::io::Error::new(kind, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_not_found_display() {
        let err = FsError::NotFound {
            path: PathBuf::from("/missing"),
        };
        assert_eq!(err.to_string(), "not found: /missing");
    }

    #[test]
    fn fs_error_already_exists_display() {
        let err = FsError::AlreadyExists {
            path: PathBuf::from("/exists"),
            operation: "create",
        };
        assert_eq!(err.to_string(), "create: already exists: /exists");
    }

    #[test]
    fn fs_error_size_limit_exceeded_display() {
        let err = FsError::SizeLimitExceeded {
            requested: 150,
            limit: 100,
        };
        assert!(err.to_string().contains("150"));
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn fs_error_from_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::NotFound { .. }));
    }

    #[test]
    fn fs_error_from_io_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::PermissionDenied { .. }));
    }

    #[test]
    fn fs_error_from_io_already_exists() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::AlreadyExists { .. }));
    }

    #[test]
    fn fs_error_from_io_other() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::Io { .. }));
    }
}
