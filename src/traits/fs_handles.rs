//! Handle-based file operations for POSIX compatibility.
//!
//! This module provides the [`FsHandles`] trait which enables file operations
//! using opaque handles instead of paths. This is essential for POSIX-compliant
//! filesystems where files can be modified after being opened.
//!
//! # Overview
//!
//! Handle-based operations are more efficient for repeated access to the same
//! file and are required for full POSIX compatibility. The workflow is:
//!
//! 1. `open()` - Open a file and get a handle
//! 2. `read_at()` / `write_at()` - Perform operations using the handle
//! 3. `close()` - Release the handle
//!
//! # Example
//!
//! ```rust
//! use fsroute::{FsHandles, OpenFlags, FsError};
//! use std::path::Path;
//!
//! // Generic function that works with any FsHandles implementation
//! fn copy_via_handles<B: FsHandles>(
//!     backend: &B,
//!     src: &Path,
//!     dst: &Path,
//! ) -> Result<(), FsError> {
//!     let src_handle = backend.open(src, OpenFlags::READ)?;
//!     let dst_handle = backend.open(dst, OpenFlags::WRITE)?;
//!
//!     let mut buf = [0u8; 4096];
//!     let mut offset = 0;
//!     loop {
//!         let n = backend.read_at(src_handle, &mut buf, offset)?;
//!         if n == 0 {
//!             break;
//!         }
//!         backend.write_at(dst_handle, &buf[..n], offset)?;
//!         offset += n as u64;
//!     }
//!
//!     backend.close(src_handle)?;
//!     backend.close(dst_handle)?;
//!     Ok(())
//! }
//! ```
//!
//! # Thread Safety
//!
//! Like all AnyFS traits, `FsHandles` requires `Send + Sync`. Implementations
//! must use interior mutability and handle concurrent access properly.

use std::path::Path;

use crate::{FsError, Handle, OpenFlags};

/// Handle-based file operations for POSIX compatibility.
///
/// This trait provides low-level file operations using opaque [`Handle`]s.
/// These operations are essential for FUSE mounts and POSIX-compliant
/// applications that need to open a file once and perform multiple
/// operations on it.
///
/// # Handle Lifecycle
///
/// 1. Obtain a handle via [`open`](FsHandles::open)
/// 2. Perform operations with [`read_at`](FsHandles::read_at) and
///    [`write_at`](FsHandles::write_at)
/// 3. Release the handle with [`close`](FsHandles::close)
///
/// # Example
///
/// ```rust
/// use fsroute::{FsHandles, OpenFlags, FsError, Handle};
/// use std::path::Path;
///
/// // Generic function that works with any FsHandles implementation
/// fn read_header<B: FsHandles>(backend: &B, path: &Path) -> Result<[u8; 16], FsError> {
///     let handle = backend.open(path, OpenFlags::READ)?;
///     let mut header = [0u8; 16];
///     backend.read_at(handle, &mut header, 0)?;
///     backend.close(handle)?;
///     Ok(header)
/// }
/// ```
pub trait FsHandles: Send + Sync {
    /// Open a file and return a handle.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path to open
    /// * `flags` - Open flags specifying read/write mode and creation behavior
    ///
    /// # Returns
    ///
    /// An opaque [`Handle`] that can be used for subsequent operations.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file doesn't exist and `create` is false
    /// - [`FsError::AlreadyExists`] if the file exists and exclusive creation is requested
    /// - [`FsError::NotAFile`] if the path is a directory
    /// - [`FsError::PermissionDenied`] if access is denied
    fn open(&self, path: &Path, flags: OpenFlags) -> Result<Handle, FsError>;

    /// Read data from a file at a specific offset.
    ///
    /// # Arguments
    ///
    /// * `handle` - Handle obtained from [`open`](FsHandles::open)
    /// * `buf` - Buffer to read data into
    /// * `offset` - Byte offset to start reading from
    ///
    /// # Returns
    ///
    /// Number of bytes read. Returns 0 at end of file.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidHandle`] if the handle is invalid or closed
    /// - [`FsError::PermissionDenied`] if the handle wasn't opened for reading
    fn read_at(&self, handle: Handle, buf: &mut [u8], offset: u64) -> Result<usize, FsError>;

    /// Write data to a file at a specific offset.
    ///
    /// # Arguments
    ///
    /// * `handle` - Handle obtained from [`open`](FsHandles::open)
    /// * `data` - Data to write
    /// * `offset` - Byte offset to start writing at
    ///
    /// # Returns
    ///
    /// Number of bytes written.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidHandle`] if the handle is invalid or closed
    /// - [`FsError::PermissionDenied`] if the handle wasn't opened for writing
    fn write_at(&self, handle: Handle, data: &[u8], offset: u64) -> Result<usize, FsError>;

    /// Close a file handle.
    ///
    /// Releases any resources associated with the handle. After closing,
    /// the handle becomes invalid and must not be used.
    ///
    /// # Arguments
    ///
    /// * `handle` - Handle to close
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidHandle`] if the handle is already closed or invalid
    fn close(&self, handle: Handle) -> Result<(), FsError>;
}
