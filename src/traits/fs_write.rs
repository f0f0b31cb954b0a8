//! Write operations for virtual filesystems.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::FsError;

/// Write operations for a virtual filesystem.
///
/// All methods use `&self` (interior mutability). Backends manage their own synchronization.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access. Backends should use interior mutability (`RwLock`, `Mutex`)
/// for thread-safe state management.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: Send + Sync {
    /// Write data to a file (creates if not exists, truncates if exists).
    ///
    /// Parent directories must exist. Use [`FsDir::create_dir_all`](super::FsDir::create_dir_all)
    /// to ensure parent directories exist.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if parent directory does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    /// - [`FsError::PermissionDenied`] if write access is denied
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;

    /// Write several files in one call.
    ///
    /// The default implementation writes each file in turn via
    /// [`write`](Self::write), so a failure partway through leaves earlier
    /// files in the batch written. Backends that can validate the whole
    /// batch up front (e.g. against a combined size cap) should override
    /// this to make the batch all-or-nothing.
    ///
    /// # Errors
    ///
    /// Same as [`write`](Self::write).
    fn write_many(&self, files: &[(PathBuf, Vec<u8>)]) -> Result<(), FsError> {
        for (path, data) in files {
            self.write(path, data)?;
        }
        Ok(())
    }

    /// Append data to a file (creates if not exists).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if parent directory does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    fn append(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;

    /// Remove a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::NotAFile`] if the path is a directory (use [`FsDir::remove_dir`](super::FsDir::remove_dir))
    fn remove_file(&self, path: &Path) -> Result<(), FsError>;

    /// Remove several files in one call, symmetric with
    /// [`write_many`](Self::write_many).
    ///
    /// The default implementation removes each file in turn via
    /// [`remove_file`](Self::remove_file), so a failure partway through
    /// leaves the rest of the batch removed.
    ///
    /// # Errors
    ///
    /// Same as [`remove_file`](Self::remove_file).
    fn remove_many(&self, paths: &[PathBuf]) -> Result<(), FsError> {
        for path in paths {
            self.remove_file(path)?;
        }
        Ok(())
    }

    /// Rename/move a file or directory.
    ///
    /// This operation should be atomic where possible.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source path does not exist
    /// - [`FsError::AlreadyExists`] if the destination already exists (backend-specific)
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Copy a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source file does not exist
    /// - [`FsError::NotAFile`] if the source is a directory
    fn copy(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Truncate a file to the specified size.
    ///
    /// If the file is larger than `size`, the extra data is discarded.
    /// If the file is smaller, it is extended with zero bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError>;

    /// Open a file for writing, returning a boxed writer.
    ///
    /// This is a "cold path" operation that returns a trait object for flexibility.
    /// For hot path writes, prefer [`write`](Self::write).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if parent directory does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>, FsError>;

    /// Set a path's access/modification times, `utime`-style.
    ///
    /// `times = None` sets both `accessed` and `modified` to now; `Some((accessed,
    /// modified))` sets them to the given values.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn set_times(&self, path: &Path, times: Option<(SystemTime, SystemTime)>) -> Result<(), FsError>;
}
