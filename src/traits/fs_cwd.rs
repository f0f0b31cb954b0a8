//! Current-working-directory component trait.
//!
//! Path resolution against a relative path needs a notion of "where am I"
//! that belongs to the backend, not to the caller: [`crate::backends::memory::VirtualFs`]
//! persists its cwd through its backing store, while
//! [`crate::backends::isolated::IsolatedFs`] keeps it in process memory next to its
//! root. Splitting it into its own trait keeps `FsRead`/`FsWrite`/`FsDir` free of a
//! concept neither of them needs.

use std::path::{Path, PathBuf};

use crate::FsError;

/// Current-working-directory tracking for a backend.
pub trait FsCwd: Send + Sync {
    /// The backend's current working directory, always an absolute virtual path.
    fn getcwd(&self) -> Result<PathBuf, FsError>;

    /// Change the current working directory to `path`.
    ///
    /// `path` may be relative (resolved against the existing cwd) or absolute.
    /// Fails with [`FsError::NotFound`] if the target does not exist, or
    /// [`FsError::NotADirectory`] if it exists but isn't a directory.
    fn chdir(&self, path: &Path) -> Result<(), FsError>;
}
