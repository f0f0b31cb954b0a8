//! Directory operations for virtual filesystems.

use std::path::Path;

use crate::{DirEntry, FileType, FsError};

/// Directory operations for a virtual filesystem.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
pub trait FsDir: Send + Sync {
    /// List directory contents.
    ///
    /// Returns an iterator over directory entries. The outer `Result` indicates
    /// whether the directory could be opened; each item's `Result` indicates
    /// whether that specific entry could be read.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotADirectory`] if the path is not a directory
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError>;

    /// List every descendant of a directory, recursing into subdirectories.
    ///
    /// Unlike [`read_dir`](Self::read_dir), which returns only the
    /// directory's immediate children, this expands into all descendants —
    /// both files and the intermediate directories above them — mirroring
    /// `list`/`list_detailed`'s `recursive=True` mode. The default
    /// implementation walks [`read_dir`](Self::read_dir) depth-first;
    /// backends that can answer more directly (e.g. by scanning a flat
    /// key space) may override it.
    ///
    /// # Errors
    ///
    /// Same as [`read_dir`](Self::read_dir).
    fn read_dir_recursive(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        let mut out = Vec::new();
        let mut stack = vec![path.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in self.read_dir(&dir)? {
                let entry = entry?;
                if entry.file_type == FileType::Directory {
                    stack.push(entry.path.clone());
                }
                out.push(Ok(entry));
            }
        }
        Ok(ReadDirIter::from_vec(out))
    }

    /// Create a directory (parent must exist).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if parent directory does not exist
    /// - [`FsError::AlreadyExists`] if the path already exists
    fn create_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Create a directory and all parent directories.
    ///
    /// This is idempotent - succeeds if the directory already exists.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if a component of the path exists but is not a directory
    fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;

    /// Remove an empty directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotADirectory`] if the path is not a directory
    /// - [`FsError::DirectoryNotEmpty`] if the directory is not empty
    fn remove_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Remove a directory and all its contents recursively.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotADirectory`] if the path is not a directory
    fn remove_dir_all(&self, path: &Path) -> Result<(), FsError>;
}

/// Iterator over directory entries.
///
/// Wraps a boxed iterator for flexibility across different backends.
///
/// - Outer `Result` (from [`FsDir::read_dir`]) = "can I open this directory?"
/// - Inner `Result` (per item) = "can I read this entry?"
///
/// # Example
///
/// ```rust
/// use fsroute::{Fs, FsError};
/// use std::path::Path;
///
/// // Generic function that works with any Fs implementation
/// fn list_files<B: Fs>(backend: &B) -> Result<Vec<String>, FsError> {
///     let mut names = Vec::new();
///     for entry in backend.read_dir(Path::new("/"))? {
///         let entry = entry?;
///         names.push(entry.name);
///     }
///     Ok(names)
/// }
/// ```
pub struct ReadDirIter(Box<dyn Iterator<Item = Result<DirEntry, FsError>> + Send + 'static>);

impl ReadDirIter {
    /// Create from any compatible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<DirEntry, FsError>> + Send + 'static,
    {
        Self(Box::new(iter))
    }

    /// Create from a pre-collected vector.
    ///
    /// Useful for middleware like Overlay that merges multiple directory listings.
    pub fn from_vec(entries: Vec<Result<DirEntry, FsError>>) -> Self {
        Self(Box::new(entries.into_iter()))
    }

    /// Collect all entries, short-circuiting on first error.
    ///
    /// This is a convenience method equivalent to `iter.collect::<Result<Vec<_>, _>>()`.
    pub fn collect_all(self) -> Result<Vec<DirEntry>, FsError> {
        self.collect()
    }
}

impl Iterator for ReadDirIter {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}


