//! # Extension Traits
//!
//! Convenience methods for filesystem backends.
//!
//! ## Overview
//!
//! [`FsExt`] provides commonly-needed utility methods that aren't part of
//! the core trait hierarchy. These are implemented as default methods with
//! blanket implementations, so any `Fs` backend gets them for free.
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`is_file`](FsExt::is_file) | Check if path is a regular file |
//! | [`is_dir`](FsExt::is_dir) | Check if path is a directory |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, additional methods are available:
//!
//! | Method | Description |
//! |--------|-------------|
//! | `read_json` | Read and deserialize JSON file |
//! | `write_json` | Serialize and write JSON file |
//!
//! Enable with:
//! ```toml
//! [dependencies]
//! anyfs-backend = { version = "0.1", features = ["serde"] }
//! ```

use crate::{Fs, FsError};
use std::path::Path;

/// Extension methods for any filesystem backend.
///
/// Provides convenience methods not in the core traits but commonly needed.
/// All methods have default implementations, so backends get them automatically.
///
/// # Example
///
/// ```rust
/// use fsroute::{Fs, FsExt, FsError};
/// use std::path::Path;
///
/// fn check_paths<B: Fs>(backend: &B) -> Result<(), FsError> {
///     // FsExt methods are available on any Fs backend
///     if backend.is_file(Path::new("/config.json"))? {
///         println!("Config exists!");
///     }
///     
///     if backend.is_dir(Path::new("/data"))? {
///         println!("Data directory exists!");
///     }
///     
///     Ok(())
/// }
/// ```
pub trait FsExt: Fs {
    /// Check if the path points to a regular file.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    /// Returns `Err` only for actual I/O errors (permission denied, etc.).
    ///
    /// # Example
    ///
    /// ```rust
    /// use fsroute::{Fs, FsExt, FsError};
    /// use std::path::Path;
    ///
    /// fn process_file<B: Fs>(backend: &B, path: &Path) -> Result<(), FsError> {
    ///     if backend.is_file(path)? {
    ///         let data = backend.read(path)?;
    ///         // Process the file...
    ///     }
    ///     Ok(())
    /// }
    /// ```
    fn is_file(&self, path: &Path) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a directory.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    /// Returns `Err` only for actual I/O errors (permission denied, etc.).
    ///
    /// # Example
    ///
    /// ```rust
    /// use fsroute::{Fs, FsExt, FsError};
    /// use std::path::Path;
    ///
    /// fn ensure_dir<B: Fs>(backend: &B, path: &Path) -> Result<(), FsError> {
    ///     if !backend.is_dir(path)? {
    ///         backend.create_dir_all(path)?;
    ///     }
    ///     Ok(())
    /// }
    /// ```
    fn is_dir(&self, path: &Path) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_dir()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a symbolic link.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    /// Returns `Err` only for actual I/O errors.
    ///
    /// # Note
    ///
    /// This method uses regular `metadata()` which follows symlinks.
    /// For backends implementing [`FsLink`](crate::FsLink), consider using
    /// `symlink_metadata()` for more accurate symlink detection.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fsroute::{Fs, FsExt, FsError};
    /// use std::path::Path;
    ///
    /// fn check_link<B: Fs>(backend: &B, path: &Path) -> Result<bool, FsError> {
    ///     backend.is_symlink(path)
    /// }
    /// ```
    fn is_symlink(&self, path: &Path) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_symlink()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get the size of a file in bytes.
    ///
    /// Convenience method that extracts just the size from metadata.
    ///
    /// # Errors
    ///
    /// Returns `FsError::NotFound` if the path doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fsroute::{Fs, FsExt, FsError};
    /// use std::path::Path;
    ///
    /// fn check_size<B: Fs>(backend: &B, path: &Path) -> Result<u64, FsError> {
    ///     backend.file_size(path)
    /// }
    /// ```
    fn file_size(&self, path: &Path) -> Result<u64, FsError> {
        Ok(self.metadata(path)?.size)
    }
}

// Blanket implementation - any Fs backend gets FsExt for free
impl<B: Fs + ?Sized> FsExt for B {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    /// JSON serialization extension methods.
    ///
    /// Available when the `serde` feature is enabled.
    pub trait FsExtJson: Fs {
        /// Read a file and deserialize it as JSON.
        ///
        /// # Type Parameters
        ///
        /// - `T`: The type to deserialize into (must implement `DeserializeOwned`)
        ///
        /// # Errors
        ///
        /// - `FsError::NotFound` — File doesn't exist
        /// - `FsError::InvalidData` — File isn't valid UTF-8
        /// - `FsError::Deserialization` — JSON parsing failed
        ///
        /// # Example
        ///
        /// ```rust
        /// use fsroute::{Fs, FsError};
        /// #[cfg(feature = "serde")]
        /// use fsroute::FsExtJson;
        /// use std::path::Path;
        ///
        /// #[cfg(feature = "serde")]
        /// fn load_config<B: Fs>(backend: &B) -> Result<serde_json::Value, FsError> {
        ///     backend.read_json(Path::new("/config.json"))
        /// }
        /// ```
        fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, FsError> {
            let data = self.read_to_string(path)?;
            serde_json::from_str(&data).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize a value and write it as JSON.
        ///
        /// Uses pretty-printing with 2-space indentation.
        ///
        /// # Type Parameters
        ///
        /// - `T`: The type to serialize (must implement `Serialize`)
        ///
        /// # Errors
        ///
        /// - `FsError::Serialization` — JSON serialization failed
        /// - Other `FsError` variants from the underlying `write()` call
        ///
        /// # Example
        ///
        /// ```rust
        /// use fsroute::{Fs, FsError};
        /// #[cfg(feature = "serde")]
        /// use fsroute::FsExtJson;
        /// use std::path::Path;
        ///
        /// #[cfg(feature = "serde")]
        /// fn save_value<B: Fs>(backend: &B, value: &serde_json::Value) -> Result<(), FsError> {
        ///     backend.write_json(Path::new("/config.json"), value)
        /// }
        /// ```
        fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), FsError> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.write(path, json.as_bytes())
        }
    }

    // Blanket implementation
    impl<B: Fs + ?Sized> FsExtJson for B {}
}

#[cfg(feature = "serde")]
pub use json::FsExtJson;
