//! Construction configuration (CONFIG).
//!
//! The source builds a backend through a single stringly-typed
//! `connect_fs(type, **kwargs)` factory (`monkeyfs/config.py`'s
//! `VirtualFSConfig`/`IsolatedFSConfig` dataclasses feed it). Rust has no
//! keyword-args-dict idiom to mirror that with, so this module gives each
//! backend its own builder struct instead: [`VirtualFsConfig`] for
//! [`crate::backends::memory::VirtualFs`], [`IsolatedFsConfig`] for
//! [`crate::backends::isolated::IsolatedFs`].

use std::path::PathBuf;
use std::sync::Arc;

use crate::backends::isolated::IsolatedFs;
use crate::backends::memory::VirtualFs;
use crate::backing_store::BackingStore;
use crate::FsError;

/// Builds a [`VirtualFs`].
///
/// Mirrors `VirtualFSConfig`'s two knobs: an optional [`BackingStore`] (a
/// fresh in-memory `MapStore` if none is given) and an optional size cap in
/// megabytes.
#[derive(Default)]
pub struct VirtualFsConfig {
    store: Option<Arc<dyn BackingStore>>,
    max_size_mb: Option<u64>,
}

impl VirtualFsConfig {
    /// Start from defaults: a fresh in-memory store, no size cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist through `store` instead of the default in-memory map.
    pub fn with_store(mut self, store: Arc<dyn BackingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Reject writes that would grow total stored content past `max_size_mb`.
    pub fn with_size_cap(mut self, max_size_mb: u64) -> Self {
        self.max_size_mb = Some(max_size_mb);
        self
    }

    /// Build the configured [`VirtualFs`].
    pub fn build(self) -> VirtualFs {
        match (self.store, self.max_size_mb) {
            (Some(store), Some(cap)) => VirtualFs::with_store_and_cap(store, cap),
            (Some(store), None) => VirtualFs::with_store(store),
            (None, Some(cap)) => VirtualFs::with_size_cap(cap),
            (None, None) => VirtualFs::new(),
        }
    }
}

/// Builds an [`IsolatedFs`].
///
/// Mirrors `IsolatedFSConfig`'s single required knob: the real directory the
/// backend confines itself to. `root` is validated (must exist and be a
/// directory) at [`build`](Self::build) time, the same point `IsolatedFs::new`
/// itself validates it.
pub struct IsolatedFsConfig {
    root: PathBuf,
}

impl IsolatedFsConfig {
    /// Confine the built backend to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Build the configured [`IsolatedFs`], validating `root` along the way.
    pub fn build(self) -> Result<IsolatedFs, FsError> {
        IsolatedFs::new(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fs;
    use std::path::Path;

    #[test]
    fn virtual_fs_config_defaults_build_a_usable_backend() {
        let fs = VirtualFsConfig::new().build();
        fs.write(Path::new("/a.txt"), b"hi").unwrap();
        assert_eq!(fs.read(Path::new("/a.txt")).unwrap(), b"hi");
    }

    #[test]
    fn virtual_fs_config_with_size_cap_rejects_oversized_writes() {
        let fs = VirtualFsConfig::new().with_size_cap(0).build();
        let err = fs.write(Path::new("/a.txt"), b"too big").unwrap_err();
        assert!(matches!(err, FsError::SizeLimitExceeded { .. }));
    }

    #[test]
    fn isolated_fs_config_builds_against_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let fs = IsolatedFsConfig::new(dir.path()).build().unwrap();
        fs.write(Path::new("/a.txt"), b"hi").unwrap();
        assert_eq!(fs.read(Path::new("/a.txt")).unwrap(), b"hi");
    }

    #[test]
    fn isolated_fs_config_rejects_a_missing_root() {
        let err = IsolatedFsConfig::new("/definitely/not/a/real/path/anywhere")
            .build()
            .unwrap_err();
        assert!(matches!(err, FsError::Io { .. }));
    }
}
