//! # Filesystem Traits
//!
//! The core trait hierarchy that defines the AnyFS interface.
//!
//! ## Trait Layers
//!
//! AnyFS uses a layered trait architecture. Each layer builds on the previous,
//! allowing backends to implement only the features they support:
//!
//! ```text
//! Layer 1 (Core):     FsRead + FsWrite + FsDir + FsCwd = Fs
//!                                               ↓
//! Layer 2 (Extended): Fs + FsLink + FsPermissions + FsSync + FsStats = FsFull
//! ```
//!
//! [`FsHandles`] and [`FsLock`] sit alongside [`FsFull`] as standalone
//! component traits — handle-based I/O and advisory locking, documented as
//! part of the external interface but not folded into a composite, since
//! neither reference backend implements them and [`fsroute`](crate::fsroute)
//! dispatches locks as liveness no-ops rather than through [`FsLock`] itself.
//!
//! ## Quick Reference
//!
//! | Layer | Composite Trait | Component Traits | Use Case |
//! |-------|-----------------|------------------|----------|
//! | 1 | [`Fs`] | [`FsRead`], [`FsWrite`], [`FsDir`] | Basic file I/O (90% of uses) |
//! | 2 | [`FsFull`] | + [`FsLink`], [`FsPermissions`], [`FsSync`], [`FsStats`] | Full `std::fs` features |
//! | — | [`FsHandles`] | handle-based `open`/`close`/`read_at`/`write_at` | Positioned I/O |
//! | — | [`FsLock`] | `lock`/`try_lock`/`unlock` | Advisory locking |
//!
//! ## Blanket Implementations
//!
//! All composite traits have blanket implementations. Implement the component
//! traits, and you get the composite trait automatically:
//!
//! ```rust
//! use fsroute::{Fs, FsRead, FsWrite, FsDir, ReadDirIter};
//!
//! // Define a backend
//! struct MyBackend;
//!
//! // Implement component traits (stubs shown)
//! # impl FsRead for MyBackend {
//! #     fn read(&self, _: &std::path::Path) -> Result<Vec<u8>, fsroute::FsError> { Ok(vec![]) }
//! #     fn read_to_string(&self, _: &std::path::Path) -> Result<String, fsroute::FsError> { Ok(String::new()) }
//! #     fn read_range(&self, _: &std::path::Path, _: u64, _: usize) -> Result<Vec<u8>, fsroute::FsError> { Ok(vec![]) }
//! #     fn exists(&self, _: &std::path::Path) -> Result<bool, fsroute::FsError> { Ok(true) }
//! #     fn metadata(&self, _: &std::path::Path) -> Result<fsroute::Metadata, fsroute::FsError> { Ok(fsroute::Metadata::default()) }
//! #     fn open_read(&self, _: &std::path::Path) -> Result<Box<dyn std::io::Read + Send>, fsroute::FsError> { unimplemented!() }
//! # }
//! # impl FsWrite for MyBackend {
//! #     fn write(&self, _: &std::path::Path, _: &[u8]) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn append(&self, _: &std::path::Path, _: &[u8]) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn truncate(&self, _: &std::path::Path, _: u64) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn remove_file(&self, _: &std::path::Path) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn rename(&self, _: &std::path::Path, _: &std::path::Path) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn copy(&self, _: &std::path::Path, _: &std::path::Path) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn open_write(&self, _: &std::path::Path) -> Result<Box<dyn std::io::Write + Send>, fsroute::FsError> { unimplemented!() }
//! # }
//! # impl FsDir for MyBackend {
//! #     fn read_dir(&self, _: &std::path::Path) -> Result<ReadDirIter, fsroute::FsError> { Ok(ReadDirIter::from_vec(vec![])) }
//! #     fn create_dir(&self, _: &std::path::Path) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn create_dir_all(&self, _: &std::path::Path) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn remove_dir(&self, _: &std::path::Path) -> Result<(), fsroute::FsError> { Ok(()) }
//! #     fn remove_dir_all(&self, _: &std::path::Path) -> Result<(), fsroute::FsError> { Ok(()) }
//! # }
//! # impl fsroute::FsCwd for MyBackend {
//! #     fn getcwd(&self) -> Result<std::path::PathBuf, fsroute::FsError> { Ok(std::path::PathBuf::from("/")) }
//! #     fn chdir(&self, _: &std::path::Path) -> Result<(), fsroute::FsError> { Ok(()) }
//! # }
//!
//! // Now MyBackend automatically implements Fs!
//! fn use_fs<B: Fs>(_backend: &B) { /* ... */ }
//! let my_backend = MyBackend;
//! use_fs(&my_backend); // ✓ Works
//! ```
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self` to enable concurrent
//! access. Backends use interior mutability for thread-safe state management.
//!
//! ## Object Safety
//!
//! All traits are object-safe and can be used as trait objects:
//!
//! ```rust
//! use fsroute::Fs;
//!
//! fn process(fs: &dyn Fs) {
//!     let _ = fs.read(std::path::Path::new("/file.txt"));
//! }
//! ```

mod fs_cwd;
mod fs_dir;
mod fs_handles;
mod fs_link;
mod fs_lock;
mod fs_path;
mod fs_permissions;
mod fs_read;
mod fs_stats;
mod fs_sync;
mod fs_write;

// Layer 1 - Core traits
pub use fs_cwd::FsCwd;
pub use fs_dir::{FsDir, ReadDirIter};
pub use fs_read::FsRead;
pub use fs_write::FsWrite;

// Layer 2 - Extended traits
pub use fs_link::FsLink;
pub use fs_path::FsPath;
pub use fs_permissions::FsPermissions;
pub use fs_stats::FsStats;
pub use fs_sync::FsSync;

// Handle-based I/O and advisory locking
pub use fs_handles::FsHandles;
pub use fs_lock::FsLock;

/// Basic filesystem — covers 90% of use cases.
///
/// The primary trait for filesystem operations. Combines reading ([`FsRead`]),
/// writing ([`FsWrite`]), and directory operations ([`FsDir`]).
///
/// # When to Use
///
/// Use `Fs` when you need:
/// - Read/write file contents
/// - Create/remove files and directories
/// - List directory contents
/// - Check if paths exist
/// - Get file metadata
///
/// # Blanket Implementation
///
/// Automatically implemented for any type that implements all three component traits.
/// You never need to implement `Fs` directly — just implement the components.
///
/// # Example
///
/// ```rust
/// use fsroute::{Fs, FsError};
/// use std::path::Path;
///
/// // Generic function that works with any Fs implementation
/// fn backup_file<B: Fs>(fs: &B, src: &Path, dst: &Path) -> Result<(), FsError> {
///     // Read source file
///     let data = fs.read(src)?;
///     
///     // Ensure destination directory exists
///     if let Some(parent) = dst.parent() {
///         fs.create_dir_all(parent)?;
///     }
///     
///     // Write to destination
///     fs.write(dst, &data)?;
///     
///     Ok(())
/// }
/// ```
///
/// # Available Methods
///
/// From [`FsRead`]:
/// - `read`, `read_to_string`, `read_range`
/// - `exists`, `metadata`, `open_read`
///
/// From [`FsWrite`]:
/// - `write`, `append`, `truncate`
/// - `remove_file`, `rename`, `copy`, `open_write`
///
/// From [`FsDir`]:
/// - `read_dir`, `create_dir`, `create_dir_all`
/// - `remove_dir`, `remove_dir_all`
///
/// From [`FsCwd`]:
/// - `getcwd`, `chdir`
pub trait Fs: FsRead + FsWrite + FsDir + FsCwd {}

// Blanket implementation - any type implementing all four gets Fs for free
impl<T: FsRead + FsWrite + FsDir + FsCwd> Fs for T {}

/// Full filesystem with all `std::fs` features.
///
/// Extends [`Fs`] with links, permissions, synchronization, and statistics.
///
/// # When to Use
///
/// Use `FsFull` when you need:
/// - Symbolic links or hard links ([`FsLink`])
/// - Permission management ([`FsPermissions`])
/// - Force writes to disk ([`FsSync`])
/// - Filesystem capacity information ([`FsStats`])
///
/// # Blanket Implementation
///
/// Automatically implemented for any type implementing `Fs + FsLink + FsPermissions + FsSync + FsStats`.
///
/// # Example
///
/// ```rust
/// use fsroute::{FsFull, FsError, Permissions};
/// use std::path::Path;
///
/// // Generic function that works with any FsFull implementation
/// fn create_backup<B: FsFull>(fs: &B) -> Result<(), FsError> {
///     // Write the main file
///     fs.write(Path::new("/data/config.json"), b"{}")?;
///     
///     // Create a hard link as backup
///     fs.hard_link(Path::new("/data/config.json"), Path::new("/backups/config.json"))?;
///     
///     // Make backup read-only
///     fs.set_permissions(Path::new("/backups/config.json"), Permissions::from_mode(0o444))?;
///     
///     // Ensure changes are on disk
///     fs.sync()?;
///     
///     // Check available space
///     let stats = fs.statfs()?;
///     println!("Available: {} bytes", stats.available_bytes);
///     
///     Ok(())
/// }
/// ```
///
/// # Additional Methods
///
/// From [`FsLink`]:
/// - `symlink`, `hard_link`, `read_link`, `symlink_metadata`
///
/// From [`FsPermissions`]:
/// - `set_permissions`
///
/// From [`FsSync`]:
/// - `sync`, `fsync`
///
/// From [`FsStats`]:
/// - `statfs`
pub trait FsFull: Fs + FsLink + FsPermissions + FsSync + FsStats {}

// Blanket implementation
impl<T: Fs + FsLink + FsPermissions + FsSync + FsStats> FsFull for T {}
