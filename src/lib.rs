//! # fsroute
//!
//! Transparent interception of a program's filesystem calls, routing them to
//! a caller-supplied virtual filesystem while it's active and straight
//! through to the real `std::fs`/`std::env` otherwise.
//!
//! This crate provides both the **trait surface** backends implement
//! ([`Fs`], [`FsFull`], plus the standalone [`FsHandles`]/[`FsLock`]
//! component traits) and the **dispatch facade**
//! ([`fsroute`], the module) that application code calls instead of
//! `std::fs`/`std::env` directly, plus two reference backends
//! ([`backends::memory::VirtualFs`], a fully in-memory filesystem, and
//! [`backends::isolated::IsolatedFs`], a chroot-style wrapper around a real
//! directory).
//!
//! ---
//!
//! ## Quick Start
//!
//! Most callers only need three things: a backend, [`ctx::activate`] to turn
//! interception on for the current thread, and the [`fsroute`] module's
//! functions in place of `std::fs`.
//!
//! ```rust
//! use fsroute::backends::memory::VirtualFs;
//! use fsroute::{ctx, fsroute as route, FsFull};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let backend: Arc<dyn FsFull> = Arc::new(VirtualFs::new());
//! let _scope = ctx::activate(backend);
//!
//! route::write(Path::new("/greeting.txt"), b"hello").unwrap();
//! assert_eq!(route::read(Path::new("/greeting.txt")).unwrap(), b"hello");
//! // _scope drops here, restoring real-filesystem routing for this thread.
//! ```
//!
//! A generic function that works with any concrete backend directly (no
//! activation involved) only needs [`Fs`]:
//!
//! ```rust
//! use fsroute::Fs;
//! use std::path::Path;
//!
//! fn work_with_files<B: Fs>(backend: &B) -> Result<(), fsroute::FsError> {
//!     let data = backend.read(Path::new("/input.txt"))?;
//!     backend.write(Path::new("/output.txt"), &data)?;
//!     backend.create_dir_all(Path::new("/archive/2024"))?;
//!     for entry in backend.read_dir(Path::new("/"))? {
//!         println!("{}", entry?.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Fs`] | Basic filesystem trait — read, write, and directory operations |
//! | [`FsFull`] | Extended filesystem — adds links, permissions, sync, stats, cwd |
//! | [`FsHandles`] | Handle-based positioned I/O (`open`/`close`/`read_at`/`write_at`) |
//! | [`FsLock`] | Advisory file locking (`lock`/`try_lock`/`unlock`) |
//! | [`FsError`] | Comprehensive error type with context |
//! | [`Metadata`] | File/directory metadata (size, type, times, permissions) |
//! | [`DirEntry`] | Single directory listing entry |
//! | [`ctx::Scope`] | RAII guard returned by [`ctx::activate`]/[`ctx::suspend`]/[`ctx::defer_commits`] |
//!
//! ---
//!
//! ## Which Trait Should I Use?
//!
//! **[`Fs`]** — When you need basic file operations.
//! - Use for: Config files, data serialization, file processing, simple I/O
//! - Methods: `read`, `write`, `create_dir`, `read_dir`, `exists`, `metadata`, `getcwd`/`chdir`
//! - Coverage: **90% of use cases**
//!
//! **[`FsFull`]** — When you need filesystem features beyond basic I/O.
//! - Use for: Backup tools, file managers, archive extraction
//! - Adds: `symlink`, `hard_link`, `set_permissions`, `sync`, `statfs`
//! - Includes: Everything in [`Fs`]
//!
//! **[`FsHandles`]**/**[`FsLock`]** — When a backend wants handle-based
//! positioned I/O or advisory locking alongside [`FsFull`]. Neither reference
//! backend in this crate implements them; [`fsroute`]'s `lock`/`try_lock`/
//! `unlock` dispatch as `FdTable`-liveness checks instead.
//!
//! ---
//!
//! ## Trait Hierarchy
//!
//! ```text
//! Layer 1 (Core):     FsRead + FsWrite + FsDir + FsCwd = Fs
//!                                               ↓
//! Layer 2 (Extended): Fs + FsLink + FsPermissions + FsSync + FsStats = FsFull
//! ```
//!
//! All composite traits ([`Fs`], [`FsFull`]) have **blanket implementations**.
//! Just implement the component traits and you get the composite trait for
//! free. `Arc<dyn FsFull>` coerces to `Arc<dyn Fs>` automatically (trait
//! upcasting), which is how [`ctx`] can store the richer type while code that
//! only needs [`Fs`] (such as [`fdtable::FdTable`]) keeps working unchanged.
//!
//! ---
//!
//! ## Activation and Dispatch
//!
//! [`ctx::activate`] binds a backend to the current thread for the lifetime
//! of the returned [`ctx::Scope`]. While active, every [`fsroute`] function
//! routes to that backend instead of the real filesystem, with one
//! exception: read-shaped calls (`exists`, `metadata`, `read_dir`, …) that
//! come back `NotFound`/`PermissionDenied` retry against the real filesystem
//! when the path is one of a small set of safe system paths (see [`safe`]),
//! so an activated backend doesn't have to know about the host's shared
//! libraries, locale data, and the like. Mutating calls never fall back.
//!
//! [`ctx::suspend`] and [`ctx::defer_commits`] are nested scopes backends use
//! internally so their own bookkeeping I/O doesn't recurse through itself.
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, FsError>`. Errors include context:
//!
//! ```rust
//! use fsroute::FsError;
//! use std::path::PathBuf;
//!
//! // Errors include the path that caused the problem
//! let err = FsError::NotFound { path: PathBuf::from("/missing.txt") };
//! assert_eq!(err.to_string(), "not found: /missing.txt");
//!
//! // Permission errors include the operation
//! let err = FsError::PermissionDenied {
//!     path: PathBuf::from("/secret"),
//!     operation: "read",
//! };
//! assert_eq!(err.to_string(), "read: permission denied: /secret");
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self` (not `&mut self`),
//! enabling safe concurrent access. Backends use interior mutability internally.
//!
//! You can safely share a backend across threads using `Arc<B>` and spawn
//! concurrent operations without explicit locking at the call site.
//! Activation ([`ctx::activate`]) is thread-local: each thread must activate
//! its own scope to have [`fsroute`] route on that thread.
//!
//! ---
//!
//! ## Logging
//!
//! This crate emits [`tracing`] events at `trace`/`debug` granularity for
//! scope transitions and routing decisions (safe-path fallback, virtual
//! descriptor allocation). It never initializes a subscriber itself —
//! applications wire up `tracing-subscriber` or an equivalent.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Enable serialization for [`Metadata`], [`DirEntry`], [`Permissions`], etc. |
//!
//! ---
//!
//! ## Crate Organization
//!
//! - [`traits`] (re-exported at the crate root) — the trait surface backends implement.
//! - [`backends::memory`] — `VirtualFs`, a fully in-memory backend.
//! - [`backends::isolated`] — `IsolatedFs`, a chroot-style wrapper over a real directory.
//! - [`ctx`] — thread-local activation state.
//! - [`fsroute`] (the module) — the dispatch facade application code calls.
//! - [`config`] — builders for constructing the two reference backends.
//! - [`fdtable`]/[`rawio`] — the virtual descriptor table behind `os_*` handle ops.
//! - [`backing_store`] — the key/value abstraction `VirtualFs`/`IsolatedFs` persist through.
//! - [`orig`]/[`safe`] — the real-filesystem seam and the safe-path allowlist.

// Private modules
mod error;
mod ext;
mod layer;
mod markers;
mod orig;
mod path_resolver;
mod rawio;
mod safe;
mod traits;
mod types;

// Public modules
pub mod backends;
pub mod backing_store;
pub mod config;
pub mod ctx;
pub mod fdtable;
pub mod fsroute;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use types::{DirEntry, FileType, Handle, LockType, Metadata, OpenFlags, Permissions, StatFs};

// Public re-exports - Layer 1 core traits
pub use traits::{Fs, FsCwd, FsDir, FsRead, FsWrite, ReadDirIter};

// Public re-exports - Layer 2 extended traits
pub use traits::{FsFull, FsLink, FsPath, FsPermissions, FsStats, FsSync};

// Public re-exports - handle-based I/O and advisory locking
pub use traits::{FsHandles, FsLock};

// Public re-exports - path resolution
pub use path_resolver::PathResolver;

// Public re-exports - infrastructure
pub use ext::FsExt;
pub use fdtable::FdTable;
pub use layer::{Layer, LayerExt};
pub use markers::SelfResolving;
pub use rawio::VirtualFdIo;

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::FsExtJson;
