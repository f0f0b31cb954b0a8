//! Activation context (CTX).
//!
//! Holds the filesystem that's currently intercepting calls made through
//! [`crate::fsroute`], plus the two re-entrancy guards that keep the router's
//! own bookkeeping and the backends' own I/O from recursing into themselves.
//!
//! Grounded on `monkeyfs/context.py`'s `current_fs: ContextVar`,
//! `suspend_fs_interception()`, and `defer_commits()`, and on
//! `monkeyfs/patching/core.py`'s `_in_safe_path_check`/`_in_vfs_operation`
//! guards. Python's `ContextVar` is per-async-task; Rust has no async
//! runtime assumption here, so the equivalent is a `thread_local!` cell
//! (§4.1), which gives the same per-execution-context isolation for the
//! synchronous, thread-based concurrency model this crate targets.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::FsFull;

thread_local! {
    static ACTIVE_FS: RefCell<Option<Arc<dyn FsFull>>> = const { RefCell::new(None) };
    static DEFER_COMMITS: Cell<bool> = const { Cell::new(false) };
    static IN_SAFE_PATH_PROBE: Cell<bool> = const { Cell::new(false) };
    static IN_BACKEND_OP: Cell<bool> = const { Cell::new(false) };
}

static SAFE_PATHS_INIT: OnceLock<Vec<PathBuf>> = OnceLock::new();

/// Idempotent one-time initialization, called automatically by [`activate`].
///
/// In the source this rebinds a large set of global functions; there is
/// nothing to rebind here, so the only real work is populating
/// [`crate::safe`]'s path list exactly once, even under concurrent
/// first-callers.
pub fn install() {
    SAFE_PATHS_INIT.get_or_init(crate::safe::compute_safe_paths);
}

/// The safe-system-path roots, computing them via [`install`] if this is
/// the first call on any thread.
pub(crate) fn safe_paths() -> &'static [PathBuf] {
    install();
    SAFE_PATHS_INIT.get().expect("install() just initialized this")
}

/// The currently active filesystem, or `None` if interception is off on
/// this thread.
pub fn current() -> Option<Arc<dyn FsFull>> {
    ACTIVE_FS.with(|cell| cell.borrow().clone())
}

/// True if a [`defer_commits`] scope is active on this thread.
pub fn commits_deferred() -> bool {
    DEFER_COMMITS.with(Cell::get)
}

/// True while the router is resolving a path against the safe-system-path
/// list; used by [`crate::fsroute`] wrappers to avoid recursing into
/// themselves through that probe.
pub fn in_safe_path_probe() -> bool {
    IN_SAFE_PATH_PROBE.with(Cell::get)
}

/// True while a backend is performing its own internal storage I/O;
/// used by [`crate::fsroute`] wrappers to send backend-initiated calls
/// straight to [`crate::orig`].
pub fn in_backend_op() -> bool {
    IN_BACKEND_OP.with(Cell::get)
}

/// A LIFO-scoped guard that restores the thread's CTX state on drop,
/// including during unwind.
///
/// Returned by [`activate`], [`suspend`], and [`defer_commits`]. Each
/// captures exactly the value it displaced and restores that value (never
/// "whatever the cell currently holds"), which is what keeps nested scopes
/// exact LIFO even if an inner scope's guard outlives expectations due to a
/// panic.
#[must_use = "a Scope restores its prior state on drop; binding it to `_` ends the scope immediately"]
pub struct Scope {
    kind: ScopeKind,
}

enum ScopeKind {
    ActiveFs(Option<Arc<dyn FsFull>>),
    DeferCommits(bool),
    SafePathProbe(bool),
    BackendOp(bool),
}

impl Drop for Scope {
    fn drop(&mut self) {
        match &mut self.kind {
            ScopeKind::ActiveFs(prior) => {
                let prior = prior.take();
                ACTIVE_FS.with(|cell| *cell.borrow_mut() = prior);
                tracing::trace!("ctx scope exited, active fs restored");
            }
            ScopeKind::DeferCommits(prior) => {
                DEFER_COMMITS.with(|cell| cell.set(*prior));
            }
            ScopeKind::SafePathProbe(prior) => {
                IN_SAFE_PATH_PROBE.with(|cell| cell.set(*prior));
            }
            ScopeKind::BackendOp(prior) => {
                IN_BACKEND_OP.with(|cell| cell.set(*prior));
            }
        }
    }
}

/// Enter an interception scope bound to `fs`.
///
/// Every call made through [`crate::fsroute`] on this thread, for the
/// lifetime of the returned [`Scope`], routes to `fs` (subject to the
/// safe-path fallback, §4.3). Calls [`install`] first.
pub fn activate(fs: Arc<dyn FsFull>) -> Scope {
    install();
    let prior = ACTIVE_FS.with(|cell| cell.replace(Some(fs)));
    tracing::debug!("ctx scope entered: fs activated");
    Scope {
        kind: ScopeKind::ActiveFs(prior),
    }
}

/// Enter a nested scope with interception disabled.
///
/// Used internally by backends so their own host-level I/O (e.g.
/// `IsolatedFs`'s real `std::fs` calls) isn't re-routed back through
/// themselves; also useful to callers who need a window of "just talk to
/// the real filesystem" inside an active scope.
pub fn suspend() -> Scope {
    let prior = ACTIVE_FS.with(|cell| cell.replace(None));
    tracing::trace!("ctx scope entered: interception suspended");
    Scope {
        kind: ScopeKind::ActiveFs(prior),
    }
}

/// Enter a nested scope suppressing per-mutation `commit()` calls on
/// `BackingStore`-backed backends.
pub fn defer_commits() -> Scope {
    let prior = DEFER_COMMITS.with(|cell| cell.replace(true));
    Scope {
        kind: ScopeKind::DeferCommits(prior),
    }
}

/// Mark that a safe-path probe is in flight on this thread. Internal to
/// [`crate::fsroute`] and [`crate::safe`].
pub(crate) fn enter_safe_path_probe() -> Scope {
    let prior = IN_SAFE_PATH_PROBE.with(|cell| cell.replace(true));
    Scope {
        kind: ScopeKind::SafePathProbe(prior),
    }
}

/// Mark that a backend is performing its own internal I/O. Internal to
/// the backend implementations.
pub(crate) fn enter_backend_op() -> Scope {
    let prior = IN_BACKEND_OP.with(|cell| cell.replace(true));
    Scope {
        kind: ScopeKind::BackendOp(prior),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        FileType, FsCwd, FsDir, FsError, FsLink, FsPermissions, FsRead, FsStats, FsSync, FsWrite,
        Metadata, Permissions, ReadDirIter, StatFs,
    };
    use std::io::{Read, Write};
    use std::path::Path;
    use std::time::SystemTime;

    struct NoopFs;

    impl FsRead for NoopFs {
        fn read(&self, _path: &Path) -> Result<Vec<u8>, FsError> {
            Ok(vec![])
        }
        fn read_to_string(&self, _path: &Path) -> Result<String, FsError> {
            Ok(String::new())
        }
        fn read_range(&self, _path: &Path, _offset: u64, _len: usize) -> Result<Vec<u8>, FsError> {
            Ok(vec![])
        }
        fn exists(&self, _path: &Path) -> Result<bool, FsError> {
            Ok(false)
        }
        fn metadata(&self, _path: &Path) -> Result<Metadata, FsError> {
            Ok(Metadata {
                file_type: FileType::File,
                size: 0,
                permissions: Permissions::default_file(),
                created: SystemTime::UNIX_EPOCH,
                modified: SystemTime::UNIX_EPOCH,
                accessed: SystemTime::UNIX_EPOCH,
                inode: 0,
                nlink: 1,
            })
        }
        fn open_read(&self, _path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
            Ok(Box::new(std::io::empty()))
        }
    }

    impl FsWrite for NoopFs {
        fn write(&self, _path: &Path, _data: &[u8]) -> Result<(), FsError> {
            Ok(())
        }
        fn append(&self, _path: &Path, _data: &[u8]) -> Result<(), FsError> {
            Ok(())
        }
        fn remove_file(&self, _path: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn rename(&self, _from: &Path, _to: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn copy(&self, _from: &Path, _to: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn truncate(&self, _path: &Path, _size: u64) -> Result<(), FsError> {
            Ok(())
        }
        fn open_write(&self, _path: &Path) -> Result<Box<dyn Write + Send>, FsError> {
            Ok(Box::new(std::io::sink()))
        }

        fn set_times(&self, _path: &Path, _times: Option<(SystemTime, SystemTime)>) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsDir for NoopFs {
        fn read_dir(&self, _path: &Path) -> Result<ReadDirIter, FsError> {
            Ok(ReadDirIter::from_vec(vec![]))
        }
        fn create_dir(&self, _path: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn create_dir_all(&self, _path: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn remove_dir(&self, _path: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn remove_dir_all(&self, _path: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsCwd for NoopFs {
        fn getcwd(&self) -> Result<PathBuf, FsError> {
            Ok(PathBuf::from("/"))
        }
        fn chdir(&self, _path: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsLink for NoopFs {
        fn symlink(&self, _target: &Path, _link: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn hard_link(&self, _original: &Path, _link: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn read_link(&self, _path: &Path) -> Result<PathBuf, FsError> {
            Ok(PathBuf::from("/"))
        }
        fn symlink_metadata(&self, path: &Path) -> Result<Metadata, FsError> {
            self.metadata(path)
        }
    }

    impl FsPermissions for NoopFs {
        fn set_permissions(&self, _path: &Path, _perm: Permissions) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsSync for NoopFs {
        fn sync(&self) -> Result<(), FsError> {
            Ok(())
        }
        fn fsync(&self, _path: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsStats for NoopFs {
        fn statfs(&self) -> Result<StatFs, FsError> {
            Ok(StatFs::default())
        }
    }

    #[test]
    fn no_active_fs_by_default() {
        assert!(current().is_none());
    }

    #[test]
    fn activate_sets_and_restores_on_drop() {
        assert!(current().is_none());
        {
            let _scope = activate(Arc::new(NoopFs));
            assert!(current().is_some());
        }
        assert!(current().is_none());
    }

    #[test]
    fn nested_scopes_restore_lifo() {
        let outer = Arc::new(NoopFs);
        let _s1 = activate(outer);
        assert!(current().is_some());
        {
            let _s2 = suspend();
            assert!(current().is_none());
        }
        assert!(current().is_some());
    }

    #[test]
    fn scope_restores_even_on_panic() {
        let result = std::panic::catch_unwind(|| {
            let _scope = activate(Arc::new(NoopFs));
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(current().is_none());
    }

    #[test]
    fn defer_commits_is_lifo_scoped() {
        assert!(!commits_deferred());
        {
            let _scope = defer_commits();
            assert!(commits_deferred());
        }
        assert!(!commits_deferred());
    }

    #[test]
    fn install_is_idempotent() {
        install();
        install();
        install();
    }
}
