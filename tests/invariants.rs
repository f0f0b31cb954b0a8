//! Property-based and boundary tests for the routing/backend invariants.

use fsroute::backends::isolated::IsolatedFs;
use fsroute::backends::memory::VirtualFs;
use fsroute::backing_store::{decode_key, encode_key, BackingStore, MapStore};
use fsroute::{ctx, FsError, FsFull, FsRead, FsWrite};
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn arb_path_component() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,8}"
}

fn arb_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_path_component(), 1..4)
        .prop_map(|parts| format!("/{}", parts.join("/")))
}

proptest! {
    /// write(p, c) then read(p) returns exactly c, and len matches.
    #[test]
    fn write_then_read_round_trips(path in arb_path(), content in proptest::collection::vec(any::<u8>(), 0..64)) {
        let fs = VirtualFs::new();
        fs.write(Path::new(&path), &content).unwrap();
        prop_assert_eq!(fs.read(Path::new(&path)).unwrap(), content.clone());
        prop_assert_eq!(fs.metadata(Path::new(&path)).unwrap().size, content.len() as u64);
    }

    /// created is preserved across an overwrite; modified never decreases.
    #[test]
    fn overwrite_preserves_created_and_advances_modified(
        path in arb_path(),
        first in proptest::collection::vec(any::<u8>(), 0..32),
        second in proptest::collection::vec(any::<u8>(), 0..32),
    ) {
        let fs = VirtualFs::new();
        fs.write(Path::new(&path), &first).unwrap();
        let before = fs.metadata(Path::new(&path)).unwrap();
        fs.write(Path::new(&path), &second).unwrap();
        let after = fs.metadata(Path::new(&path)).unwrap();

        prop_assert_eq!(before.created, after.created);
        prop_assert!(after.modified >= before.modified);
    }

    /// write then remove is observationally back to absent.
    #[test]
    fn write_then_remove_leaves_no_trace(path in arb_path(), content in proptest::collection::vec(any::<u8>(), 0..32)) {
        let fs = VirtualFs::new();
        fs.write(Path::new(&path), &content).unwrap();
        fs.remove_file(Path::new(&path)).unwrap();

        prop_assert!(!fs.exists(Path::new(&path)).unwrap());
        prop_assert!(fs.metadata(Path::new(&path)).is_err());
    }

    /// encode_key / decode_key round-trips on any normalized absolute path.
    #[test]
    fn encode_decode_key_round_trips(path in arb_path()) {
        let key = encode_key(&path);
        prop_assert_eq!(decode_key(&key).as_deref(), Some(path.as_str()));
    }

    /// write_many is all-or-nothing against a size cap: a batch that would
    /// overflow the cap leaves none of its (formerly-absent) paths behind.
    #[test]
    fn write_many_over_cap_leaves_no_trace(
        paths in proptest::collection::vec(arb_path(), 2..4),
        content in proptest::collection::vec(any::<u8>(), 1..16),
    ) {
        // A zero-byte cap guarantees any non-empty batch overflows it.
        let fs = VirtualFs::with_size_cap(0);
        let files: Vec<(PathBuf, Vec<u8>)> = paths
            .iter()
            .map(|p| (PathBuf::from(p), content.clone()))
            .collect();

        prop_assert!(fs.write_many(&files).is_err());
        for p in &paths {
            prop_assert!(!fs.exists(Path::new(p)).unwrap());
        }
    }

    /// write_many under the cap lands every path.
    #[test]
    fn write_many_under_cap_lands_every_path(
        paths in proptest::collection::vec(arb_path(), 1..4),
        content in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        let fs = VirtualFs::new();
        let files: Vec<(PathBuf, Vec<u8>)> = paths
            .iter()
            .map(|p| (PathBuf::from(p), content.clone()))
            .collect();

        fs.write_many(&files).unwrap();
        for p in &paths {
            prop_assert!(fs.exists(Path::new(p)).unwrap());
        }
    }
}

/// For every `IsolatedFs` and every path, validation either yields a host
/// path under the root or a `PermissionDenied` — never anything else.
#[test]
fn isolated_fs_validate_never_escapes_or_succeeds_silently() {
    let dir = tempfile::tempdir().unwrap();
    let fs = IsolatedFs::new(dir.path()).unwrap();

    for candidate in ["/a.txt", "../escape", "../../../etc/passwd", "/x/../../y"] {
        match fs.write(Path::new(candidate), b"") {
            Ok(()) => {
                assert!(fs.exists(Path::new(candidate)).unwrap());
            }
            // Lexical normalization collapses a leading ".." back to root
            // rather than escaping it, so some of these surface as NotFound
            // (e.g. "/x/../../y" normalizes to a path under a nonexistent
            // parent) rather than PermissionDenied; either is an acceptable
            // "did not escape" outcome, anything else would not be.
            Err(e) => assert!(matches!(
                e,
                FsError::PermissionDenied { .. } | FsError::NotFound { .. }
            )),
        }
    }
    assert!(!dir.path().parent().unwrap().join("etc").exists());
}

/// ctx::current() after exiting a scope equals its value before entering,
/// whether or not the scope body panicked.
#[test]
fn scope_exit_restores_prior_context() {
    assert!(ctx::current().is_none());

    {
        let fs: Arc<dyn FsFull> = Arc::new(VirtualFs::new());
        let _outer = ctx::activate(fs);
        assert!(ctx::current().is_some());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let inner: Arc<dyn FsFull> = Arc::new(VirtualFs::new());
            let _inner_scope = ctx::activate(inner);
            panic!("boom");
        }));
        assert!(result.is_err());

        // The inner scope's guard still ran its Drop during unwinding, so we're
        // back to the outer scope's backend.
        assert!(ctx::current().is_some());
    }

    assert!(ctx::current().is_none());
}

/// ctx::install() is idempotent under repeated calls.
#[test]
fn install_is_idempotent() {
    ctx::install();
    ctx::install();
    ctx::install();
    assert!(ctx::current().is_none());
}

/// activate(fs) entered and immediately exited is a no-op on the cell.
#[test]
fn activate_then_immediate_drop_is_a_no_op() {
    assert!(ctx::current().is_none());
    {
        let fs: Arc<dyn FsFull> = Arc::new(VirtualFs::new());
        let _scope = ctx::activate(fs);
    }
    assert!(ctx::current().is_none());
}

struct CountingStore {
    inner: MapStore,
    commits: AtomicU64,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: MapStore::new(),
            commits: AtomicU64::new(0),
        }
    }
}

impl BackingStore for CountingStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key)
    }
    fn set(&self, key: &str, value: Vec<u8>) {
        self.inner.set(key, value)
    }
    fn remove(&self, key: &str) {
        self.inner.remove(key)
    }
    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
    fn commit(&self) {
        self.commits.fetch_add(1, Ordering::SeqCst);
    }
}

/// `defer_commits` suppresses exactly the backend's `commit()` callback —
/// the write itself still lands, and resumes triggering `commit()` once the
/// deferring scope ends.
#[test]
fn defer_commits_suppresses_only_the_commit_callback() {
    let store = Arc::new(CountingStore::new());
    let fs = VirtualFs::with_store(store.clone());

    {
        let _deferred = ctx::defer_commits();
        fs.write(Path::new("/a.txt"), b"hi").unwrap();
        assert_eq!(store.commits.load(Ordering::SeqCst), 0);
        assert_eq!(fs.read(Path::new("/a.txt")).unwrap(), b"hi");
    }

    fs.write(Path::new("/b.txt"), b"bye").unwrap();
    assert_eq!(store.commits.load(Ordering::SeqCst), 1);
}

/// A zero-cap `VirtualFs` rejects every non-empty write, accepts an empty
/// one, and `write_many(&[])` is vacuously fine.
#[test]
fn zero_cap_boundary_behavior() {
    let fs = VirtualFs::with_size_cap(0);

    let err = fs.write(Path::new("/a.txt"), b"x").unwrap_err();
    assert!(matches!(err, FsError::SizeLimitExceeded { .. }));

    fs.write(Path::new("/empty.txt"), b"").unwrap();
    assert_eq!(fs.read(Path::new("/empty.txt")).unwrap(), b"");

    fs.write_many(&[]).unwrap();
}

/// write_many then remove_many round-trip through the shared trait default,
/// against any backend implementing both — exercised here against both
/// `VirtualFs` and `IsolatedFs`, not just one concrete type.
fn assert_write_many_then_remove_many<B: FsRead + FsWrite>(fs: &B) {
    let files: Vec<(PathBuf, Vec<u8>)> = vec![
        (PathBuf::from("/a.txt"), b"1".to_vec()),
        (PathBuf::from("/b.txt"), b"22".to_vec()),
    ];
    fs.write_many(&files).unwrap();
    assert!(fs.exists(Path::new("/a.txt")).unwrap());
    assert!(fs.exists(Path::new("/b.txt")).unwrap());

    fs.remove_many(&[PathBuf::from("/a.txt"), PathBuf::from("/b.txt")])
        .unwrap();
    assert!(!fs.exists(Path::new("/a.txt")).unwrap());
    assert!(!fs.exists(Path::new("/b.txt")).unwrap());
}

#[test]
fn write_many_then_remove_many_against_virtual_fs() {
    assert_write_many_then_remove_many(&VirtualFs::new());
}

#[test]
fn write_many_then_remove_many_against_isolated_fs() {
    let dir = tempfile::tempdir().unwrap();
    assert_write_many_then_remove_many(&IsolatedFs::new(dir.path()).unwrap());
}

/// `fsroute::write_many`/`remove_many` route to the active backend exactly
/// like their singular counterparts.
#[test]
fn routed_write_many_and_remove_many_dispatch_to_active_backend() {
    use fsroute::fsroute as route;

    let backend: Arc<dyn FsFull> = Arc::new(VirtualFs::new());
    let _scope = ctx::activate(backend.clone());

    let files = vec![
        (PathBuf::from("/a.txt"), b"1".to_vec()),
        (PathBuf::from("/b.txt"), b"2".to_vec()),
    ];
    route::write_many(&files).unwrap();
    assert!(route::exists(Path::new("/a.txt")));
    assert!(route::exists(Path::new("/b.txt")));

    route::remove_many(&[PathBuf::from("/a.txt"), PathBuf::from("/b.txt")]).unwrap();
    assert!(!route::exists(Path::new("/a.txt")));
    assert!(!route::exists(Path::new("/b.txt")));
}

/// `fsroute::touch` creates an absent file, and updates an existing file's
/// `modified` time via `set_times` rather than no-opping.
#[test]
fn routed_touch_creates_then_updates_existing() {
    use fsroute::fsroute as route;

    let backend: Arc<dyn FsFull> = Arc::new(VirtualFs::new());
    let _scope = ctx::activate(backend.clone());

    route::touch(Path::new("/a.txt")).unwrap();
    assert!(route::exists(Path::new("/a.txt")));
    let before = route::metadata(Path::new("/a.txt")).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(5));
    route::touch(Path::new("/a.txt")).unwrap();
    let after = route::metadata(Path::new("/a.txt")).unwrap();
    assert!(after.modified >= before.modified);
}

/// `open` with CREATE|EXCLUSIVE on an existing path fails and doesn't touch
/// the backend's existing content.
#[test]
fn create_exclusive_on_existing_path_fails_without_side_effects() {
    use fsroute::fdtable::FdTable;
    use fsroute::OpenFlags;

    let fs: Arc<dyn fsroute::Fs> = Arc::new(VirtualFs::new());
    fs.write(Path::new("/a.txt"), b"original").unwrap();

    let err = FdTable::global()
        .allocate(Path::new("/a.txt"), fs.clone(), OpenFlags::CREATE_NEW)
        .unwrap_err();
    assert!(matches!(err, FsError::AlreadyExists { .. }));
    assert_eq!(fs.read(Path::new("/a.txt")).unwrap(), b"original");
}

/// A still-open writable virtual handle reports the live buffer size via
/// `os_fstat`, not the last-persisted size.
#[test]
fn fstat_on_open_handle_reports_live_buffer_size() {
    use fsroute::fsroute as route;

    let backend: Arc<dyn FsFull> = Arc::new(VirtualFs::new());
    let _scope = ctx::activate(backend.clone());

    let handle = route::os_open(Path::new("/a.txt"), fsroute::OpenFlags::WRITE).unwrap();
    route::os_write(handle, b"hello").unwrap();

    let live = route::os_fstat(handle).unwrap();
    assert_eq!(live.size, 5);
    assert!(backend
        .read(Path::new("/a.txt"))
        .map(|b| b.is_empty())
        .unwrap_or(true));

    route::os_close(handle).unwrap();
    assert_eq!(backend.read(Path::new("/a.txt")).unwrap(), b"hello");
}
