//! System-path oracle (SAFE).
//!
//! A fixed set of absolute directory prefixes that the router always lets
//! reads through, even while an `Fs` is active — so that the standard
//! library, the dynamic linker, and the toolchain can still find their own
//! files underneath an activated virtual filesystem. Grounded on
//! `monkeyfs/patching/core.py`'s `_get_safe_paths`/`_is_safe_system_path`:
//! the original builds its set from `sys.prefix`/`sys.base_prefix`/
//! `site.getsitepackages()` (CPython's install and site-packages roots).
//! Rust has no interpreter install prefix or site-packages concept, so the
//! nearest equivalents are the running executable's own directory (where a
//! dynamically linked `std` build and any bundled resources live) and, at
//! test time, `CARGO_MANIFEST_DIR` (so a test suite's own fixtures remain
//! reachable without activating the virtual filesystem for them).

use std::env;
use std::path::{Path, PathBuf};

/// Compute the set of safe system-path roots once, at [`crate::ctx::install`]
/// time.
///
/// Mirrors the source's `_get_safe_paths`: each candidate is resolved with
/// `canonicalize` and kept only if it exists; unresolvable or nonexistent
/// candidates are silently skipped rather than failing `install()`.
pub(crate) fn compute_safe_paths() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            push_canonical(&mut roots, dir);
        }
    }

    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        push_canonical(&mut roots, Path::new(&manifest_dir));
    }

    tracing::debug!(count = roots.len(), "safe system paths initialized");
    roots
}

fn push_canonical(roots: &mut Vec<PathBuf>, path: &Path) {
    if let Ok(resolved) = path.canonicalize() {
        if !roots.contains(&resolved) {
            roots.push(resolved);
        }
    }
}

/// True if `path` resolves under one of the safe system-path roots.
///
/// Resolution itself runs inside [`crate::ctx::enter_safe_path_probe`] so
/// that `std::fs::canonicalize`, called here against the real filesystem,
/// doesn't get routed back through an active `Fs` by the very wrappers that
/// call this function (mirrors `_is_safe_system_path` setting
/// `_in_safe_path_check` before calling `os.path.realpath`).
pub fn is_safe_system_path(path: &Path, roots: &[PathBuf]) -> bool {
    let _probe = crate::ctx::enter_safe_path_probe();
    let resolved = match path.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => return false,
    };
    roots.iter().any(|root| resolved.starts_with(root))
}
