//! Dispatch facade (ROUTE).
//!
//! Rust has no way to rebind `std::fs::*`/`std::env::*` the way the source's
//! `patching/install.py` monkeypatches the `os`/`os.path`/`io`/`shutil`
//! modules in place, so this module is the explicit substitute: ordinary
//! public functions that callers spell instead of `std::fs`/`std::env`, each
//! implementing the same five-step decision the source's `_vfs_*` wrappers
//! make (`monkeyfs/patching/patches.py`), in source order:
//!
//! 1. a safe-path probe is in flight on this thread -> [`crate::orig`]
//! 2. a backend is doing its own internal I/O -> [`crate::orig`]
//! 3. read [`crate::ctx::current`]
//! 4. nothing active -> [`crate::orig`]
//! 5. something active -> dispatch to it, with the read-shaped fallback
//!    described below
//!
//! Read-shaped primitives (`exists`, `metadata`, `read_dir`, `read_link`, …)
//! retry against [`crate::orig`] when the active backend answers
//! [`FsError::NotFound`] or [`FsError::PermissionDenied`] *and* the path is
//! one of [`crate::safe`]'s system paths — this is what lets an activated
//! virtual filesystem still see the interpreter's own supporting files
//! (grounded on `monkeyfs/patching/install.py`'s safe-path fallback).
//! Mutation-shaped primitives never fall back: a write that the active
//! backend can't satisfy is the caller's problem, not an invitation to leak
//! onto the real disk.
//!
//! Path-normalization primitives (`expanduser`, `expandvars`, `home_dir`,
//! `abspath`) are a third, stricter shape: they never reveal the real home
//! directory while a backend is active, because doing so would leak host
//! identity through an otherwise fully virtualized path.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    ctx, orig, safe, DirEntry, FdTable, FileType, Fs, FsCwd, FsDir, FsError, FsFull, FsLink,
    FsPermissions, FsRead, FsStats, FsSync, FsWrite, Handle, LockType, Metadata, OpenFlags,
    Permissions, ReadDirIter, StatFs, VirtualFdIo,
};

/// Anything `fsroute::open` can hand back: a real `File` or a [`VirtualFdIo`].
pub trait FileIo: Read + Write + Seek + Send {}
impl<T: Read + Write + Seek + Send> FileIo for T {}

fn io_to_fs(e: io::Error, path: &Path, operation: &'static str) -> FsError {
    match e.kind() {
        io::ErrorKind::NotFound => FsError::NotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists {
            path: path.to_path_buf(),
            operation,
        },
        io::ErrorKind::PermissionDenied => FsError::PermissionDenied {
            path: path.to_path_buf(),
            operation,
        },
        _ => FsError::Io {
            operation,
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// Step 3-5 for read-shaped primitives: try the active backend, and on
/// `NotFound`/`PermissionDenied` against a safe system path, retry `fallback`.
fn read_op<T>(
    path: &Path,
    op: impl FnOnce(&dyn FsFull) -> Result<T, FsError>,
    fallback: impl FnOnce() -> Result<T, FsError>,
) -> Result<T, FsError> {
    if ctx::in_safe_path_probe() || ctx::in_backend_op() {
        return fallback();
    }
    match ctx::current() {
        None => fallback(),
        Some(fs) => match op(fs.as_ref()) {
            Ok(v) => Ok(v),
            Err(e @ (FsError::NotFound { .. } | FsError::PermissionDenied { .. })) => {
                if safe::is_safe_system_path(path, ctx::safe_paths()) {
                    tracing::debug!(path = %path.display(), "falling back to real filesystem for safe system path");
                    fallback()
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        },
    }
}

/// Step 3-5 for mutation-shaped primitives: no fallback once something is
/// active.
fn mutate_op<T>(
    op: impl FnOnce(&dyn FsFull) -> Result<T, FsError>,
    fallback: impl FnOnce() -> Result<T, FsError>,
) -> Result<T, FsError> {
    if ctx::in_safe_path_probe() || ctx::in_backend_op() {
        return fallback();
    }
    match ctx::current() {
        None => fallback(),
        Some(fs) => op(fs.as_ref()),
    }
}

/// The `Fs` to hand `FdTable` for a low-level handle op: the active backend
/// (upcast from `FsFull`), or a pass-through over [`crate::orig`] when
/// nothing is installed, so `os_open`/`os_read`/`os_write`/`os_close` behave
/// uniformly whether or not a virtual filesystem is active.
fn effective_fs() -> Arc<dyn Fs> {
    if !ctx::in_safe_path_probe() && !ctx::in_backend_op() {
        if let Some(fs) = ctx::current() {
            return fs;
        }
    }
    Arc::new(RealFs)
}

/// Adapts [`crate::orig`] into an `Fs` so [`FdTable`] has something to
/// allocate against when no virtual filesystem is installed. Not exported:
/// callers that want real-file I/O without FDTAB's whole-buffer semantics
/// should use [`open`], not the `os_*` family.
struct RealFs;

impl FsRead for RealFs {
    fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        orig::read(path).map_err(|e| io_to_fs(e, path, "read"))
    }
    fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        orig::read_to_string(path).map_err(|e| io_to_fs(e, path, "read_to_string"))
    }
    fn read_range(&self, path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, FsError> {
        let data = self.read(path)?;
        let start = offset as usize;
        let end = (start + len).min(data.len());
        Ok(if start >= data.len() {
            Vec::new()
        } else {
            data[start..end].to_vec()
        })
    }
    fn exists(&self, path: &Path) -> Result<bool, FsError> {
        Ok(orig::exists(path))
    }
    fn metadata(&self, path: &Path) -> Result<Metadata, FsError> {
        orig::metadata(path)
            .map(|m| orig::std_to_metadata(&m))
            .map_err(|e| io_to_fs(e, path, "metadata"))
    }
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        let mut opts = std::fs::OpenOptions::new();
        opts.read(true);
        let file = orig::open(path, &opts).map_err(|e| io_to_fs(e, path, "open"))?;
        Ok(Box::new(file))
    }
}

impl FsWrite for RealFs {
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        orig::write(path, data).map_err(|e| io_to_fs(e, path, "write"))
    }
    fn append(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let mut opts = std::fs::OpenOptions::new();
        opts.create(true).append(true);
        let mut file = orig::open(path, &opts).map_err(|e| io_to_fs(e, path, "append"))?;
        file.write_all(data)
            .map_err(|e| io_to_fs(e, path, "append"))
    }
    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError> {
        let mut opts = std::fs::OpenOptions::new();
        opts.write(true);
        let file = orig::open(path, &opts).map_err(|e| io_to_fs(e, path, "truncate"))?;
        file.set_len(size)
            .map_err(|e| io_to_fs(e, path, "truncate"))
    }
    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        orig::remove_file(path).map_err(|e| io_to_fs(e, path, "remove_file"))
    }
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        orig::rename(from, to).map_err(|e| io_to_fs(e, from, "rename"))
    }
    fn copy(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        orig::copy(from, to)
            .map(|_| ())
            .map_err(|e| io_to_fs(e, from, "copy"))
    }
    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>, FsError> {
        let mut opts = std::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        let file = orig::open(path, &opts).map_err(|e| io_to_fs(e, path, "open"))?;
        Ok(Box::new(file))
    }
    fn set_times(
        &self,
        path: &Path,
        times: Option<(std::time::SystemTime, std::time::SystemTime)>,
    ) -> Result<(), FsError> {
        orig::set_times(path, times).map_err(|e| io_to_fs(e, path, "set_times"))
    }
}

impl FsDir for RealFs {
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        orig_read_dir(path)
    }
    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        orig::create_dir(path).map_err(|e| io_to_fs(e, path, "create_dir"))
    }
    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        orig::create_dir_all(path).map_err(|e| io_to_fs(e, path, "create_dir_all"))
    }
    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        orig::remove_dir(path).map_err(|e| io_to_fs(e, path, "remove_dir"))
    }
    fn remove_dir_all(&self, path: &Path) -> Result<(), FsError> {
        orig::remove_dir_all(path).map_err(|e| io_to_fs(e, path, "remove_dir_all"))
    }
}

impl FsCwd for RealFs {
    fn getcwd(&self) -> Result<PathBuf, FsError> {
        orig::getcwd().map_err(|e| io_to_fs(e, Path::new("."), "getcwd"))
    }
    fn chdir(&self, path: &Path) -> Result<(), FsError> {
        orig::chdir(path).map_err(|e| io_to_fs(e, path, "chdir"))
    }
}

fn convert_std_entry(entry: io::Result<std::fs::DirEntry>, parent: &Path) -> Result<DirEntry, FsError> {
    let entry = entry.map_err(|e| io_to_fs(e, parent, "read_dir"))?;
    let path = entry.path();
    let meta = entry
        .metadata()
        .map_err(|e| io_to_fs(e, &path, "read_dir"))?;
    let converted = orig::std_to_metadata(&meta);
    Ok(DirEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        path,
        file_type: converted.file_type,
        size: converted.size,
        inode: converted.inode,
    })
}

fn orig_read_dir(path: &Path) -> Result<ReadDirIter, FsError> {
    let rd = orig::read_dir(path).map_err(|e| io_to_fs(e, path, "read_dir"))?;
    let parent = path.to_path_buf();
    let entries: Vec<Result<DirEntry, FsError>> =
        rd.map(|e| convert_std_entry(e, &parent)).collect();
    Ok(ReadDirIter::from_vec(entries))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut stack: Vec<std::ffi::OsString> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::ParentDir => {
                stack.pop();
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => stack.clear(),
            Component::Normal(seg) => stack.push(seg.to_os_string()),
        }
    }
    let mut result = PathBuf::from("/");
    for seg in stack {
        result.push(seg);
    }
    result
}

// ---------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------

/// Read a whole file's contents. Routed (§4.3, read-shaped).
pub fn read(path: &Path) -> Result<Vec<u8>, FsError> {
    read_op(
        path,
        |fs| fs.read(path),
        || orig::read(path).map_err(|e| io_to_fs(e, path, "read")),
    )
}

/// Read a whole file's contents as UTF-8. Routed (§4.3, read-shaped).
pub fn read_to_string(path: &Path) -> Result<String, FsError> {
    read_op(
        path,
        |fs| fs.read_to_string(path),
        || orig::read_to_string(path).map_err(|e| io_to_fs(e, path, "read_to_string")),
    )
}

/// Read `len` bytes starting at `offset`. Routed (§4.3, read-shaped).
pub fn read_range(path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, FsError> {
    read_op(
        path,
        |fs| fs.read_range(path, offset, len),
        || RealFs.read_range(path, offset, len),
    )
}

/// Does `path` exist (following symlinks)? Never errors. Routed (§4.3).
pub fn exists(path: &Path) -> bool {
    if ctx::in_safe_path_probe() || ctx::in_backend_op() {
        return orig::exists(path);
    }
    match ctx::current() {
        None => orig::exists(path),
        Some(fs) => {
            let found = fs.exists(path).unwrap_or(false);
            if !found && safe::is_safe_system_path(path, ctx::safe_paths()) {
                orig::exists(path)
            } else {
                found
            }
        }
    }
}

/// `lstat`-equivalent existence check: true for a dangling symlink too.
pub fn lexists(path: &Path) -> bool {
    symlink_metadata(path).is_ok()
}

/// Check whether a path is reachable. Routed (§4.3, read-shaped).
pub fn access(path: &Path) -> Result<bool, FsError> {
    read_op(path, |fs| fs.access(path), || RealFs.access(path))
}

/// Metadata following symlinks. Routed (§4.3, read-shaped).
pub fn metadata(path: &Path) -> Result<Metadata, FsError> {
    read_op(
        path,
        |fs| fs.metadata(path),
        || {
            orig::metadata(path)
                .map(|m| orig::std_to_metadata(&m))
                .map_err(|e| io_to_fs(e, path, "metadata"))
        },
    )
}

/// Metadata without following a final symlink. Routed (§4.3, read-shaped).
pub fn symlink_metadata(path: &Path) -> Result<Metadata, FsError> {
    read_op(
        path,
        |fs| fs.symlink_metadata(path),
        || {
            orig::symlink_metadata(path)
                .map(|m| orig::std_to_metadata(&m))
                .map_err(|e| io_to_fs(e, path, "symlink_metadata"))
        },
    )
}

/// Convenience built on [`metadata`].
pub fn is_file(path: &Path) -> bool {
    metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Convenience built on [`metadata`].
pub fn is_dir(path: &Path) -> bool {
    metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Convenience built on [`symlink_metadata`].
pub fn is_symlink(path: &Path) -> bool {
    symlink_metadata(path).map(|m| m.is_symlink()).unwrap_or(false)
}

/// File size in bytes. Routed via [`metadata`].
pub fn file_size(path: &Path) -> Result<u64, FsError> {
    Ok(metadata(path)?.size)
}

/// Best-effort "do these two paths name the same file": compares inode
/// numbers from [`metadata`]. Out of contract across mixed backends (§9) —
/// a zero inode (the usual sentinel for "not tracked") never matches.
pub fn samefile(a: &Path, b: &Path) -> Result<bool, FsError> {
    let ma = metadata(a)?;
    let mb = metadata(b)?;
    Ok(ma.inode != 0 && ma.inode == mb.inode)
}

/// Target of a symlink, unresolved. Routed (§4.3, read-shaped).
pub fn read_link(path: &Path) -> Result<PathBuf, FsError> {
    read_op(
        path,
        |fs| fs.read_link(path),
        || orig::read_link(path).map_err(|e| io_to_fs(e, path, "read_link")),
    )
}

/// List a directory's entries. Routed (§4.3, read-shaped).
pub fn read_dir(path: &Path) -> Result<ReadDirIter, FsError> {
    read_op(path, |fs| fs.read_dir(path), || orig_read_dir(path))
}

/// List every descendant of a directory, recursing into subdirectories.
/// Routed (§4.3, read-shaped).
pub fn read_dir_recursive(path: &Path) -> Result<ReadDirIter, FsError> {
    read_op(
        path,
        |fs| fs.read_dir_recursive(path),
        || RealFs.read_dir_recursive(path),
    )
}

/// Resolve symlinks and require every component to exist.
///
/// Implemented directly here rather than through [`crate::FsPath`]'s
/// blanket impl, since that impl targets concrete backend types and
/// `fsroute` only ever holds `&dyn FsFull`: the walk below calls
/// `symlink_metadata`/`read_link` through the trait object instead.
/// Routed (§4.3, read-shaped).
pub fn canonicalize(path: &Path) -> Result<PathBuf, FsError> {
    read_op(
        path,
        |fs| canonicalize_against(fs, path),
        || orig::canonicalize(path).map_err(|e| io_to_fs(e, path, "canonicalize")),
    )
}

const MAX_SYMLINK_DEPTH: usize = 40;

fn canonicalize_against(fs: &dyn FsFull, path: &Path) -> Result<PathBuf, FsError> {
    let mut current = if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&fs.getcwd()?.join(path))
    };
    if !fs.exists(&current)? {
        return Err(FsError::NotFound { path: current });
    }
    for _ in 0..MAX_SYMLINK_DEPTH {
        let meta = fs.symlink_metadata(&current)?;
        if !meta.is_symlink() {
            return Ok(current);
        }
        let target = fs.read_link(&current)?;
        current = if target.is_absolute() {
            normalize_lexically(&target)
        } else {
            let parent = current.parent().unwrap_or(Path::new("/"));
            normalize_lexically(&parent.join(target))
        };
    }
    Err(FsError::InvalidData {
        path: current,
        details: "symlink loop exceeded maximum depth".into(),
    })
}

/// Lexical absolute-path normalization (no symlink following), joined
/// against the active backend's cwd, or the real cwd otherwise.
pub fn abspath(path: &Path) -> Result<PathBuf, FsError> {
    if ctx::in_safe_path_probe() || ctx::in_backend_op() {
        return std::path::absolute(path).map_err(|e| io_to_fs(e, path, "abspath"));
    }
    match ctx::current() {
        None => std::path::absolute(path).map_err(|e| io_to_fs(e, path, "abspath")),
        Some(fs) => {
            let joined = if path.is_absolute() {
                path.to_path_buf()
            } else {
                fs.getcwd()?.join(path)
            };
            Ok(normalize_lexically(&joined))
        }
    }
}

/// The home directory to use for [`expanduser`]/[`expandvars`]: the real
/// `$HOME` when nothing is active, `/` when a backend is — never the real
/// home directory while virtualized, since that would leak host identity
/// through an otherwise fully virtual path.
pub fn home_dir() -> Option<PathBuf> {
    if ctx::in_safe_path_probe() || ctx::in_backend_op() {
        return orig::home_dir();
    }
    if ctx::current().is_some() {
        return Some(PathBuf::from("/"));
    }
    orig::home_dir()
}

/// Expand a leading `~` or `~/...` using [`home_dir`].
pub fn expanduser(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    let Some(rest) = s.strip_prefix('~') else {
        return path.to_path_buf();
    };
    let home = home_dir().unwrap_or_else(|| PathBuf::from("/"));
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        home
    } else {
        home.join(rest)
    }
}

/// Expand `$HOME`/`${HOME}` using [`home_dir`]. Other environment variables
/// are left untouched — this crate only virtualizes filesystem identity.
pub fn expandvars(path: &Path) -> PathBuf {
    let mut s = path.to_string_lossy().into_owned();
    if let Some(home) = home_dir() {
        let home_str = home.to_string_lossy();
        s = s.replace("${HOME}", &home_str).replace("$HOME", &home_str);
    }
    PathBuf::from(s)
}

// ---------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------

/// Write a file's full contents, creating or truncating it. Routed (§4.3,
/// mutation-shaped).
pub fn write(path: &Path, data: &[u8]) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.write(path, data),
        || orig::write(path, data).map_err(|e| io_to_fs(e, path, "write")),
    )
}

/// Append bytes to a file, creating it if needed. Routed (§4.3,
/// mutation-shaped).
pub fn append(path: &Path, data: &[u8]) -> Result<(), FsError> {
    mutate_op(|fs| fs.append(path, data), || RealFs.append(path, data))
}

/// Truncate (or extend with zeros) a file to `size`. Routed (§4.3,
/// mutation-shaped).
pub fn truncate(path: &Path, size: u64) -> Result<(), FsError> {
    mutate_op(|fs| fs.truncate(path, size), || RealFs.truncate(path, size))
}

/// Write several files in one call. Routed (§4.3, mutation-shaped).
pub fn write_many(files: &[(PathBuf, Vec<u8>)]) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.write_many(files),
        || RealFs.write_many(files),
    )
}

/// Remove a file. Routed (§4.3, mutation-shaped).
pub fn remove_file(path: &Path) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.remove_file(path),
        || orig::remove_file(path).map_err(|e| io_to_fs(e, path, "remove_file")),
    )
}

/// Remove several files in one call, symmetric with [`write_many`]. Routed
/// (§4.3, mutation-shaped).
pub fn remove_many(paths: &[PathBuf]) -> Result<(), FsError> {
    mutate_op(|fs| fs.remove_many(paths), || RealFs.remove_many(paths))
}

/// Rename/move a file or directory. Routed (§4.3, mutation-shaped).
pub fn rename(from: &Path, to: &Path) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.rename(from, to),
        || orig::rename(from, to).map_err(|e| io_to_fs(e, from, "rename")),
    )
}

/// `os.replace`'s Rust name is just `rename`: both this crate and `std::fs`
/// collapse the "atomic overwrite" distinction POSIX/Windows draw at the
/// syscall level into a single primitive.
pub fn replace(from: &Path, to: &Path) -> Result<(), FsError> {
    rename(from, to)
}

/// Copy a file by reading then writing — never `std::fs::copy`'s possibly
/// fd-based fast path, so an active backend always sees both halves of the
/// operation (§6).
pub fn copy(from: &Path, to: &Path) -> Result<(), FsError> {
    let data = read(from)?;
    write(to, &data)
}

/// Create a directory (parent must already exist). Routed (§4.3,
/// mutation-shaped).
pub fn create_dir(path: &Path) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.create_dir(path),
        || orig::create_dir(path).map_err(|e| io_to_fs(e, path, "create_dir")),
    )
}

/// Create a directory and all missing parents. Routed (§4.3,
/// mutation-shaped).
pub fn create_dir_all(path: &Path) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.create_dir_all(path),
        || orig::create_dir_all(path).map_err(|e| io_to_fs(e, path, "create_dir_all")),
    )
}

/// Remove an empty directory. Routed (§4.3, mutation-shaped).
pub fn remove_dir(path: &Path) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.remove_dir(path),
        || orig::remove_dir(path).map_err(|e| io_to_fs(e, path, "remove_dir")),
    )
}

/// Remove a directory and everything under it, via [`read_dir`]/
/// [`remove_file`]/[`remove_dir`] rather than `std::fs::remove_dir_all`'s
/// platform fast path (§6), so the removal is visible to an active backend
/// one entry at a time.
pub fn remove_dir_all(path: &Path) -> Result<(), FsError> {
    for entry in read_dir(path)? {
        let entry = entry?;
        if entry.file_type == crate::FileType::Directory {
            remove_dir_all(&entry.path)?;
        } else {
            remove_file(&entry.path)?;
        }
    }
    remove_dir(path)
}

/// Create a symlink at `link` pointing to `target`. Routed (§4.3,
/// mutation-shaped).
pub fn symlink(target: &Path, link: &Path) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.symlink(target, link),
        || orig::symlink(target, link).map_err(|e| io_to_fs(e, link, "symlink")),
    )
}

/// Create a hard link. Routed (§4.3, mutation-shaped).
pub fn hard_link(original: &Path, link: &Path) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.hard_link(original, link),
        || orig::hard_link(original, link).map_err(|e| io_to_fs(e, link, "hard_link")),
    )
}

/// Set a path's permission bits. Routed (§4.3, mutation-shaped).
pub fn set_permissions(path: &Path, perm: Permissions) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.set_permissions(path, perm),
        || {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let std_perm = std::fs::Permissions::from_mode(perm.mode());
                orig::set_permissions(path, std_perm)
                    .map_err(|e| io_to_fs(e, path, "set_permissions"))
            }
            #[cfg(not(unix))]
            {
                let mut std_perm = std::fs::metadata(path)
                    .map_err(|e| io_to_fs(e, path, "set_permissions"))?
                    .permissions();
                std_perm.set_readonly(perm.readonly());
                orig::set_permissions(path, std_perm)
                    .map_err(|e| io_to_fs(e, path, "set_permissions"))
            }
        },
    )
}

/// Set a path's access/modification times, `utime`-style. `times = None`
/// sets both to now. Routed (§4.3, mutation-shaped).
pub fn set_times(
    path: &Path,
    times: Option<(std::time::SystemTime, std::time::SystemTime)>,
) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.set_times(path, times),
        || orig::set_times(path, times).map_err(|e| io_to_fs(e, path, "set_times")),
    )
}

/// Create a file if it doesn't exist; otherwise update its timestamps via
/// [`set_times`].
pub fn touch(path: &Path) -> Result<(), FsError> {
    if exists(path) {
        return set_times(path, None);
    }
    write(path, &[])
}

/// Flush all pending writes. Routed (§4.3, mutation-shaped).
pub fn sync() -> Result<(), FsError> {
    mutate_op(|fs| fs.sync(), || Ok(()))
}

/// Flush a specific file's data. Routed (§4.3, mutation-shaped).
pub fn fsync(path: &Path) -> Result<(), FsError> {
    mutate_op(
        |fs| fs.fsync(path),
        || {
            let mut opts = std::fs::OpenOptions::new();
            opts.write(true);
            let file = orig::open(path, &opts).map_err(|e| io_to_fs(e, path, "fsync"))?;
            file.sync_all().map_err(|e| io_to_fs(e, path, "fsync"))
        },
    )
}

/// Filesystem capacity/inode statistics. Routed (§4.3, mutation-shaped —
/// there is no safe-path fallback for a global stat).
pub fn statfs() -> Result<StatFs, FsError> {
    mutate_op(
        |fs| fs.statfs(),
        || {
            Err(FsError::NotSupported {
                operation: "statfs without an active virtual filesystem",
            })
        },
    )
}

// ---------------------------------------------------------------------
// Working directory — straight to the backend, no safe-path fallback.
// ---------------------------------------------------------------------

/// The current working directory. Routed (§4.3).
pub fn getcwd() -> Result<PathBuf, FsError> {
    if ctx::in_safe_path_probe() || ctx::in_backend_op() {
        return orig::getcwd().map_err(|e| io_to_fs(e, Path::new("."), "getcwd"));
    }
    match ctx::current() {
        Some(fs) => fs.getcwd(),
        None => orig::getcwd().map_err(|e| io_to_fs(e, Path::new("."), "getcwd")),
    }
}

/// Change the current working directory. Routed (§4.3).
pub fn chdir(path: &Path) -> Result<(), FsError> {
    if ctx::in_safe_path_probe() || ctx::in_backend_op() {
        return orig::chdir(path).map_err(|e| io_to_fs(e, path, "chdir"));
    }
    match ctx::current() {
        Some(fs) => fs.chdir(path),
        None => orig::chdir(path).map_err(|e| io_to_fs(e, path, "chdir")),
    }
}

// ---------------------------------------------------------------------
// File open / low-level handle ops
// ---------------------------------------------------------------------

/// Open a file for streamed I/O. Routed (§4.3): against an active backend
/// this allocates a virtual descriptor ([`crate::fdtable`]); otherwise it's
/// a real, unbuffered `std::fs::File` — unlike the `os_*` family below,
/// this never reads a real file fully into memory.
pub fn open(path: &Path, flags: OpenFlags) -> Result<Box<dyn FileIo>, FsError> {
    if ctx::in_safe_path_probe() || ctx::in_backend_op() {
        return real_open(path, flags);
    }
    match ctx::current() {
        None => real_open(path, flags),
        Some(fs) => {
            let base: Arc<dyn Fs> = fs;
            let handle = FdTable::global().allocate(path, base, flags)?;
            Ok(Box::new(VirtualFdIo::new(handle, FdTable::global())))
        }
    }
}

fn real_open(path: &Path, flags: OpenFlags) -> Result<Box<dyn FileIo>, FsError> {
    let mut opts = std::fs::OpenOptions::new();
    opts.read(flags.read).write(flags.write).append(flags.append);
    if flags.exclusive {
        opts.create_new(true);
    } else if flags.create {
        opts.create(true);
    }
    opts.truncate(flags.truncate);
    let file = orig::open(path, &opts).map_err(|e| io_to_fs(e, path, "open"))?;
    Ok(Box::new(file))
}

/// Low-level handle open, always routed through [`FdTable`] (§4.4): against
/// a real path with nothing active, this still allocates a descriptor, just
/// backed by [`RealFs`] instead of a virtual one.
pub fn os_open(path: &Path, flags: OpenFlags) -> Result<Handle, FsError> {
    FdTable::global().allocate(path, effective_fs(), flags)
}

/// Read up to `max_len` bytes from an open handle.
pub fn os_read(handle: Handle, max_len: usize) -> Result<Vec<u8>, FsError> {
    FdTable::global().with_entry(handle, |vfd| {
        if !vfd.readable {
            return Err(FsError::PermissionDenied {
                path: vfd.path.clone(),
                operation: "read",
            });
        }
        let mut buf = vec![0u8; max_len];
        let n = vfd.buffer.read(&mut buf).unwrap_or(0);
        buf.truncate(n);
        Ok(buf)
    })
}

/// Write bytes to an open handle, returning the number of bytes written.
pub fn os_write(handle: Handle, data: &[u8]) -> Result<usize, FsError> {
    FdTable::global().with_entry(handle, |vfd| {
        if !vfd.writable {
            return Err(FsError::PermissionDenied {
                path: vfd.path.clone(),
                operation: "write",
            });
        }
        Ok(vfd.buffer.write(data).unwrap_or(0))
    })
}

/// Seek within an open handle.
pub fn os_lseek(handle: Handle, pos: SeekFrom) -> Result<u64, FsError> {
    FdTable::global().with_entry(handle, |vfd| {
        vfd.buffer.seek(pos).map_err(|e| FsError::Io {
            operation: "lseek",
            path: vfd.path.clone(),
            source: e,
        })
    })
}

/// Metadata for an open handle's path, without a fresh lookup by path.
///
/// `size` reflects the handle's live in-memory buffer rather than what's
/// currently persisted, so a writer sees its own unflushed bytes reflected
/// immediately; every other field comes from the backend's last-known
/// metadata for the path.
pub fn os_fstat(handle: Handle) -> Result<Metadata, FsError> {
    FdTable::global().with_entry(handle, |vfd| {
        let mut meta = vfd.fs.metadata(&vfd.path)?;
        meta.size = vfd.buffer.get_ref().len() as u64;
        Ok(meta)
    })
}

/// Close a handle opened via [`os_open`], flushing buffered writes.
pub fn os_close(handle: Handle) -> Result<(), FsError> {
    FdTable::global().close(handle)
}

// ---------------------------------------------------------------------
// Advisory locks — no-ops while a handle is live (§4.3).
// ---------------------------------------------------------------------

/// Acquire an advisory lock. A no-op that only checks the handle is live:
/// this crate has no cross-process lock manager, virtual or real.
pub fn lock(handle: Handle, _kind: LockType) -> Result<(), FsError> {
    require_live(handle)
}

/// Like [`lock`], but never blocks; always succeeds immediately for a live
/// handle.
pub fn try_lock(handle: Handle, _kind: LockType) -> Result<bool, FsError> {
    require_live(handle).map(|_| true)
}

/// Release an advisory lock. A no-op, like [`lock`].
pub fn unlock(handle: Handle) -> Result<(), FsError> {
    require_live(handle)
}

fn require_live(handle: Handle) -> Result<(), FsError> {
    if FdTable::global().is_virtual(handle) {
        Ok(())
    } else {
        Err(FsError::BadFileDescriptor { handle })
    }
}

// ---------------------------------------------------------------------
// Scratch files
// ---------------------------------------------------------------------

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Create a uniquely-named, already-open file under `dir`, read-write and
/// exclusive. Grounded on the source's `tempfile`-via-`VirtualFDTable`
/// pattern; uniqueness comes from a process-wide counter plus the process
/// id rather than randomness, since nothing in this crate needs
/// unpredictability, only distinctness.
pub fn mkstemp(dir: &Path, prefix: &str) -> Result<(PathBuf, Handle), FsError> {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = format!("{prefix}{}-{n}", std::process::id());
    let path = dir.join(name);
    let flags = OpenFlags {
        read: true,
        write: true,
        create: true,
        truncate: false,
        append: false,
        exclusive: true,
    };
    let handle = os_open(&path, flags)?;
    Ok((path, handle))
}

// ---------------------------------------------------------------------
// Glob
// ---------------------------------------------------------------------

/// Match files (never directories) against a shell-style glob pattern:
/// `*` (any run of characters, including `/`), `?` (any one character),
/// `[seq]`/`[!seq]` (character class, optionally negated).
///
/// `pattern` is resolved against [`getcwd`] first when relative, exactly
/// like the other path-taking functions in this module. Grounded on the
/// source's `glob()`, which matches the *whole* candidate path against the
/// whole pattern via `fnmatch.fnmatch` rather than matching component by
/// component — so `*` does cross directory separators, unlike a shell glob.
/// Results are returned relative to the same base the pattern was given in
/// (absolute in, absolute out; cwd-relative in, cwd-relative out), sorted.
pub fn glob(pattern: &Path) -> Result<Vec<PathBuf>, FsError> {
    let pattern_str = pattern.to_string_lossy();
    let absolute = pattern_str.starts_with('/');

    let cwd_prefix = {
        let cwd = getcwd()?;
        let trimmed = cwd.to_string_lossy().trim_start_matches('/').to_string();
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        }
    };

    let match_pattern = if absolute {
        pattern_str.trim_start_matches('/').to_string()
    } else {
        format!("{cwd_prefix}{pattern_str}")
    };

    let mut files = Vec::new();
    collect_files(Path::new("/"), &mut files)?;

    let mut results: Vec<PathBuf> = files
        .into_iter()
        .filter_map(|full| {
            let relative = full.trim_start_matches('/').to_string();
            if !fnmatch(&match_pattern, &relative) {
                return None;
            }
            if absolute {
                Some(PathBuf::from(format!("/{relative}")))
            } else {
                relative.strip_prefix(cwd_prefix.as_str()).map(PathBuf::from)
            }
        })
        .collect();
    results.sort();
    Ok(results)
}

fn collect_files(dir: &Path, out: &mut Vec<String>) -> Result<(), FsError> {
    for entry in read_dir(dir)? {
        let entry = entry?;
        if entry.file_type == FileType::Directory {
            collect_files(&entry.path, out)?;
        } else {
            out.push(entry.path.to_string_lossy().into_owned());
        }
    }
    Ok(())
}

/// `fnmatch`-equivalent: whole-string shell glob matching, no directory
/// awareness. Hand-rolled since nothing in this crate's dependency stack
/// offers it (the source relies on Python's `fnmatch` standard module,
/// which has no Rust stdlib counterpart).
fn fnmatch(pattern: &str, text: &str) -> bool {
    fnmatch_bytes(pattern.as_bytes(), text.as_bytes())
}

fn fnmatch_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') => {
            fnmatch_bytes(&pattern[1..], text)
                || (!text.is_empty() && fnmatch_bytes(pattern, &text[1..]))
        }
        Some(b'?') => !text.is_empty() && fnmatch_bytes(&pattern[1..], &text[1..]),
        Some(b'[') => match_class(pattern, text),
        Some(&c) => !text.is_empty() && text[0] == c && fnmatch_bytes(&pattern[1..], &text[1..]),
    }
}

fn match_class(pattern: &[u8], text: &[u8]) -> bool {
    if text.is_empty() {
        return false;
    }
    let Some(end) = pattern
        .iter()
        .skip(1)
        .position(|&b| b == b']')
        .map(|i| i + 1)
    else {
        // No closing bracket: '[' has no special meaning.
        return text[0] == b'[' && fnmatch_bytes(&pattern[1..], &text[1..]);
    };

    let mut class = &pattern[1..end];
    let negate = matches!(class.first(), Some(b'!') | Some(b'^'));
    if negate {
        class = &class[1..];
    }

    let c = text[0];
    let mut matched = false;
    let mut i = 0;
    while i < class.len() {
        if i + 2 < class.len() && class[i + 1] == b'-' {
            if class[i] <= c && c <= class[i + 2] {
                matched = true;
            }
            i += 3;
        } else {
            if class[i] == c {
                matched = true;
            }
            i += 1;
        }
    }

    matched != negate && fnmatch_bytes(&pattern[end + 1..], &text[1..])
}
