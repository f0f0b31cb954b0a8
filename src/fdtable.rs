//! Virtual descriptor table (FDTAB).
//!
//! Emulates integer file descriptors against an active `Fs`, entirely in
//! process memory: allocation, positioned reads/writes, and close-time
//! flush. Grounded on `monkeyfs/patching/fdtable.py`'s `VirtualFDTable`/
//! `VirtualFD`, and structurally templated on the teacher's
//! `fs_handles.rs` test fixture (`MockHandleFs`), which already shows the
//! `RwLock<HashMap<handle, open-file>>` + monotonically increasing counter
//! shape this table uses.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, OnceLock};
use std::path::PathBuf;

use crate::{Fs, FsError, Handle, OpenFlags};

/// First handle value this table ever allocates. Chosen far above any
/// plausible real kernel fd so virtual and real descriptors never collide
/// (mirrors the source's `_BASE_FD = 10_000`).
pub const BASE_HANDLE: u64 = 10_000;

/// An open virtual file: its backing path, the `Fs` it belongs to, an
/// in-memory seekable buffer, and the bits that govern how close behaves.
pub(crate) struct VirtualFd {
    pub(crate) path: PathBuf,
    pub(crate) fs: Arc<dyn Fs>,
    pub(crate) buffer: Cursor<Vec<u8>>,
    pub(crate) readable: bool,
    pub(crate) writable: bool,
}

/// The table of currently open virtual descriptors.
pub struct FdTable {
    next: Mutex<u64>,
    entries: Mutex<HashMap<u64, VirtualFd>>,
}

static GLOBAL: OnceLock<FdTable> = OnceLock::new();

impl FdTable {
    fn new() -> Self {
        Self {
            next: Mutex::new(BASE_HANDLE),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide table backing [`crate::fsroute`]'s `os_*` functions.
    pub fn global() -> &'static FdTable {
        GLOBAL.get_or_init(FdTable::new)
    }

    /// True if `handle` currently refers to an open virtual descriptor.
    pub fn is_virtual(&self, handle: Handle) -> bool {
        self.entries.lock().unwrap().contains_key(&handle.0)
    }

    /// Open `path` against `fs` under `flags`, allocating a new handle.
    ///
    /// Implements the algorithm in source order: reject `CREATE|EXCLUSIVE`
    /// against an existing file, reject a missing file without `CREATE`,
    /// load existing bytes unless `TRUNCATE`, position at end for
    /// `APPEND`, auto-create parent directories and an empty file on
    /// `CREATE` of a previously-absent path, then assign the handle.
    pub fn allocate(&self, path: &std::path::Path, fs: Arc<dyn Fs>, flags: OpenFlags) -> Result<Handle, FsError> {
        let exists = fs.exists(path)?;

        if flags.create && flags.exclusive && exists {
            return Err(FsError::AlreadyExists {
                path: path.to_path_buf(),
                operation: "open",
            });
        }
        if !flags.create && !exists {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let mut buffer = if exists && !flags.truncate {
            let bytes = fs.read(path)?;
            Cursor::new(bytes)
        } else {
            Cursor::new(Vec::new())
        };

        if flags.create && !exists {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && parent != std::path::Path::new("/") {
                    let _guard = crate::ctx::enter_backend_op();
                    fs.create_dir_all(parent)?;
                }
            }
            let _guard = crate::ctx::enter_backend_op();
            fs.write(path, &[])?;
        }

        if flags.append {
            let end = buffer.get_ref().len() as u64;
            buffer.set_position(end);
        } else {
            buffer.set_position(0);
        }

        let vfd = VirtualFd {
            path: path.to_path_buf(),
            fs,
            buffer,
            readable: flags.read,
            writable: flags.write,
        };

        let mut next = self.next.lock().unwrap();
        let handle = *next;
        *next += 1;
        drop(next);

        self.entries.lock().unwrap().insert(handle, vfd);
        tracing::trace!(handle, path = %path.display(), "virtual fd allocated");
        Ok(Handle(handle))
    }

    pub(crate) fn with_entry<T>(
        &self,
        handle: Handle,
        f: impl FnOnce(&mut VirtualFd) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let mut entries = self.entries.lock().unwrap();
        let vfd = entries
            .get_mut(&handle.0)
            .ok_or(FsError::BadFileDescriptor { handle })?;
        f(vfd)
    }

    /// Close `handle`: remove it from the table and, if it was opened
    /// writable, flush its full buffer to the backend at its virtual path.
    ///
    /// Unlike the source (which leaves a `closed = true` marker behind and
    /// treats a second close as a no-op), this table fully removes the
    /// entry on first close, so any later close of the same handle —
    /// whether truly never-allocated or already closed — uniformly fails
    /// with [`FsError::BadFileDescriptor`]. This matches the simpler
    /// "double-close fails `BadFileDescriptor`" contract this crate
    /// documents (§7) rather than the source's no-op-on-redundant-close
    /// behavior.
    pub fn close(&self, handle: Handle) -> Result<(), FsError> {
        let vfd = self
            .entries
            .lock()
            .unwrap()
            .remove(&handle.0)
            .ok_or(FsError::BadFileDescriptor { handle })?;

        if vfd.writable {
            let _guard = crate::ctx::enter_backend_op();
            vfd.fs.write(&vfd.path, vfd.buffer.get_ref())?;
        }
        tracing::trace!(handle = handle.0, "virtual fd closed");
        Ok(())
    }
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::VirtualFs;
    use std::path::Path;

    fn vfs() -> Arc<dyn Fs> {
        Arc::new(VirtualFs::new())
    }

    #[test]
    fn allocate_create_then_close_persists_content() {
        let table = FdTable::default();
        let fs = vfs();
        let handle = table
            .allocate(Path::new("/a.txt"), fs.clone(), OpenFlags::WRITE)
            .unwrap();
        table
            .with_entry(handle, |vfd| {
                use std::io::Write;
                vfd.buffer.write_all(b"hello").unwrap();
                Ok(())
            })
            .unwrap();
        table.close(handle).unwrap();
        assert_eq!(fs.read(Path::new("/a.txt")).unwrap(), b"hello");
    }

    #[test]
    fn open_missing_without_create_fails() {
        let table = FdTable::default();
        let fs = vfs();
        let err = table
            .allocate(Path::new("/missing.txt"), fs, OpenFlags::READ)
            .unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn create_exclusive_on_existing_fails() {
        let table = FdTable::default();
        let fs = vfs();
        fs.write(Path::new("/a.txt"), b"x").unwrap();
        let err = table
            .allocate(Path::new("/a.txt"), fs, OpenFlags::CREATE_NEW)
            .unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists { .. }));
    }

    #[test]
    fn double_close_fails_bad_file_descriptor() {
        let table = FdTable::default();
        let fs = vfs();
        let handle = table
            .allocate(Path::new("/a.txt"), fs, OpenFlags::WRITE)
            .unwrap();
        table.close(handle).unwrap();
        let err = table.close(handle).unwrap_err();
        assert!(matches!(err, FsError::BadFileDescriptor { .. }));
    }

    #[test]
    fn read_only_close_does_not_write() {
        let table = FdTable::default();
        let fs = vfs();
        fs.write(Path::new("/a.txt"), b"orig").unwrap();
        let handle = table
            .allocate(Path::new("/a.txt"), fs.clone(), OpenFlags::READ)
            .unwrap();
        table.close(handle).unwrap();
        assert_eq!(fs.read(Path::new("/a.txt")).unwrap(), b"orig");
    }

    #[test]
    fn handles_start_above_base() {
        let table = FdTable::default();
        let fs = vfs();
        let handle = table
            .allocate(Path::new("/a.txt"), fs, OpenFlags::WRITE)
            .unwrap();
        assert!(handle.0 >= BASE_HANDLE);
    }
}
