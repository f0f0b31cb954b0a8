//! Raw/buffered/text adapter (RAWIO).
//!
//! Presents a virtual descriptor to ordinary `std::io` consumers. Grounded
//! on `monkeyfs/patching/fdtable.py`'s `VirtualFDRawIO`, which wraps a
//! `(fd, table)` pair and delegates `readinto`/`write`/`seek` to the
//! looked-up `VirtualFD`'s buffer, and on the teacher's handle-based
//! pattern in `fs_handles.rs`, generalized here into a standalone adapter
//! rather than only trait methods, since `fsroute::open` needs to hand
//! callers something that implements `Read + Write + Seek` directly.
//!
//! Unlike the source, where closing the `RawIO` object itself triggers the
//! table-level flush-and-remove, this adapter requires an explicit
//! [`VirtualFdIo::close`] call: `std::io::Write`/`Read`/`Seek` carry no
//! `close()` of their own, and a `Drop`-triggered flush could silently eat
//! the error a close can produce (an I/O failure writing the buffer back
//! to the backend). Callers that forget to close simply leak the
//! descriptor from the table until the process exits, which is the same
//! trade `std::fs::File` makes for its own `sync_all`/error-on-drop story.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::{FdTable, FsError, Handle};

/// An open virtual file descriptor exposed as `Read + Write + Seek`.
pub struct VirtualFdIo {
    handle: Handle,
    table: &'static FdTable,
}

impl VirtualFdIo {
    /// Wrap an already-allocated `handle` from `table`.
    pub fn new(handle: Handle, table: &'static FdTable) -> Self {
        Self { handle, table }
    }

    /// The wrapped handle, e.g. for `fsroute::os_close`.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Close the underlying virtual descriptor, flushing buffered writes.
    pub fn close(self) -> Result<(), FsError> {
        self.table.close(self.handle)
    }
}

impl Read for VirtualFdIo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.table
            .with_entry(self.handle, |vfd| {
                if !vfd.readable {
                    return Err(FsError::PermissionDenied {
                        path: vfd.path.clone(),
                        operation: "read",
                    });
                }
                Ok(vfd.buffer.read(buf).unwrap_or(0))
            })
            .map_err(io::Error::from)
    }
}

impl Write for VirtualFdIo {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.table
            .with_entry(self.handle, |vfd| {
                if !vfd.writable {
                    return Err(FsError::PermissionDenied {
                        path: vfd.path.clone(),
                        operation: "write",
                    });
                }
                Ok(vfd.buffer.write(buf).unwrap_or(0))
            })
            .map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for VirtualFdIo {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.table
            .with_entry(self.handle, |vfd| {
                vfd.buffer.seek(pos).map_err(|e| FsError::Io {
                    operation: "seek",
                    path: vfd.path.clone(),
                    source: e,
                })
            })
            .map_err(io::Error::from)
    }
}
