//! Original-primitive registry (ORIG).
//!
//! Rust gives no reflective rebind of `std::fs`/`std::env` the way the
//! source's `patching/core.py` snapshots a `_originals` dict of builtins
//! before patching them: there's nothing to snapshot, since `std::fs::*`
//! is always reachable by its ordinary name. What this module preserves
//! from the source's design is the *seam*: [`crate::fsroute`] never spells
//! `std::fs::…`/`std::env::…` directly, it calls through here, so every
//! "what does pass-through actually do" question has one answer.
//!
//! Reduced from `_originals`' exhaustive builtin list (`open`, `listdir`,
//! `remove`, `stat`, `lstat`, `exists`, `realpath`, `scandir`, `getcwd`,
//! `chdir`, `expanduser`, `getenv`, `expandvars`, `readlink`, `symlink`,
//! `link`, `chmod`, `truncate`, plus low-level `os_open`/`os_read`/
//! `os_write`/`os_close`/`os_fstat`/`os_lseek`) to what a Rust `fsroute`
//! actually needs against `std::fs`/`std::env`/`std::path`. `utime` is kept
//! as [`set_times`].

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

pub(crate) fn read(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}

pub(crate) fn read_to_string(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

pub(crate) fn write(path: &Path, data: &[u8]) -> io::Result<()> {
    fs::write(path, data)
}

pub(crate) fn open(path: &Path, options: &OpenOptions) -> io::Result<File> {
    options.open(path)
}

pub(crate) fn remove_file(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

pub(crate) fn rename(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

pub(crate) fn copy(from: &Path, to: &Path) -> io::Result<u64> {
    fs::copy(from, to)
}

pub(crate) fn create_dir(path: &Path) -> io::Result<()> {
    fs::create_dir(path)
}

pub(crate) fn create_dir_all(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

pub(crate) fn remove_dir(path: &Path) -> io::Result<()> {
    fs::remove_dir(path)
}

pub(crate) fn remove_dir_all(path: &Path) -> io::Result<()> {
    fs::remove_dir_all(path)
}

pub(crate) fn read_dir(path: &Path) -> io::Result<fs::ReadDir> {
    fs::read_dir(path)
}

pub(crate) fn metadata(path: &Path) -> io::Result<fs::Metadata> {
    fs::metadata(path)
}

pub(crate) fn symlink_metadata(path: &Path) -> io::Result<fs::Metadata> {
    fs::symlink_metadata(path)
}

pub(crate) fn canonicalize(path: &Path) -> io::Result<PathBuf> {
    fs::canonicalize(path)
}

pub(crate) fn exists(path: &Path) -> bool {
    path.exists()
}

pub(crate) fn read_link(path: &Path) -> io::Result<PathBuf> {
    fs::read_link(path)
}

#[cfg(unix)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

pub(crate) fn hard_link(original: &Path, link: &Path) -> io::Result<()> {
    fs::hard_link(original, link)
}

pub(crate) fn set_permissions(path: &Path, perms: fs::Permissions) -> io::Result<()> {
    fs::set_permissions(path, perms)
}

/// `utime`-equivalent: set a path's access/modification times, or both to
/// now when `times` is `None`.
pub(crate) fn set_times(
    path: &Path,
    times: Option<(std::time::SystemTime, std::time::SystemTime)>,
) -> io::Result<()> {
    let now = std::time::SystemTime::now();
    let (accessed, modified) = times.unwrap_or((now, now));
    let file_times = fs::FileTimes::new()
        .set_accessed(accessed)
        .set_modified(modified);
    File::options().read(true).open(path)?.set_times(file_times)
}

pub(crate) fn getcwd() -> io::Result<PathBuf> {
    std::env::current_dir()
}

pub(crate) fn chdir(path: &Path) -> io::Result<()> {
    std::env::set_current_dir(path)
}

pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

pub(crate) fn getenv(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Translate a `std::fs::Metadata`/`std::fs::FileType` pair into this
/// crate's [`crate::Metadata`], shared by any backend (chiefly
/// `IsolatedFs`) that wraps real filesystem entries.
pub(crate) fn std_to_metadata(meta: &fs::Metadata) -> crate::Metadata {
    use crate::{FileType, Permissions};

    let file_type = if meta.is_dir() {
        FileType::Directory
    } else if meta.file_type().is_symlink() {
        FileType::Symlink
    } else {
        FileType::File
    };

    #[cfg(unix)]
    let mode = {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode()
    };
    #[cfg(not(unix))]
    let mode = if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    };

    #[cfg(unix)]
    let nlink = {
        use std::os::unix::fs::MetadataExt;
        meta.nlink()
    };
    #[cfg(not(unix))]
    let nlink = 1;

    #[cfg(unix)]
    let inode = {
        use std::os::unix::fs::MetadataExt;
        meta.ino()
    };
    #[cfg(not(unix))]
    let inode = 0;

    crate::Metadata {
        file_type,
        size: meta.len(),
        permissions: Permissions::from_mode(mode),
        created: meta.created().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        modified: meta
            .modified()
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        accessed: meta
            .accessed()
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        inode,
        nlink,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        write(&path, b"hi").unwrap();
        assert_eq!(read(&path).unwrap(), b"hi");
    }

    #[test]
    fn std_to_metadata_reports_size_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        write(&path, b"hello").unwrap();
        let meta = metadata(&path).unwrap();
        let converted = std_to_metadata(&meta);
        assert_eq!(converted.size, 5);
        assert!(converted.is_file());
    }

    #[test]
    fn getcwd_returns_existing_dir() {
        let cwd = getcwd().unwrap();
        assert!(cwd.exists());
    }
}
