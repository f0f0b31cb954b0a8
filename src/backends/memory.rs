//! In-memory `Fs` backend (VFS).
//!
//! Grounded on `monkeyfs/virtual.py`'s `VirtualFS`: content keyed by
//! normalized path in a pluggable [`BackingStore`], metadata held
//! separately from content, directories implicit unless created through
//! `mkdir`, an optional total-byte size cap, and a backend-owned current
//! working directory. Sized bookkeeping (`_get_current_size`,
//! `_check_size_limit`) and lazy directory derivation
//! (`_ensure_dir_cache`) are reproduced as documented in this module's
//! methods; see each method's doc comment for the specific line of
//! descent.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use crate::backing_store::{decode_key, encode_key, BackingStore, MapStore, CWD_KEY, META_KEY};
use crate::markers::SelfResolving;
use crate::{
    DirEntry, FileType, FsCwd, FsDir, FsError, FsLink, FsPermissions, FsRead, FsStats, FsSync,
    FsWrite, Metadata, Permissions, ReadDirIter, StatFs,
};

/// An in-memory filesystem backed by any [`BackingStore`].
///
/// Directories are implicit (a proper prefix of some stored file's path)
/// unless explicitly created via [`FsDir::create_dir`]/`create_dir_all`,
/// in which case they carry their own metadata entry. An optional total
/// byte cap rejects writes that would push the sum of all file sizes over
/// the configured limit.
pub struct VirtualFs {
    store: Arc<dyn BackingStore>,
    metadata: Arc<RwLock<HashMap<String, Metadata>>>,
    max_size_bytes: Option<u64>,
    current_size: Arc<Mutex<Option<u64>>>,
}

impl VirtualFs {
    /// An empty, uncapped filesystem backed by the default [`MapStore`].
    pub fn new() -> Self {
        Self::with_store(Arc::new(MapStore::new()))
    }

    /// An empty, uncapped filesystem backed by a caller-supplied store.
    ///
    /// If `store` already holds a metadata blob under [`META_KEY`] (from a
    /// prior `VirtualFs` over the same durable store), it's rehydrated here
    /// rather than starting from an empty cache — mirrors `_get_metadata`'s
    /// load-on-init. Only available with the `serde` feature; without it the
    /// metadata cache is purely in-process (§1.1).
    pub fn with_store(store: Arc<dyn BackingStore>) -> Self {
        let metadata = Self::load_metadata(&store);
        Self {
            store,
            metadata: Arc::new(RwLock::new(metadata)),
            max_size_bytes: None,
            current_size: Arc::new(Mutex::new(None)),
        }
    }

    /// An empty filesystem capped at `max_size_mb` mebibytes total.
    pub fn with_size_cap(max_size_mb: u64) -> Self {
        Self::with_store_and_cap(Arc::new(MapStore::new()), max_size_mb)
    }

    /// A filesystem backed by `store`, capped at `max_size_mb` mebibytes total.
    pub fn with_store_and_cap(store: Arc<dyn BackingStore>, max_size_mb: u64) -> Self {
        let metadata = Self::load_metadata(&store);
        Self {
            store,
            metadata: Arc::new(RwLock::new(metadata)),
            max_size_bytes: Some(max_size_mb * 1024 * 1024),
            current_size: Arc::new(Mutex::new(None)),
        }
    }

    #[cfg(feature = "serde")]
    fn load_metadata(store: &Arc<dyn BackingStore>) -> HashMap<String, Metadata> {
        store
            .get(META_KEY)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    #[cfg(not(feature = "serde"))]
    fn load_metadata(_store: &Arc<dyn BackingStore>) -> HashMap<String, Metadata> {
        HashMap::new()
    }

    #[cfg(feature = "serde")]
    fn persist_metadata(&self) {
        let snapshot = self.metadata.read().unwrap();
        if let Ok(bytes) = serde_json::to_vec(&*snapshot) {
            self.store.set(META_KEY, bytes);
        }
    }

    #[cfg(not(feature = "serde"))]
    fn persist_metadata(&self) {}

    fn normalize(raw: &str) -> String {
        let replaced = raw.replace('\\', "/");
        let mut stack: Vec<&str> = Vec::new();
        for part in replaced.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    stack.pop();
                }
                other => stack.push(other),
            }
        }
        if stack.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", stack.join("/"))
        }
    }

    /// Resolve `path` against this backend's cwd into a normalized,
    /// absolute virtual path. Mirrors `resolve_path`/`_normalize_path`.
    fn resolve(&self, path: &Path) -> Result<String, FsError> {
        let raw = path.to_string_lossy();
        if raw.starts_with('/') || raw.starts_with('\\') {
            Ok(Self::normalize(&raw))
        } else {
            let cwd = self.getcwd()?;
            let joined = format!("{}/{}", cwd.display(), raw);
            Ok(Self::normalize(&joined))
        }
    }

    fn is_dir_internal(&self, path: &str) -> bool {
        if path == "/" {
            return true;
        }
        let metadata = self.metadata.read().unwrap();
        if let Some(meta) = metadata.get(path) {
            return meta.is_dir();
        }
        let prefix = format!("{path}/");
        metadata.keys().any(|k| k.starts_with(&prefix))
    }

    fn exists_internal(&self, path: &str) -> bool {
        path == "/" || self.metadata.read().unwrap().contains_key(path) || self.is_dir_internal(path)
    }

    /// Sum of every stored file's size, cached and invalidated on mutation.
    ///
    /// Mirrors `_get_current_size`'s caching: a running total recomputed
    /// from the metadata map only after a write/remove invalidates it,
    /// not on every call.
    fn current_size(&self) -> u64 {
        let mut cache = self.current_size.lock().unwrap();
        if let Some(size) = *cache {
            return size;
        }
        let total: u64 = self
            .metadata
            .read()
            .unwrap()
            .values()
            .filter(|m| m.is_file())
            .map(|m| m.size)
            .sum();
        *cache = Some(total);
        total
    }

    fn invalidate_size(&self) {
        *self.current_size.lock().unwrap() = None;
    }

    /// Check a prospective write of `new_size` bytes to `path` against the
    /// cap, accounting for the file's own existing size when it's being
    /// overwritten. Mirrors `_check_size_limit`'s
    /// `current - existing + new` formula exactly.
    fn check_size_limit(&self, path: &str, new_size: u64) -> Result<(), FsError> {
        let Some(cap) = self.max_size_bytes else {
            return Ok(());
        };
        let existing = self
            .metadata
            .read()
            .unwrap()
            .get(path)
            .filter(|m| m.is_file())
            .map(|m| m.size)
            .unwrap_or(0);
        let projected = self.current_size() - existing + new_size;
        if projected > cap {
            return Err(FsError::SizeLimitExceeded {
                requested: projected,
                limit: cap,
            });
        }
        Ok(())
    }

    fn persist(&self) {
        self.persist_metadata();
        if !crate::ctx::commits_deferred() {
            self.store.commit();
        }
    }

    fn store_file(&self, path: &str, content: Vec<u8>) -> Result<(), FsError> {
        self.check_size_limit(path, content.len() as u64)?;

        let is_new = !self
            .metadata
            .read()
            .unwrap()
            .get(path)
            .is_some_and(|m| m.is_file());
        let now = SystemTime::now();
        let size = content.len() as u64;

        self.store.set(&encode_key(path), content);

        let mut metadata = self.metadata.write().unwrap();
        let created = if is_new {
            now
        } else {
            metadata.get(path).map(|m| m.created).unwrap_or(now)
        };
        metadata.insert(
            path.to_string(),
            Metadata {
                file_type: FileType::File,
                size,
                permissions: Permissions::default_file(),
                created,
                modified: now,
                accessed: now,
                inode: 0,
                nlink: 1,
            },
        );
        drop(metadata);
        self.invalidate_size();
        self.persist();
        Ok(())
    }

    /// Shallow copy of the metadata map at this instant, for change
    /// detection across two points in time. Mirrors `get_metadata_snapshot`.
    pub fn metadata_snapshot(&self) -> HashMap<PathBuf, Metadata> {
        self.metadata
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (PathBuf::from(k), v.clone()))
            .collect()
    }
}

impl Default for VirtualFs {
    fn default() -> Self {
        Self::new()
    }
}

impl SelfResolving for VirtualFs {}

impl FsRead for VirtualFs {
    fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let resolved = self.resolve(path)?;
        self.store
            .get(&encode_key(&resolved))
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| FsError::InvalidData {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    fn read_range(&self, path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, FsError> {
        let bytes = self.read(path)?;
        let start = offset as usize;
        if start >= bytes.len() {
            return Ok(Vec::new());
        }
        let end = (start + len).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn exists(&self, path: &Path) -> Result<bool, FsError> {
        let resolved = self.resolve(path)?;
        Ok(self.exists_internal(&resolved))
    }

    fn metadata(&self, path: &Path) -> Result<Metadata, FsError> {
        let resolved = self.resolve(path)?;
        if let Some(meta) = self.metadata.read().unwrap().get(&resolved) {
            return Ok(meta.clone());
        }
        if self.is_dir_internal(&resolved) {
            return Ok(Metadata {
                file_type: FileType::Directory,
                size: 0,
                permissions: Permissions::default_dir(),
                created: SystemTime::UNIX_EPOCH,
                modified: SystemTime::UNIX_EPOCH,
                accessed: SystemTime::UNIX_EPOCH,
                inode: 0,
                nlink: 1,
            });
        }
        Err(FsError::NotFound {
            path: path.to_path_buf(),
        })
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        let bytes = self.read(path)?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

impl FsWrite for VirtualFs {
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        self.store_file(&resolved, data.to_vec())
    }

    fn append(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        let mut content = self.store.get(&encode_key(&resolved)).unwrap_or_default();
        content.extend_from_slice(data);
        self.store_file(&resolved, content)
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        let mut metadata = self.metadata.write().unwrap();
        match metadata.get(&resolved) {
            Some(m) if m.is_file() => {}
            Some(_) => {
                return Err(FsError::NotAFile {
                    path: path.to_path_buf(),
                })
            }
            None => {
                return Err(FsError::NotFound {
                    path: path.to_path_buf(),
                })
            }
        }
        metadata.remove(&resolved);
        drop(metadata);
        self.store.remove(&encode_key(&resolved));
        self.invalidate_size();
        self.persist();
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let from_resolved = self.resolve(from)?;
        let to_resolved = self.resolve(to)?;

        if !self.exists_internal(&from_resolved) {
            return Err(FsError::NotFound {
                path: from.to_path_buf(),
            });
        }

        let is_file = self
            .metadata
            .read()
            .unwrap()
            .get(&from_resolved)
            .is_some_and(|m| m.is_file());

        if is_file {
            let content = self.store.get(&encode_key(&from_resolved)).unwrap_or_default();
            self.store.remove(&encode_key(&from_resolved));
            let mut metadata = self.metadata.write().unwrap();
            let mut entry = metadata.remove(&from_resolved).unwrap();
            entry.modified = SystemTime::now();
            metadata.insert(to_resolved.clone(), entry);
            drop(metadata);
            self.store.set(&encode_key(&to_resolved), content);
        } else {
            let prefix = format!("{from_resolved}/");
            let mut metadata = self.metadata.write().unwrap();
            let keys: Vec<String> = metadata
                .keys()
                .filter(|k| *k == &from_resolved || k.starts_with(&prefix))
                .cloned()
                .collect();
            for key in keys {
                let suffix = &key[from_resolved.len()..];
                let new_key = format!("{to_resolved}{suffix}");
                if let Some(mut entry) = metadata.remove(&key) {
                    if entry.is_file() {
                        if let Some(content) = self.store.get(&encode_key(&key)) {
                            self.store.remove(&encode_key(&key));
                            self.store.set(&encode_key(&new_key), content);
                        }
                    }
                    entry.modified = SystemTime::now();
                    metadata.insert(new_key, entry);
                }
            }
        }

        self.invalidate_size();
        self.persist();
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let content = self.read(from)?;
        self.write(to, &content)
    }

    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        let mut content = self
            .store
            .get(&encode_key(&resolved))
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })?;
        content.resize(size as usize, 0);
        self.store_file(&resolved, content)
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>, FsError> {
        let resolved = self.resolve(path)?;
        Ok(Box::new(CommitOnDrop {
            store: self.store.clone(),
            metadata: self.metadata.clone(),
            current_size: self.current_size.clone(),
            path: resolved,
            buffer: Vec::new(),
        }))
    }

    fn write_many(&self, files: &[(PathBuf, Vec<u8>)]) -> Result<(), FsError> {
        let resolved: Vec<(String, &Vec<u8>)> = files
            .iter()
            .map(|(p, c)| Ok((self.resolve(p)?, c)))
            .collect::<Result<_, FsError>>()?;

        if let Some(cap) = self.max_size_bytes {
            let metadata = self.metadata.read().unwrap();
            let mut total = self.current_size();
            for (path, content) in &resolved {
                let existing = metadata
                    .get(path)
                    .filter(|m| m.is_file())
                    .map(|m| m.size)
                    .unwrap_or(0);
                total = total - existing + content.len() as u64;
            }
            drop(metadata);
            if total > cap {
                return Err(FsError::SizeLimitExceeded {
                    requested: total,
                    limit: cap,
                });
            }
        }

        for (path, content) in resolved {
            self.store_file(&path, content.clone())?;
        }
        Ok(())
    }

    fn remove_many(&self, paths: &[PathBuf]) -> Result<(), FsError> {
        for path in paths {
            self.remove_file(path)?;
        }
        Ok(())
    }

    fn set_times(&self, path: &Path, times: Option<(SystemTime, SystemTime)>) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        let (accessed, modified) = times.unwrap_or_else(|| {
            let now = SystemTime::now();
            (now, now)
        });

        let mut metadata = self.metadata.write().unwrap();
        if let Some(entry) = metadata.get_mut(&resolved) {
            entry.accessed = accessed;
            entry.modified = modified;
            drop(metadata);
            self.persist();
            return Ok(());
        }

        if self.is_dir_internal(&resolved) {
            metadata.insert(
                resolved,
                Metadata {
                    file_type: FileType::Directory,
                    size: 0,
                    permissions: Permissions::default_dir(),
                    created: accessed,
                    modified,
                    accessed,
                    inode: 0,
                    nlink: 1,
                },
            );
            drop(metadata);
            self.persist();
            return Ok(());
        }

        Err(FsError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// A `Write` sink returned by [`VirtualFs::open_write`]; its buffered
/// bytes replace the file's content when dropped.
struct CommitOnDrop {
    store: Arc<dyn BackingStore>,
    metadata: Arc<RwLock<HashMap<String, Metadata>>>,
    current_size: Arc<Mutex<Option<u64>>>,
    path: String,
    buffer: Vec<u8>,
}

impl Write for CommitOnDrop {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for CommitOnDrop {
    fn drop(&mut self) {
        let now = SystemTime::now();
        let size = self.buffer.len() as u64;
        self.store.set(&encode_key(&self.path), std::mem::take(&mut self.buffer));
        let mut metadata = self.metadata.write().unwrap();
        let created = metadata.get(&self.path).map(|m| m.created).unwrap_or(now);
        metadata.insert(
            self.path.clone(),
            Metadata {
                file_type: FileType::File,
                size,
                permissions: Permissions::default_file(),
                created,
                modified: now,
                accessed: now,
                inode: 0,
                nlink: 1,
            },
        );
        *self.current_size.lock().unwrap() = None;
        self.store.commit();
    }
}

impl FsDir for VirtualFs {
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        let resolved = self.resolve(path)?;

        if self
            .metadata
            .read()
            .unwrap()
            .get(&resolved)
            .is_some_and(|m| m.is_file())
        {
            return Err(FsError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        if !self.is_dir_internal(&resolved) {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let prefix = if resolved == "/" {
            String::new()
        } else {
            format!("{resolved}/")
        };

        let metadata = self.metadata.read().unwrap();
        let mut children: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
        for key in metadata.keys() {
            if *key == resolved {
                continue;
            }
            let remainder = if resolved == "/" {
                key.strip_prefix('/')
            } else {
                key.strip_prefix(&prefix)
            };
            let Some(remainder) = remainder else { continue };
            if remainder.is_empty() {
                continue;
            }
            let first = remainder.split('/').next().unwrap();
            children.insert(first.to_string());
        }

        let mut entries = Vec::with_capacity(children.len());
        for name in children {
            let child_path = if resolved == "/" {
                format!("/{name}")
            } else {
                format!("{resolved}/{name}")
            };
            let (file_type, size) = match metadata.get(&child_path) {
                Some(m) => (m.file_type, m.size),
                None => (FileType::Directory, 0),
            };
            entries.push(Ok(DirEntry {
                name,
                path: PathBuf::from(&child_path),
                file_type,
                size,
                inode: 0,
            }));
        }
        drop(metadata);

        Ok(ReadDirIter::from_vec(entries))
    }

    fn read_dir_recursive(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        let resolved = self.resolve(path)?;

        if self
            .metadata
            .read()
            .unwrap()
            .get(&resolved)
            .is_some_and(|m| m.is_file())
        {
            return Err(FsError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        if !self.is_dir_internal(&resolved) {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let prefix = if resolved == "/" {
            String::new()
        } else {
            format!("{resolved}/")
        };

        let metadata = self.metadata.read().unwrap();
        let mut descendants: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
        for key in metadata.keys() {
            if *key == resolved {
                continue;
            }
            let remainder = if resolved == "/" {
                key.strip_prefix('/')
            } else {
                key.strip_prefix(&prefix)
            };
            let Some(remainder) = remainder else { continue };
            if remainder.is_empty() {
                continue;
            }
            let mut built = String::new();
            for part in remainder.split('/') {
                if !built.is_empty() {
                    built.push('/');
                }
                built.push_str(part);
                descendants.insert(built.clone());
            }
        }

        let mut entries = Vec::with_capacity(descendants.len());
        for rel in descendants {
            let full_path = format!("{prefix}{rel}");
            let (file_type, size) = match metadata.get(&full_path) {
                Some(m) => (m.file_type, m.size),
                None => (FileType::Directory, 0),
            };
            let name = rel.rsplit('/').next().unwrap().to_string();
            entries.push(Ok(DirEntry {
                name,
                path: PathBuf::from(&full_path),
                file_type,
                size,
                inode: 0,
            }));
        }
        drop(metadata);

        Ok(ReadDirIter::from_vec(entries))
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        if self.exists_internal(&resolved) {
            return Err(FsError::AlreadyExists {
                path: path.to_path_buf(),
                operation: "create_dir",
            });
        }
        let parent = parent_of(&resolved);
        if !self.is_dir_internal(&parent) {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let now = SystemTime::now();
        self.metadata.write().unwrap().insert(
            resolved,
            Metadata {
                file_type: FileType::Directory,
                size: 0,
                permissions: Permissions::default_dir(),
                created: now,
                modified: now,
                accessed: now,
                inode: 0,
                nlink: 1,
            },
        );
        self.persist();
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        let components: Vec<&str> = resolved.trim_start_matches('/').split('/').collect();
        let mut built = String::new();
        for component in components {
            if component.is_empty() {
                continue;
            }
            built.push('/');
            built.push_str(component);
            if !self.exists_internal(&built) {
                let now = SystemTime::now();
                self.metadata.write().unwrap().insert(
                    built.clone(),
                    Metadata {
                        file_type: FileType::Directory,
                        size: 0,
                        permissions: Permissions::default_dir(),
                        created: now,
                        modified: now,
                        accessed: now,
                        inode: 0,
                        nlink: 1,
                    },
                );
            }
        }
        self.persist();
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        if self
            .metadata
            .read()
            .unwrap()
            .get(&resolved)
            .is_some_and(|m| m.is_file())
        {
            return Err(FsError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        if !self.is_dir_internal(&resolved) {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let prefix = format!("{resolved}/");
        let has_children = self
            .metadata
            .read()
            .unwrap()
            .keys()
            .any(|k| k.starts_with(&prefix));
        if has_children {
            return Err(FsError::DirectoryNotEmpty {
                path: path.to_path_buf(),
            });
        }
        self.metadata.write().unwrap().remove(&resolved);
        self.persist();
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        if !self.is_dir_internal(&resolved) {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let prefix = format!("{resolved}/");
        let mut metadata = self.metadata.write().unwrap();
        let keys: Vec<String> = metadata
            .keys()
            .filter(|k| *k == &resolved || k.starts_with(&prefix))
            .cloned()
            .collect();
        for key in keys {
            if metadata.get(&key).is_some_and(|m| m.is_file()) {
                self.store.remove(&encode_key(&key));
            }
            metadata.remove(&key);
        }
        drop(metadata);
        self.invalidate_size();
        self.persist();
        Ok(())
    }
}

fn parent_of(resolved: &str) -> String {
    match resolved.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => resolved[..idx].to_string(),
        None => "/".to_string(),
    }
}

impl FsCwd for VirtualFs {
    fn getcwd(&self) -> Result<PathBuf, FsError> {
        let cwd = self
            .store
            .get(CWD_KEY)
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| "/".to_string());
        Ok(PathBuf::from(cwd))
    }

    fn chdir(&self, path: &Path) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        if !self.is_dir_internal(&resolved) {
            return if self.metadata.read().unwrap().contains_key(&resolved) {
                Err(FsError::NotADirectory {
                    path: path.to_path_buf(),
                })
            } else {
                Err(FsError::NotFound {
                    path: path.to_path_buf(),
                })
            };
        }
        self.store.set(CWD_KEY, resolved.into_bytes());
        self.persist();
        Ok(())
    }
}

impl FsLink for VirtualFs {
    fn symlink(&self, _target: &Path, _link: &Path) -> Result<(), FsError> {
        Err(FsError::NotImplementedByBackend {
            backend: "VirtualFs",
            operation: "symlink",
        })
    }

    /// Implemented as a content copy: the in-memory backend has no inode
    /// concept for two paths to share, so a "hard link" here is simply a
    /// second file with the same bytes at the time of linking (later
    /// writes to one do not propagate to the other).
    fn hard_link(&self, original: &Path, link: &Path) -> Result<(), FsError> {
        let content = self.read(original)?;
        self.write(link, &content)
    }

    fn read_link(&self, _path: &Path) -> Result<PathBuf, FsError> {
        Err(FsError::NotImplementedByBackend {
            backend: "VirtualFs",
            operation: "read_link",
        })
    }

    fn symlink_metadata(&self, path: &Path) -> Result<Metadata, FsError> {
        self.metadata(path)
    }
}

impl FsPermissions for VirtualFs {
    fn set_permissions(&self, path: &Path, _perm: Permissions) -> Result<(), FsError> {
        if self.exists(path)? {
            Ok(())
        } else {
            Err(FsError::NotFound {
                path: path.to_path_buf(),
            })
        }
    }
}

impl FsSync for VirtualFs {
    fn sync(&self) -> Result<(), FsError> {
        self.store.commit();
        Ok(())
    }

    fn fsync(&self, _path: &Path) -> Result<(), FsError> {
        self.store.commit();
        Ok(())
    }
}

impl FsStats for VirtualFs {
    fn statfs(&self) -> Result<StatFs, FsError> {
        let used = self.current_size();
        let total = self.max_size_bytes.unwrap_or(0);
        Ok(StatFs {
            total_bytes: total,
            used_bytes: used,
            available_bytes: total.saturating_sub(used),
            total_inodes: 0,
            used_inodes: self.metadata.read().unwrap().len() as u64,
            available_inodes: 0,
            block_size: 4096,
            max_name_len: 255,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"hello").unwrap();
        assert_eq!(fs.read(Path::new("/a.txt")).unwrap(), b"hello");
        assert_eq!(fs.metadata(Path::new("/a.txt")).unwrap().size, 5);
    }

    #[test]
    fn write_creates_implicit_parent_dirs() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a/b/c.txt"), b"x").unwrap();
        assert!(fs.exists(Path::new("/a")).unwrap());
        assert!(fs.exists(Path::new("/a/b")).unwrap());
        assert!(fs.metadata(Path::new("/a")).unwrap().is_dir());
    }

    #[test]
    fn overwrite_preserves_created_updates_modified() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"v1").unwrap();
        let first = fs.metadata(Path::new("/a.txt")).unwrap();
        fs.write(Path::new("/a.txt"), b"v2-longer").unwrap();
        let second = fs.metadata(Path::new("/a.txt")).unwrap();
        assert_eq!(first.created, second.created);
        assert!(second.modified >= first.modified);
        assert_eq!(second.size, 9);
    }

    #[test]
    fn remove_file_then_not_found() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"x").unwrap();
        fs.remove_file(Path::new("/a.txt")).unwrap();
        assert!(!fs.exists(Path::new("/a.txt")).unwrap());
        assert!(matches!(
            fs.read(Path::new("/a.txt")).unwrap_err(),
            FsError::NotFound { .. }
        ));
    }

    #[test]
    fn list_directory_one_level_deep() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/dir/a.txt"), b"1").unwrap();
        fs.write(Path::new("/dir/sub/b.txt"), b"2").unwrap();
        let entries = fs.read_dir(Path::new("/dir")).unwrap().collect_all().unwrap();
        let mut names: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "sub".to_string()]);
    }

    #[test]
    fn list_file_is_not_a_directory_error() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"1").unwrap();
        assert!(matches!(
            fs.read_dir(Path::new("/a.txt")).unwrap_err(),
            FsError::NotADirectory { .. }
        ));
    }

    #[test]
    fn mkdir_requires_existing_parent() {
        let fs = VirtualFs::new();
        assert!(matches!(
            fs.create_dir(Path::new("/a/b")).unwrap_err(),
            FsError::NotFound { .. }
        ));
        fs.create_dir(Path::new("/a")).unwrap();
        fs.create_dir(Path::new("/a/b")).unwrap();
        assert!(fs.exists(Path::new("/a/b")).unwrap());
    }

    #[test]
    fn rmdir_rejects_non_empty() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a/b.txt"), b"1").unwrap();
        assert!(matches!(
            fs.remove_dir(Path::new("/a")).unwrap_err(),
            FsError::DirectoryNotEmpty { .. }
        ));
    }

    #[test]
    fn rename_file_moves_content_and_metadata() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"x").unwrap();
        fs.rename(Path::new("/a.txt"), Path::new("/b.txt")).unwrap();
        assert!(!fs.exists(Path::new("/a.txt")).unwrap());
        assert_eq!(fs.read(Path::new("/b.txt")).unwrap(), b"x");
    }

    #[test]
    fn rename_directory_moves_whole_subtree() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/dir/a.txt"), b"1").unwrap();
        fs.write(Path::new("/dir/sub/b.txt"), b"2").unwrap();
        fs.rename(Path::new("/dir"), Path::new("/moved")).unwrap();
        assert_eq!(fs.read(Path::new("/moved/a.txt")).unwrap(), b"1");
        assert_eq!(fs.read(Path::new("/moved/sub/b.txt")).unwrap(), b"2");
        assert!(!fs.exists(Path::new("/dir")).unwrap());
    }

    #[test]
    fn size_cap_rejects_over_budget_write() {
        let fs = VirtualFs::with_size_cap(0);
        assert!(matches!(
            fs.write(Path::new("/a.txt"), b"x").unwrap_err(),
            FsError::SizeLimitExceeded { .. }
        ));
    }

    #[test]
    fn size_cap_accounts_for_overwrite_of_same_file() {
        let fs = VirtualFs::with_store_and_cap(Arc::new(MapStore::new()), 0);
        // A zero-byte write to a zero-cap VFS is allowed (0 <= 0).
        fs.write(Path::new("/a.txt"), b"").unwrap();
        fs.write(Path::new("/a.txt"), b"").unwrap();
    }

    #[test]
    fn write_many_is_all_or_nothing_against_cap() {
        let fs = VirtualFs::with_size_cap(0);
        let files = vec![(PathBuf::from("/a.txt"), b"x".to_vec())];
        assert!(fs.write_many(&files).is_err());
        assert!(!fs.exists(Path::new("/a.txt")).unwrap());
    }

    #[test]
    fn chdir_then_relative_writes_resolve_against_it() {
        let fs = VirtualFs::new();
        fs.create_dir(Path::new("/work")).unwrap();
        fs.chdir(Path::new("/work")).unwrap();
        fs.write(Path::new("rel.txt"), b"x").unwrap();
        assert_eq!(fs.read(Path::new("/work/rel.txt")).unwrap(), b"x");
    }

    #[test]
    fn symlink_and_read_link_are_not_implemented() {
        let fs = VirtualFs::new();
        assert!(matches!(
            fs.symlink(Path::new("/a"), Path::new("/b")).unwrap_err(),
            FsError::NotImplementedByBackend { .. }
        ));
        assert!(matches!(
            fs.read_link(Path::new("/a")).unwrap_err(),
            FsError::NotImplementedByBackend { .. }
        ));
    }

    #[test]
    fn hard_link_copies_content() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"x").unwrap();
        fs.hard_link(Path::new("/a.txt"), Path::new("/b.txt")).unwrap();
        assert_eq!(fs.read(Path::new("/b.txt")).unwrap(), b"x");
    }

    #[test]
    fn metadata_snapshot_is_a_shallow_copy() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"x").unwrap();
        let snapshot = fs.metadata_snapshot();
        fs.write(Path::new("/b.txt"), b"y").unwrap();
        assert!(snapshot.contains_key(Path::new("/a.txt")));
        assert!(!snapshot.contains_key(Path::new("/b.txt")));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn metadata_rehydrates_from_a_shared_durable_store() {
        let store: Arc<dyn BackingStore> = Arc::new(MapStore::new());
        let first = VirtualFs::with_store(store.clone());
        first.write(Path::new("/a.txt"), b"hello").unwrap();
        drop(first);

        let second = VirtualFs::with_store(store);
        assert!(second.exists(Path::new("/a.txt")).unwrap());
        assert_eq!(second.read(Path::new("/a.txt")).unwrap(), b"hello");
        assert_eq!(second.metadata(Path::new("/a.txt")).unwrap().size, 5);
    }

    #[cfg(not(feature = "serde"))]
    #[test]
    fn metadata_does_not_rehydrate_without_the_serde_feature() {
        let store: Arc<dyn BackingStore> = Arc::new(MapStore::new());
        let first = VirtualFs::with_store(store.clone());
        first.write(Path::new("/a.txt"), b"hello").unwrap();
        drop(first);

        let second = VirtualFs::with_store(store);
        assert!(!second.exists(Path::new("/a.txt")).unwrap());
    }

    #[test]
    fn read_dir_recursive_includes_nested_files_and_dirs() {
        let fs = VirtualFs::new();
        fs.create_dir(Path::new("/a")).unwrap();
        fs.write(Path::new("/a/one.txt"), b"1").unwrap();
        fs.create_dir(Path::new("/a/b")).unwrap();
        fs.write(Path::new("/a/b/two.txt"), b"2").unwrap();

        let names: std::collections::BTreeSet<String> = fs
            .read_dir_recursive(Path::new("/a"))
            .unwrap()
            .map(|e| e.unwrap().path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            std::collections::BTreeSet::from([
                "/a/one.txt".to_string(),
                "/a/b".to_string(),
                "/a/b/two.txt".to_string(),
            ])
        );
    }

    #[test]
    fn read_dir_recursive_on_file_is_not_a_directory() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"x").unwrap();
        assert!(matches!(
            fs.read_dir_recursive(Path::new("/a.txt")).unwrap_err(),
            FsError::NotADirectory { .. }
        ));
    }

    #[test]
    fn remove_many_removes_every_file() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"1").unwrap();
        fs.write(Path::new("/b.txt"), b"2").unwrap();
        fs.remove_many(&[PathBuf::from("/a.txt"), PathBuf::from("/b.txt")])
            .unwrap();
        assert!(!fs.exists(Path::new("/a.txt")).unwrap());
        assert!(!fs.exists(Path::new("/b.txt")).unwrap());
    }

    #[test]
    fn set_times_updates_an_existing_file() {
        let fs = VirtualFs::new();
        fs.write(Path::new("/a.txt"), b"x").unwrap();
        let stamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000);
        fs.set_times(Path::new("/a.txt"), Some((stamp, stamp)))
            .unwrap();
        let meta = fs.metadata(Path::new("/a.txt")).unwrap();
        assert_eq!(meta.modified, stamp);
        assert_eq!(meta.accessed, stamp);
    }

    #[test]
    fn set_times_on_missing_path_is_not_found() {
        let fs = VirtualFs::new();
        assert!(matches!(
            fs.set_times(Path::new("/missing.txt"), None).unwrap_err(),
            FsError::NotFound { .. }
        ));
    }
}
