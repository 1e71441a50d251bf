//! Snapshot-file store shared between processes
//!
//! Every call takes an advisory `flock` on `<snapshot>.lock`, loads the
//! snapshot, applies itself to a [`MemoryStore`] and, for writes, saves the
//! result before the lock is released. Processes pointed at the same file see
//! each other's writes at once and never write back a stale copy.
//!
//! Reads share the lock; writes and [`FileStore::transaction`] hold it
//! exclusively.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::{Entity, EntityStore, MemoryStore, StoreError, StoreResult};
use crate::ids::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Held `flock` on a snapshot's lock file; released on drop.
struct SnapshotLock {
    file: File,
}

impl SnapshotLock {
    fn acquire(snapshot: &Path, mode: LockMode) -> StoreResult<Self> {
        let path = lock_path(snapshot);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::Io(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let op = match mode {
                LockMode::Shared => libc::LOCK_SH,
                LockMode::Exclusive => libc::LOCK_EX,
            };
            // SAFETY: `file` owns a valid descriptor for the duration of the call.
            let result = unsafe { libc::flock(file.as_raw_fd(), op) };
            if result != 0 {
                let err = std::io::Error::last_os_error();
                return Err(StoreError::Unavailable(format!(
                    "cannot lock {}: {err}",
                    path.display()
                )));
            }
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(Self { file })
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            // SAFETY: the descriptor is still owned by `self.file`.
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
        // The lock file stays: removing it would let a waiter lock a dead inode.
    }
}

fn lock_path(snapshot: &Path) -> PathBuf {
    snapshot.with_extension("lock")
}

/// [`EntityStore`] whose single source of truth is a snapshot file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes callers inside this process before they contend on the file.
    local: Mutex<()>,
}

impl FileStore {
    /// Use `path` as the snapshot, validating it if it already exists.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self {
            path: path.into(),
            local: Mutex::new(()),
        };
        store.read(|_| Ok(()))?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked<T>(
        &self,
        mode: LockMode,
        op: impl FnOnce(&MemoryStore) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _local = self.local.lock().map_err(|_| StoreError::LockPoisoned)?;
        let _lock = SnapshotLock::acquire(&self.path, mode)?;
        let store = MemoryStore::open(&self.path)?;
        let value = op(&store)?;
        if mode == LockMode::Exclusive {
            store.save(&self.path)?;
        }
        Ok(value)
    }

    fn read<T>(&self, op: impl FnOnce(&MemoryStore) -> StoreResult<T>) -> StoreResult<T> {
        self.locked(LockMode::Shared, op)
    }

    fn write<T>(&self, op: impl FnOnce(&MemoryStore) -> StoreResult<T>) -> StoreResult<T> {
        self.locked(LockMode::Exclusive, op)
    }

    /// Run `op` against the latest snapshot with the lock held throughout.
    ///
    /// The snapshot is saved only when `op` succeeds, so a denied operation
    /// leaves the file untouched. `op` must not call back into this store.
    pub fn transaction<T, E>(&self, op: impl FnOnce(Arc<MemoryStore>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _local = self.local.lock().map_err(|_| StoreError::LockPoisoned)?;
        let _lock = SnapshotLock::acquire(&self.path, LockMode::Exclusive)?;
        let store = Arc::new(MemoryStore::open(&self.path)?);
        let value = op(store.clone())?;
        store.save(&self.path)?;
        debug!(path = %self.path.display(), "Transaction committed");
        Ok(value)
    }
}

impl EntityStore for FileStore {
    fn next_id(&self, kind: EntityKind) -> StoreResult<String> {
        self.write(|store| store.next_id(kind))
    }

    fn get<E: Entity>(&self, id: &str) -> StoreResult<Option<E>> {
        self.read(|store| store.get(id))
    }

    fn list<E: Entity>(&self, filter: impl Fn(&E) -> bool) -> StoreResult<Vec<E>> {
        self.read(|store| store.list(filter))
    }

    fn insert<E: Entity>(&self, entity: &E) -> StoreResult<()> {
        self.write(|store| store.insert(entity))
    }

    fn update<E: Entity>(&self, entity: &E) -> StoreResult<()> {
        self.write(|store| store.update(entity))
    }

    fn delete<E: Entity>(&self, id: &str) -> StoreResult<()> {
        self.write(|store| store.delete::<E>(id))
    }
}
