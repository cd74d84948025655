//! Durable storage for the [`PersistedSessionRecord`].
//!
//! Reads and writes are synchronous whole-record overwrites; there is exactly one
//! record per store, addressed by [`STORAGE_KEY`].

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use crate::dao::{
    models::PersistedSessionRecord,
    storage::{StorageError, StorageResult},
};

/// Fixed key the session record is stored under.
pub const STORAGE_KEY: &str = "live-shoot-session";

/// Abstraction over the client-local storage holding the session record.
pub trait SessionStore: Send + Sync {
    /// Read the stored record, `None` when nothing is stored.
    fn load(&self) -> StorageResult<Option<PersistedSessionRecord>>;
    /// Overwrite the stored record.
    fn save(&self, record: &PersistedSessionRecord) -> StorageResult<()>;
    /// Remove the stored record. Clearing an empty store succeeds.
    fn clear(&self) -> StorageResult<()>;
}

/// Stores the record as a JSON file named after [`STORAGE_KEY`] inside a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Location of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> StorageResult<Option<PersistedSessionRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::io(&self.path, err)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StorageError::Malformed {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, record: &PersistedSessionRecord) -> StorageResult<()> {
        let payload = serde_json::to_vec(record).map_err(StorageError::Encode)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
        }

        // Write next to the target and rename so readers never observe a partial record.
        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(|err| StorageError::io(&temp, err))?;
        file.write_all(&payload)
            .and_then(|()| file.sync_all())
            .map_err(|err| StorageError::io(&temp, err))?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(|err| StorageError::io(&self.path, err))
    }

    fn clear(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(&self.path, err)),
        }
    }
}

/// In-memory store, used when no durable location is configured and in tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<PersistedSessionRecord>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `record`.
    pub fn with_record(record: PersistedSessionRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> StorageResult<Option<PersistedSessionRecord>> {
        let guard = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    fn save(&self, record: &PersistedSessionRecord) -> StorageResult<()> {
        let mut guard = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut guard = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        guard.take();
        Ok(())
    }
}
