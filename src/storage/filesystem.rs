//! File-system storage implementation

use crate::codec::Codec;
use crate::schema::DbSchema;
use crate::Result;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage file location relative to the root, without extension
pub const RELATIVE_STORAGE_PATH: &str = "adb/adb";

/// `<root>/adb/adb.<format>`
pub fn storage_path(root: &Path, format: &str) -> PathBuf {
    root.join(Path::new(RELATIVE_STORAGE_PATH).with_extension(format))
}

/// Outcome of a read-modify-write closure.
#[derive(Debug)]
pub enum Mutation<T> {
    /// Persist the modified schema, then return the value
    Commit(T),
    /// Drop any modification and return the value without writing
    Discard(T),
}

/// Codec and file path currently in use
struct Active {
    codec: Arc<dyn Codec>,
    path: PathBuf,
}

/// One schema snapshot in one file under one root, through one codec.
///
/// All file access goes through a single lock, so writes from threads of this
/// process never interleave and a reader never sees a half-written file.
/// Nothing guards against other processes.
pub struct FileSystemStorage {
    root: PathBuf,
    active: Mutex<Active>,
}

impl FileSystemStorage {
    /// Open storage for a root (creates the directory and an empty snapshot if missing)
    pub fn open(root: impl Into<PathBuf>, codec: Arc<dyn Codec>) -> Result<Self> {
        let root = root.into();
        let path = storage_path(&root, codec.format());
        let storage = Self {
            root,
            active: Mutex::new(Active { codec, path }),
        };
        storage.initialize()?;
        Ok(storage)
    }

    fn initialize(&self) -> Result<()> {
        let active = self.active.lock();
        ensure_parent_dir(&active.path)?;
        if !active.path.exists() {
            tracing::debug!("Initializing empty storage at {}", active.path.display());
            write_snapshot(&active, &DbSchema::new())?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the snapshot file for the active codec
    pub fn path(&self) -> PathBuf {
        self.active.lock().path.clone()
    }

    pub fn format(&self) -> String {
        self.active.lock().codec.format().to_string()
    }

    pub fn codec(&self) -> Arc<dyn Codec> {
        Arc::clone(&self.active.lock().codec)
    }

    pub fn is_initialized(&self) -> bool {
        self.active.lock().path.exists()
    }

    /// Read the current snapshot. A missing file reads as an empty schema.
    pub fn read(&self) -> Result<DbSchema> {
        let active = self.active.lock();
        read_snapshot(&active)
    }

    /// Replace the snapshot on disk.
    pub fn write(&self, schema: &DbSchema) -> Result<()> {
        let active = self.active.lock();
        write_snapshot(&active, schema)
    }

    /// Read-modify-write under one lock acquisition.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut DbSchema) -> Result<Mutation<T>>,
    {
        let active = self.active.lock();
        let mut schema = read_snapshot(&active)?;
        match f(&mut schema)? {
            Mutation::Commit(value) => {
                write_snapshot(&active, &schema)?;
                Ok(value)
            }
            Mutation::Discard(value) => Ok(value),
        }
    }

    /// Remove the snapshot file, then its directory if that is now empty.
    ///
    /// Returns `Ok(false)` when there was no file to delete.
    pub fn delete(&self) -> Result<bool> {
        let active = self.active.lock();
        match fs::remove_file(&active.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!("File {} not found for deletion", active.path.display());
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(parent) = active.path.parent() {
            if fs::read_dir(parent)?.next().is_none() {
                fs::remove_dir(parent)?;
            }
        }
        tracing::debug!("Deleted storage {}", active.path.display());
        Ok(true)
    }

    /// Switch to another codec, copying the current snapshot into the new format's file.
    ///
    /// The old file is left in place.
    pub fn set_codec(&self, codec: Arc<dyn Codec>) -> Result<()> {
        let mut active = self.active.lock();
        if active.codec.format() == codec.format() {
            return Ok(());
        }

        let schema = read_snapshot(&active)?;
        let next = Active {
            path: storage_path(&self.root, codec.format()),
            codec,
        };
        write_snapshot(&next, &schema)?;

        tracing::info!(
            "Migrated storage from {} to {}",
            active.path.display(),
            next.path.display()
        );
        *active = next;
        Ok(())
    }
}

impl std::fmt::Debug for FileSystemStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemStorage")
            .field("root", &self.root)
            .field("path", &self.path())
            .finish()
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn read_snapshot(active: &Active) -> Result<DbSchema> {
    match fs::read_to_string(&active.path) {
        Ok(content) => Ok(active.codec.deserialize(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::error!("File {} not found for reading", active.path.display());
            Ok(DbSchema::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_snapshot(active: &Active, schema: &DbSchema) -> Result<()> {
    let data = active.codec.serialize(schema)?;
    ensure_parent_dir(&active.path)?;

    // Atomic write: temp + fsync + rename
    let mut tmp_name = active.path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let written = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &active.path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
