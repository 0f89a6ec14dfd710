//! Root-scoped instance registry
//!
//! Ensures all callers addressing the same storage root share one
//! `DatabaseManager` (and therefore one storage lock) instead of racing on the
//! same file through independent handles.
//!
//! Root arguments are canonicalized first: `./data`, `/abs/path/data` and a
//! symlink to it all map to the same key. An omitted root maps to
//! `RootKey::Default`, which the registry resolves to the default directory
//! before caching.

use crate::codec::{CodecRegistry, default_registry};
use crate::manager::DatabaseManager;
use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Canonical cache key for a storage root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootKey {
    /// No root supplied (or one that could not be canonicalized)
    Default,
    /// Absolute, symlink-resolved root
    Path(PathBuf),
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootKey::Default => write!(f, "default"),
            RootKey::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolve a caller-supplied root to its cache key.
///
/// The path does not have to exist: the longest existing ancestor is
/// symlink-resolved and the remaining components are appended after folding
/// `.` and `..`.
pub fn canonical_key(root: Option<&Path>) -> RootKey {
    let Some(root) = root else {
        return RootKey::Default;
    };
    match canonicalize_lenient(root) {
        Some(path) => RootKey::Path(path),
        None => {
            tracing::warn!("Invalid root path provided: {:?}. Using default.", root);
            RootKey::Default
        }
    }
}

fn canonicalize_lenient(root: &Path) -> Option<PathBuf> {
    if root.as_os_str().is_empty() || root.to_string_lossy().contains('\0') {
        return None;
    }

    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(root)
    };

    // Longest existing prefix goes to the OS so `link/..` follows the link target
    let mut existing = PathBuf::new();
    let mut tail = Vec::new();
    for component in absolute.components() {
        if tail.is_empty() {
            let candidate = existing.join(component.as_os_str());
            if candidate.exists() {
                existing = candidate;
                continue;
            }
        }
        tail.push(component);
    }

    let mut path = existing.canonicalize().ok()?;
    for component in tail {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                path.pop();
            }
            other => path.push(other.as_os_str()),
        }
    }
    Some(path)
}

/// Built-in default root: `$ADB_ROOT`, then `$HOME`, then the current directory
pub fn default_root() -> PathBuf {
    std::env::var_os("ADB_ROOT")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Key an instance is cached under.
///
/// An omitted root is resolved to the directory it stands for, so that
/// `--root` omitted and `--root <same dir>` share one instance.
fn cache_key(key: RootKey, fallback: &Path) -> RootKey {
    match key {
        RootKey::Default => canonicalize_lenient(fallback)
            .map(RootKey::Path)
            .unwrap_or(RootKey::Default),
        key => key,
    }
}

/// Keyed cache of open managers
pub struct InstanceRegistry {
    codecs: Arc<CodecRegistry>,
    instances: Mutex<HashMap<RootKey, Arc<DatabaseManager>>>,
}

impl InstanceRegistry {
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self {
            codecs,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Process-wide registry with the built-in codecs
    pub fn global() -> &'static InstanceRegistry {
        static GLOBAL: OnceLock<InstanceRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| InstanceRegistry::new(Arc::new(default_registry())))
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Return the cached manager for `root`, or open and cache a new one.
    ///
    /// `format` is only used when a new instance is created; an existing
    /// instance keeps its active format (switch it with `set_codec`).
    pub fn get_or_open(&self, root: Option<&Path>, format: &str) -> Result<Arc<DatabaseManager>> {
        let key = match canonical_key(root) {
            RootKey::Default => cache_key(RootKey::Default, &default_root()),
            key => key,
        };

        // Hold the lock for the whole lookup-or-create so one root never gets two instances
        let mut instances = self.instances.lock();
        if let Some(existing) = instances.get(&key) {
            if let Ok(active) = existing.format() {
                if !active.eq_ignore_ascii_case(format.trim()) {
                    tracing::warn!(
                        "Instance for {} is already open as {}; ignoring requested format {}",
                        key,
                        active,
                        format
                    );
                }
            }
            tracing::debug!("Returning existing database instance for {}", key);
            return Ok(Arc::clone(existing));
        }

        let codec = self.codecs.resolve(format)?;
        let storage_root = match &key {
            RootKey::Path(path) => path.clone(),
            RootKey::Default => default_root(),
        };
        let manager = Arc::new(DatabaseManager::open(storage_root, codec)?);
        tracing::debug!("Opened database instance for {}", key);
        instances.insert(key, Arc::clone(&manager));
        Ok(manager)
    }

    pub fn get(&self, key: &RootKey) -> Option<Arc<DatabaseManager>> {
        self.instances.lock().get(key).cloned()
    }

    /// Drop a cached instance
    pub fn remove(&self, key: &RootKey) -> Option<Arc<DatabaseManager>> {
        self.instances.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    /// Forget every cached instance (files are untouched)
    pub fn clear(&self) {
        self.instances.lock().clear();
    }
}
