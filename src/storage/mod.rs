//! Storage Layer - file-system persistence of one schema snapshot
//!
//! One root directory holds one file per format:
//! - `<root>/adb/adb.json`
//! - `<root>/adb/adb.xml`
//! - `<root>/adb/adb.yaml`
//!
//! Every write replaces the whole snapshot (temp file + rename).

pub mod filesystem;

pub use filesystem::{FileSystemStorage, Mutation, RELATIVE_STORAGE_PATH, storage_path};
