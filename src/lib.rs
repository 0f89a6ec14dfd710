//! # addressdb - Address book database
//!
//! Books of shared contacts, persisted as one snapshot file per root.
//!
//! addressdb provides:
//! - Content-addressed contacts (fingerprint of normalized name + address)
//! - A schema snapshot (contacts table + books table) as the unit of persistence
//! - Pluggable codecs (JSON, XML, YAML; CSV reserved) resolved by format name
//! - File-system storage with whole-snapshot, lock-serialized writes
//! - A manager enforcing referential integrity between books and contacts
//! - A root-keyed instance registry so one root is served by one manager

pub mod contact;
pub mod book;
pub mod schema;
pub mod codec;
pub mod storage;
pub mod search;
pub mod status;
pub mod manager;
pub mod registry;
pub mod view;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use book::Book;
pub use codec::{Codec, CodecError, CodecRegistry};
pub use contact::{Contact, ContactField, ContactId, ValidationError};
pub use manager::{DatabaseManager, HandleState};
pub use registry::{InstanceRegistry, RootKey};
pub use schema::DbSchema;
pub use search::SearchCriteria;
pub use status::{JobStatus, Status};
pub use storage::FileSystemStorage;

use std::path::PathBuf;

/// Result type alias for addressdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for addressdb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid search criteria: {0}")]
    InvalidCriteria(String),

    #[error("Unknown view format '{0}' (expected text, markdown or html)")]
    UnknownView(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database at {} is deinitialized", .0.display())]
    Deinitialized(PathBuf),
}
