//! Codec Framework
//!
//! A codec turns a `DbSchema` into a serialized string and back. Codecs are
//! registered once, keyed by format name, and resolved by string at runtime.
//!
//! "Listed" and "usable" are separate questions: a codec can be registered
//! (and show up in `supported_formats()`) while failing every call, either
//! because its backing library was compiled out or because it is a placeholder.

pub mod csv;
pub mod json;
pub mod xml;
pub mod yaml;

pub use csv::CsvCodec;
pub use json::JsonCodec;
pub use xml::XmlCodec;
pub use yaml::YamlCodec;

use crate::schema::DbSchema;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Codec-layer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Format '{0}' is already registered")]
    DuplicateFormat(String),

    #[error("Unsupported format '{requested}' (supported: {})", .supported.join(", "))]
    UnsupportedFormat {
        requested: String,
        supported: Vec<String>,
    },

    #[error("{format} codec unavailable: {reason}")]
    Unavailable { format: String, reason: String },

    #[error("{0} serialization not implemented yet")]
    NotImplemented(String),

    #[error("{format} serialize error: {detail}")]
    Serialize { format: String, detail: String },

    #[error("{format} deserialize error: {detail}")]
    Deserialize { format: String, detail: String },
}

impl CodecError {
    pub fn serialize(format: impl Into<String>, detail: impl ToString) -> Self {
        CodecError::Serialize {
            format: format.into(),
            detail: detail.to_string(),
        }
    }

    pub fn deserialize(format: impl Into<String>, detail: impl ToString) -> Self {
        CodecError::Deserialize {
            format: format.into(),
            detail: detail.to_string(),
        }
    }

    pub fn unavailable(format: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::Unavailable {
            format: format.into(),
            reason: reason.into(),
        }
    }
}

/// Trait for schema codecs
pub trait Codec: Send + Sync {
    /// Canonical format name, also used as the storage file extension
    fn format(&self) -> &str;

    /// File extensions this codec claims
    fn extensions(&self) -> &[&str];

    /// Whether the backing library is compiled in and the codec is implemented
    fn is_available(&self) -> bool {
        true
    }

    fn serialize(&self, schema: &DbSchema) -> Result<String, CodecError>;

    fn deserialize(&self, data: &str) -> Result<DbSchema, CodecError>;
}

/// Registry of codecs, keyed by lowercase format name
#[derive(Default)]
pub struct CodecRegistry {
    codecs: BTreeMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec. The key is `Codec::format`, lowercased, so a codec
    /// names its own format and cannot be registered under a second one.
    pub fn register(&mut self, codec: impl Codec + 'static) -> Result<(), CodecError> {
        let key = codec.format().to_lowercase();
        if self.codecs.contains_key(&key) {
            return Err(CodecError::DuplicateFormat(key));
        }
        tracing::debug!("Registered codec '{}'", key);
        self.codecs.insert(key, Arc::new(codec));
        Ok(())
    }

    /// Find the codec for a format name (case-insensitive)
    pub fn resolve(&self, format: &str) -> Result<Arc<dyn Codec>, CodecError> {
        self.codecs
            .get(&format.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| CodecError::UnsupportedFormat {
                requested: format.to_string(),
                supported: self.supported_formats(),
            })
    }

    /// Find the codec claiming a file extension (`yml` resolves to yaml)
    pub fn resolve_extension(&self, ext: &str) -> Result<Arc<dyn Codec>, CodecError> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.codecs
            .values()
            .find(|c| c.extensions().iter().any(|e| e.eq_ignore_ascii_case(&ext)))
            .cloned()
            .ok_or_else(|| CodecError::UnsupportedFormat {
                requested: ext,
                supported: self.supported_formats(),
            })
    }

    /// Registered format names, sorted
    pub fn supported_formats(&self) -> Vec<String> {
        self.codecs.keys().cloned().collect()
    }

    /// Registered formats whose codec can actually be used
    pub fn usable_formats(&self) -> Vec<String> {
        self.codecs
            .iter()
            .filter(|(_, c)| c.is_available())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn is_supported(&self, format: &str) -> bool {
        self.codecs.contains_key(&format.trim().to_lowercase())
    }
}

/// Create a registry with all built-in codecs
pub fn default_registry() -> CodecRegistry {
    let mut registry = CodecRegistry::new();
    // Built-in formats are distinct, so registration cannot collide.
    for result in [
        registry.register(JsonCodec),
        registry.register(XmlCodec),
        registry.register(YamlCodec),
        registry.register(CsvCodec),
    ] {
        if let Err(e) = result {
            tracing::error!("Failed to register built-in codec: {}", e);
        }
    }
    registry
}
