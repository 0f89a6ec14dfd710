//! CSV codec placeholder
//!
//! Registered so that `csv` is discoverable as a format name, but every call
//! fails with `CodecError::NotImplemented`.

use super::{Codec, CodecError};
use crate::schema::DbSchema;

pub struct CsvCodec;

impl Codec for CsvCodec {
    fn format(&self) -> &str {
        "csv"
    }

    fn extensions(&self) -> &[&str] {
        &["csv"]
    }

    fn is_available(&self) -> bool {
        false
    }

    fn serialize(&self, _schema: &DbSchema) -> Result<String, CodecError> {
        Err(CodecError::NotImplemented("CSV".into()))
    }

    fn deserialize(&self, _data: &str) -> Result<DbSchema, CodecError> {
        Err(CodecError::NotImplemented("CSV".into()))
    }
}
