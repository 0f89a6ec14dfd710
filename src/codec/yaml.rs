//! YAML codec (serde_yaml, behind the `yaml` feature)

use super::{Codec, CodecError};
use crate::schema::DbSchema;

pub struct YamlCodec;

impl Codec for YamlCodec {
    fn format(&self) -> &str {
        "yaml"
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "yaml")
    }

    #[cfg(feature = "yaml")]
    fn serialize(&self, schema: &DbSchema) -> Result<String, CodecError> {
        serde_yaml::to_string(schema).map_err(|e| CodecError::serialize("yaml", e))
    }

    #[cfg(feature = "yaml")]
    fn deserialize(&self, data: &str) -> Result<DbSchema, CodecError> {
        // An empty document is an empty schema
        if data.trim().is_empty() {
            return Ok(DbSchema::new());
        }
        serde_yaml::from_str(data).map_err(|e| CodecError::deserialize("yaml", e))
    }

    #[cfg(not(feature = "yaml"))]
    fn serialize(&self, _schema: &DbSchema) -> Result<String, CodecError> {
        Err(CodecError::unavailable("yaml", "built without the `yaml` feature"))
    }

    #[cfg(not(feature = "yaml"))]
    fn deserialize(&self, _data: &str) -> Result<DbSchema, CodecError> {
        Err(CodecError::unavailable("yaml", "built without the `yaml` feature"))
    }
}

#[cfg(all(test, feature = "yaml"))]
mod tests {
    use super::*;
    use crate::codec::tests::{assert_roundtrip, sample_schema};

    #[test]
    fn test_yaml_roundtrip() {
        assert_roundtrip(&YamlCodec);
    }

    #[test]
    fn test_yaml_layout() {
        let text = YamlCodec.serialize(&sample_schema()).unwrap();
        assert!(text.contains("contacts:"));
        assert!(text.contains("books:"));
        assert!(text.contains("Friends:"));
    }

    #[test]
    fn test_yaml_empty_document() {
        assert_eq!(YamlCodec.deserialize("").unwrap(), DbSchema::new());
    }
}
