//! JSON codec
//!
//! `{"contacts": {"<id>": {"name", "address", "phone_no"}}, "books": {"<name>": [ids]}}`
//! Contact ids become stringified integer keys.

use super::{Codec, CodecError};
use crate::schema::DbSchema;

pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn serialize(&self, schema: &DbSchema) -> Result<String, CodecError> {
        serde_json::to_string_pretty(schema).map_err(|e| CodecError::serialize("json", e))
    }

    fn deserialize(&self, data: &str) -> Result<DbSchema, CodecError> {
        serde_json::from_str(data).map_err(|e| CodecError::deserialize("json", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::{assert_roundtrip, single_schema};
    use crate::contact::ContactId;

    #[test]
    fn test_json_roundtrip() {
        assert_roundtrip(&JsonCodec);
    }

    #[test]
    fn test_json_layout() {
        let text = JsonCodec.serialize(&single_schema()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["contacts"]["42"]["name"], "Solo");
        assert!(value["contacts"]["42"]["phone_no"].is_null());
        assert_eq!(value["books"]["Only"][0], 42);
    }

    #[test]
    fn test_json_missing_tables_default_to_empty() {
        let schema = JsonCodec.deserialize(r#"{"books": {"A": [7]}}"#).unwrap();
        assert!(schema.contacts.is_empty());
        assert_eq!(schema.books["A"], vec![ContactId(7)]);
    }

    #[test]
    fn test_json_garbage_is_deserialize_error() {
        let err = JsonCodec.deserialize("not json").unwrap_err();
        assert!(matches!(err, CodecError::Deserialize { .. }));
    }
}
