//! XML codec (quick-xml, behind the `xml` feature)
//!
//! Layout:
//! ```xml
//! <DbSchema>
//!   <contacts>
//!     <contact id="42"><name>..</name><address>..</address><phone_no>..</phone_no></contact>
//!   </contacts>
//!   <books>
//!     <book name="Friends"><contact_id>42</contact_id></book>
//!   </books>
//! </DbSchema>
//! ```
//! An absent phone number is written as an empty `<phone_no/>` element.

use super::{Codec, CodecError};
use crate::schema::DbSchema;

pub struct XmlCodec;

impl Codec for XmlCodec {
    fn format(&self) -> &str {
        "xml"
    }

    fn extensions(&self) -> &[&str] {
        &["xml"]
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "xml")
    }

    #[cfg(feature = "xml")]
    fn serialize(&self, schema: &DbSchema) -> Result<String, CodecError> {
        imp::write_schema(schema)
    }

    #[cfg(feature = "xml")]
    fn deserialize(&self, data: &str) -> Result<DbSchema, CodecError> {
        imp::read_schema(data)
    }

    #[cfg(not(feature = "xml"))]
    fn serialize(&self, _schema: &DbSchema) -> Result<String, CodecError> {
        Err(CodecError::unavailable("xml", "built without the `xml` feature"))
    }

    #[cfg(not(feature = "xml"))]
    fn deserialize(&self, _data: &str) -> Result<DbSchema, CodecError> {
        Err(CodecError::unavailable("xml", "built without the `xml` feature"))
    }
}

#[cfg(feature = "xml")]
mod imp {
    use super::CodecError;
    use crate::contact::{ContactId, ContactRecord};
    use crate::schema::DbSchema;
    use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
    use quick_xml::{Reader, Writer};

    fn ser_err(e: impl ToString) -> CodecError {
        CodecError::serialize("xml", e)
    }

    fn de_err(e: impl ToString) -> CodecError {
        CodecError::deserialize("xml", e)
    }

    fn write_text_element(
        writer: &mut Writer<Vec<u8>>,
        tag: &str,
        text: Option<&str>,
    ) -> Result<(), CodecError> {
        match text {
            Some(text) => {
                writer
                    .write_event(Event::Start(BytesStart::new(tag)))
                    .map_err(ser_err)?;
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(ser_err)?;
                writer
                    .write_event(Event::End(BytesEnd::new(tag)))
                    .map_err(ser_err)?;
            }
            None => {
                writer
                    .write_event(Event::Empty(BytesStart::new(tag)))
                    .map_err(ser_err)?;
            }
        }
        Ok(())
    }

    pub(super) fn write_schema(schema: &DbSchema) -> Result<String, CodecError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(ser_err)?;
        writer
            .write_event(Event::Start(BytesStart::new("DbSchema")))
            .map_err(ser_err)?;

        writer
            .write_event(Event::Start(BytesStart::new("contacts")))
            .map_err(ser_err)?;
        for (id, record) in &schema.contacts {
            let id = id.to_string();
            writer
                .write_event(Event::Start(
                    BytesStart::new("contact").with_attributes([("id", id.as_str())]),
                ))
                .map_err(ser_err)?;
            write_text_element(&mut writer, "name", Some(&record.name))?;
            write_text_element(&mut writer, "address", Some(&record.address))?;
            write_text_element(&mut writer, "phone_no", record.phone_no.as_deref())?;
            writer
                .write_event(Event::End(BytesEnd::new("contact")))
                .map_err(ser_err)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("contacts")))
            .map_err(ser_err)?;

        writer
            .write_event(Event::Start(BytesStart::new("books")))
            .map_err(ser_err)?;
        for (name, ids) in &schema.books {
            writer
                .write_event(Event::Start(
                    BytesStart::new("book").with_attributes([("name", name.as_str())]),
                ))
                .map_err(ser_err)?;
            for id in ids {
                write_text_element(&mut writer, "contact_id", Some(&id.to_string()))?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("book")))
                .map_err(ser_err)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("books")))
            .map_err(ser_err)?;

        writer
            .write_event(Event::End(BytesEnd::new("DbSchema")))
            .map_err(ser_err)?;

        String::from_utf8(writer.into_inner()).map_err(ser_err)
    }

    /// Partially read contact element
    #[derive(Default)]
    struct PendingContact {
        id: Option<ContactId>,
        name: Option<String>,
        address: Option<String>,
        phone_no: Option<String>,
    }

    impl PendingContact {
        fn finish(self) -> Result<(ContactId, ContactRecord), CodecError> {
            let id = self.id.ok_or_else(|| de_err("<contact> without id attribute"))?;
            Ok((
                id,
                ContactRecord {
                    name: self.name.unwrap_or_default(),
                    address: self.address.unwrap_or_default(),
                    phone_no: self.phone_no.filter(|p| !p.is_empty()),
                },
            ))
        }
    }

    fn attribute(start: &BytesStart<'_>, key: &str) -> Result<Option<String>, CodecError> {
        match start.try_get_attribute(key).map_err(de_err)? {
            Some(attr) => Ok(Some(attr.unescape_value().map_err(de_err)?.into_owned())),
            None => Ok(None),
        }
    }

    fn parse_id(text: &str) -> Result<ContactId, CodecError> {
        text.parse()
            .map_err(|_| de_err(format!("invalid contact id '{}'", text)))
    }

    pub(super) fn read_schema(data: &str) -> Result<DbSchema, CodecError> {
        let mut reader = Reader::from_str(data);
        let mut schema = DbSchema::new();
        let mut saw_root = false;

        let mut contact: Option<PendingContact> = None;
        let mut book: Option<(String, Vec<ContactId>)> = None;
        // Leaf element currently collecting text
        let mut leaf: Option<String> = None;
        let mut text = String::new();

        loop {
            match reader.read_event().map_err(de_err)? {
                Event::Start(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match tag.as_str() {
                        "DbSchema" => saw_root = true,
                        "contact" => {
                            let id = attribute(&e, "id")?.map(|s| parse_id(&s)).transpose()?;
                            contact = Some(PendingContact {
                                id,
                                ..Default::default()
                            });
                        }
                        "book" => {
                            let name = attribute(&e, "name")?
                                .ok_or_else(|| de_err("<book> without name attribute"))?;
                            book = Some((name, Vec::new()));
                        }
                        "name" | "address" | "phone_no" | "contact_id" => {
                            leaf = Some(tag);
                            text.clear();
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match tag.as_str() {
                        "DbSchema" => saw_root = true,
                        "book" => {
                            let name = attribute(&e, "name")?
                                .ok_or_else(|| de_err("<book> without name attribute"))?;
                            schema.books.insert(name, Vec::new());
                        }
                        "name" | "address" | "phone_no" => {
                            if let Some(c) = contact.as_mut() {
                                let slot = match tag.as_str() {
                                    "name" => &mut c.name,
                                    "address" => &mut c.address,
                                    _ => &mut c.phone_no,
                                };
                                *slot = Some(String::new());
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    if leaf.is_some() {
                        text.push_str(&t.unescape().map_err(de_err)?);
                    }
                }
                Event::CData(t) => {
                    if leaf.is_some() {
                        text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::End(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match tag.as_str() {
                        "contact" => {
                            if let Some(c) = contact.take() {
                                let (id, record) = c.finish()?;
                                schema.contacts.insert(id, record);
                            }
                        }
                        "book" => {
                            if let Some((name, ids)) = book.take() {
                                schema.books.insert(name, ids);
                            }
                        }
                        "name" | "address" | "phone_no" | "contact_id" => {
                            let value = std::mem::take(&mut text);
                            leaf = None;
                            match tag.as_str() {
                                "contact_id" => {
                                    if let Some((_, ids)) = book.as_mut() {
                                        ids.push(parse_id(&value)?);
                                    }
                                }
                                "name" => {
                                    if let Some(c) = contact.as_mut() {
                                        c.name = Some(value);
                                    }
                                }
                                "address" => {
                                    if let Some(c) = contact.as_mut() {
                                        c.address = Some(value);
                                    }
                                }
                                _ => {
                                    if let Some(c) = contact.as_mut() {
                                        c.phone_no = Some(value);
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(de_err("missing <DbSchema> root element"));
        }
        Ok(schema)
    }
}

#[cfg(all(test, feature = "xml"))]
mod tests {
    use super::*;
    use crate::codec::tests::{assert_roundtrip, single_schema};
    use crate::contact::ContactId;

    #[test]
    fn test_xml_roundtrip() {
        assert_roundtrip(&XmlCodec);
    }

    #[test]
    fn test_xml_layout() {
        let text = XmlCodec.serialize(&single_schema()).unwrap();
        assert!(text.contains("<DbSchema>"));
        assert!(text.contains(r#"<contact id="42">"#));
        assert!(text.contains("<name>Solo</name>"));
        assert!(text.contains("<phone_no/>"));
        assert!(text.contains(r#"<book name="Only"><contact_id>42</contact_id></book>"#));
    }

    #[test]
    fn test_xml_tolerates_whitespace_and_dangling_ids() {
        let text = r#"
            <DbSchema>
              <contacts>
                <contact id="1">
                  <name>Ann</name>
                  <address>1 Oak St</address>
                  <phone_no>555-0001</phone_no>
                </contact>
              </contacts>
              <books>
                <book name="Friends">
                  <contact_id>1</contact_id>
                  <contact_id>99</contact_id>
                </book>
              </books>
            </DbSchema>"#;
        let schema = XmlCodec.deserialize(text).unwrap();
        assert_eq!(schema.contacts[&ContactId(1)].name, "Ann");
        assert_eq!(
            schema.contacts[&ContactId(1)].phone_no.as_deref(),
            Some("555-0001")
        );
        assert_eq!(schema.books["Friends"], vec![ContactId(1), ContactId(99)]);
    }

    #[test]
    fn test_xml_rejects_bad_input() {
        assert!(XmlCodec.deserialize("<other/>").is_err());
        assert!(XmlCodec
            .deserialize(r#"<DbSchema><books><book name="A"><contact_id>x</contact_id></book></books></DbSchema>"#)
            .is_err());
    }
}

#[cfg(all(test, not(feature = "xml")))]
mod tests {
    use super::*;

    #[test]
    fn test_xml_unavailable() {
        assert!(!XmlCodec.is_available());
        let err = XmlCodec.deserialize("<DbSchema/>").unwrap_err();
        assert!(matches!(err, CodecError::Unavailable { .. }));
    }
}
