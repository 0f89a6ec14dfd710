//! Database schema - the unit of persistence
//!
//! Two tables:
//! - contacts(id -> name, address, phone_no)
//! - books(name -> ordered contact ids)
//!
//! Referential integrity between the two is maintained by the manager, not here.
//! A snapshot whose books reference missing contacts is still a valid schema.

use crate::book::Book;
use crate::contact::{ContactId, ContactRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ContactsTable = BTreeMap<ContactId, ContactRecord>;
pub type BooksTable = BTreeMap<String, Vec<ContactId>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSchema {
    #[serde(default)]
    pub contacts: ContactsTable,
    #[serde(default)]
    pub books: BooksTable,
}

impl DbSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.books.is_empty()
    }

    /// Book view with dangling references removed.
    pub fn resolved_book(&self, name: &str) -> Option<Book> {
        let ids = self.books.get(name)?;
        Some(Book::with_contacts(
            name,
            ids.iter().copied().filter(|id| self.contacts.contains_key(id)),
        ))
    }

    /// Ids referenced by some book but absent from the contacts table.
    pub fn dangling_references(&self) -> Vec<(String, ContactId)> {
        self.books
            .iter()
            .flat_map(|(name, ids)| {
                ids.iter()
                    .filter(|id| !self.contacts.contains_key(id))
                    .map(move |id| (name.clone(), *id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ContactRecord {
        ContactRecord {
            name: name.to_string(),
            address: "1 Oak St".to_string(),
            phone_no: None,
        }
    }

    #[test]
    fn test_empty_schema() {
        let schema = DbSchema::new();
        assert!(schema.is_empty());
        assert!(schema.resolved_book("missing").is_none());
    }

    #[test]
    fn test_resolved_book_drops_dangling_ids() {
        let mut schema = DbSchema::new();
        schema.contacts.insert(ContactId(1), record("Ann"));
        schema.contacts.insert(ContactId(2), record("Bob"));
        schema
            .books
            .insert("Friends".into(), vec![ContactId(2), ContactId(99), ContactId(1)]);

        let book = schema.resolved_book("Friends").unwrap();
        assert_eq!(book.contacts(), &[ContactId(2), ContactId(1)]);
        assert_eq!(
            schema.dangling_references(),
            vec![("Friends".to_string(), ContactId(99))]
        );
    }
}
