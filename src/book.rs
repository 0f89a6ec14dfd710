//! Book - a named, ordered list of contact references
//!
//! Books never own contact payloads. They hold `ContactId`s that point into
//! the schema's global contacts table, so one contact can be shared by many books.

use crate::contact::ContactId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    name: String,
    contacts: Vec<ContactId>,
}

impl Book {
    /// Create an empty book
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contacts: Vec::new(),
        }
    }

    /// Build a book from stored references, dropping repeated ids
    /// while keeping first-insertion order.
    pub fn with_contacts(name: impl Into<String>, ids: impl IntoIterator<Item = ContactId>) -> Self {
        let mut book = Self::new(name);
        for id in ids {
            book.add_record(id);
        }
        book
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contacts(&self) -> &[ContactId] {
        &self.contacts
    }

    /// Append a reference. Returns `false` if the id was already present.
    pub fn add_record(&mut self, id: ContactId) -> bool {
        if self.contact_exists(id) {
            return false;
        }
        self.contacts.push(id);
        true
    }

    pub fn contact_exists(&self, id: ContactId) -> bool {
        self.contacts.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddressBook(name={}, ({} contacts))", self.name, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_record_keeps_order_and_dedups() {
        let mut book = Book::new("Friends");
        assert!(book.is_empty());
        assert!(book.add_record(ContactId(3)));
        assert!(book.add_record(ContactId(1)));
        assert!(!book.add_record(ContactId(3)));
        assert_eq!(book.contacts(), &[ContactId(3), ContactId(1)]);
    }

    #[test]
    fn test_with_contacts_drops_repeats() {
        let book = Book::with_contacts("Work", [ContactId(5), ContactId(2), ContactId(5)]);
        assert_eq!(book.len(), 2);
        assert_eq!(book.to_string(), "AddressBook(name=Work, (2 contacts))");
    }
}
