use crate::book::Book;
use crate::contact::Contact;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct BookRow {
    #[tabled(rename = "Book")]
    name: String,
    #[tabled(rename = "Contacts")]
    contacts: usize,
}

#[derive(Tabled)]
struct ContactRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Phone")]
    phone: String,
}

#[derive(Default)]
pub struct BookTable {
    rows: Vec<BookRow>,
}

impl BookTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_book(&mut self, book: &Book) {
        self.rows.push(BookRow {
            name: book.name().to_string(),
            contacts: book.len(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

#[derive(Default)]
pub struct ContactTable {
    rows: Vec<ContactRow>,
}

impl ContactTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contact(&mut self, contact: &Contact) {
        self.rows.push(ContactRow {
            id: contact.id().to_string(),
            name: contact.name().to_string(),
            address: contact.address().to_string(),
            phone: contact.phone_no().unwrap_or("-").to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}
