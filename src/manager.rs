//! Database manager - books of shared contacts
//!
//! The only component that interprets a schema as books-of-contacts. Every
//! mutation is one read-modify-write against storage; queries read and project.
//!
//! Referential integrity rules:
//! - a book only ever references ids present in the contacts table
//! - deleting or clearing a book never removes contacts (other books may share them)
//! - orphaned contacts are kept

use crate::book::Book;
use crate::codec::Codec;
use crate::contact::{Contact, ContactId};
use crate::schema::DbSchema;
use crate::search::SearchCriteria;
use crate::status::JobStatus;
use crate::storage::{FileSystemStorage, Mutation};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle of a manager handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Initialized,
    Deinitialized,
}

pub struct DatabaseManager {
    root: PathBuf,
    storage: RwLock<Option<FileSystemStorage>>,
}

impl DatabaseManager {
    /// Open (and initialize if needed) the database under `root`
    pub fn open(root: impl Into<PathBuf>, codec: Arc<dyn Codec>) -> Result<Self> {
        let storage = FileSystemStorage::open(root, codec)?;
        Ok(Self::from_storage(storage))
    }

    pub fn from_storage(storage: FileSystemStorage) -> Self {
        tracing::debug!("Database manager bound to {}", storage.path().display());
        Self {
            root: storage.root().to_path_buf(),
            storage: RwLock::new(Some(storage)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> HandleState {
        if self.storage.read().is_some() {
            HandleState::Initialized
        } else {
            HandleState::Deinitialized
        }
    }

    fn with_storage<T>(&self, f: impl FnOnce(&FileSystemStorage) -> Result<T>) -> Result<T> {
        let guard = self.storage.read();
        let storage = guard
            .as_ref()
            .ok_or_else(|| Error::Deinitialized(self.root.clone()))?;
        f(storage)
    }

    /// Path of the snapshot file
    pub fn storage_path(&self) -> Result<PathBuf> {
        self.with_storage(|s| Ok(s.path()))
    }

    /// Active format name
    pub fn format(&self) -> Result<String> {
        self.with_storage(|s| Ok(s.format()))
    }

    /// Read-only snapshot, e.g. for rendering
    pub fn schema(&self) -> Result<DbSchema> {
        self.with_storage(|s| s.read())
    }

    // ========== Book Operations ==========

    /// All books with their stored reference lists
    pub fn list_books(&self) -> Result<Vec<Book>> {
        let schema = self.schema()?;
        Ok(schema
            .books
            .into_iter()
            .map(|(name, ids)| Book::with_contacts(name, ids))
            .collect())
    }

    /// A book by name, without dangling references
    pub fn get_book(&self, name: &str) -> Result<Book> {
        let schema = self.schema()?;
        schema.resolved_book(name).ok_or_else(|| {
            tracing::warn!("Book '{}' not found.", name);
            Error::NotFound(format!("Book '{}'", name))
        })
    }

    pub fn create_empty_book(&self, name: &str) -> Result<JobStatus<Book>> {
        self.with_storage(|storage| {
            storage.update(|schema| {
                if let Some(existing) = schema.resolved_book(name) {
                    let message = format!("Address Book '{}' already exists.", name);
                    tracing::warn!("{}", message);
                    return Ok(Mutation::Discard(
                        JobStatus::cancelled(Some(existing), message)
                            .because(Error::AlreadyExists(format!("Book '{}'", name))),
                    ));
                }

                schema.books.insert(name.to_string(), Vec::new());
                tracing::info!("Created address book '{}'", name);
                Ok(Mutation::Commit(JobStatus::success(
                    Book::new(name),
                    format!("Address book '{}' created successfully.", name),
                )))
            })
        })
    }

    /// Remove a book. Its contacts stay in the global table.
    pub fn delete_book(&self, name: &str) -> Result<JobStatus<Book>> {
        self.with_storage(|storage| {
            storage.update(|schema| match schema.books.remove(name) {
                Some(ids) => {
                    tracing::info!("Deleted address book '{}'", name);
                    Ok(Mutation::Commit(JobStatus::success(
                        Book::with_contacts(name, ids),
                        format!("Address book '{}' deleted.", name),
                    )))
                }
                None => {
                    let message = format!("Address book '{}' does not exist.", name);
                    tracing::warn!("{}", message);
                    Ok(Mutation::Discard(
                        JobStatus::cancelled(None, message)
                            .because(Error::NotFound(format!("Book '{}'", name))),
                    ))
                }
            })
        })
    }

    /// Drop every reference from a book, keeping the (now empty) book.
    pub fn clear_book(&self, name: &str) -> Result<JobStatus<Book>> {
        self.with_storage(|storage| {
            storage.update(|schema| match schema.books.get_mut(name) {
                Some(ids) => {
                    let removed = ids.len();
                    ids.clear();
                    tracing::debug!("Clearing address book {}: removed {} references", name, removed);
                    Ok(Mutation::Commit(JobStatus::success(
                        Book::new(name),
                        format!("Address book '{}' cleared ({} contacts removed).", name, removed),
                    )))
                }
                None => {
                    tracing::warn!("Address book '{}' not found.", name);
                    Ok(Mutation::Discard(JobStatus::error(Error::NotFound(format!(
                        "Book '{}'",
                        name
                    )))))
                }
            })
        })
    }

    /// Remove every book. Returns the number of books removed.
    pub fn clear_all(&self) -> Result<JobStatus<usize>> {
        self.with_storage(|storage| {
            storage.update(|schema| {
                let removed = schema.books.len();
                if removed == 0 {
                    return Ok(Mutation::Discard(JobStatus::cancelled(
                        Some(0),
                        "Database has no address books.",
                    )));
                }
                schema.books.clear();
                tracing::debug!("Clearing database: removed {} address books", removed);
                Ok(Mutation::Commit(JobStatus::success(
                    removed,
                    format!("Removed {} address books.", removed),
                )))
            })
        })
    }

    // ========== Contact Operations ==========

    /// Add a contact to a book.
    ///
    /// A contact whose fingerprint is already referenced by the book is a
    /// cancelled no-op that returns the stored contact.
    pub fn add_contact(
        &self,
        book_name: &str,
        name: &str,
        address: &str,
        phone_no: Option<&str>,
    ) -> Result<JobStatus<Contact>> {
        let contact = match Contact::new(name, address, phone_no.map(String::from)) {
            Ok(contact) => contact,
            Err(e) => {
                tracing::warn!("Invalid contact data: {}", e);
                return Ok(JobStatus::error(e.into()));
            }
        };

        self.with_storage(|storage| {
            storage.update(|schema| {
                let Some(ids) = schema.books.get(book_name) else {
                    tracing::warn!("Book '{}' not found.", book_name);
                    return Ok(Mutation::Discard(JobStatus::error(Error::NotFound(format!(
                        "Book '{}'",
                        book_name
                    )))));
                };

                let id = contact.id();
                let referenced = ids.contains(&id);
                if let Some(record) = schema.contacts.get(&id).filter(|_| referenced) {
                    let existing = Contact::from_record(id, record);
                    let message = format!("Contact {} already exists in '{}'", existing, book_name);
                    tracing::warn!("{}", message);
                    return Ok(Mutation::Discard(
                        JobStatus::cancelled(Some(existing), message)
                            .because(Error::AlreadyExists(format!("Contact {}", id))),
                    ));
                }

                let stored = schema
                    .contacts
                    .entry(id)
                    .or_insert_with(|| contact.to_record());
                let stored = Contact::from_record(id, stored);

                // A dangling reference keeps its position in the book
                if !referenced {
                    if let Some(ids) = schema.books.get_mut(book_name) {
                        ids.push(id);
                    }
                }

                tracing::info!("Added contact {} to '{}'", stored, book_name);
                Ok(Mutation::Commit(JobStatus::success(
                    stored,
                    format!("Contact added to '{}'.", book_name),
                )))
            })
        })
    }

    /// A contact from the global table
    pub fn get_contact(&self, id: ContactId) -> Result<Contact> {
        let schema = self.schema()?;
        schema
            .contacts
            .get(&id)
            .map(|record| Contact::from_record(id, record))
            .ok_or_else(|| Error::NotFound(format!("Contact {}", id)))
    }

    /// Contacts of a book in insertion order; dangling references are skipped.
    pub fn list_contacts(&self, book_name: &str) -> Result<Vec<Contact>> {
        let schema = self.schema()?;
        let Some(ids) = schema.books.get(book_name) else {
            tracing::warn!("Book '{}' not found.", book_name);
            return Err(Error::NotFound(format!("Book '{}'", book_name)));
        };

        Ok(ids
            .iter()
            .filter_map(|id| {
                schema
                    .contacts
                    .get(id)
                    .map(|record| Contact::from_record(*id, record))
            })
            .collect())
    }

    /// Contacts of a book matching every criterion
    pub fn find_contacts(&self, book_name: &str, criteria: &SearchCriteria) -> Result<Vec<Contact>> {
        Ok(self
            .list_contacts(book_name)?
            .into_iter()
            .filter(|c| criteria.matches(c))
            .collect())
    }

    // ========== Lifecycle ==========

    /// Switch the active format, copying the snapshot into the new file
    pub fn set_codec(&self, codec: Arc<dyn Codec>) -> Result<()> {
        self.with_storage(|s| s.set_codec(codec))
    }

    /// Remove the snapshot file (and directory if empty) and release storage.
    ///
    /// Returns `Ok(false)` if the handle was already deinitialized.
    pub fn deinit(&self) -> Result<bool> {
        let mut guard = self.storage.write();
        let Some(storage) = guard.as_ref() else {
            tracing::warn!("Database at {} is not initialized", self.root.display());
            return Ok(false);
        };
        tracing::debug!("Deinitializing database");
        storage.delete()?;
        *guard = None;
        Ok(true)
    }

    /// Construct fresh storage for the same root
    pub fn reinit(&self, codec: Arc<dyn Codec>) -> Result<()> {
        let mut guard = self.storage.write();
        let storage = FileSystemStorage::open(&self.root, codec)?;
        tracing::debug!("Reinitialized database at {}", storage.path().display());
        *guard = Some(storage);
        Ok(())
    }
}

impl std::fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseManager")
            .field("root", &self.root)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JsonCodec, default_registry};
    use crate::status::Status;
    use tempfile::TempDir;

    fn manager() -> (TempDir, DatabaseManager) {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::open(dir.path(), Arc::new(JsonCodec)).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_create_empty_book() {
        let (_dir, db) = manager();
        let created = db.create_empty_book("Friends").unwrap();
        assert_eq!(created.status, Status::Success);
        assert!(created.value.unwrap().is_empty());

        let again = db.create_empty_book("Friends").unwrap();
        assert!(again.is_cancelled());
        assert!(matches!(again.error, Some(Error::AlreadyExists(_))));
        assert_eq!(again.value.unwrap().name(), "Friends");

        assert_eq!(db.list_books().unwrap().len(), 1);
    }

    #[test]
    fn test_get_book_not_found() {
        let (_dir, db) = manager();
        assert!(matches!(db.get_book("Nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_add_contact_validation_error() {
        let (_dir, db) = manager();
        db.create_empty_book("Friends").unwrap();

        let status = db.add_contact("Friends", "123", "1 Oak St", None).unwrap();
        assert!(status.is_error());
        assert!(matches!(status.error, Some(Error::Validation(_))));

        let status = db
            .add_contact("Friends", "Ann", "1 Oak St", Some("call me"))
            .unwrap();
        assert!(status.is_error());
        assert!(db.list_contacts("Friends").unwrap().is_empty());
    }

    #[test]
    fn test_add_contact_to_missing_book() {
        let (_dir, db) = manager();
        let status = db.add_contact("Ghost", "Ann", "1 Oak St", None).unwrap();
        assert!(status.is_error());
        assert!(matches!(status.error, Some(Error::NotFound(_))));
        assert!(db.schema().unwrap().contacts.is_empty());
    }

    #[test]
    fn test_add_contact_is_idempotent() {
        let (_dir, db) = manager();
        db.create_empty_book("Friends").unwrap();

        let first = db
            .add_contact("Friends", "Ann", "1 Oak St", Some("555-0001"))
            .unwrap();
        assert!(first.is_success());

        let second = db
            .add_contact("Friends", "Ann", "1 Oak St", Some("555-0001"))
            .unwrap();
        assert!(second.is_cancelled());
        assert!(!second.is_error());
        assert_eq!(second.value.unwrap().id(), first.value.unwrap().id());

        assert_eq!(db.get_book("Friends").unwrap().len(), 1);
    }

    #[test]
    fn test_phone_is_not_identity() {
        let (_dir, db) = manager();
        db.create_empty_book("Friends").unwrap();
        db.add_contact("Friends", "Ann", "1 Oak St", Some("555-0001"))
            .unwrap();

        let other_phone = db
            .add_contact("Friends", "Ann", "1 Oak St", Some("555-9999"))
            .unwrap();
        assert!(other_phone.is_cancelled());
        // the original record is kept
        assert_eq!(other_phone.value.unwrap().phone_no(), Some("555-0001"));
    }

    #[test]
    fn test_contacts_are_shared_between_books() {
        let (_dir, db) = manager();
        db.create_empty_book("Friends").unwrap();
        db.create_empty_book("Work").unwrap();

        let ann = db
            .add_contact("Friends", "Ann", "1 Oak St", Some("555-0001"))
            .unwrap()
            .into_value()
            .unwrap();
        // same identity, new phone: the stored record wins
        let shared = db
            .add_contact("Work", "Ann", "1 Oak St", Some("555-9999"))
            .unwrap();
        assert!(shared.is_success());
        assert_eq!(shared.value.unwrap().phone_no(), Some("555-0001"));

        let schema = db.schema().unwrap();
        assert_eq!(schema.contacts.len(), 1);
        assert_eq!(schema.books["Friends"], vec![ann.id()]);
        assert_eq!(schema.books["Work"], vec![ann.id()]);
    }

    #[test]
    fn test_list_contacts_keeps_insertion_order() {
        let (_dir, db) = manager();
        db.create_empty_book("Friends").unwrap();
        for name in ["Zed", "Amy", "Max"] {
            db.add_contact("Friends", name, "1 Oak St", None).unwrap();
        }

        let names: Vec<_> = db
            .list_contacts("Friends")
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["Zed", "Amy", "Max"]);
        assert!(matches!(db.list_contacts("Nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_find_contacts() {
        let (_dir, db) = manager();
        db.create_empty_book("People").unwrap();
        db.add_contact("People", "John Doe", "123 Main St", Some("555-1234"))
            .unwrap();
        db.add_contact("People", "Johnny Cash", "9 Elm St", None)
            .unwrap();
        db.add_contact("People", "Jane Doe", "123 Park Ave", None)
            .unwrap();

        let johns = db
            .find_contacts("People", &SearchCriteria::new().name("John*").unwrap())
            .unwrap();
        assert_eq!(johns.len(), 2);
        assert!(johns.iter().all(|c| c.name().starts_with("John")));

        let both = SearchCriteria::parse([("name", "John*"), ("address", "123*")]).unwrap();
        let matched = db.find_contacts("People", &both).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name(), "John Doe");

        assert!(matches!(
            SearchCriteria::parse([("nickname", "J*")]),
            Err(Error::InvalidCriteria(_))
        ));
    }

    #[test]
    fn test_delete_book_keeps_shared_contacts() {
        let (_dir, db) = manager();
        db.create_empty_book("Friends").unwrap();
        db.create_empty_book("Work").unwrap();
        let ann = db
            .add_contact("Friends", "Ann", "1 Oak St", None)
            .unwrap()
            .into_value()
            .unwrap();
        db.add_contact("Work", "Ann", "1 Oak St", None).unwrap();

        let deleted = db.delete_book("Friends").unwrap();
        assert!(deleted.is_success());
        assert_eq!(deleted.value.unwrap().contacts(), &[ann.id()]);

        let names: Vec<_> = db
            .list_books()
            .unwrap()
            .into_iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["Work"]);
        assert_eq!(db.list_contacts("Work").unwrap(), vec![ann.clone()]);
        assert_eq!(db.get_contact(ann.id()).unwrap().name(), "Ann");

        let missing = db.delete_book("Friends").unwrap();
        assert!(missing.is_cancelled());
    }

    #[test]
    fn test_clear_book_keeps_book_and_contacts() {
        let (_dir, db) = manager();
        db.create_empty_book("Friends").unwrap();
        let ann = db
            .add_contact("Friends", "Ann", "1 Oak St", None)
            .unwrap()
            .into_value()
            .unwrap();

        assert!(db.clear_book("Friends").unwrap().is_success());
        assert!(db.get_book("Friends").unwrap().is_empty());
        assert!(db.get_contact(ann.id()).is_ok());

        assert!(db.clear_book("Nope").unwrap().is_error());
    }

    #[test]
    fn test_clear_all() {
        let (_dir, db) = manager();
        db.create_empty_book("A").unwrap();
        db.create_empty_book("B").unwrap();

        let cleared = db.clear_all().unwrap();
        assert_eq!(cleared.value, Some(2));
        assert!(db.list_books().unwrap().is_empty());
        assert!(db.clear_all().unwrap().is_cancelled());
    }

    #[test]
    fn test_dangling_references_are_tolerated() {
        let (_dir, db) = manager();
        let mut schema = DbSchema::new();
        let ann = Contact::new("Ann", "1 Oak St", None).unwrap();
        schema.contacts.insert(ann.id(), ann.to_record());
        schema
            .books
            .insert("Friends".into(), vec![ContactId(7), ann.id()]);
        db.with_storage(|s| s.write(&schema)).unwrap();

        assert_eq!(db.get_book("Friends").unwrap().contacts(), &[ann.id()]);
        assert_eq!(db.list_contacts("Friends").unwrap().len(), 1);
        // the raw listing still reports what is stored
        assert_eq!(db.list_books().unwrap()[0].len(), 2);
    }

    #[test]
    fn test_add_contact_repairs_dangling_reference() {
        let (_dir, db) = manager();
        let ann = Contact::new("Ann", "1 Oak St", None).unwrap();
        let mut schema = DbSchema::new();
        schema.books.insert("Friends".into(), vec![ann.id()]);
        db.with_storage(|s| s.write(&schema)).unwrap();
        assert!(db.list_contacts("Friends").unwrap().is_empty());

        let added = db.add_contact("Friends", "Ann", "1 Oak St", None).unwrap();
        assert_eq!(added.status, Status::Success);

        let contacts = db.list_contacts("Friends").unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name(), "Ann");
        // the reference was not duplicated
        assert_eq!(db.list_books().unwrap()[0].contacts(), &[ann.id()]);

        let again = db.add_contact("Friends", "Ann", "1 Oak St", None).unwrap();
        assert!(again.is_cancelled());
    }

    #[test]
    fn test_concurrent_adds_lose_nothing() {
        let (_dir, db) = manager();
        let db = Arc::new(db);
        db.create_empty_book("Crowd").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    let status = db
                        .add_contact("Crowd", &format!("Person {}", i), "1 Oak St", None)
                        .unwrap();
                    assert!(status.is_success());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(db.get_book("Crowd").unwrap().len(), 8);
        assert_eq!(db.schema().unwrap().contacts.len(), 8);
    }

    #[test]
    fn test_deinit_and_reinit() {
        let (dir, db) = manager();
        db.create_empty_book("Friends").unwrap();
        let path = db.storage_path().unwrap();

        assert!(db.deinit().unwrap());
        assert_eq!(db.state(), HandleState::Deinitialized);
        assert!(!path.exists());
        assert!(!dir.path().join("adb").exists());
        assert!(matches!(db.list_books(), Err(Error::Deinitialized(_))));
        assert!(matches!(
            db.create_empty_book("Again"),
            Err(Error::Deinitialized(_))
        ));
        assert!(!db.deinit().unwrap());

        db.reinit(Arc::new(JsonCodec)).unwrap();
        assert_eq!(db.state(), HandleState::Initialized);
        assert!(path.exists());
        assert!(db.list_books().unwrap().is_empty());
    }

    #[test]
    fn test_end_to_end_json_roundtrip() {
        let (_dir, db) = manager();
        assert!(db.create_empty_book("Friends").unwrap().is_success());
        assert!(db
            .add_contact("Friends", "Ann", "1 Oak St", Some("555-0001"))
            .unwrap()
            .is_success());
        assert!(db
            .add_contact("Friends", "Ann", "1 Oak St", Some("555-0001"))
            .unwrap()
            .is_cancelled());
        assert!(db
            .add_contact("Friends", "Ann", "1 Oak St", Some("555-9999"))
            .unwrap()
            .is_cancelled());
        assert_eq!(db.list_contacts("Friends").unwrap().len(), 1);

        let registry = default_registry();
        let json = registry.resolve("json").unwrap();
        let text = json.serialize(&db.schema().unwrap()).unwrap();
        let schema = json.deserialize(&text).unwrap();

        let book = schema.resolved_book("Friends").unwrap();
        assert_eq!(book.len(), 1);
        assert_eq!(schema.contacts[&book.contacts()[0]].name, "Ann");
    }

    #[cfg(feature = "xml")]
    #[test]
    fn test_set_codec_migrates_data() {
        let (dir, db) = manager();
        db.create_empty_book("Friends").unwrap();
        db.add_contact("Friends", "Ann", "1 Oak St", None).unwrap();

        let registry = default_registry();
        db.set_codec(registry.resolve("xml").unwrap()).unwrap();

        assert_eq!(db.format().unwrap(), "xml");
        assert_eq!(db.list_contacts("Friends").unwrap().len(), 1);
        assert!(dir.path().join("adb").join("adb.json").exists());
        assert!(dir.path().join("adb").join("adb.xml").exists());
    }
}
