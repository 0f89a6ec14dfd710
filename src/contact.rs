//! Contact identity model
//!
//! A contact is identified by a fingerprint of its normalized `(name, address)`:
//! - `name` and `address` are whitespace-trimmed before hashing
//! - the phone number is stored and displayed but is NOT part of identity
//!
//! Two contacts with the same name and address but different phone numbers
//! therefore collide and are treated as the same entity.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Separator placed between the normalized fields before hashing, so that
/// `("ab", "c")` and `("a", "bc")` do not produce the same input.
const FIELD_SEPARATOR: char = '\u{1f}';

static PHONE_NO_REGEX: OnceLock<Regex> = OnceLock::new();

fn phone_no_regex() -> &'static Regex {
    PHONE_NO_REGEX.get_or_init(|| Regex::new(r"^[0-9()+\-\s]+$").expect("static phone regex"))
}

/// Deterministic contact fingerprint.
///
/// The first 8 bytes of a BLAKE3 digest, read big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub u64);

impl ContactId {
    /// Compute the fingerprint for a `(name, address)` pair.
    pub fn fingerprint(name: &str, address: &str) -> Self {
        let mut input = String::with_capacity(name.len() + address.len() + 1);
        input.push_str(name.trim());
        input.push(FIELD_SEPARATOR);
        input.push_str(address.trim());

        let digest = blake3::hash(input.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        Self(u64::from_be_bytes(head))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContactId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// The searchable/validated fields of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Address,
    PhoneNo,
}

impl ContactField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Address => "address",
            ContactField::PhoneNo => "phone_no",
        }
    }
}

impl FromStr for ContactField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(ContactField::Name),
            "address" => Ok(ContactField::Address),
            "phone_no" | "phone" => Ok(ContactField::PhoneNo),
            _ => Err(Error::InvalidCriteria(format!(
                "unknown contact field '{}' (expected one of: name, address, phone_no)",
                s
            ))),
        }
    }
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rejected contact field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} format: {value:?}. {reason}")]
pub struct ValidationError {
    pub field: ContactField,
    pub value: String,
    pub reason: &'static str,
}

impl ValidationError {
    fn new(field: ContactField, value: &str, reason: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

pub fn validate_name(name: &str) -> std::result::Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(ContactField::Name, name, "Name cannot be empty."));
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(ContactField::Name, name, "Name cannot be a number."));
    }
    Ok(())
}

pub fn validate_address(address: &str) -> std::result::Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::new(
            ContactField::Address,
            address,
            "Address cannot be empty.",
        ));
    }
    Ok(())
}

pub fn validate_phone_no(phone_no: Option<&str>) -> std::result::Result<(), ValidationError> {
    match phone_no {
        Some(phone) if !phone_no_regex().is_match(phone) => Err(ValidationError::new(
            ContactField::PhoneNo,
            phone,
            "Please enter only digits, spaces, +, (, ), and -.",
        )),
        _ => Ok(()),
    }
}

/// Stored contact payload, as it appears in the schema's contacts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone_no: Option<String>,
}

/// An immutable, validated contact.
#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    id: ContactId,
    name: String,
    address: String,
    phone_no: Option<String>,
}

impl Contact {
    /// Validate the fields and build a contact.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone_no: Option<String>,
    ) -> std::result::Result<Self, ValidationError> {
        let name = name.into();
        let address = address.into();

        validate_name(&name)?;
        validate_address(&address)?;
        validate_phone_no(phone_no.as_deref())?;

        let id = ContactId::fingerprint(&name, &address);
        Ok(Self {
            id,
            name,
            address,
            phone_no,
        })
    }

    /// Rebuild a contact from a stored row without re-validating it.
    /// The id is the table key, not a recomputed fingerprint.
    pub fn from_record(id: ContactId, record: &ContactRecord) -> Self {
        Self {
            id,
            name: record.name.clone(),
            address: record.address.clone(),
            phone_no: record.phone_no.clone(),
        }
    }

    pub fn id(&self) -> ContactId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn phone_no(&self) -> Option<&str> {
        self.phone_no.as_deref()
    }

    /// Field value used for display and pattern matching; an absent phone is `""`.
    pub fn field(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Address => &self.address,
            ContactField::PhoneNo => self.phone_no.as_deref().unwrap_or(""),
        }
    }

    pub fn to_record(&self) -> ContactRecord {
        ContactRecord {
            name: self.name.clone(),
            address: self.address.clone(),
            phone_no: self.phone_no.clone(),
        }
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contact {}

impl std::hash::Hash for Contact {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Contact(name={}, address={}, phone_no={})",
            self.name,
            self.address,
            self.phone_no.as_deref().unwrap_or("-")
        )
    }
}
