//! Contact search criteria
//!
//! Criteria map a field name to a glob pattern (`*`, `?`, `[...]`, case-sensitive).
//! A contact matches only if every criterion matches.

use crate::contact::{Contact, ContactField};
use crate::{Error, Result};
use glob::Pattern;

#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    patterns: Vec<(ContactField, Pattern)>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `(field, pattern)` pairs. Unknown fields and malformed patterns are rejected.
    pub fn parse<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = Self::new();
        for (field, pattern) in pairs {
            let field: ContactField = field.as_ref().parse()?;
            criteria = criteria.with(field, pattern.as_ref())?;
        }
        Ok(criteria)
    }

    /// Add one criterion
    pub fn with(mut self, field: ContactField, pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|e| {
            Error::InvalidCriteria(format!("invalid pattern '{}' for {}: {}", pattern, field, e))
        })?;
        self.patterns.push((field, compiled));
        Ok(self)
    }

    pub fn name(self, pattern: &str) -> Result<Self> {
        self.with(ContactField::Name, pattern)
    }

    pub fn address(self, pattern: &str) -> Result<Self> {
        self.with(ContactField::Address, pattern)
    }

    pub fn phone_no(self, pattern: &str) -> Result<Self> {
        self.with(ContactField::PhoneNo, pattern)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Logical AND of all criteria; empty criteria match everything.
    pub fn matches(&self, contact: &Contact) -> bool {
        self.patterns
            .iter()
            .all(|(field, pattern)| pattern.matches(contact.field(*field)))
    }
}
