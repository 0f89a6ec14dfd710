//! Read-only rendering of a schema for humans
//!
//! Walks books (by name) and their contacts (in insertion order) and produces
//! plain text, Markdown or HTML. Dangling references are skipped.

use crate::contact::{Contact, ContactId};
use crate::schema::DbSchema;
use crate::{Error, Result};
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFormat {
    Text,
    Markdown,
    Html,
}

impl ViewFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewFormat::Text => "text",
            ViewFormat::Markdown => "markdown",
            ViewFormat::Html => "html",
        }
    }
}

impl FromStr for ViewFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(ViewFormat::Text),
            "markdown" | "md" => Ok(ViewFormat::Markdown),
            "html" => Ok(ViewFormat::Html),
            _ => Err(Error::UnknownView(s.to_string())),
        }
    }
}

fn book_contacts<'a>(schema: &'a DbSchema, ids: &'a [ContactId]) -> impl Iterator<Item = Contact> + 'a {
    ids.iter().filter_map(|id| {
        schema
            .contacts
            .get(id)
            .map(|record| Contact::from_record(*id, record))
    })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render every book of the schema.
pub fn render(schema: &DbSchema, format: ViewFormat) -> String {
    let mut out = String::new();

    if format == ViewFormat::Html {
        out.push_str("<div class=\"adb\">");
    }

    for (name, ids) in &schema.books {
        // Writing into a String cannot fail
        let _ = match format {
            ViewFormat::Text => render_text(&mut out, name, book_contacts(schema, ids)),
            ViewFormat::Markdown => render_markdown(&mut out, name, book_contacts(schema, ids)),
            ViewFormat::Html => render_html(&mut out, name, book_contacts(schema, ids)),
        };
    }

    if format == ViewFormat::Html {
        out.push_str("</div>");
    }
    out
}

fn render_text(
    out: &mut String,
    name: &str,
    contacts: impl Iterator<Item = Contact>,
) -> std::fmt::Result {
    writeln!(out, "Address Book: {}", name)?;
    for (i, contact) in contacts.enumerate() {
        writeln!(
            out,
            "{}. {}, {}, {}",
            i + 1,
            contact.name(),
            contact.address(),
            contact.phone_no().unwrap_or("-")
        )?;
    }
    writeln!(out)
}

fn render_markdown(
    out: &mut String,
    name: &str,
    contacts: impl Iterator<Item = Contact>,
) -> std::fmt::Result {
    writeln!(out, "# Address Book: {}", name)?;
    writeln!(out, "## Contacts")?;
    for contact in contacts {
        writeln!(out, "- **Name**: {}", contact.name())?;
        writeln!(out, "  - **Address**: {}", contact.address())?;
        writeln!(
            out,
            "  - **Phone Number**: {}",
            contact.phone_no().unwrap_or("-")
        )?;
    }
    writeln!(out)
}

fn render_html(
    out: &mut String,
    name: &str,
    contacts: impl Iterator<Item = Contact>,
) -> std::fmt::Result {
    write!(out, "<h1>Address Book: {}</h1><ul>", escape_html(name))?;
    for contact in contacts {
        write!(
            out,
            "<li>{}, {}, {}</li>",
            escape_html(contact.name()),
            escape_html(contact.address()),
            escape_html(contact.phone_no().unwrap_or("-"))
        )?;
    }
    write!(out, "</ul>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> DbSchema {
        let mut schema = DbSchema::new();
        let ann = Contact::new("Ann", "1 Oak St", Some("555-0001".into())).unwrap();
        let bob = Contact::new("Bob & Co", "<2 Elm St>", None).unwrap();
        schema.contacts.insert(ann.id(), ann.to_record());
        schema.contacts.insert(bob.id(), bob.to_record());
        schema
            .books
            .insert("Friends".into(), vec![bob.id(), ContactId(1), ann.id()]);
        schema
    }

    #[test]
    fn test_view_format_parse() {
        assert_eq!("md".parse::<ViewFormat>().unwrap(), ViewFormat::Markdown);
        assert_eq!("HTML".parse::<ViewFormat>().unwrap(), ViewFormat::Html);
        assert!("pdf".parse::<ViewFormat>().is_err());
    }

    #[test]
    fn test_render_text() {
        let text = render(&schema(), ViewFormat::Text);
        assert!(text.starts_with("Address Book: Friends\n"));
        assert!(text.contains("1. Bob & Co, <2 Elm St>, -\n"));
        assert!(text.contains("2. Ann, 1 Oak St, 555-0001\n"));
    }

    #[test]
    fn test_render_markdown() {
        let md = render(&schema(), ViewFormat::Markdown);
        assert!(md.contains("# Address Book: Friends"));
        assert!(md.contains("- **Name**: Ann"));
        assert!(md.contains("  - **Phone Number**: 555-0001"));
    }

    #[test]
    fn test_render_html_escapes() {
        let html = render(&schema(), ViewFormat::Html);
        assert!(html.contains("<h1>Address Book: Friends</h1>"));
        assert!(html.contains("<li>Bob &amp; Co, &lt;2 Elm St&gt;, -</li>"));
        assert!(!html.contains("<2 Elm St>"));
    }

    #[test]
    fn test_render_empty_schema() {
        assert_eq!(render(&DbSchema::new(), ViewFormat::Text), "");
    }
}
