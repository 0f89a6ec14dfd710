//! Human-facing CLI output. Errors and warnings go to stderr; everything else
//! to stdout and is suppressed when `ADB_QUIET` is set.

use crate::status::Status;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;
use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("ADB_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::DATABASE, text.style(theme().header.clone()));
}

pub fn book_header(name: &str, count: usize) {
    if is_quiet() {
        return;
    }
    println!(
        "{} {} {}",
        Icons::BOOK,
        name.style(theme().header.clone()),
        muted(&format!("({} contacts)", count))
    );
}

pub fn status(icon: &str, label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}: {}", icon, label.style(theme().label.clone()), value);
}

pub fn success(label: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CHECK, label.style(theme().outcome(Status::Success)));
}

pub fn cancelled(label: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::SKIP, label.style(theme().outcome(Status::Cancelled)));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().outcome(Status::Error)));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().label.clone()),
        value
    );
}

pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("  {} {}", label.style(theme().label.clone()), value);
}

/// Report a mutation outcome with the matching icon and style
pub fn outcome(status: Status, message: &str) {
    match status {
        Status::Success => success(message),
        Status::Cancelled => cancelled(message),
        Status::Error => error(message),
    }
}
