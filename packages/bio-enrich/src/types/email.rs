//! Email evidence harvested from pages and profile bios.

use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // local@domain.tld with a tld of two or more letters
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
}

/// Set of normalized email addresses.
///
/// Keeps first-seen order so that "first email found" is deterministic, but
/// equality ignores order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailSet(IndexSet<String>);

impl EmailSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and insert one address. Returns `true` if it was new.
    ///
    /// Candidates that do not normalize to exactly one `@` are ignored.
    pub fn insert(&mut self, raw: &str) -> bool {
        match normalize_email(raw) {
            Some(email) => self.0.insert(email),
            None => false,
        }
    }

    /// Insert every address found in free text. Returns how many were new.
    pub fn extend_from_text(&mut self, text: &str) -> usize {
        let before = self.0.len();
        for m in EMAIL_REGEX.find_iter(text) {
            self.insert(m.as_str());
        }
        self.0.len() - before
    }

    /// Union another set into this one.
    pub fn merge(&mut self, other: &EmailSet) {
        for email in other.iter() {
            self.0.insert(email.clone());
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.0.contains(email)
    }

    /// First address in insertion order.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for EmailSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|e| other.0.contains(e))
    }
}

impl Eq for EmailSet {}

impl<S: AsRef<str>> FromIterator<S> for EmailSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = EmailSet::new();
        for email in iter {
            set.insert(email.as_ref());
        }
        set
    }
}

/// Extract every email in `text` into a fresh set.
pub fn extract_emails(text: &str) -> EmailSet {
    let mut set = EmailSet::new();
    set.extend_from_text(text);
    set
}

/// Find the first email embedded in a link target (`mailto:` or literal).
pub fn email_in_url(url: &str) -> Option<String> {
    EMAIL_REGEX
        .find(url)
        .and_then(|m| normalize_email(m.as_str()))
}

/// Trim, strip a `mailto:` prefix and query, lower-case the domain.
fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_scheme = match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => &trimmed[7..],
        _ => trimmed,
    };
    let address = without_scheme
        .split('?')
        .next()
        .unwrap_or_default()
        .trim();

    let (local, domain) = address.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }

    Some(format!("{}@{}", local, domain.to_lowercase()))
}
