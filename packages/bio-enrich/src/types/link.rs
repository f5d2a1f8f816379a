//! Links scraped from a bio page.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// An anchor as scraped. `url` may be missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawLink {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawLink {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
        }
    }

    /// A link whose anchor had no href.
    pub fn without_url(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
        }
    }

    /// The trimmed URL, if present and non-empty.
    pub fn href(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Navigable links split into social and other buckets.
///
/// Each bucket is deduplicated on the (title, url) pair and keeps first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedLinks {
    pub social: IndexSet<RawLink>,
    pub other: IndexSet<RawLink>,
}

impl ClassifiedLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_social(&self) -> bool {
        !self.social.is_empty()
    }

    pub fn total(&self) -> usize {
        self.social.len() + self.other.len()
    }
}
