//! Provider requests and the normalized per-platform profile.

use serde::{Deserialize, Serialize};

use super::email::EmailSet;
use super::platform::Platform;

/// What gets sent to a platform's provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ProviderInput {
    /// Extracted handles, one per distinct profile link
    Usernames(Vec<String>),
    /// Profile URLs passed through verbatim (possibly replicated)
    StartUrls(Vec<String>),
}

impl ProviderInput {
    pub fn values(&self) -> &[String] {
        match self {
            ProviderInput::Usernames(v) | ProviderInput::StartUrls(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }
}

/// One platform's lookup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub platform: Platform,
    pub input: ProviderInput,
    /// The page link the input was derived from, used as the profile URL
    /// when the provider does not report one.
    pub source_url: Option<String>,
}

impl ProviderRequest {
    pub fn new(platform: Platform, input: ProviderInput) -> Self {
        Self {
            platform,
            input,
            source_url: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Empty input means the lookup is skipped, not sent.
    pub fn is_dispatchable(&self) -> bool {
        !self.input.is_empty()
    }
}

/// Common-shape profile built from one provider item.
///
/// Every field is best-effort: `None` when the provider did not report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProfile {
    pub platform: Platform,
    pub url: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub follower_count: Option<u64>,
    pub like_count: Option<u64>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub external_url: Option<String>,
    pub emails_found: EmailSet,
    /// Other link-in-bio pages referenced from the bio or external URL
    #[serde(default)]
    pub linked_bio_pages: Vec<String>,
}
