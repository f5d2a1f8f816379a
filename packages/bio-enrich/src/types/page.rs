//! Page content handed over by the scraping layer.

use serde::{Deserialize, Serialize};

use super::link::RawLink;

/// Already-extracted content of one bio page.
///
/// The two link lists correspond to the page's two anchor classes: the row of
/// social icons and the featured link buttons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    /// URL the page was loaded from
    pub url: String,

    /// Document title
    #[serde(default)]
    pub title: String,

    /// Display name shown in the profile header, if any
    #[serde(default)]
    pub profile_name: Option<String>,

    #[serde(default)]
    pub social_icon_links: Vec<RawLink>,

    #[serde(default)]
    pub featured_links: Vec<RawLink>,

    /// Visible text content of the page
    #[serde(default)]
    pub text: String,
}

impl PageContent {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_profile_name(mut self, name: impl Into<String>) -> Self {
        self.profile_name = Some(name.into());
        self
    }

    pub fn with_social_icon(mut self, link: RawLink) -> Self {
        self.social_icon_links.push(link);
        self
    }

    pub fn with_featured_link(mut self, link: RawLink) -> Self {
        self.featured_links.push(link);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Both anchor classes, icons first.
    pub fn links(&self) -> Vec<RawLink> {
        self.social_icon_links
            .iter()
            .chain(self.featured_links.iter())
            .cloned()
            .collect()
    }
}
