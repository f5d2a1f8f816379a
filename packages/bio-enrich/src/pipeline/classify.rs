//! Link classification: emails vs social links vs everything else.
//!
//! Emails are pulled out first (from the page text and from any link whose
//! target contains an address). What is left is split by host into social and
//! other links, each deduplicated on the (title, url) pair.

use tracing::{debug, info};
use url::Url;

use crate::error::EnrichError;
use crate::types::config::EnrichmentConfig;
use crate::types::email::{email_in_url, EmailSet};
use crate::types::link::{ClassifiedLinks, RawLink};
use crate::types::platform::Platform;

/// Where a single link ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// Link target is (or contains) an email address
    Email(String),
    /// Link host belongs to a supported platform
    Social(Platform),
    /// Any other navigable link
    Other,
    /// Missing or unparseable URL; dropped
    Malformed,
}

/// Decide the bucket for one link.
pub fn classify_link(link: &RawLink, config: &EnrichmentConfig) -> LinkKind {
    let Some(href) = link.href() else {
        return LinkKind::Malformed;
    };

    if let Some(email) = email_in_url(href) {
        return LinkKind::Email(email);
    }

    let parsed = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => return LinkKind::Malformed,
    };

    match parsed.host_str().and_then(|host| config.platform_for_host(host)) {
        Some(platform) => LinkKind::Social(platform),
        None => LinkKind::Other,
    }
}

/// Classify a page's links, adding every email found to `emails`.
///
/// Emails in `page_text` are collected first, then emails hiding in link
/// targets. Calling this twice with the same input yields the same result.
pub fn classify_links(
    links: &[RawLink],
    page_text: &str,
    emails: &mut EmailSet,
    config: &EnrichmentConfig,
) -> ClassifiedLinks {
    let from_text = emails.extend_from_text(page_text);
    let mut classified = ClassifiedLinks::new();
    let mut email_links = 0usize;
    let mut dropped = 0usize;

    for link in links {
        match classify_link(link, config) {
            LinkKind::Email(email) => {
                email_links += 1;
                emails.insert(&email);
            }
            LinkKind::Social(_) => {
                classified.social.insert(link.clone());
            }
            LinkKind::Other => {
                classified.other.insert(link.clone());
            }
            LinkKind::Malformed => {
                dropped += 1;
                let err = EnrichError::MalformedLink {
                    url: link.url.clone(),
                };
                debug!(title = %link.title, error = %err, "Dropping link");
            }
        }
    }

    info!(
        total = links.len(),
        social = classified.social.len(),
        other = classified.other.len(),
        email_links,
        dropped,
        emails_from_text = from_text,
        emails = emails.len(),
        "Links classified"
    );

    classified
}

/// Social links whose host belongs to `platform`, in first-seen order.
pub fn platform_links(
    platform: Platform,
    classified: &ClassifiedLinks,
    config: &EnrichmentConfig,
) -> Vec<String> {
    classified
        .social
        .iter()
        .filter_map(|link| {
            let href = link.href()?;
            let host = Url::parse(href).ok()?.host_str()?.to_string();
            (config.platform_for_host(&host) == Some(platform)).then(|| href.to_string())
        })
        .collect()
}
