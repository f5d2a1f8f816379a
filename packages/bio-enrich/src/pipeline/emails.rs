//! Email union, primary-email precedence, and the most prominent platform.

use indexmap::IndexMap;
use tracing::info;

use crate::types::email::EmailSet;
use crate::types::platform::Platform;
use crate::types::profile::NormalizedProfile;

/// Aggregate email evidence for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSummary {
    pub emails: EmailSet,
    pub primary: Option<String>,
}

/// Union page emails with every profile's emails and pick the primary.
///
/// Precedence: page emails first, then platforms in `priority` order, then any
/// platform missing from `priority` in slot order. The primary is the first
/// address of the first non-empty source.
pub fn aggregate_emails(
    page_emails: &EmailSet,
    profiles: &IndexMap<Platform, Option<NormalizedProfile>>,
    priority: &[Platform],
) -> EmailSummary {
    let mut emails = page_emails.clone();
    let mut primary = page_emails.first().map(str::to_string);

    for platform in precedence(profiles, priority) {
        let Some(profile) = profiles.get(&platform).and_then(Option::as_ref) else {
            continue;
        };
        emails.merge(&profile.emails_found);
        if primary.is_none() {
            primary = profile.emails_found.first().map(str::to_string);
        }
    }

    info!(
        page = page_emails.len(),
        total = emails.len(),
        primary = primary.as_deref().unwrap_or("-"),
        "Emails aggregated"
    );

    EmailSummary { emails, primary }
}

/// Platform with the largest follower count.
///
/// Ties go to the platform earlier in `priority`; profiles without a count
/// are ignored. `None` when no profile reports a count.
pub fn top_platform(
    profiles: &IndexMap<Platform, Option<NormalizedProfile>>,
    priority: &[Platform],
) -> Option<Platform> {
    let mut best: Option<(Platform, u64)> = None;

    for platform in precedence(profiles, priority) {
        let count = profiles
            .get(&platform)
            .and_then(Option::as_ref)
            .and_then(|p| p.follower_count);
        let Some(count) = count else {
            continue;
        };
        if best.map_or(true, |(_, current)| count > current) {
            best = Some((platform, count));
        }
    }

    best.map(|(platform, _)| platform)
}

fn precedence(
    profiles: &IndexMap<Platform, Option<NormalizedProfile>>,
    priority: &[Platform],
) -> Vec<Platform> {
    let mut order: Vec<Platform> = Vec::with_capacity(profiles.len());
    for platform in priority.iter().chain(profiles.keys()) {
        if !order.contains(platform) {
            order.push(*platform);
        }
    }
    order
}
