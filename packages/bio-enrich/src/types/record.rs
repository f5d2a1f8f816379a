//! The assembled per-page output record.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::email::EmailSet;
use super::link::RawLink;
use super::platform::Platform;
use super::profile::NormalizedProfile;

/// What happened to one platform during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// No input for this platform (or the platform is disabled); nothing was sent
    Skipped,
    /// Input existed but no provider is registered
    Unsupported,
    /// Provider answered with this many items
    Completed { items: usize },
    /// Provider call failed
    Failed { error: String },
    /// Deadline or cancellation hit before the provider answered
    TimedOut,
}

impl DispatchOutcome {
    /// Whether a request was actually sent.
    pub fn was_dispatched(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Completed { .. }
                | DispatchOutcome::Failed { .. }
                | DispatchOutcome::TimedOut
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DispatchOutcome::Failed { .. } | DispatchOutcome::TimedOut)
    }
}

/// Overall result quality for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// At least one lookup completed, or none was needed beyond skipped ones
    Complete,
    /// The page had no social links at all
    NoSocialLinks,
    /// Every dispatched lookup failed; profile fields are empty because of errors
    Degraded,
}

/// Everything known about one bio page after enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub url: String,
    pub page_title: String,
    pub profile_name: Option<String>,

    /// Emails found on the page itself
    pub page_emails: EmailSet,

    pub social_links: Vec<RawLink>,
    pub other_links: Vec<RawLink>,

    /// One slot per platform, `None` when nothing usable came back
    pub profiles: IndexMap<Platform, Option<NormalizedProfile>>,

    /// Page emails plus every platform's emails
    pub emails: EmailSet,
    pub primary_email: Option<String>,
    pub top_platform: Option<Platform>,

    /// Link-in-bio pages referenced from profile bios, for the caller to enqueue
    pub discovered_bio_pages: Vec<String>,

    pub dispatch: IndexMap<Platform, DispatchOutcome>,
    pub status: EnrichmentStatus,
    pub processed_at: DateTime<Utc>,
}

impl OutputRecord {
    pub fn profile(&self, platform: Platform) -> Option<&NormalizedProfile> {
        self.profiles.get(&platform).and_then(Option::as_ref)
    }

    pub fn is_degraded(&self) -> bool {
        self.status == EnrichmentStatus::Degraded
    }
}
