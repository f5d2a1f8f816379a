//! Final record assembly.

use chrono::Utc;
use indexmap::{IndexMap, IndexSet};

use crate::pipeline::dispatch::DispatchReport;
use crate::pipeline::emails::EmailSummary;
use crate::types::email::EmailSet;
use crate::types::link::ClassifiedLinks;
use crate::types::page::PageContent;
use crate::types::platform::Platform;
use crate::types::profile::NormalizedProfile;
use crate::types::record::{EnrichmentStatus, OutputRecord};

/// Everything the assembler needs, already computed.
pub struct RecordParts<'a> {
    pub page: &'a PageContent,
    pub classified: ClassifiedLinks,
    pub page_emails: EmailSet,
    pub profiles: IndexMap<Platform, Option<NormalizedProfile>>,
    pub summary: EmailSummary,
    pub top_platform: Option<Platform>,
    pub report: &'a DispatchReport,
}

/// Build the output record. Pure data transformation.
pub fn assemble_record(parts: RecordParts<'_>) -> OutputRecord {
    let status = if !parts.classified.has_social() {
        EnrichmentStatus::NoSocialLinks
    } else if parts.report.degradation().is_some() {
        EnrichmentStatus::Degraded
    } else {
        EnrichmentStatus::Complete
    };

    let own_url = parts.page.url.trim_end_matches('/');
    let discovered_bio_pages: IndexSet<String> = parts
        .profiles
        .values()
        .flatten()
        .flat_map(|p| p.linked_bio_pages.iter())
        .filter(|url| url.trim_end_matches('/') != own_url)
        .cloned()
        .collect();

    OutputRecord {
        url: parts.page.url.clone(),
        page_title: parts.page.title.clone(),
        profile_name: parts.page.profile_name.clone(),
        page_emails: parts.page_emails,
        social_links: parts.classified.social.into_iter().collect(),
        other_links: parts.classified.other.into_iter().collect(),
        profiles: parts.profiles,
        emails: parts.summary.emails,
        primary_email: parts.summary.primary,
        top_platform: parts.top_platform,
        discovered_bio_pages: discovered_bio_pages.into_iter().collect(),
        dispatch: parts.report.outcomes(),
        status,
        processed_at: Utc::now(),
    }
}
