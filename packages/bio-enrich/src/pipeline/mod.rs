//! The link classification and enrichment pipeline.

pub mod assemble;
pub mod classify;
pub mod dispatch;
pub mod emails;
pub mod enrich;
pub mod identifiers;
pub mod normalize;
pub mod shortlink;

pub use assemble::{assemble_record, RecordParts};
pub use classify::{classify_link, classify_links, platform_links, LinkKind};
pub use dispatch::{DispatchReport, PlatformResult, ProviderDispatcher};
pub use emails::{aggregate_emails, top_platform, EmailSummary};
pub use enrich::Enricher;
pub use identifiers::IdentifierExtractor;
pub use normalize::{normalize_profile, parse_count, single_line};
pub use shortlink::{expand_short_links, ShortLinkExpansion};
