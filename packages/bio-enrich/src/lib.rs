//! Link-in-bio Enrichment Library
//!
//! Takes the content of one link-in-bio page (a title, a list of links, some
//! free text), works out which links point at social profiles, looks those
//! profiles up through external providers, and merges everything into a
//! single output record.
//!
//! # Pipeline
//!
//! 1. Classify links into social, email and other
//! 2. Expand short links, then derive one provider input per platform
//! 3. Dispatch all platform lookups concurrently, isolating failures
//! 4. Normalize provider items into a common profile shape
//! 5. Aggregate emails, pick a primary email and a top platform
//! 6. Assemble the record and hand it to a sink
//!
//! # Usage
//!
//! ```rust,ignore
//! use bio_enrich::{apify_registry, Enricher, EnrichmentConfig, JsonLinesSink, PageContent};
//! use apify_client::ApifyClient;
//! use std::sync::Arc;
//!
//! let config = EnrichmentConfig::default();
//! let client = Arc::new(ApifyClient::new(token));
//! let enricher = Enricher::new(config.clone(), apify_registry(client, &config))?;
//!
//! let page = PageContent::new("https://linktr.ee/alice");
//! let record = enricher.process_page(&page, &JsonLinesSink::new(std::io::stdout())).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams to the outside world (ProfileProvider, ShortLinkResolver, RecordSink)
//! - [`types`] - Pages, links, profiles, config and output records
//! - [`pipeline`] - The enrichment stages and the [`Enricher`] that runs them
//! - [`providers`] - Provider implementations (ApifyProvider)
//! - [`resolvers`] - Short-link resolver over HTTP
//! - [`sinks`] - Record sinks (JsonLinesSink)
//! - [`render`] - Flat row rendering
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod pipeline;
pub mod providers;
pub mod render;
pub mod resolvers;
pub mod sinks;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ConfigError, EnrichError, ProviderError, ResolveError, Result, SinkError};
pub use traits::{
    provider::{ProfileProvider, ProviderRegistry},
    resolver::ShortLinkResolver,
    sink::RecordSink,
};
pub use types::{
    config::{
        EnrichmentConfig, FieldMap, IdentifierRule, InputEntryShape, PlatformSpec, ProviderSpec,
        ShortLinkRule, TWITTER_START_URL_REPLICATION,
    },
    email::{email_in_url, extract_emails, EmailSet},
    link::{ClassifiedLinks, RawLink},
    page::PageContent,
    platform::Platform,
    profile::{NormalizedProfile, ProviderInput, ProviderRequest},
    record::{DispatchOutcome, EnrichmentStatus, OutputRecord},
};

pub use pipeline::{
    // Orchestration
    Enricher,
    // Stages
    aggregate_emails, assemble_record, classify_link, classify_links, expand_short_links,
    normalize_profile, platform_links, top_platform, IdentifierExtractor, ProviderDispatcher,
    // Stage outputs
    DispatchReport, EmailSummary, LinkKind, PlatformResult, RecordParts, ShortLinkExpansion,
};

pub use providers::{apify_registry, ApifyProvider};
pub use render::flat_row;
pub use resolvers::HttpShortLinkResolver;
pub use sinks::{JsonLinesSink, RecordLayout};

// Re-export testing utilities
pub use testing::{MemorySink, MockProvider, MockResolver};
