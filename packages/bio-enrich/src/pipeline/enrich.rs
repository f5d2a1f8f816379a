//! The per-page enrichment pipeline.
//!
//! classify → expand short links → extract identifiers → dispatch →
//! normalize → aggregate emails → assemble. Only dispatch runs concurrently.

use indexmap::IndexMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ConfigResult, Result};
use crate::pipeline::assemble::{assemble_record, RecordParts};
use crate::pipeline::classify::{classify_links, platform_links};
use crate::pipeline::dispatch::ProviderDispatcher;
use crate::pipeline::emails::{aggregate_emails, top_platform};
use crate::pipeline::identifiers::IdentifierExtractor;
use crate::pipeline::normalize::normalize_profile;
use crate::pipeline::shortlink::expand_short_links;
use crate::traits::provider::ProviderRegistry;
use crate::traits::resolver::ShortLinkResolver;
use crate::traits::sink::RecordSink;
use crate::types::config::EnrichmentConfig;
use crate::types::email::EmailSet;
use crate::types::link::ClassifiedLinks;
use crate::types::page::PageContent;
use crate::types::platform::Platform;
use crate::types::profile::{NormalizedProfile, ProviderRequest};
use crate::types::record::OutputRecord;

/// Runs the enrichment pipeline for one page at a time.
///
/// Holds no per-page state; concurrent calls on one `Enricher` are independent.
///
/// # Example
///
/// ```rust,ignore
/// let enricher = Enricher::new(EnrichmentConfig::default(), registry)?
///     .with_resolver(Arc::new(HttpShortLinkResolver::new()?));
///
/// let record = enricher.enrich(&page).await;
/// ```
pub struct Enricher {
    config: EnrichmentConfig,
    extractor: IdentifierExtractor,
    registry: ProviderRegistry,
    resolver: Option<Arc<dyn ShortLinkResolver>>,
}

impl Enricher {
    /// Validate the config and build an enricher.
    pub fn new(config: EnrichmentConfig, registry: ProviderRegistry) -> ConfigResult<Self> {
        config.validate()?;
        let extractor = IdentifierExtractor::new(&config)?;
        Ok(Self {
            config,
            extractor,
            registry,
            resolver: None,
        })
    }

    /// Set the transport used to expand short links.
    pub fn with_resolver(mut self, resolver: Arc<dyn ShortLinkResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Enrich one page. Never fails; partial data loss shows up in the record.
    pub async fn enrich(&self, page: &PageContent) -> OutputRecord {
        self.enrich_with_cancel(page, CancellationToken::new()).await
    }

    /// Enrich one page; lookups still running when `cancel` fires count as timed out.
    pub async fn enrich_with_cancel(
        &self,
        page: &PageContent,
        cancel: CancellationToken,
    ) -> OutputRecord {
        info!(url = %page.url, title = %page.title, "Enriching bio page");

        let mut page_emails = EmailSet::new();
        let classified = classify_links(&page.links(), &page.text, &mut page_emails, &self.config);

        let requests = self.build_requests(&classified).await;

        let report = ProviderDispatcher::new(&self.registry)
            .with_timeout(self.config.dispatch_timeout())
            .dispatch(requests, cancel)
            .await;

        let mut profiles: IndexMap<Platform, Option<NormalizedProfile>> = IndexMap::new();
        for spec in &self.config.platforms {
            let profile = report.get(spec.platform).and_then(|result| {
                normalize_profile(
                    spec,
                    &result.items,
                    Some(&result.request),
                    &self.config.bio_page_domains,
                )
            });
            profiles.insert(spec.platform, profile);
        }

        let summary = aggregate_emails(&page_emails, &profiles, &self.config.email_priority);
        let top = top_platform(&profiles, &self.config.audience_priority);

        let record = assemble_record(RecordParts {
            page,
            classified,
            page_emails,
            profiles,
            summary,
            top_platform: top,
            report: &report,
        });

        info!(
            url = %record.url,
            status = ?record.status,
            profiles = record.profiles.values().filter(|p| p.is_some()).count(),
            emails = record.emails.len(),
            "Bio page enriched"
        );

        record
    }

    /// Enrich one page and hand the record to `sink`.
    pub async fn process_page<S: RecordSink + ?Sized>(
        &self,
        page: &PageContent,
        sink: &S,
    ) -> Result<OutputRecord> {
        let record = self.enrich(page).await;
        sink.emit(&record).await?;
        info!(url = %record.url, "Record emitted");
        Ok(record)
    }

    /// One request per configured platform, in config order.
    ///
    /// Disabled platforms and platforms without usable links get empty input.
    pub async fn build_requests(&self, classified: &ClassifiedLinks) -> Vec<ProviderRequest> {
        let mut requests = Vec::with_capacity(self.config.platforms.len());

        for spec in &self.config.platforms {
            let links = platform_links(spec.platform, classified, &self.config);
            let source_url = links.first().cloned();

            let input = if !spec.enabled || links.is_empty() {
                self.extractor.extract(spec.platform, &[])
            } else {
                let expansion = expand_short_links(spec, links, self.resolver.as_deref()).await;
                if !expansion.failures.is_empty() {
                    warn!(
                        platform = %spec.platform,
                        failed = expansion.failures.len(),
                        "Some short links could not be resolved"
                    );
                }
                self.extractor.extract(spec.platform, &expansion.urls)
            };

            let mut request = ProviderRequest::new(spec.platform, input);
            if let Some(url) = source_url {
                request = request.with_source_url(url);
            }
            requests.push(request);
        }

        requests
    }
}
