//! Derive provider input (handles or start URLs) from a platform's links.

use indexmap::IndexSet;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

use crate::error::ConfigResult;
use crate::pipeline::classify::platform_links;
use crate::types::config::{EnrichmentConfig, IdentifierRule};
use crate::types::link::ClassifiedLinks;
use crate::types::platform::Platform;
use crate::types::profile::ProviderInput;

/// Applies each platform's identifier rule. Patterns are compiled once.
#[derive(Debug, Clone)]
pub struct IdentifierExtractor {
    rules: HashMap<Platform, CompiledRule>,
}

#[derive(Debug, Clone)]
enum CompiledRule {
    Username(Regex),
    StartUrls { replication: usize },
}

impl IdentifierExtractor {
    pub fn new(config: &EnrichmentConfig) -> ConfigResult<Self> {
        let mut rules = HashMap::new();
        for spec in &config.platforms {
            let rule = match (&spec.identifier, spec.identifier.compile(spec.platform)?) {
                (_, Some(regex)) => CompiledRule::Username(regex),
                (IdentifierRule::StartUrls { replication }, None) => CompiledRule::StartUrls {
                    replication: (*replication).max(1),
                },
                (IdentifierRule::Username { .. }, None) => continue,
            };
            rules.insert(spec.platform, rule);
        }
        Ok(Self { rules })
    }

    /// Build provider input for `platform` from already-filtered URLs.
    ///
    /// URLs that do not match the platform's pattern are skipped. Handles and
    /// URLs are deduplicated before start URLs are replicated.
    pub fn extract(&self, platform: Platform, urls: &[String]) -> ProviderInput {
        match self.rules.get(&platform) {
            Some(CompiledRule::Username(regex)) => {
                let usernames: IndexSet<String> = urls
                    .iter()
                    .filter_map(|url| {
                        let handle = regex
                            .captures(url)
                            .and_then(|caps| caps.get(1))
                            .map(|m| m.as_str().to_string());
                        if handle.is_none() {
                            debug!(platform = %platform, url = %url, "No username in link, skipping");
                        }
                        handle
                    })
                    .filter(|handle| !handle.is_empty())
                    .collect();
                ProviderInput::Usernames(usernames.into_iter().collect())
            }
            Some(CompiledRule::StartUrls { replication }) => {
                let unique: IndexSet<&String> = urls.iter().collect();
                let replicated = unique
                    .into_iter()
                    .flat_map(|url| std::iter::repeat(url.clone()).take(*replication))
                    .collect();
                ProviderInput::StartUrls(replicated)
            }
            None => ProviderInput::Usernames(Vec::new()),
        }
    }

    /// Filter the social set down to `platform` and extract in one step.
    pub fn extract_from_links(
        &self,
        platform: Platform,
        classified: &ClassifiedLinks,
        config: &EnrichmentConfig,
    ) -> ProviderInput {
        self.extract(platform, &platform_links(platform, classified, config))
    }
}
