//! Short-link expansion ahead of identifier extraction.

use tracing::{debug, info, warn};
use url::Url;

use crate::error::EnrichError;
use crate::traits::resolver::ShortLinkResolver;
use crate::types::config::PlatformSpec;

/// URLs ready for identifier extraction, plus the links that could not be expanded.
#[derive(Debug, Default)]
pub struct ShortLinkExpansion {
    pub urls: Vec<String>,
    pub failures: Vec<EnrichError>,
}

/// Expand every short link in `urls` that belongs to `spec`'s short-link hosts.
///
/// Long links pass through untouched. A link that fails to resolve is dropped
/// from the result and recorded in `failures`; the rest are unaffected.
/// With expansion disabled, or without a resolver, short links pass through as-is.
pub async fn expand_short_links(
    spec: &PlatformSpec,
    urls: Vec<String>,
    resolver: Option<&dyn ShortLinkResolver>,
) -> ShortLinkExpansion {
    let mut expansion = ShortLinkExpansion::default();

    for url in urls {
        if !is_short_link(spec, &url) {
            expansion.urls.push(url);
            continue;
        }

        let resolver = match resolver {
            Some(r) if spec.short_links.expand => r,
            _ => {
                debug!(platform = %spec.platform, url = %url, "Short link left unexpanded");
                expansion.urls.push(url);
                continue;
            }
        };

        match resolver.resolve(&url).await {
            Ok(resolved) => {
                info!(platform = %spec.platform, from = %url, to = %resolved, "Short link resolved");
                expansion.urls.push(resolved);
            }
            Err(source) => {
                let err = EnrichError::ShortLinkResolution { url, source };
                warn!(platform = %spec.platform, error = %err, "Dropping unresolvable short link");
                expansion.failures.push(err);
            }
        }
    }

    expansion
}

fn is_short_link(spec: &PlatformSpec, url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| spec.is_short_link_host(h)))
        .unwrap_or(false)
}
