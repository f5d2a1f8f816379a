//! HTTP short-link resolver.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{ResolveError, ResolveResult};
use crate::traits::resolver::ShortLinkResolver;

const MAX_REDIRECTS: usize = 10;

/// Expands short links by following redirects with a plain GET.
pub struct HttpShortLinkResolver {
    client: reqwest::Client,
}

impl HttpShortLinkResolver {
    /// Create a resolver with a 15 second timeout and a browser user agent.
    pub fn new() -> ResolveResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(15))
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
            )
            .build()
            .map_err(|e| ResolveError::Http(Box::new(e)))?;
        Ok(Self { client })
    }

    /// Use a custom HTTP client. It should follow redirects.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ShortLinkResolver for HttpShortLinkResolver {
    /// Follow redirects and report where they end.
    ///
    /// Once the chain has left the short-link host the final URL is returned
    /// whatever its status; profile hosts often answer 403 or 429 to
    /// non-browser clients.
    async fn resolve(&self, url: &str) -> ResolveResult<String> {
        let parsed = Url::parse(url).map_err(|_| ResolveError::InvalidUrl {
            url: url.to_string(),
        })?;

        debug!(url = %url, "Resolving short link");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResolveError::Http(Box::new(e)))?;

        let status = response.status();
        let final_url = response.url();

        if final_url.host_str() != parsed.host_str() {
            if !status.is_success() {
                debug!(url = %url, to = %final_url, status = status.as_u16(), "Short link resolved to an error page");
            }
            return Ok(final_url.to_string());
        }

        if !status.is_success() {
            return Err(ResolveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Err(ResolveError::NotRedirected {
            url: url.to_string(),
        })
    }
}
