//! Short-link expansion transport.

use async_trait::async_trait;

use crate::error::ResolveResult;

/// Follows redirects for one URL and reports where they end.
#[async_trait]
pub trait ShortLinkResolver: Send + Sync {
    /// Return the final URL after following redirects.
    async fn resolve(&self, url: &str) -> ResolveResult<String>;
}
