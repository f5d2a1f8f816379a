//! Profile provider trait and the per-platform registry.
//!
//! A provider takes one platform's request and returns that provider's raw
//! items, in its own schema. The pipeline never looks inside an item until
//! normalization, which goes through the platform's [`FieldMap`](crate::types::config::FieldMap).
//!
//! # Usage
//!
//! ```rust,ignore
//! use bio_enrich::{ProviderRegistry, Platform};
//!
//! let registry = ProviderRegistry::new()
//!     .with_provider(Platform::Instagram, instagram_provider)
//!     .with_provider(Platform::TikTok, tiktok_provider);
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ProviderResult;
use crate::types::platform::Platform;
use crate::types::profile::ProviderRequest;

/// A lookup service for one platform's profile data.
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Run one logical lookup and return the provider's items in order.
    ///
    /// An empty vector means the provider found nothing, which is not an error.
    async fn lookup(&self, request: &ProviderRequest) -> ProviderResult<Vec<Value>>;

    /// Provider name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<P: ProfileProvider + ?Sized> ProfileProvider for Arc<P> {
    async fn lookup(&self, request: &ProviderRequest) -> ProviderResult<Vec<Value>> {
        (**self).lookup(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mapping from platform to the provider that serves it.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Platform, Arc<dyn ProfileProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the provider for a platform.
    pub fn register(&mut self, platform: Platform, provider: Arc<dyn ProfileProvider>) {
        self.providers.insert(platform, provider);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_provider<P: ProfileProvider + 'static>(mut self, platform: Platform, provider: P) -> Self {
        self.register(platform, Arc::new(provider));
        self
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn ProfileProvider>> {
        self.providers.get(&platform).cloned()
    }

    pub fn supports(&self, platform: Platform) -> bool {
        self.providers.contains_key(&platform)
    }

    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.providers.keys().copied().collect();
        platforms.sort();
        platforms
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}
