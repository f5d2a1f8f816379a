//! Apify-backed profile provider.
//!
//! Each platform maps to one Apify actor. The actor input is built from the
//! platform's [`ProviderSpec`]: the handle or URL list goes under `input_key`,
//! and the static `extra` fields are merged alongside it.

use apify_client::{ApifyClient, StartUrl};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::provider::{ProfileProvider, ProviderRegistry};
use crate::types::config::{EnrichmentConfig, InputEntryShape, ProviderSpec};
use crate::types::platform::Platform;
use crate::types::profile::ProviderRequest;

/// Runs one Apify actor per lookup and returns its dataset items.
pub struct ApifyProvider {
    client: Arc<ApifyClient>,
    platform: Platform,
    spec: ProviderSpec,
}

impl ApifyProvider {
    pub fn new(client: Arc<ApifyClient>, platform: Platform, spec: ProviderSpec) -> Self {
        Self {
            client,
            platform,
            spec,
        }
    }

    /// Actor input object for `request`.
    pub fn build_input(&self, request: &ProviderRequest) -> ProviderResult<Value> {
        if request.platform != self.platform {
            return Err(ProviderError::InvalidInput(format!(
                "{} provider received a {} request",
                self.platform, request.platform
            )));
        }

        let values = request.input.values();
        let entries: Vec<Value> = match self.spec.entry_shape {
            InputEntryShape::Strings => values.iter().map(|v| Value::String(v.clone())).collect(),
            InputEntryShape::UrlObjects => values
                .iter()
                .map(|v| serde_json::to_value(StartUrl::new(v.clone())))
                .collect::<Result<_, _>>()
                .map_err(|e| ProviderError::InvalidInput(e.to_string()))?,
        };

        let mut input: Map<String, Value> = self.spec.extra.clone();
        input.insert(self.spec.input_key.clone(), Value::Array(entries));
        Ok(Value::Object(input))
    }
}

#[async_trait]
impl ProfileProvider for ApifyProvider {
    async fn lookup(&self, request: &ProviderRequest) -> ProviderResult<Vec<Value>> {
        let input = self.build_input(request)?;

        info!(
            platform = %self.platform,
            actor_id = %self.spec.actor_id,
            inputs = request.input.len(),
            "Calling Apify actor"
        );

        let items: Vec<Value> = self.client.call_actor(&self.spec.actor_id, &input).await?;
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.spec.actor_id
    }
}

/// Registry with an [`ApifyProvider`] for every enabled platform in `config`.
pub fn apify_registry(client: Arc<ApifyClient>, config: &EnrichmentConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for spec in config.platforms.iter().filter(|s| s.enabled) {
        registry.register(
            spec.platform,
            Arc::new(ApifyProvider::new(
                client.clone(),
                spec.platform,
                spec.provider.clone(),
            )),
        );
    }
    registry
}
