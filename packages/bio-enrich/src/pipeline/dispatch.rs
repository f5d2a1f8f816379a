//! Concurrent provider dispatch with per-platform failure isolation.
//!
//! Every platform with input gets exactly one lookup; all lookups run
//! together and the stage waits for all of them. A lookup that errors,
//! panics, times out or is cancelled only empties its own slot.

use futures::future::join_all;
use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{EnrichError, ProviderError};
use crate::traits::provider::{ProfileProvider, ProviderRegistry};
use crate::types::platform::Platform;
use crate::types::profile::ProviderRequest;
use crate::types::record::DispatchOutcome;

/// One platform's slot after dispatch.
#[derive(Debug, Clone)]
pub struct PlatformResult {
    pub request: ProviderRequest,
    pub outcome: DispatchOutcome,
    /// Raw provider items; empty unless the lookup completed
    pub items: Vec<Value>,
}

/// Results for every requested platform, in request order.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub results: IndexMap<Platform, PlatformResult>,
}

impl DispatchReport {
    pub fn get(&self, platform: Platform) -> Option<&PlatformResult> {
        self.results.get(&platform)
    }

    /// Number of lookups actually sent.
    pub fn dispatched(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.outcome.was_dispatched())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.outcome.is_failure())
            .count()
    }

    /// `Some` when lookups were sent and every one of them failed.
    pub fn degradation(&self) -> Option<EnrichError> {
        let attempted = self.dispatched();
        (attempted > 0 && self.failed() == attempted)
            .then_some(EnrichError::TotalDispatchFailure { attempted })
    }

    pub fn outcomes(&self) -> IndexMap<Platform, DispatchOutcome> {
        self.results
            .iter()
            .map(|(p, r)| (*p, r.outcome.clone()))
            .collect()
    }
}

/// Sends one lookup per platform and joins them all.
pub struct ProviderDispatcher<'a> {
    registry: &'a ProviderRegistry,
    timeout: Option<Duration>,
}

impl<'a> ProviderDispatcher<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Bound the whole stage. Lookups still running at the deadline count as timed out.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Dispatch every request and return one slot per request.
    ///
    /// Requests with empty input are not sent. Requests for platforms without
    /// a registered provider are rejected before dispatch.
    pub async fn dispatch(
        &self,
        requests: Vec<ProviderRequest>,
        cancel: CancellationToken,
    ) -> DispatchReport {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut report = DispatchReport::default();
        let mut lookups = Vec::new();

        for request in requests {
            let platform = request.platform;

            if !request.is_dispatchable() {
                report
                    .results
                    .insert(platform, settled(request, DispatchOutcome::Skipped));
                continue;
            }

            let Some(provider) = self.registry.get(platform) else {
                let err = EnrichError::UnsupportedPlatform(platform);
                warn!(error = %err, inputs = request.input.len(), "Skipping platform");
                report
                    .results
                    .insert(platform, settled(request, DispatchOutcome::Unsupported));
                continue;
            };

            // Reserve the slot so output order follows request order.
            report
                .results
                .insert(platform, settled(request.clone(), DispatchOutcome::Skipped));
            lookups.push(run_lookup(provider, request, deadline, cancel.clone()));
        }

        info!(count = lookups.len(), "Dispatching provider lookups");

        for result in join_all(lookups).await {
            report.results.insert(result.request.platform, result);
        }

        if let Some(err) = report.degradation() {
            warn!(error = %err, "Dispatch degraded");
        }

        report
    }
}

fn settled(request: ProviderRequest, outcome: DispatchOutcome) -> PlatformResult {
    PlatformResult {
        request,
        outcome,
        items: Vec::new(),
    }
}

async fn run_lookup(
    provider: Arc<dyn ProfileProvider>,
    request: ProviderRequest,
    deadline: Option<Instant>,
    cancel: CancellationToken,
) -> PlatformResult {
    let platform = request.platform;
    info!(
        platform = %platform,
        provider = provider.name(),
        inputs = request.input.len(),
        "Provider lookup started"
    );

    let lookup = AssertUnwindSafe(provider.lookup(&request)).catch_unwind();
    let bounded = async {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, lookup)
                .await
                .unwrap_or(Ok(Err(ProviderError::Timeout))),
            None => lookup.await,
        }
    };

    let result = tokio::select! {
        result = bounded => result,
        _ = cancel.cancelled() => Ok(Err(ProviderError::Cancelled)),
    };

    let (outcome, items) = match result {
        Ok(Ok(items)) => {
            info!(platform = %platform, items = items.len(), "Provider lookup completed");
            (DispatchOutcome::Completed { items: items.len() }, items)
        }
        Ok(Err(ProviderError::Timeout)) | Ok(Err(ProviderError::Cancelled)) => {
            warn!(platform = %platform, "Provider lookup did not finish in time");
            (DispatchOutcome::TimedOut, Vec::new())
        }
        Ok(Err(source)) => {
            let err = EnrichError::Provider { platform, source };
            warn!(error = %err, "Provider lookup failed");
            (
                DispatchOutcome::Failed {
                    error: err.to_string(),
                },
                Vec::new(),
            )
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(platform = %platform, panic = %message, "Provider lookup panicked");
            (DispatchOutcome::Failed { error: message }, Vec::new())
        }
    };

    PlatformResult {
        request,
        outcome,
        items,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "provider panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use crate::types::profile::ProviderInput;
    use serde_json::json;

    fn request(platform: Platform, handles: &[&str]) -> ProviderRequest {
        ProviderRequest::new(
            platform,
            ProviderInput::Usernames(handles.iter().map(|s| s.to_string()).collect()),
        )
    }

    #[tokio::test]
    async fn test_empty_input_is_skipped_not_sent() {
        let ig = MockProvider::new().with_items(vec![json!({"username": "alice"})]);
        let registry = ProviderRegistry::new().with_provider(Platform::Instagram, ig.clone());

        let report = ProviderDispatcher::new(&registry)
            .dispatch(vec![request(Platform::Instagram, &[])], CancellationToken::new())
            .await;

        assert_eq!(ig.call_count(), 0);
        assert_eq!(
            report.get(Platform::Instagram).unwrap().outcome,
            DispatchOutcome::Skipped
        );
        assert!(report.degradation().is_none());
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_platform() {
        let ig = MockProvider::new().failing("actor crashed");
        let tt = MockProvider::new().with_items(vec![json!({"authorMeta": {"name": "bob"}})]);
        let registry = ProviderRegistry::new()
            .with_provider(Platform::Instagram, ig)
            .with_provider(Platform::TikTok, tt.clone());

        let report = ProviderDispatcher::new(&registry)
            .dispatch(
                vec![
                    request(Platform::Instagram, &["alice"]),
                    request(Platform::TikTok, &["bob"]),
                ],
                CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            report.get(Platform::Instagram).unwrap().outcome,
            DispatchOutcome::Failed { .. }
        ));
        let tiktok = report.get(Platform::TikTok).unwrap();
        assert_eq!(tiktok.outcome, DispatchOutcome::Completed { items: 1 });
        assert_eq!(tiktok.items.len(), 1);
        assert_eq!(tt.call_count(), 1);
        assert!(report.degradation().is_none());
    }

    #[tokio::test]
    async fn test_all_failures_flag_degradation() {
        let registry = ProviderRegistry::new()
            .with_provider(Platform::Instagram, MockProvider::new().failing("down"))
            .with_provider(Platform::Twitch, MockProvider::new().failing("down"));

        let report = ProviderDispatcher::new(&registry)
            .dispatch(
                vec![
                    request(Platform::Instagram, &["a"]),
                    request(Platform::Twitch, &["b"]),
                    request(Platform::Snapchat, &[]),
                ],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(report.dispatched(), 2);
        assert!(matches!(
            report.degradation(),
            Some(EnrichError::TotalDispatchFailure { attempted: 2 })
        ));
    }

    #[tokio::test]
    async fn test_unregistered_platform_is_rejected_before_dispatch() {
        let registry = ProviderRegistry::new();

        let report = ProviderDispatcher::new(&registry)
            .dispatch(vec![request(Platform::Snapchat, &["zed"])], CancellationToken::new())
            .await;

        assert_eq!(
            report.get(Platform::Snapchat).unwrap().outcome,
            DispatchOutcome::Unsupported
        );
        assert_eq!(report.dispatched(), 0);
        assert!(report.degradation().is_none());
    }

    #[tokio::test]
    async fn test_panicking_provider_is_contained() {
        let registry = ProviderRegistry::new()
            .with_provider(Platform::Instagram, MockProvider::new().panicking("boom"))
            .with_provider(
                Platform::Twitch,
                MockProvider::new().with_items(vec![json!({"login": "kai"})]),
            );

        let report = ProviderDispatcher::new(&registry)
            .dispatch(
                vec![request(Platform::Instagram, &["a"]), request(Platform::Twitch, &["kai"])],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(
            report.get(Platform::Instagram).unwrap().outcome,
            DispatchOutcome::Failed {
                error: "boom".to_string()
            }
        );
        assert_eq!(
            report.get(Platform::Twitch).unwrap().outcome,
            DispatchOutcome::Completed { items: 1 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_marks_slow_lookups_timed_out() {
        let registry = ProviderRegistry::new()
            .with_provider(
                Platform::YouTube,
                MockProvider::new()
                    .with_items(vec![json!({"channelName": "slow"})])
                    .with_delay(Duration::from_secs(120)),
            )
            .with_provider(
                Platform::Twitch,
                MockProvider::new().with_items(vec![json!({"login": "fast"})]),
            );

        let report = ProviderDispatcher::new(&registry)
            .with_timeout(Some(Duration::from_secs(30)))
            .dispatch(
                vec![request(Platform::YouTube, &["slow"]), request(Platform::Twitch, &["fast"])],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(
            report.get(Platform::YouTube).unwrap().outcome,
            DispatchOutcome::TimedOut
        );
        assert_eq!(
            report.get(Platform::Twitch).unwrap().outcome,
            DispatchOutcome::Completed { items: 1 }
        );
    }

    #[tokio::test]
    async fn test_cancelled_token_times_out_pending_lookups() {
        let registry = ProviderRegistry::new().with_provider(
            Platform::Instagram,
            MockProvider::new()
                .with_items(vec![json!({"username": "x"})])
                .with_delay(Duration::from_secs(60)),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = ProviderDispatcher::new(&registry)
            .dispatch(vec![request(Platform::Instagram, &["x"])], cancel)
            .await;

        assert_eq!(
            report.get(Platform::Instagram).unwrap().outcome,
            DispatchOutcome::TimedOut
        );
    }

    #[tokio::test]
    async fn test_results_follow_request_order() {
        let registry = ProviderRegistry::new()
            .with_provider(Platform::Instagram, MockProvider::new())
            .with_provider(Platform::Twitch, MockProvider::new());

        let report = ProviderDispatcher::new(&registry)
            .dispatch(
                vec![
                    request(Platform::Twitch, &["t"]),
                    request(Platform::Snapchat, &[]),
                    request(Platform::Instagram, &["i"]),
                ],
                CancellationToken::new(),
            )
            .await;

        let order: Vec<Platform> = report.results.keys().copied().collect();
        assert_eq!(order, vec![Platform::Twitch, Platform::Snapchat, Platform::Instagram]);
    }
}
