//! In-memory test doubles for the pipeline's external seams.
//!
//! Every double is cheap to clone; clones share their recorded calls so a
//! test can hand one copy to the registry and assert on the other.

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult, ResolveError, ResolveResult, SinkResult};
use crate::traits::provider::ProfileProvider;
use crate::traits::resolver::ShortLinkResolver;
use crate::traits::sink::RecordSink;
use crate::types::email::EmailSet;
use crate::types::link::RawLink;
use crate::types::platform::Platform;
use crate::types::profile::{NormalizedProfile, ProviderRequest};
use crate::types::record::{DispatchOutcome, EnrichmentStatus, OutputRecord};

#[derive(Debug, Clone)]
enum MockBehavior {
    Items(Vec<Value>),
    Fail(String),
    Panic(String),
}

/// Profile provider that returns canned items.
///
/// # Example
///
/// ```rust
/// use bio_enrich::testing::MockProvider;
/// use serde_json::json;
///
/// let provider = MockProvider::new().with_items(vec![json!({ "username": "alice" })]);
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<ProviderRequest>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            behavior: MockBehavior::Items(Vec::new()),
            delay: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl MockProvider {
    /// A provider that answers every lookup with no items.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, items: Vec<Value>) -> Self {
        self.behavior = MockBehavior::Items(items);
        self
    }

    /// Every lookup fails with a run failure carrying `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.behavior = MockBehavior::Fail(message.to_string());
        self
    }

    /// Every lookup panics with `message`.
    pub fn panicking(mut self, message: &str) -> Self {
        self.behavior = MockBehavior::Panic(message.to_string());
        self
    }

    /// Sleep before answering. Uses tokio time, so paused-clock tests stay fast.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    pub fn calls(&self) -> Vec<ProviderRequest> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ProfileProvider for MockProvider {
    async fn lookup(&self, request: &ProviderRequest) -> ProviderResult<Vec<Value>> {
        self.calls.write().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Items(items) => Ok(items.clone()),
            MockBehavior::Fail(message) => Err(ProviderError::RunFailed(message.clone())),
            MockBehavior::Panic(message) => panic!("{}", message),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Short-link resolver backed by a fixed redirect table.
///
/// URLs missing from the table resolve to a 404.
#[derive(Clone, Default)]
pub struct MockResolver {
    redirects: Arc<RwLock<HashMap<String, String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_redirect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects
            .write()
            .unwrap()
            .insert(from.into(), to.into());
        self
    }

    /// URLs passed to `resolve`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ShortLinkResolver for MockResolver {
    async fn resolve(&self, url: &str) -> ResolveResult<String> {
        self.calls.write().unwrap().push(url.to_string());
        self.redirects
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ResolveError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Sink that keeps every emitted record in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<RwLock<Vec<OutputRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<OutputRecord> {
        self.records.read().unwrap().clone()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn emit(&self, record: &OutputRecord) -> SinkResult<()> {
        self.records.write().unwrap().push(record.clone());
        Ok(())
    }
}

/// A fully-populated record with one Instagram profile, for output tests.
pub fn sample_record() -> OutputRecord {
    let mut emails = EmailSet::new();
    emails.insert("alice@mail.com");

    let profile = NormalizedProfile {
        platform: Platform::Instagram,
        url: Some("https://instagram.com/alice".to_string()),
        username: Some("alice".to_string()),
        display_name: Some("Alice".to_string()),
        follower_count: Some(1200),
        like_count: None,
        bio: Some("collabs: alice@mail.com".to_string()),
        location: None,
        country: None,
        external_url: Some("https://alice.shop".to_string()),
        emails_found: emails.clone(),
        linked_bio_pages: Vec::new(),
    };

    let mut profiles = IndexMap::new();
    let mut dispatch = IndexMap::new();
    for platform in Platform::ALL {
        profiles.insert(platform, None);
        dispatch.insert(platform, DispatchOutcome::Skipped);
    }
    profiles.insert(Platform::Instagram, Some(profile));
    dispatch.insert(Platform::Instagram, DispatchOutcome::Completed { items: 1 });

    OutputRecord {
        url: "https://linktr.ee/alice".to_string(),
        page_title: "Alice | Linktree".to_string(),
        profile_name: Some("Alice".to_string()),
        page_emails: EmailSet::new(),
        social_links: vec![RawLink::new("Instagram", "https://instagram.com/alice")],
        other_links: vec![RawLink::new("Shop", "https://alice.shop")],
        profiles,
        emails: emails.clone(),
        primary_email: Some("alice@mail.com".to_string()),
        top_platform: Some(Platform::Instagram),
        discovered_bio_pages: Vec::new(),
        dispatch,
        status: EnrichmentStatus::Complete,
        processed_at: Utc::now(),
    }
}
