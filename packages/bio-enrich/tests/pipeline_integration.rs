//! End-to-end tests for the enrichment pipeline.
//!
//! Every test runs the full page flow with in-memory providers:
//! classify, expand, extract, dispatch, normalize, aggregate, assemble.

use bio_enrich::testing::{MemorySink, MockProvider, MockResolver};
use bio_enrich::{
    classify_links, DispatchOutcome, EmailSet, Enricher, EnrichmentConfig, EnrichmentStatus,
    PageContent, Platform, ProviderInput, ProviderRegistry, RawLink,
};
use serde_json::json;
use std::sync::Arc;

/// Helper to build an enricher over the default platform table.
fn enricher(registry: ProviderRegistry) -> Enricher {
    Enricher::new(EnrichmentConfig::default(), registry).unwrap()
}

fn bio_page(links: &[(&str, &str)], text: &str) -> PageContent {
    links
        .iter()
        .fold(PageContent::new("https://linktr.ee/alice"), |page, (title, url)| {
            page.with_featured_link(RawLink::new(*title, *url))
        })
        .with_title("alice | Linktree")
        .with_text(text)
}

#[tokio::test]
async fn test_page_and_link_emails_are_deduplicated() {
    let page = bio_page(
        &[("IG", "https://instagram.com/alice"), ("mail", "mailto:a@b.com")],
        "contact: a@b.com",
    );
    let enricher = enricher(ProviderRegistry::new());

    let mut emails = EmailSet::new();
    let classified = classify_links(&page.links(), &page.text, &mut emails, enricher.config());
    assert_eq!(emails, ["a@b.com"].into_iter().collect::<EmailSet>());
    assert_eq!(
        classified.social.iter().cloned().collect::<Vec<_>>(),
        vec![RawLink::new("IG", "https://instagram.com/alice")]
    );
    assert!(classified.other.is_empty());

    let requests = enricher.build_requests(&classified).await;
    let instagram = requests
        .iter()
        .find(|r| r.platform == Platform::Instagram)
        .unwrap();
    assert_eq!(instagram.input, ProviderInput::Usernames(vec!["alice".to_string()]));

    let record = enricher.enrich(&page).await;
    assert_eq!(record.emails.len(), 1);
    assert_eq!(record.primary_email.as_deref(), Some("a@b.com"));
    assert_eq!(record.social_links.len(), 1);
}

#[tokio::test]
async fn test_bio_email_reaches_profile_and_aggregate() {
    let page = bio_page(&[("IG", "https://instagram.com/alice")], "");
    let registry = ProviderRegistry::new().with_provider(
        Platform::Instagram,
        MockProvider::new().with_items(vec![json!({
            "username": "alice",
            "biography": "reach me at x@y.com",
            "followersCount": 5400
        })]),
    );

    let record = enricher(registry).enrich(&page).await;

    let profile = record.profile(Platform::Instagram).unwrap();
    assert_eq!(profile.bio.as_deref(), Some("reach me at x@y.com"));
    assert_eq!(profile.emails_found, ["x@y.com"].into_iter().collect::<EmailSet>());
    assert!(record.emails.contains("x@y.com"));
    assert_eq!(record.primary_email.as_deref(), Some("x@y.com"));
    assert_eq!(record.top_platform, Some(Platform::Instagram));
    assert_eq!(record.status, EnrichmentStatus::Complete);
}

#[tokio::test]
async fn test_failing_provider_leaves_other_platforms_populated() {
    let page = bio_page(
        &[
            ("IG", "https://instagram.com/alice"),
            ("TT", "https://www.tiktok.com/@bob"),
        ],
        "",
    );
    let tiktok = MockProvider::new().with_items(vec![json!({
        "authorMeta": { "name": "bob", "fans": 900, "signature": "dance" }
    })]);
    let registry = ProviderRegistry::new()
        .with_provider(Platform::Instagram, MockProvider::new().failing("actor crashed"))
        .with_provider(Platform::TikTok, tiktok.clone());

    let record = enricher(registry).enrich(&page).await;

    assert!(record.profile(Platform::Instagram).is_none());
    assert!(matches!(
        record.dispatch[&Platform::Instagram],
        DispatchOutcome::Failed { .. }
    ));

    let profile = record.profile(Platform::TikTok).unwrap();
    assert_eq!(profile.username.as_deref(), Some("bob"));
    assert_eq!(profile.follower_count, Some(900));
    assert_eq!(tiktok.call_count(), 1);
    assert_eq!(record.status, EnrichmentStatus::Complete);
}

#[tokio::test]
async fn test_page_without_social_links_dispatches_nothing() {
    let instagram = MockProvider::new().with_items(vec![json!({ "username": "nobody" })]);
    let registry =
        ProviderRegistry::new().with_provider(Platform::Instagram, instagram.clone());
    let enricher = enricher(registry);

    let with_email = bio_page(&[("Shop", "https://alice.shop")], "hello@alice.shop");
    let record = enricher.enrich(&with_email).await;

    assert_eq!(instagram.call_count(), 0);
    assert!(record.social_links.is_empty());
    assert!(record.profiles.values().all(Option::is_none));
    assert!(record
        .dispatch
        .values()
        .all(|outcome| *outcome == DispatchOutcome::Skipped));
    assert_eq!(record.primary_email.as_deref(), Some("hello@alice.shop"));
    assert_eq!(record.status, EnrichmentStatus::NoSocialLinks);
    assert_eq!(record.top_platform, None);

    let without_email = bio_page(&[("Shop", "https://alice.shop")], "");
    let record = enricher.enrich(&without_email).await;
    assert_eq!(record.primary_email, None);
    assert!(record.emails.is_empty());
}

#[tokio::test]
async fn test_short_links_resolve_before_batching() {
    let page = bio_page(
        &[
            ("TT", "https://vm.tiktok.com/ZMgood/"),
            ("TT old", "https://vm.tiktok.com/ZMgone/"),
        ],
        "",
    );
    let resolver = MockResolver::new()
        .with_redirect("https://vm.tiktok.com/ZMgood/", "https://www.tiktok.com/@gina/video/7");
    let tiktok = MockProvider::new().with_items(vec![json!({
        "authorMeta": { "name": "gina" }
    })]);
    let registry = ProviderRegistry::new().with_provider(Platform::TikTok, tiktok.clone());
    let enricher = enricher(registry).with_resolver(Arc::new(resolver.clone()));

    let record = enricher.enrich(&page).await;

    let calls = tiktok.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].input, ProviderInput::Usernames(vec!["gina".to_string()]));
    assert_eq!(resolver.calls().len(), 2);
    assert_eq!(
        record.profile(Platform::TikTok).unwrap().username.as_deref(),
        Some("gina")
    );
}

#[tokio::test]
async fn test_failed_provider_does_not_change_other_profiles() {
    let page = bio_page(
        &[
            ("IG", "https://instagram.com/alice"),
            ("TT", "https://www.tiktok.com/@alice.tt"),
            ("Twitch", "https://twitch.tv/alicelive"),
        ],
        "",
    );
    let tiktok = || {
        MockProvider::new().with_items(vec![json!({
            "authorMeta": { "name": "alice.tt", "fans": "1.2M", "signature": "hi\nthere" }
        })])
    };
    let twitch = || {
        MockProvider::new().with_items(vec![json!({
            "login": "alicelive", "followers": 3100, "description": "streams"
        })])
    };

    let with_failure = enricher(
        ProviderRegistry::new()
            .with_provider(Platform::Instagram, MockProvider::new().failing("down"))
            .with_provider(Platform::TikTok, tiktok())
            .with_provider(Platform::Twitch, twitch()),
    )
    .enrich(&page)
    .await;

    let without_instagram = enricher(
        ProviderRegistry::new()
            .with_provider(Platform::TikTok, tiktok())
            .with_provider(Platform::Twitch, twitch()),
    )
    .enrich(&page)
    .await;

    for platform in [Platform::TikTok, Platform::Twitch] {
        assert!(with_failure.profile(platform).is_some());
        assert_eq!(
            with_failure.profile(platform),
            without_instagram.profile(platform)
        );
    }
    assert_eq!(
        without_instagram.dispatch[&Platform::Instagram],
        DispatchOutcome::Unsupported
    );
}

#[tokio::test]
async fn test_shared_email_is_kept_once_and_page_wins() {
    let page = bio_page(
        &[("IG", "https://instagram.com/alice")],
        "booking: team@alice.shop",
    );
    let registry = ProviderRegistry::new().with_provider(
        Platform::Instagram,
        MockProvider::new().with_items(vec![json!({
            "username": "alice",
            "biography": "mgmt: other@agency.com / team@alice.shop"
        })]),
    );

    let record = enricher(registry).enrich(&page).await;

    assert_eq!(record.emails.len(), 2);
    assert_eq!(
        record.emails.iter().filter(|e| *e == "team@alice.shop").count(),
        1
    );
    assert_eq!(record.primary_email.as_deref(), Some("team@alice.shop"));
}

#[tokio::test]
async fn test_total_failure_still_emits_degraded_record() {
    let page = bio_page(
        &[
            ("IG", "https://instagram.com/alice"),
            ("TT", "https://www.tiktok.com/@alice"),
        ],
        "",
    );
    let registry = ProviderRegistry::new()
        .with_provider(Platform::Instagram, MockProvider::new().failing("quota"))
        .with_provider(Platform::TikTok, MockProvider::new().panicking("bad item"));
    let sink = MemorySink::new();

    let record = enricher(registry).process_page(&page, &sink).await.unwrap();

    assert_eq!(sink.len(), 1);
    assert_eq!(record.status, EnrichmentStatus::Degraded);
    assert!(record.is_degraded());
    assert!(record.profiles.values().all(Option::is_none));
    assert_eq!(sink.records()[0].url, "https://linktr.ee/alice");
}

#[tokio::test]
async fn test_linked_bio_pages_are_discovered() {
    let page = bio_page(&[("IG", "https://instagram.com/alice")], "");
    let registry = ProviderRegistry::new().with_provider(
        Platform::Instagram,
        MockProvider::new().with_items(vec![json!({
            "username": "alice",
            "biography": "more at https://linktr.ee/alice.backup",
            "externalUrl": "https://linktr.ee/alice"
        })]),
    );

    let record = enricher(registry).enrich(&page).await;

    assert_eq!(
        record.discovered_bio_pages,
        vec!["https://linktr.ee/alice.backup".to_string()]
    );
}

#[tokio::test]
async fn test_missing_account_leaves_platform_empty() {
    let page = bio_page(&[("IG", "https://www.instagram.com/ghost")], "");
    let registry = ProviderRegistry::new().with_provider(
        Platform::Instagram,
        MockProvider::new().with_items(vec![json!({
            "url": "https://www.instagram.com/ghost",
            "error": "not_found",
            "errorDescription": "Profile does not exist"
        })]),
    );

    let record = enricher(registry).enrich(&page).await;

    assert!(record.profile(Platform::Instagram).is_none());
    assert_eq!(
        record.dispatch[&Platform::Instagram],
        DispatchOutcome::Completed { items: 1 }
    );
    assert_eq!(record.top_platform, None);
}
