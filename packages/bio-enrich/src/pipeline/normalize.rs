//! Map raw provider items onto [`NormalizedProfile`].
//!
//! Field access is driven entirely by the platform's [`FieldMap`]: each field
//! lists JSON pointers tried in order. Nothing is read from an item that the
//! map does not name.

use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::types::config::{host_matches, FieldMap, PlatformSpec};
use crate::types::email::extract_emails;
use crate::types::profile::{NormalizedProfile, ProviderInput, ProviderRequest};

lazy_static! {
    static ref NEWLINES: Regex = Regex::new(r"[\r\n]+").unwrap();
    static ref HTTP_URL: Regex = Regex::new(r#"https?://[^\s"'<>()]+"#).unwrap();
}

/// Build a profile from the first usable item, or `None` if there is none.
///
/// An item is usable when it is an object, carries none of the map's `error`
/// markers, has its `root` (if named) present and non-null, and reports at
/// least one mapped field besides `url`.
pub fn normalize_profile(
    spec: &PlatformSpec,
    items: &[Value],
    request: Option<&ProviderRequest>,
    bio_page_domains: &[String],
) -> Option<NormalizedProfile> {
    let fields = &spec.fields;
    let item = items.iter().find(|item| is_usable(item, fields));

    let Some(item) = item else {
        debug!(platform = %spec.platform, items = items.len(), "No usable provider item");
        return None;
    };

    let bio = first_text(item, &fields.bio);
    let external_url = first_string(item, &fields.external_url);

    let emails_found = bio.as_deref().map(extract_emails).unwrap_or_default();
    let linked_bio_pages = bio_page_links(
        bio.iter().chain(external_url.iter()).map(String::as_str),
        bio_page_domains,
    );

    Some(NormalizedProfile {
        platform: spec.platform,
        url: first_string(item, &fields.url).or_else(|| request.and_then(fallback_url)),
        username: first_string(item, &fields.username).or_else(|| request.and_then(sole_username)),
        display_name: first_text(item, &fields.display_name),
        follower_count: first_count(item, &fields.followers),
        like_count: first_count(item, &fields.likes),
        bio,
        location: first_text(item, &fields.location),
        country: first_text(item, &fields.country),
        external_url,
        emails_found,
        linked_bio_pages,
    })
}

/// Replace each run of line breaks with a single space.
pub fn single_line(text: &str) -> String {
    NEWLINES.replace_all(text, " ").trim().to_string()
}

/// Parse an audience count: integers, floats, `"12,345"`, `"1.2K"`, `"3M"`.
pub fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => parse_count_str(s),
        _ => None,
    }
}

fn parse_count_str(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (number, multiplier) = match cleaned.chars().last()?.to_ascii_uppercase() {
        'K' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'M' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        'B' => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    let value: f64 = number.parse().ok()?;
    (value >= 0.0).then(|| (value * multiplier).round() as u64)
}

fn is_usable(item: &Value, fields: &FieldMap) -> bool {
    if !item.is_object() {
        return false;
    }
    if let Some(marker) = first_value(item, &fields.error).filter(|v| is_error_marker(v)) {
        debug!(error = %marker, "Skipping provider error item");
        return false;
    }
    if let Some(root) = &fields.root {
        if item.pointer(root).map_or(true, Value::is_null) {
            return false;
        }
    }

    [
        &fields.username,
        &fields.display_name,
        &fields.followers,
        &fields.likes,
        &fields.bio,
        &fields.location,
        &fields.country,
        &fields.external_url,
    ]
    .into_iter()
    .any(|pointers| first_value(item, pointers).is_some())
}

fn is_error_marker(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(s) => !s.trim().is_empty(),
        Value::Null => false,
        _ => true,
    }
}

fn first_value<'a>(item: &'a Value, pointers: &[String]) -> Option<&'a Value> {
    pointers
        .iter()
        .filter_map(|p| item.pointer(p))
        .find(|v| !v.is_null())
}

fn first_string(item: &Value, pointers: &[String]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| item.pointer(p))
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
}

fn first_text(item: &Value, pointers: &[String]) -> Option<String> {
    first_string(item, pointers)
        .map(|s| single_line(&s))
        .filter(|s| !s.is_empty())
}

fn first_count(item: &Value, pointers: &[String]) -> Option<u64> {
    first_value(item, pointers).and_then(parse_count)
}

/// The request's page link, when it can only belong to this profile.
///
/// Start-URL requests qualify when they name a single URL. Username requests
/// qualify when they name a single handle that appears in the page link, which
/// rules out unexpanded short links.
fn fallback_url(request: &ProviderRequest) -> Option<String> {
    match &request.input {
        ProviderInput::StartUrls(urls) => {
            let unique: IndexSet<&String> = urls.iter().collect();
            match unique.len() {
                1 => unique.first().map(|url| url.to_string()),
                _ => None,
            }
        }
        ProviderInput::Usernames(names) if names.len() == 1 => {
            let handle = names[0].to_lowercase();
            request
                .source_url
                .as_ref()
                .filter(|url| url.to_lowercase().contains(&handle))
                .cloned()
        }
        ProviderInput::Usernames(_) => None,
    }
}

fn sole_username(request: &ProviderRequest) -> Option<String> {
    match &request.input {
        ProviderInput::Usernames(names) if names.len() == 1 => Some(names[0].clone()),
        _ => None,
    }
}

/// Link-aggregator page URLs found in `texts`, as `scheme://host/name`.
fn bio_page_links<'a>(texts: impl Iterator<Item = &'a str>, domains: &[String]) -> Vec<String> {
    if domains.is_empty() {
        return Vec::new();
    }

    let mut found = IndexSet::new();
    for text in texts {
        for m in HTTP_URL.find_iter(text) {
            let Ok(url) = Url::parse(m.as_str()) else {
                continue;
            };
            let Some(host) = url.host_str().map(str::to_lowercase) else {
                continue;
            };
            if !domains.iter().any(|d| host_matches(&host, d)) {
                continue;
            }
            let name = url
                .path_segments()
                .and_then(|mut segments| segments.next())
                .filter(|s| !s.is_empty());
            if let Some(name) = name {
                found.insert(format!("{}://{}/{}", url.scheme(), host, name));
            }
        }
    }
    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::platform::Platform;
    use serde_json::json;

    fn bio_domains() -> Vec<String> {
        vec!["linktr.ee".to_string()]
    }

    #[test]
    fn test_instagram_item_maps_to_profile() {
        let spec = PlatformSpec::default_for(Platform::Instagram);
        let items = vec![json!({
            "url": "https://www.instagram.com/alice",
            "username": "alice",
            "fullName": "Alice\nLiddell",
            "followersCount": 15230,
            "biography": "reach me at x@y.com",
            "externalUrl": "https://linktr.ee/alice_links?utm=ig"
        })];

        let profile = normalize_profile(&spec, &items, None, &bio_domains()).unwrap();

        assert_eq!(profile.username.as_deref(), Some("alice"));
        assert_eq!(profile.display_name.as_deref(), Some("Alice Liddell"));
        assert_eq!(profile.follower_count, Some(15230));
        assert_eq!(profile.like_count, None);
        assert_eq!(profile.bio.as_deref(), Some("reach me at x@y.com"));
        assert!(profile.emails_found.contains("x@y.com"));
        assert_eq!(profile.linked_bio_pages, vec!["https://linktr.ee/alice_links".to_string()]);
    }

    #[test]
    fn test_tiktok_nested_author_meta() {
        let spec = PlatformSpec::default_for(Platform::TikTok);
        let items = vec![json!({
            "text": "video caption",
            "authorMeta": {
                "name": "bob",
                "nickName": "Bob B",
                "fans": "1.5M",
                "heart": 9000000,
                "signature": "dance\n\nbiz: bob@agency.io",
                "region": "US"
            }
        })];

        let profile = normalize_profile(&spec, &items, None, &[]).unwrap();

        assert_eq!(profile.username.as_deref(), Some("bob"));
        assert_eq!(profile.follower_count, Some(1_500_000));
        assert_eq!(profile.like_count, Some(9_000_000));
        assert_eq!(profile.bio.as_deref(), Some("dance biz: bob@agency.io"));
        assert_eq!(profile.country.as_deref(), Some("US"));
        assert!(profile.emails_found.contains("bob@agency.io"));
    }

    #[test]
    fn test_missing_root_yields_none() {
        let spec = PlatformSpec::default_for(Platform::TikTok);
        let items = vec![json!({ "text": "no author here" }), json!({ "authorMeta": null })];
        assert!(normalize_profile(&spec, &items, None, &[]).is_none());
    }

    #[test]
    fn test_zero_items_yields_none() {
        let spec = PlatformSpec::default_for(Platform::Instagram);
        assert!(normalize_profile(&spec, &[], None, &[]).is_none());
    }

    #[test]
    fn test_first_usable_item_wins() {
        let spec = PlatformSpec::default_for(Platform::TikTok);
        let items = vec![
            json!("not an object"),
            json!({ "authorMeta": { "name": "first" } }),
            json!({ "authorMeta": { "name": "second" } }),
        ];
        let profile = normalize_profile(&spec, &items, None, &[]).unwrap();
        assert_eq!(profile.username.as_deref(), Some("first"));
    }

    #[test]
    fn test_request_fills_url_and_single_username() {
        let spec = PlatformSpec::default_for(Platform::Twitch);
        let request = ProviderRequest::new(
            Platform::Twitch,
            ProviderInput::Usernames(vec!["kai".to_string()]),
        )
        .with_source_url("https://twitch.tv/kai");
        let items = vec![json!({ "displayName": "Kai" })];

        let profile = normalize_profile(&spec, &items, Some(&request), &[]).unwrap();

        assert_eq!(profile.url.as_deref(), Some("https://twitch.tv/kai"));
        assert_eq!(profile.username.as_deref(), Some("kai"));
        assert_eq!(profile.follower_count, None);
        assert_eq!(profile.bio, None);
        assert!(profile.emails_found.is_empty());
    }

    #[test]
    fn test_not_found_item_is_not_a_profile() {
        let spec = PlatformSpec::default_for(Platform::Instagram);
        let request = ProviderRequest::new(
            Platform::Instagram,
            ProviderInput::Usernames(vec!["ghost".to_string()]),
        )
        .with_source_url("https://www.instagram.com/ghost");
        let items = vec![json!({
            "url": "https://www.instagram.com/ghost",
            "error": "not_found",
            "errorDescription": "Profile does not exist"
        })];

        assert!(normalize_profile(&spec, &items, Some(&request), &[]).is_none());
    }

    #[test]
    fn test_error_item_is_skipped_for_a_later_profile() {
        let spec = PlatformSpec::default_for(Platform::Instagram);
        let items = vec![
            json!({ "error": "rate_limited" }),
            json!({ "username": "alice", "error": null }),
        ];

        let profile = normalize_profile(&spec, &items, None, &[]).unwrap();
        assert_eq!(profile.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_url_only_item_is_not_a_profile() {
        let spec = PlatformSpec::default_for(Platform::Twitch);
        let items = vec![json!({ "url": "https://twitch.tv/kai" })];
        assert!(normalize_profile(&spec, &items, None, &[]).is_none());
    }

    #[test]
    fn test_error_markers_are_configurable() {
        let mut spec = PlatformSpec::default_for(Platform::Snapchat);
        spec.fields.error = vec!["/status/failed".to_string()];
        let items = vec![json!({ "username": "zed", "status": { "failed": true } })];
        assert!(normalize_profile(&spec, &items, None, &[]).is_none());

        let items = vec![json!({ "username": "zed", "status": { "failed": false } })];
        assert!(normalize_profile(&spec, &items, None, &[]).is_some());
    }

    #[test]
    fn test_url_fallback_needs_a_single_matching_input() {
        let spec = PlatformSpec::default_for(Platform::TikTok);
        let items = vec![json!({ "authorMeta": { "name": "gina" } })];

        let several = ProviderRequest::new(
            Platform::TikTok,
            ProviderInput::Usernames(vec!["gina".to_string(), "hank".to_string()]),
        )
        .with_source_url("https://www.tiktok.com/@hank");
        let profile = normalize_profile(&spec, &items, Some(&several), &[]).unwrap();
        assert_eq!(profile.url, None);

        let from_short_link = ProviderRequest::new(
            Platform::TikTok,
            ProviderInput::Usernames(vec!["gina".to_string()]),
        )
        .with_source_url("https://vm.tiktok.com/ZM123/");
        let profile = normalize_profile(&spec, &items, Some(&from_short_link), &[]).unwrap();
        assert_eq!(profile.url, None);
        assert_eq!(profile.username.as_deref(), Some("gina"));
    }

    #[test]
    fn test_start_url_request_falls_back_to_its_only_url() {
        let spec = PlatformSpec::default_for(Platform::Twitter);
        let url = "https://x.com/dave".to_string();
        let request = ProviderRequest::new(
            Platform::Twitter,
            ProviderInput::StartUrls(vec![url.clone(); 5]),
        )
        .with_source_url("https://twitter.com/dave");
        let items = vec![json!({ "name": "Dave" })];

        let profile = normalize_profile(&spec, &items, Some(&request), &[]).unwrap();
        assert_eq!(profile.url.as_deref(), Some("https://x.com/dave"));
    }

    #[test]
    fn test_parse_count_variants() {
        assert_eq!(parse_count(&json!(42)), Some(42));
        assert_eq!(parse_count(&json!(12.6)), Some(13));
        assert_eq!(parse_count(&json!("12,345")), Some(12_345));
        assert_eq!(parse_count(&json!("1.2K")), Some(1_200));
        assert_eq!(parse_count(&json!("3m")), Some(3_000_000));
        assert_eq!(parse_count(&json!(-5)), None);
        assert_eq!(parse_count(&json!("lots")), None);
        assert_eq!(parse_count(&json!(null)), None);
    }

    #[test]
    fn test_single_line_collapses_breaks() {
        assert_eq!(single_line("a\r\n\r\nb\nc\n"), "a b c");
    }
}
