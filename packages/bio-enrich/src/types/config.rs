//! Configuration for classification, dispatch and normalization.
//!
//! Everything platform-specific lives in one [`PlatformSpec`] per platform:
//! which hosts belong to it, how a handle is pulled out of a link, whether
//! short links are expanded, which provider actor is called with what input,
//! and which response fields map onto [`NormalizedProfile`](super::profile::NormalizedProfile).

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use super::platform::Platform;
use crate::error::{ConfigError, ConfigResult};

/// How many times each micro-blogging start URL is repeated in one provider batch.
///
/// That provider returns more complete profiles when the same URL appears
/// several times in a batch.
pub const TWITTER_START_URL_REPLICATION: usize = 5;

/// Top-level enrichment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// One entry per supported platform.
    pub platforms: Vec<PlatformSpec>,

    /// Order in which platforms are consulted for the primary email,
    /// after page-level emails.
    pub email_priority: Vec<Platform>,

    /// Tie-break order for the most prominent platform.
    pub audience_priority: Vec<Platform>,

    /// Deadline for the whole dispatch stage, in milliseconds. `None` waits for every lookup.
    #[serde(default)]
    pub dispatch_timeout_ms: Option<u64>,

    /// Hosts of link-aggregator pages worth harvesting from profile bios.
    #[serde(default)]
    pub bio_page_domains: Vec<String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            platforms: Platform::ALL.iter().map(|p| PlatformSpec::default_for(*p)).collect(),
            email_priority: Platform::ALL.to_vec(),
            audience_priority: Platform::ALL.to_vec(),
            dispatch_timeout_ms: None,
            bio_page_domains: vec!["linktr.ee".to_string()],
        }
    }
}

impl EnrichmentConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check patterns compile with a capture group and no platform is listed twice.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for spec in &self.platforms {
            if !seen.insert(spec.platform) {
                return Err(ConfigError::DuplicatePlatform(spec.platform));
            }
            spec.identifier.compile(spec.platform)?;
        }
        Ok(())
    }

    /// Set the dispatch deadline, kept at millisecond precision.
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the primary-email precedence.
    pub fn with_email_priority(mut self, order: impl IntoIterator<Item = Platform>) -> Self {
        self.email_priority = order.into_iter().collect();
        self
    }

    /// Set the top-platform tie-break order.
    pub fn with_audience_priority(mut self, order: impl IntoIterator<Item = Platform>) -> Self {
        self.audience_priority = order.into_iter().collect();
        self
    }

    /// Replace the spec for one platform.
    pub fn with_platform(mut self, spec: PlatformSpec) -> Self {
        match self.platforms.iter_mut().find(|s| s.platform == spec.platform) {
            Some(existing) => *existing = spec,
            None => self.platforms.push(spec),
        }
        self
    }

    /// Disable enrichment for a platform. Its links are still classified as social.
    pub fn without_platform(mut self, platform: Platform) -> Self {
        if let Some(spec) = self.platforms.iter_mut().find(|s| s.platform == platform) {
            spec.enabled = false;
        }
        self
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_ms.map(Duration::from_millis)
    }

    pub fn spec(&self, platform: Platform) -> Option<&PlatformSpec> {
        self.platforms.iter().find(|s| s.platform == platform)
    }

    /// Platform whose domains cover `host`, if any.
    pub fn platform_for_host(&self, host: &str) -> Option<Platform> {
        self.platforms
            .iter()
            .find(|s| s.matches_host(host))
            .map(|s| s.platform)
    }
}

/// Everything the pipeline knows about one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub platform: Platform,

    /// Disabled platforms are still recognized as social but never dispatched.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Registrable domains; a host matches when equal or a subdomain (`www.`, `m.`).
    pub domains: Vec<String>,

    pub identifier: IdentifierRule,

    #[serde(default)]
    pub short_links: ShortLinkRule,

    pub provider: ProviderSpec,

    pub fields: FieldMap,
}

fn default_enabled() -> bool {
    true
}

impl PlatformSpec {
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();
        self.domains.iter().any(|d| host_matches(&host, d))
    }

    /// Whether `host` is one of this platform's short-link hosts.
    pub fn is_short_link_host(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.short_links.hosts.iter().any(|d| host_matches(&host, d))
    }

    /// Built-in defaults for a platform.
    pub fn default_for(platform: Platform) -> Self {
        match platform {
            Platform::Instagram => Self {
                platform,
                enabled: true,
                domains: strings(&["instagram.com", "instagr.am"]),
                identifier: IdentifierRule::username(r"(?:instagram\.com|instagr\.am)/([^/?#]+)"),
                short_links: ShortLinkRule::default(),
                provider: ProviderSpec::new("apify/instagram-profile-scraper", "usernames")
                    .with_extra(json!({ "resultsLimit": 1 })),
                fields: FieldMap {
                    root: None,
                    error: strings(&["/error"]),
                    url: strings(&["/url"]),
                    username: strings(&["/username"]),
                    display_name: strings(&["/fullName"]),
                    followers: strings(&["/followersCount"]),
                    likes: vec![],
                    bio: strings(&["/biography"]),
                    location: strings(&["/businessAddress/city_name"]),
                    country: vec![],
                    external_url: strings(&["/externalUrl"]),
                },
            },
            Platform::TikTok => Self {
                platform,
                enabled: true,
                domains: strings(&["tiktok.com"]),
                identifier: IdentifierRule::username(r"tiktok\.com/@([^/?#]+)"),
                short_links: ShortLinkRule::expand(&["vm.tiktok.com", "vt.tiktok.com"]),
                provider: ProviderSpec::new("clockworks/tiktok-profile-scraper", "profiles")
                    .with_extra(json!({ "resultsPerPage": 1 })),
                fields: FieldMap {
                    root: Some("/authorMeta".to_string()),
                    error: strings(&["/error"]),
                    url: strings(&["/authorMeta/profileUrl"]),
                    username: strings(&["/authorMeta/name"]),
                    display_name: strings(&["/authorMeta/nickName"]),
                    followers: strings(&["/authorMeta/fans"]),
                    likes: strings(&["/authorMeta/heart"]),
                    bio: strings(&["/authorMeta/signature"]),
                    location: vec![],
                    country: strings(&["/authorMeta/region", "/locationCreated"]),
                    external_url: strings(&["/authorMeta/bioLink"]),
                },
            },
            Platform::Twitter => Self {
                platform,
                enabled: true,
                domains: strings(&["twitter.com", "x.com"]),
                identifier: IdentifierRule::StartUrls {
                    replication: TWITTER_START_URL_REPLICATION,
                },
                short_links: ShortLinkRule::default(),
                provider: ProviderSpec::new("apidojo/twitter-user-scraper", "startUrls"),
                fields: FieldMap {
                    root: None,
                    error: strings(&["/error"]),
                    url: strings(&["/url", "/author/url"]),
                    username: strings(&["/userName", "/author/userName"]),
                    display_name: strings(&["/name", "/author/name"]),
                    followers: strings(&["/followers", "/author/followers"]),
                    likes: strings(&["/favouritesCount", "/author/favouritesCount"]),
                    bio: strings(&["/description", "/author/description"]),
                    location: strings(&["/location", "/author/location"]),
                    country: vec![],
                    external_url: strings(&[
                        "/entities/url/urls/0/expanded_url",
                        "/author/entities/url/urls/0/expanded_url",
                    ]),
                },
            },
            Platform::YouTube => Self {
                platform,
                enabled: true,
                domains: strings(&["youtube.com", "youtu.be"]),
                identifier: IdentifierRule::StartUrls { replication: 1 },
                short_links: ShortLinkRule::expand(&["youtu.be"]),
                provider: ProviderSpec::new("streamers/youtube-channel-scraper", "startUrls")
                    .with_shape(InputEntryShape::UrlObjects)
                    .with_extra(json!({ "maxResults": 1 })),
                fields: FieldMap {
                    root: None,
                    error: strings(&["/error"]),
                    url: strings(&["/channelUrl", "/inputChannelUrl"]),
                    username: strings(&["/channelUsername"]),
                    display_name: strings(&["/channelName"]),
                    followers: strings(&["/numberOfSubscribers"]),
                    likes: vec![],
                    bio: strings(&["/channelDescription"]),
                    location: strings(&["/channelLocation"]),
                    country: vec![],
                    external_url: strings(&["/channelDescriptionLinks/0/url"]),
                },
            },
            Platform::Twitch => Self {
                platform,
                enabled: true,
                domains: strings(&["twitch.tv"]),
                identifier: IdentifierRule::username(r"twitch\.tv/([^/?#]+)"),
                short_links: ShortLinkRule::default(),
                provider: ProviderSpec::new("epctex/twitch-scraper", "usernames"),
                fields: FieldMap {
                    root: None,
                    error: strings(&["/error"]),
                    url: strings(&["/url"]),
                    username: strings(&["/login", "/username"]),
                    display_name: strings(&["/displayName"]),
                    followers: strings(&["/followers", "/followersCount"]),
                    likes: vec![],
                    bio: strings(&["/description"]),
                    location: vec![],
                    country: vec![],
                    external_url: vec![],
                },
            },
            Platform::Snapchat => Self {
                platform,
                enabled: true,
                domains: strings(&["snapchat.com"]),
                identifier: IdentifierRule::username(r"snapchat\.com/add/([^/?#]+)"),
                short_links: ShortLinkRule::default(),
                provider: ProviderSpec::new("argusapi/snapchat-profile-scraper", "usernames"),
                fields: FieldMap {
                    root: None,
                    error: strings(&["/error"]),
                    url: strings(&["/url", "/profileUrl"]),
                    username: strings(&["/username"]),
                    display_name: strings(&["/displayName", "/title"]),
                    followers: strings(&["/subscriberCount"]),
                    likes: vec![],
                    bio: strings(&["/bio", "/description"]),
                    location: vec![],
                    country: vec![],
                    external_url: strings(&["/websiteUrl"]),
                },
            },
        }
    }
}

/// How a platform's provider input is derived from its links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IdentifierRule {
    /// Capture group 1 of `pattern` is the handle.
    Username { pattern: String },
    /// Pass matching URLs through verbatim, each repeated `replication` times.
    StartUrls { replication: usize },
}

impl IdentifierRule {
    pub fn username(pattern: impl Into<String>) -> Self {
        IdentifierRule::Username {
            pattern: pattern.into(),
        }
    }

    /// Compile the username pattern, if this rule has one.
    pub fn compile(&self, platform: Platform) -> ConfigResult<Option<Regex>> {
        match self {
            IdentifierRule::Username { pattern } => {
                let regex = Regex::new(pattern).map_err(|e| ConfigError::Pattern {
                    platform,
                    reason: e.to_string(),
                })?;
                if regex.captures_len() < 2 {
                    return Err(ConfigError::Pattern {
                        platform,
                        reason: "pattern needs a capture group for the handle".to_string(),
                    });
                }
                Ok(Some(regex))
            }
            IdentifierRule::StartUrls { .. } => Ok(None),
        }
    }
}

/// Short-link hosts for a platform and whether to expand them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLinkRule {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub expand: bool,
}

impl ShortLinkRule {
    pub fn expand(hosts: &[&str]) -> Self {
        Self {
            hosts: strings(hosts),
            expand: true,
        }
    }
}

/// Shape of each entry in the provider's input list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEntryShape {
    /// `["alice", "bob"]`
    #[default]
    Strings,
    /// `[{"url": "https://..."}]`
    UrlObjects,
}

/// Which provider to call and how to build its input object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Actor ID or `username/actor-name`.
    pub actor_id: String,

    /// Input field that receives the handle / URL list.
    pub input_key: String,

    #[serde(default)]
    pub entry_shape: InputEntryShape,

    /// Static fields merged into every input object.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl ProviderSpec {
    pub fn new(actor_id: impl Into<String>, input_key: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            input_key: input_key.into(),
            entry_shape: InputEntryShape::Strings,
            extra: Map::new(),
        }
    }

    pub fn with_shape(mut self, shape: InputEntryShape) -> Self {
        self.entry_shape = shape;
        self
    }

    /// Merge static fields from a JSON object. Non-objects are ignored.
    pub fn with_extra(mut self, extra: Value) -> Self {
        if let Value::Object(map) = extra {
            self.extra.extend(map);
        }
        self
    }
}

/// JSON pointers (RFC 6901) into one provider item, per normalized field.
///
/// Each field lists candidates tried in order; the first present, non-null value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    /// Nested object that must exist for the item to count as a profile.
    #[serde(default)]
    pub root: Option<String>,
    /// Markers of a provider-side failure (e.g. `{"error": "not_found"}`).
    /// An item with any of these set is not a profile.
    #[serde(default)]
    pub error: Vec<String>,
    #[serde(default)]
    pub url: Vec<String>,
    #[serde(default)]
    pub username: Vec<String>,
    #[serde(default)]
    pub display_name: Vec<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub bio: Vec<String>,
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub country: Vec<String>,
    #[serde(default)]
    pub external_url: Vec<String>,
}

/// `host` equals `domain` or is a subdomain of it.
pub(crate) fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.to_lowercase();
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
