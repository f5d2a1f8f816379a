//! Flat, spreadsheet-friendly rendering of an [`OutputRecord`].
//!
//! Profile fields are prefixed with the platform name
//! (`instagramFollowers`, `tiktokBio`, ...). Missing values render as `null`
//! so every row has the same columns.

use serde_json::{Map, Value};

use crate::types::email::EmailSet;
use crate::types::link::RawLink;
use crate::types::platform::Platform;
use crate::types::record::OutputRecord;

const LIST_SEPARATOR: &str = ", ";

/// One flat object per record, with a fixed column set.
pub fn flat_row(record: &OutputRecord) -> Map<String, Value> {
    let mut row = Map::new();

    row.insert("url".into(), Value::String(record.url.clone()));
    row.insert("pageTitle".into(), Value::String(record.page_title.clone()));
    row.insert("profileName".into(), opt_string(record.profile_name.as_deref()));
    row.insert("socialLinks".into(), joined_links(&record.social_links));
    row.insert("otherLinks".into(), joined_links(&record.other_links));

    for platform in Platform::ALL {
        let profile = record.profile(platform);
        let key = |field: &str| format!("{}{}", platform.as_str(), field);

        row.insert(key("Url"), opt_string(profile.and_then(|p| p.url.as_deref())));
        row.insert(
            key("Username"),
            opt_string(profile.and_then(|p| p.username.as_deref())),
        );
        row.insert(
            key("DisplayName"),
            opt_string(profile.and_then(|p| p.display_name.as_deref())),
        );
        row.insert(key("Followers"), opt_count(profile.and_then(|p| p.follower_count)));
        row.insert(key("Likes"), opt_count(profile.and_then(|p| p.like_count)));
        row.insert(key("Bio"), opt_string(profile.and_then(|p| p.bio.as_deref())));
        row.insert(
            key("Location"),
            opt_string(profile.and_then(|p| p.location.as_deref())),
        );
        row.insert(
            key("Country"),
            opt_string(profile.and_then(|p| p.country.as_deref())),
        );
        row.insert(
            key("ExternalUrl"),
            opt_string(profile.and_then(|p| p.external_url.as_deref())),
        );
        row.insert(
            key("Emails"),
            profile.map_or(Value::Null, |p| joined_emails(&p.emails_found)),
        );
    }

    row.insert("emails".into(), joined_emails(&record.emails));
    row.insert("mainEmail".into(), opt_string(record.primary_email.as_deref()));
    row.insert(
        "topPlatform".into(),
        opt_string(record.top_platform.map(|p| p.as_str())),
    );
    row.insert(
        "discoveredBioPages".into(),
        joined(record.discovered_bio_pages.iter().map(String::as_str)),
    );
    row.insert(
        "status".into(),
        serde_json::to_value(record.status).unwrap_or(Value::Null),
    );
    row.insert(
        "processedAt".into(),
        Value::String(record.processed_at.to_rfc3339()),
    );

    row
}

fn opt_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_string()))
}

fn opt_count(value: Option<u64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

fn joined_emails(emails: &EmailSet) -> Value {
    joined(emails.iter().map(String::as_str))
}

fn joined_links(links: &[RawLink]) -> Value {
    joined(links.iter().filter_map(RawLink::href))
}

fn joined<'a>(values: impl Iterator<Item = &'a str>) -> Value {
    let parts: Vec<&str> = values.collect();
    if parts.is_empty() {
        Value::Null
    } else {
        Value::String(parts.join(LIST_SEPARATOR))
    }
}
