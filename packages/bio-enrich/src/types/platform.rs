//! Supported social platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported social platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    TikTok,
    Twitter,
    YouTube,
    Twitch,
    Snapchat,
}

impl Platform {
    /// Every platform, in the default priority order
    /// (photo-sharing, short-video, micro-blogging, video, chat).
    pub const ALL: [Platform; 6] = [
        Platform::Instagram,
        Platform::TikTok,
        Platform::Twitter,
        Platform::YouTube,
        Platform::Twitch,
        Platform::Snapchat,
    ];

    /// Stable lowercase tag, used in logs and flat output keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::Twitter => "twitter",
            Platform::YouTube => "youtube",
            Platform::Twitch => "twitch",
            Platform::Snapchat => "snapchat",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::TikTok),
            "twitter" | "x" => Ok(Platform::Twitter),
            "youtube" => Ok(Platform::YouTube),
            "twitch" => Ok(Platform::Twitch),
            "snapchat" => Ok(Platform::Snapchat),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}
