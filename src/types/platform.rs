//! Video platform tags and URL classification.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Platform a saved video was linked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Instagram,
    TikTok,
    Facebook,
    Unknown,
}

static URL_PATTERNS: LazyLock<Vec<(Platform, Regex)>> = LazyLock::new(|| {
    [
        (
            Platform::YouTube,
            r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:watch\?v=|embed/)|youtu\.be/)([a-zA-Z0-9_-]+)",
        ),
        (
            Platform::Instagram,
            r"(?:https?://)?(?:www\.)?instagram\.com/(?:p|reel|tv)/([a-zA-Z0-9_-]+)",
        ),
        (
            Platform::TikTok,
            r"(?:https?://)?(?:www\.)?(?:tiktok\.com/@[\w.-]+/video/|vm\.tiktok\.com/)(\d+)",
        ),
        (
            Platform::Facebook,
            r"(?:https?://)?(?:www\.)?facebook\.com/(?:watch/\?v=|video\.php\?v=)(\d+)",
        ),
        (
            Platform::Facebook,
            r"(?:https?://)?(?:www\.)?fb\.watch/([a-zA-Z0-9_-]+)",
        ),
    ]
    .into_iter()
    .filter_map(|(platform, pattern)| Regex::new(pattern).ok().map(|re| (platform, re)))
    .collect()
});

impl Platform {
    /// Classifies a video URL. Unrecognized links map to `Unknown`.
    pub fn detect(url: &str) -> Self {
        URL_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(url))
            .map(|(platform, _)| *platform)
            .unwrap_or(Platform::Unknown)
    }

    /// Extracts the platform-specific video id from a URL, if it matches.
    pub fn video_id(url: &str) -> Option<(Self, String)> {
        URL_PATTERNS.iter().find_map(|(platform, re)| {
            re.captures(url)
                .and_then(|caps| caps.get(1))
                .map(|m| (*platform, m.as_str().to_string()))
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::YouTube),
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::TikTok),
            "facebook" => Ok(Platform::Facebook),
            "unknown" => Ok(Platform::Unknown),
            _ => Err("Unknown platform"),
        }
    }
}
