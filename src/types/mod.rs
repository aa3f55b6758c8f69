mod platform;

pub use platform::Platform;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Opaque identifier of a content item, as assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

/// Identifier of the user owning a content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A saved video together with the text signals extracted from it.
///
/// Owned by the external store. The search core only reads these records;
/// `metadata` is the one open-ended field and keeps whatever the scraper
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,
    pub user_id: UserId,
    pub platform: Platform,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub search_summary: String,
    #[serde(default)]
    pub visual_summary: String,
    #[serde(default)]
    pub audio_transcript: String,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ContentItem {
    /// Creates an item with only the required fields set.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        platform: Platform,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            user_id: UserId::new(user_id),
            platform,
            title: title.into(),
            url: String::new(),
            thumbnail_url: String::new(),
            search_summary: String::new(),
            visual_summary: String::new(),
            audio_transcript: String::new(),
            keywords: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// One ranked hit returned to the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: ItemId,
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
    pub platform: Platform,
    /// Relevance, capped at 100. Only non-negative when the similarity
    /// feeding it is non-negative.
    pub relevance_score: f32,
}

impl SearchResult {
    pub fn from_item(item: &ContentItem, relevance_score: f32) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            url: item.url.clone(),
            thumbnail_url: item.thumbnail_url.clone(),
            platform: item.platform,
            relevance_score,
        }
    }
}
