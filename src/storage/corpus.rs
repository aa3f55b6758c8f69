//! JSON corpus files used by the CLI.
//!
//! ```json
//! { "items": [ { "id": "v1", "user_id": "u1", "platform": "youtube",
//!               "title": "...", "embedding": [0.01, ...] } ] }
//! ```
//!
//! `embedding` is optional; entries without one are embedded on load by the CLI.

use crate::error::{StoreError, StoreResult};
use crate::types::ContentItem;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    #[serde(flatten)]
    pub item: ContentItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusFile {
    #[serde(default)]
    pub items: Vec<CorpusEntry>,
}

impl CorpusFile {
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::CorpusRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&json).map_err(|e| StoreError::CorpusFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| StoreError::CorpusFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CorpusRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(path, json).map_err(|source| StoreError::CorpusRead {
            path: path.to_path_buf(),
            source,
        })
    }
}
