//! Shared fixtures for integration tests.

#![allow(dead_code)]

use clipmark::vector::{VectorDimension, VectorError, normalize_vector_copy};
use clipmark::{ContentItem, EmbeddingGenerator, Platform};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DIM: usize = 64;

/// Deterministic bag-of-words embedding: each lowercase word lands in one
/// hashed bucket. Texts sharing words are similar.
pub struct WordHashGenerator {
    dimension: VectorDimension,
}

impl WordHashGenerator {
    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::new(DIM).expect("non-zero dimension"),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .bytes()
                .fold(17usize, |h, b| h.wrapping_mul(131).wrapping_add(b as usize));
            v[bucket % DIM] += 1.0;
        }
        if v.iter().all(|x| *x == 0.0) {
            v[0] = 1.0;
        }
        normalize_vector_copy(&v)
    }
}

impl EmbeddingGenerator for WordHashGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

pub struct TestCorpus {
    pub dir: TempDir,
}

impl TestCorpus {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn write(&self, name: &str, json: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, json).expect("Failed to write corpus");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// A small two-user library of cooking and travel clips.
pub fn sample_corpus_json() -> &'static str {
    r#"{
  "items": [
    {
      "id": "yt-sourdough",
      "user_id": "alice",
      "platform": "youtube",
      "title": "Sourdough shaping basics",
      "url": "https://www.youtube.com/watch?v=abc123XYZ00",
      "search_summary": "Sourdough shaping basics. Shows hands, dough. Set in kitchen",
      "visual_summary": "Shows hands, dough, banneton. Set in kitchen",
      "audio_transcript": "fold the dough towards you and build tension",
      "keywords": ["bread", "sourdough", "baking"],
      "metadata": {"duration": 412, "uploader": "Crumb Lab"}
    },
    {
      "id": "tt-latte",
      "user_id": "alice",
      "platform": "tiktok",
      "title": "Latte art heart in ten seconds",
      "url": "https://www.tiktok.com/@barista/video/7234567890123456789",
      "visual_summary": "Shows cup, milk pitcher. Set in cafe",
      "audio_transcript": "pour high then drop low",
      "keywords": ["coffee", "latte"],
      "metadata": {"duration": 10}
    },
    {
      "id": "ig-lisbon",
      "user_id": "alice",
      "platform": "instagram",
      "title": "Three days in Lisbon",
      "url": "https://www.instagram.com/reel/CxYz123abc/",
      "visual_summary": "Shows tram, street. Set in city",
      "audio_transcript": "the best pastel de nata is near the river",
      "keywords": ["travel", "portugal"],
      "metadata": {"location": "Lisbon, Portugal"}
    },
    {
      "id": "fb-bread",
      "user_id": "alice",
      "platform": "facebook",
      "title": "Grandma's kitchen",
      "audio_transcript": "she always baked bread on sundays",
      "keywords": ["family"],
      "metadata": {}
    },
    {
      "id": "yt-bob-bread",
      "user_id": "bob",
      "platform": "youtube",
      "title": "Bread for beginners",
      "keywords": ["bread", "baking"]
    }
  ]
}"#
}

pub fn item(id: &str, user: &str, platform: Platform, title: &str) -> ContentItem {
    ContentItem::new(id, user, platform, title)
}
