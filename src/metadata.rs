//! Reel metadata records.
//!
//! Post-level metadata is captured once at download time and rides along
//! through the pipeline as a JSON file; the summarizer folds it into its
//! prompt so the model sees the caption and engagement context alongside
//! what was heard and seen.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReelgistError;

/// Metadata of a downloaded reel.
///
/// Every field except the shortcode is optional; content hosts omit or
/// withhold most of these depending on account and region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelMetadata {
    /// Post caption, if any.
    pub caption: Option<String>,
    /// Like count at fetch time.
    pub likes: Option<u64>,
    /// View count at fetch time (video posts only).
    pub views: Option<u64>,
    /// Publication date as reported by the host.
    pub date: Option<String>,
    /// Canonical shortcode identifying the post.
    pub shortcode: String,
    /// Direct URL of the video asset.
    pub video_url: Option<String>,
}

impl ReelMetadata {
    /// Read a metadata record from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ReelgistError::Io`] if the file cannot be read and
    /// [`ReelgistError::Metadata`] if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReelgistError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|error| ReelgistError::Metadata(error.to_string()))
    }

    /// Write the record as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReelgistError> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|error| ReelgistError::Metadata(error.to_string()))?;
        fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ReelMetadata;

    #[test]
    fn parses_record_with_null_fields() {
        let raw = r#"{
            "caption": "Thocky goodness! #mechanicalkeyboard",
            "likes": 1234,
            "views": null,
            "date": "2025-11-02 18:30:00",
            "shortcode": "DRH9x20DB8H",
            "video_url": "https://cdn.example.com/v/DRH9x20DB8H.mp4"
        }"#;

        let metadata: ReelMetadata = serde_json::from_str(raw).expect("parse");
        assert_eq!(metadata.shortcode, "DRH9x20DB8H");
        assert_eq!(metadata.likes, Some(1234));
        assert_eq!(metadata.views, None);
    }

    #[test]
    fn round_trips_through_workspace_file() {
        let directory = tempfile::tempdir().expect("temp dir");
        let path = directory.path().join("metadata.json");

        let metadata = ReelMetadata {
            caption: None,
            likes: Some(7),
            views: Some(901),
            date: None,
            shortcode: "AbC123".to_string(),
            video_url: None,
        };
        metadata.save(&path).expect("save");

        let loaded = ReelMetadata::load(&path).expect("load");
        assert_eq!(loaded, metadata);
    }
}
