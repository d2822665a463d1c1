//! Reel retrieval.
//!
//! Fetches the post metadata and the video asset into the workspace before
//! any processing runs. The content host is an external collaborator: this
//! module does plain HTTP and makes no retry decisions; a caller that wants
//! retries re-invokes the download, not the extraction.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::ReelgistError;
use crate::metadata::ReelMetadata;
use crate::workspace::Workspace;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

fn shortcode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"instagram\.com/(?:[^/]+/)?(?:reels?|p)/([A-Za-z0-9_-]+)")
            .expect("shortcode pattern is valid")
    })
}

/// Extract the canonical shortcode from a post or reel URL.
///
/// Accepts `/reel/`, `/reels/`, and `/p/` links, with or without a leading
/// username segment and trailing query parameters.
///
/// # Errors
///
/// Returns [`ReelgistError::InvalidUrl`] if no shortcode can be found.
pub fn shortcode_from_url(url: &str) -> Result<String, ReelgistError> {
    shortcode_pattern()
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|shortcode| shortcode.as_str().to_string())
        .ok_or_else(|| ReelgistError::InvalidUrl(url.to_string()))
}

/// HTTP client for fetching reel resources.
///
/// # Example
///
/// ```no_run
/// use reelgist::{ReelClient, ReelgistError, Workspace};
///
/// let workspace = Workspace::new(".");
/// let client = ReelClient::new()?;
/// let metadata = client.download_reel("https://www.instagram.com/reel/DRH9x20DB8H/", &workspace)?;
/// println!("caption: {:?}", metadata.caption);
/// # Ok::<(), ReelgistError>(())
/// ```
pub struct ReelClient {
    http: Client,
}

impl ReelClient {
    /// Build a client with a browser user agent and a request timeout.
    pub fn new() -> Result<Self, ReelgistError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|error| ReelgistError::Download {
                url: String::new(),
                reason: format!("failed to build HTTP client: {error}"),
            })?;
        Ok(Self { http })
    }

    /// Fetch post metadata for a reel or post URL.
    ///
    /// Queries the host's embedded-data endpoint for the post's shortcode
    /// and reads the fields defensively: the payload shape changes often
    /// and every field except the shortcode is optional.
    pub fn fetch_metadata(&self, url: &str) -> Result<ReelMetadata, ReelgistError> {
        let shortcode = shortcode_from_url(url)?;
        let endpoint = format!("https://www.instagram.com/p/{shortcode}/?__a=1&__d=dis");

        log::debug!("Fetching metadata for shortcode {shortcode}");

        let response = self
            .http
            .get(&endpoint)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|error| ReelgistError::Download {
                url: endpoint.clone(),
                reason: error.to_string(),
            })?;

        let payload: Value = response.json().map_err(|error| ReelgistError::Download {
            url: endpoint,
            reason: format!("metadata payload is not JSON: {error}"),
        })?;

        Ok(metadata_from_payload(&payload, shortcode))
    }

    /// Stream the video asset to `destination`, creating parent directories
    /// as needed. Returns the number of bytes written.
    pub fn download_video(&self, video_url: &str, destination: &Path) -> Result<u64, ReelgistError> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut response = self
            .http
            .get(video_url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|error| ReelgistError::Download {
                url: video_url.to_string(),
                reason: error.to_string(),
            })?;

        let mut file = File::create(destination)?;
        let bytes = io::copy(&mut response, &mut file)?;

        log::info!("Downloaded {} bytes to {}", bytes, destination.display());
        Ok(bytes)
    }

    /// Fetch metadata and the video asset into the workspace.
    ///
    /// The metadata record is written to
    /// [`metadata_path`](Workspace::metadata_path) and the video to
    /// [`video_path`](Workspace::video_path).
    pub fn download_reel(
        &self,
        url: &str,
        workspace: &Workspace,
    ) -> Result<ReelMetadata, ReelgistError> {
        workspace.ensure_layout()?;

        let metadata = self.fetch_metadata(url)?;
        metadata.save(workspace.metadata_path())?;

        let video_url = metadata
            .video_url
            .as_deref()
            .ok_or_else(|| ReelgistError::Download {
                url: url.to_string(),
                reason: "post has no video asset".to_string(),
            })?;
        self.download_video(video_url, &workspace.video_path())?;

        Ok(metadata)
    }
}

/// Pull the metadata fields out of the host's payload, tolerating both the
/// legacy `graphql` shape and the newer `items` shape.
fn metadata_from_payload(payload: &Value, shortcode: String) -> ReelMetadata {
    let media = payload
        .pointer("/graphql/shortcode_media")
        .or_else(|| payload.pointer("/items/0"));

    let caption = media.and_then(|media| {
        media
            .pointer("/edge_media_to_caption/edges/0/node/text")
            .or_else(|| media.pointer("/caption/text"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    let likes = media.and_then(|media| {
        media
            .pointer("/edge_media_preview_like/count")
            .or_else(|| media.get("like_count"))
            .and_then(Value::as_u64)
    });

    let views = media.and_then(|media| {
        media
            .get("video_view_count")
            .or_else(|| media.get("play_count"))
            .and_then(Value::as_u64)
    });

    let date = media.and_then(|media| {
        media
            .get("taken_at_timestamp")
            .or_else(|| media.get("taken_at"))
            .and_then(Value::as_i64)
            .map(|timestamp| timestamp.to_string())
    });

    let video_url = media.and_then(|media| {
        media
            .get("video_url")
            .or_else(|| media.pointer("/video_versions/0/url"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    ReelMetadata {
        caption,
        likes,
        views,
        date,
        shortcode,
        video_url,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{metadata_from_payload, shortcode_from_url};

    #[test]
    fn shortcode_from_reel_url() {
        let url = "https://www.instagram.com/reel/DRH9x20DB8H/?utm_source=ig_web_copy_link";
        assert_eq!(shortcode_from_url(url).expect("shortcode"), "DRH9x20DB8H");
    }

    #[test]
    fn shortcode_from_post_url_with_username() {
        let url = "https://www.instagram.com/someuser/p/AbC-12_xyz/";
        assert_eq!(shortcode_from_url(url).expect("shortcode"), "AbC-12_xyz");
    }

    #[test]
    fn rejects_non_post_url() {
        assert!(shortcode_from_url("https://www.instagram.com/someuser/").is_err());
        assert!(shortcode_from_url("https://example.com/reel/AbC123/").is_err());
    }

    #[test]
    fn reads_legacy_graphql_payload() {
        let payload = json!({
            "graphql": {
                "shortcode_media": {
                    "edge_media_to_caption": {
                        "edges": [{ "node": { "text": "lube the switches" } }]
                    },
                    "edge_media_preview_like": { "count": 42 },
                    "video_view_count": 900,
                    "taken_at_timestamp": 1730500000,
                    "video_url": "https://cdn.example.com/v.mp4"
                }
            }
        });

        let metadata = metadata_from_payload(&payload, "AbC123".to_string());
        assert_eq!(metadata.caption.as_deref(), Some("lube the switches"));
        assert_eq!(metadata.likes, Some(42));
        assert_eq!(metadata.views, Some(900));
        assert_eq!(metadata.video_url.as_deref(), Some("https://cdn.example.com/v.mp4"));
    }

    #[test]
    fn tolerates_missing_fields() {
        let metadata = metadata_from_payload(&json!({}), "AbC123".to_string());
        assert_eq!(metadata.shortcode, "AbC123");
        assert!(metadata.caption.is_none());
        assert!(metadata.video_url.is_none());
    }
}
