//! Error types for the `reelgist` crate.
//!
//! This module defines [`ReelgistError`], the unified error type returned by
//! all fallible operations in the crate. Variants carry enough context (file
//! paths, frame indices, provider names) to diagnose a failure without extra
//! logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `reelgist` operations.
///
/// Every public method that can fail returns `Result<T, ReelgistError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReelgistError {
    /// The input video could not be opened or its container is unreadable.
    ///
    /// Fatal to an extraction call; no output directory is created.
    #[error("Failed to open video stream at {path}: {reason}")]
    StreamOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The stream opened but produced no decodable frames.
    ///
    /// Distinct from [`StreamOpen`](ReelgistError::StreamOpen) so a corrupt
    /// header and a valid-but-empty file are diagnosable apart.
    #[error("Video stream opened but yielded no decodable frames")]
    EmptyStream,

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The file does not contain an audio stream.
    #[error("No audio stream found in file")]
    NoAudioStream,

    /// A single frame failed to decode mid-stream.
    ///
    /// Non-fatal to the keyframe scan: the frame is counted as dropped and
    /// the scan continues.
    #[error("Failed to decode frame {frame_index}: {reason}")]
    FrameDecode {
        /// Position of the frame in decode order.
        frame_index: u64,
        /// Underlying decoder error.
        reason: String,
    },

    /// A selected keyframe image could not be written.
    ///
    /// Fatal: downstream stages assume the output directory is complete, so
    /// a failed write aborts the extraction rather than silently skipping.
    #[error("Failed to write keyframe for frame {frame_index} to {path}: {reason}")]
    KeyframeWrite {
        /// Destination path of the failed write.
        path: PathBuf,
        /// Index of the frame that was being persisted.
        frame_index: u64,
        /// Underlying reason the write failed.
        reason: String,
    },

    /// Audio decoding or resampling failed.
    #[error("Audio extraction failed: {0}")]
    AudioDecode(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// The operation was cancelled via a
    /// [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// The given URL does not look like a post or reel link.
    #[error("Unrecognized reel URL: {0}")]
    InvalidUrl(String),

    /// Fetching a remote resource failed.
    #[error("Download of {url} failed: {reason}")]
    Download {
        /// The URL that was being fetched.
        url: String,
        /// Underlying reason the fetch failed.
        reason: String,
    },

    /// Reel metadata could not be read, parsed, or written.
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// The transcription command failed or produced no transcript.
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Keyframe annotation failed before any frame could be processed.
    #[error("Frame annotation failed: {0}")]
    Annotation(String),

    /// The requested summarization provider name is not known.
    #[error("Unknown summarization provider: {0}")]
    UnknownProvider(String),

    /// A summarization provider call failed.
    ///
    /// Provider-specific HTTP and payload errors are normalized into this
    /// one kind; `provider` names the backend that failed.
    #[error("{provider} summarization failed: {reason}")]
    Summarization {
        /// Stable lowercase provider name.
        provider: &'static str,
        /// Underlying reason the call failed.
        reason: String,
    },
}

impl From<FfmpegError> for ReelgistError {
    fn from(error: FfmpegError) -> Self {
        ReelgistError::Ffmpeg(error.to_string())
    }
}
