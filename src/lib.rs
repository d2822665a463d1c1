//! # reelgist
//!
//! Distill social-media reels into transcripts, keyframes, and narrative
//! summaries.
//!
//! `reelgist` ingests a short-form video, pulls its audio and visual content
//! apart, and produces a structured multi-modal dataset — a transcript, a
//! set of annotated keyframes, and post metadata — then folds the three
//! streams into one LLM-generated summary. Video decoding is powered by
//! FFmpeg via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)
//! crate.
//!
//! The heart of the crate is the [`KeyframeSelector`]: a sequential scan
//! over the decoded frame stream that compares every frame against the most
//! recently saved one using two pixel-level signals (per-channel histogram
//! divergence and windowed structural similarity) and persists the frames
//! that open a new visual scene. Everything else is glue around external
//! collaborators: an HTTP download, a Whisper-compatible transcription
//! command, a vision-model captioner, and a text-generation provider.
//!
//! ## Quick Start
//!
//! ### Select keyframes from a video
//!
//! ```no_run
//! use reelgist::{SelectorOptions, extract_keyframes};
//!
//! let options = SelectorOptions::new("artifacts/video_frames")
//!     .histogram_threshold(0.35)
//!     .structural_threshold(0.80)
//!     .min_frame_interval(8);
//!
//! let report = extract_keyframes("ingestion/video.mp4", options).unwrap();
//! println!(
//!     "saved {} of {} frames ({} dropped)",
//!     report.keyframes.len(),
//!     report.frames_decoded,
//!     report.frames_dropped,
//! );
//! ```
//!
//! ### Run the full pipeline
//!
//! ```no_run
//! use reelgist::{
//!     OllamaVisionAnnotator, Pipeline, Provider, SelectorOptions, Summarizer,
//!     SummarizerOptions, WhisperCommand, Workspace,
//! };
//!
//! let workspace = Workspace::new(".");
//! let selector = SelectorOptions::new(workspace.frames_dir());
//! let summarizer = Summarizer::new(SummarizerOptions::new(Provider::Ollama)).unwrap();
//! let pipeline = Pipeline::new(
//!     workspace,
//!     selector,
//!     Box::new(WhisperCommand::new()),
//!     summarizer,
//! );
//!
//! let report = pipeline
//!     .run("https://www.instagram.com/reel/DRH9x20DB8H/", || {
//!         OllamaVisionAnnotator::new("http://localhost:11434", "llava")
//!     })
//!     .unwrap();
//! println!("{}", report.summary);
//! ```
//!
//! ## Selection model
//!
//! - Frame 0 is always saved; it becomes the first reference frame.
//! - Each later frame is compared against the reference. A save triggers
//!   when histogram divergence exceeds its threshold **or** structural
//!   similarity falls below its threshold; either signal alone suffices.
//! - A minimum frame interval debounces bursts; it is checked before any
//!   signal math.
//! - On every save the newly selected frame becomes the reference.
//!
//! A frame that fails to decode mid-stream is counted as dropped and the
//! scan continues; an unreadable container or an empty stream fails the
//! whole call.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system. The
//! transcription and annotation stages shell out to external tools
//! (a Whisper-compatible CLI, a vision model behind Ollama) that are
//! configured per call.

pub mod annotate;
pub mod audio;
pub mod download;
pub mod error;
pub mod ffmpeg;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod selector;
pub mod signals;
pub mod source;
pub mod summarize;
pub mod transcribe;
pub mod workspace;

pub use annotate::{
    AnnotateOptions, CommandAnnotator, FrameAnnotation, FrameAnnotator, OllamaVisionAnnotator,
    annotate_frames, load_annotations, save_annotations,
};
pub use audio::extract_audio_track;
pub use download::{ReelClient, shortcode_from_url};
pub use error::ReelgistError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::ReelMetadata;
pub use pipeline::{Pipeline, PipelineReport};
pub use progress::CancellationToken;
pub use selector::{
    ExtractionReport, KeyframeRecord, KeyframeSelector, SelectionReason, SelectorOptions,
    extract_keyframes, keyframe_file_name,
};
pub use signals::{ColorHistogram, structural_similarity};
pub use source::{FrameSource, VideoSource};
pub use summarize::{Provider, Summarizer, SummarizerOptions, build_prompt};
pub use transcribe::{Transcriber, WhisperCommand};
pub use workspace::Workspace;
