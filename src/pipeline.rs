//! End-to-end pipeline orchestration.
//!
//! One sequential pass per reel: download, audio extraction, transcription,
//! keyframe selection, annotation, summarization. Stages exchange artifacts
//! through the [`Workspace`] only, and each failure propagates immediately;
//! the pipeline performs no retries of its own.

use std::fs;

use crate::annotate::{self, AnnotateOptions, FrameAnnotator};
use crate::audio;
use crate::download::ReelClient;
use crate::error::ReelgistError;
use crate::metadata::ReelMetadata;
use crate::selector::{ExtractionReport, KeyframeSelector, SelectorOptions};
use crate::source::{FrameSource, VideoSource};
use crate::summarize::{self, Summarizer};
use crate::transcribe::Transcriber;
use crate::workspace::Workspace;

/// Everything the pipeline produced for one reel.
#[derive(Debug)]
#[must_use]
pub struct PipelineReport {
    /// Post metadata, when the download stage supplied it.
    pub metadata: Option<ReelMetadata>,
    /// The audio transcript.
    pub transcript: String,
    /// Keyframe selection totals and records.
    pub extraction: ExtractionReport,
    /// Per-frame annotations in save order.
    pub annotations: Vec<annotate::FrameAnnotation>,
    /// The generated narrative summary.
    pub summary: String,
}

/// Sequential reel-processing pipeline.
///
/// # Example
///
/// ```no_run
/// use reelgist::{
///     OllamaVisionAnnotator, Pipeline, Provider, ReelgistError, SelectorOptions, Summarizer,
///     SummarizerOptions, WhisperCommand, Workspace,
/// };
///
/// let workspace = Workspace::new(".");
/// let selector = SelectorOptions::new(workspace.frames_dir());
/// let summarizer = Summarizer::new(SummarizerOptions::new(Provider::Ollama))?;
/// let pipeline = Pipeline::new(workspace, selector, Box::new(WhisperCommand::new()), summarizer);
///
/// let report = pipeline.run(
///     "https://www.instagram.com/reel/DRH9x20DB8H/",
///     || OllamaVisionAnnotator::new("http://localhost:11434", "llava"),
/// )?;
/// println!("{}", report.summary);
/// # Ok::<(), ReelgistError>(())
/// ```
pub struct Pipeline {
    workspace: Workspace,
    selector_options: SelectorOptions,
    transcriber: Box<dyn Transcriber>,
    summarizer: Summarizer,
    annotator_workers: usize,
}

impl Pipeline {
    /// Assemble a pipeline from its stage configurations.
    ///
    /// `selector_options.output_dir` is where keyframes land and where the
    /// annotation stage reads them back; it is normally
    /// [`Workspace::frames_dir`].
    pub fn new(
        workspace: Workspace,
        selector_options: SelectorOptions,
        transcriber: Box<dyn Transcriber>,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            workspace,
            selector_options,
            transcriber,
            summarizer,
            annotator_workers: 2,
        }
    }

    /// Set how many annotation workers run in parallel.
    #[must_use]
    pub fn with_annotator_workers(mut self, workers: usize) -> Self {
        self.annotator_workers = workers.max(1);
        self
    }

    /// Clear the workspace, download the reel at `url`, and process it.
    pub fn run<F, A>(&self, url: &str, make_annotator: F) -> Result<PipelineReport, ReelgistError>
    where
        F: Fn() -> Result<A, ReelgistError>,
        A: FrameAnnotator + Send,
    {
        self.workspace.clear()?;
        self.workspace.ensure_layout()?;

        log::info!("Downloading reel resources for {url}");
        let client = ReelClient::new()?;
        let metadata = client.download_reel(url, &self.workspace)?;

        self.run_local(Some(metadata), make_annotator)
    }

    /// Process a video already present at [`Workspace::video_path`].
    ///
    /// When `metadata` is `None`, a record left behind by a previous
    /// download is picked up from the workspace if one parses.
    pub fn run_local<F, A>(
        &self,
        metadata: Option<ReelMetadata>,
        make_annotator: F,
    ) -> Result<PipelineReport, ReelgistError>
    where
        F: Fn() -> Result<A, ReelgistError>,
        A: FrameAnnotator + Send,
    {
        let video_path = self.workspace.video_path();
        if !video_path.exists() {
            return Err(ReelgistError::StreamOpen {
                path: video_path,
                reason: "no video supplied by the download stage".to_string(),
            });
        }
        self.workspace.ensure_layout()?;

        let metadata =
            metadata.or_else(|| ReelMetadata::load(self.workspace.metadata_path()).ok());

        log::info!("Extracting audio track");
        audio::extract_audio_track(&video_path, &self.workspace.audio_path())?;

        log::info!("Transcribing audio");
        let transcript = self.transcriber.transcribe(&self.workspace.audio_path())?;
        fs::write(self.workspace.transcript_path(), &transcript)?;

        log::info!("Selecting keyframes");
        let mut source = VideoSource::open(&video_path)?;
        let frame_rate = source.frame_rate();
        let extraction = KeyframeSelector::new(self.selector_options.clone()).run(&mut source)?;

        log::info!("Annotating {} keyframes", extraction.keyframes.len());
        let annotate_options = AnnotateOptions {
            workers: self.annotator_workers,
            frame_rate,
        };
        let annotations = annotate::annotate_frames(
            &self.selector_options.output_dir,
            &annotate_options,
            make_annotator,
        )?;
        annotate::save_annotations(&annotations, &self.workspace.annotations_path())?;

        log::info!("Generating summary");
        let prompt = summarize::build_prompt(&transcript, &annotations, metadata.as_ref());
        let summary = self.summarizer.generate(&prompt)?;
        fs::write(self.workspace.summary_path(), &summary)?;

        Ok(PipelineReport {
            metadata,
            transcript,
            extraction,
            annotations,
            summary,
        })
    }
}
