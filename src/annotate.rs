//! Keyframe annotation.
//!
//! Every image the selector saved gets a model-generated caption; the
//! captions are the "what was seen" stream the summarizer correlates with
//! the transcript. Vision models are stateful, so workers never share one:
//! each worker thread constructs its own annotator through the caller's
//! factory, pulls file paths from a shared queue, and sends results back
//! over a channel.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use base64::Engine as _;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::ReelgistError;

/// One annotated keyframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotation {
    /// File name of the annotated keyframe image.
    pub frame_file: String,
    /// Source frame index, parsed from the file name.
    pub frame_index: u64,
    /// Timestamp in the source video, `mm:ss`.
    pub timestamp: String,
    /// Model-generated description of the frame.
    pub caption: String,
}

/// Produces a caption for one keyframe image.
///
/// Implementations may hold mutable model or connection state; the
/// annotation driver gives each worker thread its own instance.
pub trait FrameAnnotator {
    /// Describe the image at `image_path` in plain text.
    fn annotate(&mut self, image_path: &Path) -> Result<String, ReelgistError>;
}

/// Settings for the annotation pass.
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// Worker threads, each owning one annotator instance. Clamped to the
    /// number of files to process. Default: 2.
    pub workers: usize,
    /// Frame rate used to derive timestamps from frame indices. A value of
    /// 0.0 yields `??:??` timestamps.
    pub frame_rate: f64,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            workers: 2,
            frame_rate: 0.0,
        }
    }
}

/// Caption every keyframe image in `frames_dir`.
///
/// Files are discovered by the selector's naming scheme and processed in
/// name order, which is save order. A frame whose annotation fails is
/// logged and skipped; one flaky caption does not lose the whole pass.
/// Construction of the annotators themselves is fail-fast.
///
/// # Errors
///
/// Returns [`ReelgistError::Io`] if the directory is unreadable, or
/// whatever `make_annotator` fails with.
pub fn annotate_frames<F, A>(
    frames_dir: &Path,
    options: &AnnotateOptions,
    make_annotator: F,
) -> Result<Vec<FrameAnnotation>, ReelgistError>
where
    F: Fn() -> Result<A, ReelgistError>,
    A: FrameAnnotator + Send,
{
    let mut image_files: Vec<PathBuf> = fs::read_dir(frames_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .and_then(frame_index_from_name)
                .is_some()
        })
        .collect();
    image_files.sort();

    if image_files.is_empty() {
        log::warn!("No keyframe images found in {}", frames_dir.display());
        return Ok(Vec::new());
    }

    let worker_count = options.workers.max(1).min(image_files.len());

    // Fail fast if any worker's model cannot be constructed, before any
    // thread is spawned. Each instance is moved into exactly one worker.
    let annotators = (0..worker_count)
        .map(|_| make_annotator())
        .collect::<Result<Vec<A>, ReelgistError>>()?;

    log::info!(
        "Annotating {} keyframes with {} worker(s)",
        image_files.len(),
        worker_count,
    );

    let queue: Arc<Mutex<VecDeque<(usize, PathBuf)>>> =
        Arc::new(Mutex::new(image_files.into_iter().enumerate().collect()));
    let (result_sender, result_receiver) = mpsc::channel::<(usize, PathBuf, String)>();

    thread::scope(|scope| {
        for (worker, mut annotator) in annotators.into_iter().enumerate() {
            let queue = Arc::clone(&queue);
            let results = result_sender.clone();
            scope.spawn(move || {
                loop {
                    let job = {
                        let Ok(mut queue) = queue.lock() else { break };
                        queue.pop_front()
                    };
                    let Some((position, path)) = job else { break };

                    match annotator.annotate(&path) {
                        Ok(caption) => {
                            log::debug!("Worker {worker} captioned {}", path.display());
                            let _ = results.send((position, path, caption));
                        }
                        Err(error) => {
                            log::warn!("Skipping {}: {error}", path.display());
                        }
                    }
                }
            });
        }
    });
    drop(result_sender);

    let mut completed: Vec<(usize, PathBuf, String)> = result_receiver.iter().collect();
    completed.sort_by_key(|(position, ..)| *position);

    let annotations = completed
        .into_iter()
        .filter_map(|(_, path, caption)| {
            let frame_file = path.file_name()?.to_str()?.to_string();
            let frame_index = frame_index_from_name(&frame_file)?;
            Some(FrameAnnotation {
                timestamp: timestamp_label(frame_index, options.frame_rate),
                frame_file,
                frame_index,
                caption,
            })
        })
        .collect();

    Ok(annotations)
}

/// Write annotation records as pretty-printed JSON.
pub fn save_annotations(
    annotations: &[FrameAnnotation],
    path: &Path,
) -> Result<(), ReelgistError> {
    let payload = serde_json::to_string_pretty(annotations)
        .map_err(|error| ReelgistError::Annotation(error.to_string()))?;
    fs::write(path, payload)?;
    Ok(())
}

/// Read annotation records back from JSON.
pub fn load_annotations(path: &Path) -> Result<Vec<FrameAnnotation>, ReelgistError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|error| ReelgistError::Annotation(error.to_string()))
}

/// Parse the source frame index out of a selector-named file
/// (`keyframe_NNNN_frame_NNNNNN.jpg`).
fn frame_index_from_name(name: &str) -> Option<u64> {
    let stem = name
        .strip_suffix(".jpg")
        .or_else(|| name.strip_suffix(".jpeg"))
        .or_else(|| name.strip_suffix(".png"))?;
    if !stem.starts_with("keyframe_") {
        return None;
    }
    stem.rsplit('_').next()?.parse().ok()
}

/// Format a frame index as an `mm:ss` timestamp.
fn timestamp_label(frame_index: u64, frame_rate: f64) -> String {
    if frame_rate <= 0.0 {
        return "??:??".to_string();
    }
    let seconds = (frame_index as f64 / frame_rate).round() as u64;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Captioning via a local Ollama vision model (e.g. `llava`).
///
/// Sends the image base64-embedded to the `/api/generate` endpoint and takes
/// the model's reply as the caption.
pub struct OllamaVisionAnnotator {
    http: Client,
    endpoint: String,
    model: String,
    prompt: String,
}

impl OllamaVisionAnnotator {
    /// Create an annotator against `endpoint` (e.g. `http://localhost:11434`)
    /// using `model`.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ReelgistError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|error| {
                ReelgistError::Annotation(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            prompt: "Describe this video frame in one detailed sentence, including any \
                     visible text."
                .to_string(),
        })
    }

    /// Override the captioning prompt.
    #[must_use]
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

impl FrameAnnotator for OllamaVisionAnnotator {
    fn annotate(&mut self, image_path: &Path) -> Result<String, ReelgistError> {
        let bytes = fs::read(image_path)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        let body = serde_json::json!({
            "model": self.model,
            "prompt": self.prompt,
            "images": [encoded],
            "stream": false,
        });

        let response = self
            .http
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|error| ReelgistError::Annotation(error.to_string()))?;

        let payload: serde_json::Value = response
            .json()
            .map_err(|error| ReelgistError::Annotation(error.to_string()))?;

        payload
            .get("response")
            .and_then(serde_json::Value::as_str)
            .map(|caption| caption.trim().to_string())
            .ok_or_else(|| {
                ReelgistError::Annotation("model reply carries no response field".to_string())
            })
    }
}

/// Captioning via an arbitrary external command.
///
/// The image path is appended as the final argument; stdout is taken as the
/// caption. Useful for wiring in local captioning scripts without an HTTP
/// server in between.
#[derive(Debug, Clone)]
pub struct CommandAnnotator {
    program: String,
    args: Vec<String>,
}

impl CommandAnnotator {
    /// Caption frames by running `program [args...] <image>`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl FrameAnnotator for CommandAnnotator {
    fn annotate(&mut self, image_path: &Path) -> Result<String, ReelgistError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .output()
            .map_err(|error| {
                ReelgistError::Annotation(format!("failed to run `{}`: {error}", self.program))
            })?;

        if !output.status.success() {
            return Err(ReelgistError::Annotation(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim(),
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{frame_index_from_name, timestamp_label};

    #[test]
    fn parses_frame_index_from_selector_names() {
        assert_eq!(
            frame_index_from_name("keyframe_0000_frame_000000.jpg"),
            Some(0)
        );
        assert_eq!(
            frame_index_from_name("keyframe_0012_frame_004242.jpg"),
            Some(4242)
        );
        assert_eq!(frame_index_from_name("thumbnail.jpg"), None);
        assert_eq!(frame_index_from_name("keyframe_0000_frame_x.jpg"), None);
    }

    #[test]
    fn timestamps_round_to_seconds() {
        assert_eq!(timestamp_label(0, 30.0), "00:00");
        assert_eq!(timestamp_label(90, 30.0), "00:03");
        assert_eq!(timestamp_label(3700, 30.0), "02:03");
        assert_eq!(timestamp_label(10, 0.0), "??:??");
    }
}
