//! Keyframe selection.
//!
//! The selector scans a decoded frame stream in arrival order and saves the
//! frames that open a new visual scene. Every frame is compared against the
//! most recently saved frame (the reference) with two signals: a per-channel
//! color-histogram distance and a windowed structural similarity index.
//! Either signal alone can trigger a save; a missed scene change costs more
//! downstream than an extra keyframe, so the two are OR-combined. A minimum
//! frame interval debounces bursts during rapid cuts.
//!
//! The scan is single-threaded by construction: which frame is the current
//! reference is only known after all prior frames have been processed.
//!
//! # Example
//!
//! ```no_run
//! use reelgist::{ReelgistError, SelectorOptions, extract_keyframes};
//!
//! let options = SelectorOptions::new("artifacts/video_frames")
//!     .histogram_threshold(0.5)
//!     .min_frame_interval(12);
//! let report = extract_keyframes("ingestion/video.mp4", options)?;
//! println!("saved {} of {} frames", report.keyframes.len(), report.frames_decoded);
//! # Ok::<(), ReelgistError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage};

use crate::error::ReelgistError;
use crate::progress::CancellationToken;
use crate::signals::{self, ColorHistogram};
use crate::source::{FrameSource, VideoSource};

/// Default minimum histogram divergence that triggers a save.
pub const DEFAULT_HISTOGRAM_THRESHOLD: f64 = 0.35;
/// Default structural-similarity score below which a save triggers.
pub const DEFAULT_STRUCTURAL_THRESHOLD: f64 = 0.80;
/// Default minimum number of decoded frames between two saves.
pub const DEFAULT_MIN_FRAME_INTERVAL: u64 = 8;

/// Keyframe selection settings.
///
/// The three tuning knobs are independent; none of the defaults is right
/// for every kind of content. Builder methods adjust individual fields.
///
/// # Example
///
/// ```
/// use reelgist::SelectorOptions;
///
/// let options = SelectorOptions::new("frames")
///     .structural_threshold(0.7)
///     .min_frame_interval(15);
/// assert_eq!(options.min_frame_interval, 15);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct SelectorOptions {
    /// Minimum histogram divergence (max across channels) for a save.
    ///
    /// Lower values save more frames. Default: 0.35.
    pub histogram_threshold: f64,
    /// Structural-similarity score below which a save triggers.
    ///
    /// Higher values save more frames. Default: 0.80.
    pub structural_threshold: f64,
    /// Minimum number of decoded frames that must elapse after a save
    /// before another save is allowed, regardless of signal strength.
    ///
    /// Evaluated before any signal math. Default: 8.
    pub min_frame_interval: u64,
    /// Directory receiving the saved keyframe images. Created if absent.
    pub output_dir: PathBuf,
}

impl SelectorOptions {
    /// Create selection settings with default thresholds.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            histogram_threshold: DEFAULT_HISTOGRAM_THRESHOLD,
            structural_threshold: DEFAULT_STRUCTURAL_THRESHOLD,
            min_frame_interval: DEFAULT_MIN_FRAME_INTERVAL,
            output_dir: output_dir.into(),
        }
    }

    /// Set the minimum histogram divergence that triggers a save.
    pub fn histogram_threshold(mut self, threshold: f64) -> Self {
        self.histogram_threshold = threshold;
        self
    }

    /// Set the structural-similarity score below which a save triggers.
    pub fn structural_threshold(mut self, threshold: f64) -> Self {
        self.structural_threshold = threshold;
        self
    }

    /// Set the debounce interval in frames. Clamped to a minimum of 1.
    pub fn min_frame_interval(mut self, interval: u64) -> Self {
        self.min_frame_interval = interval.max(1);
        self
    }
}

/// Why a frame was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// The first decodable frame of the stream is always saved.
    StreamStart,
    /// The color distribution diverged from the reference frame.
    HistogramDivergence,
    /// The frame layout changed structurally relative to the reference.
    StructuralChange,
    /// Both signals crossed their thresholds.
    HistogramAndStructural,
}

/// A saved keyframe.
///
/// Records are appended in save order and never mutated. Save indices are
/// consecutive from 0; frame indices are strictly increasing and, past the
/// forced first frame, at least
/// [`min_frame_interval`](SelectorOptions::min_frame_interval) apart.
#[derive(Debug, Clone)]
pub struct KeyframeRecord {
    /// Zero-based position in save order.
    pub save_index: u64,
    /// Index of the originating frame in decode order.
    pub frame_index: u64,
    /// Which signal triggered the save.
    pub reason: SelectionReason,
    /// Path of the written image file.
    pub path: PathBuf,
}

/// Totals and records for one extraction run.
#[derive(Debug, Clone)]
#[must_use]
pub struct ExtractionReport {
    /// Frames that decoded successfully, selected or not.
    pub frames_decoded: u64,
    /// Frames that failed to decode and were skipped.
    pub frames_dropped: u64,
    /// Saved keyframes, in save order.
    pub keyframes: Vec<KeyframeRecord>,
}

/// File name for a saved keyframe.
///
/// Both indices are zero-padded so that lexicographic order matches save
/// order, with the source frame index embedded for traceability.
pub fn keyframe_file_name(save_index: u64, frame_index: u64) -> String {
    format!("keyframe_{save_index:04}_frame_{frame_index:06}.jpg")
}

/// The only persistent scan state: the most recently saved frame, held as
/// its precomputed comparison signals.
///
/// Replaced wholesale on every save: the histogram and grayscale plane are
/// always the result of a single fresh pass over the newly selected frame.
struct ReferenceFrame {
    histogram: ColorHistogram,
    luma: GrayImage,
}

impl ReferenceFrame {
    fn from_image(image: &RgbImage) -> Self {
        Self {
            histogram: ColorHistogram::from_image(image),
            luma: image::imageops::grayscale(image),
        }
    }
}

/// Scans a frame stream and persists the visually significant frames.
///
/// See the [module documentation](self) for the selection model.
pub struct KeyframeSelector {
    options: SelectorOptions,
    cancellation: Option<CancellationToken>,
}

impl KeyframeSelector {
    /// Create a selector with the given settings.
    pub fn new(options: SelectorOptions) -> Self {
        Self {
            options,
            cancellation: None,
        }
    }

    /// Attach a cancellation token, checked between frames.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Scan `source` and write one image per selected frame.
    ///
    /// The first decodable frame is always saved. The output directory is
    /// only created once that frame is in hand, so open and empty-stream
    /// failures leave nothing on disk.
    ///
    /// # Errors
    ///
    /// - [`ReelgistError::EmptyStream`] if the stream yields no decodable
    ///   frames.
    /// - [`ReelgistError::KeyframeWrite`] if a selected frame cannot be
    ///   persisted (this aborts the scan; the error names the frame).
    /// - [`ReelgistError::Cancelled`] if the attached token was tripped.
    ///
    /// Individual frames that fail to decode are counted in
    /// [`frames_dropped`](ExtractionReport::frames_dropped) and skipped.
    pub fn run<S: FrameSource>(&self, source: &mut S) -> Result<ExtractionReport, ReelgistError> {
        log::debug!(
            "Selecting keyframes (histogram > {}, similarity < {}, interval {}, {:.2} fps)",
            self.options.histogram_threshold,
            self.options.structural_threshold,
            self.options.min_frame_interval,
            source.frame_rate(),
        );

        let mut frames_decoded: u64 = 0;
        let mut frames_dropped: u64 = 0;
        let mut position: u64 = 0;

        // Pull until the first frame decodes; a stream where nothing decodes
        // is empty for our purposes.
        let first = loop {
            match source.next_frame() {
                None => return Err(ReelgistError::EmptyStream),
                Some(Err(error)) => {
                    frames_dropped += 1;
                    log::warn!("Dropping undecodable frame {position}: {error}");
                    position += 1;
                }
                Some(Ok(image)) => break image,
            }
        };
        frames_decoded += 1;
        let first_index = position;
        position += 1;

        fs::create_dir_all(&self.options.output_dir)?;

        let mut keyframes = Vec::new();
        self.save_keyframe(&first, first_index, SelectionReason::StreamStart, &mut keyframes)?;
        let mut reference = ReferenceFrame::from_image(&first);
        let mut last_saved_index = first_index;

        loop {
            if let Some(token) = &self.cancellation
                && token.is_cancelled()
            {
                return Err(ReelgistError::Cancelled);
            }

            let image = match source.next_frame() {
                None => break,
                Some(Err(error)) => {
                    frames_dropped += 1;
                    log::warn!("Dropping undecodable frame {position}: {error}");
                    position += 1;
                    continue;
                }
                Some(Ok(image)) => image,
            };
            let current_index = position;
            position += 1;
            frames_decoded += 1;

            // Hard debounce gate, evaluated before any signal math.
            if current_index - last_saved_index < self.options.min_frame_interval {
                continue;
            }

            let histogram = ColorHistogram::from_image(&image);
            let divergence = reference.histogram.divergence(&histogram);
            let luma = image::imageops::grayscale(&image);
            let similarity = signals::structural_similarity(&reference.luma, &luma);

            let histogram_hit = divergence > self.options.histogram_threshold;
            let structural_hit = similarity < self.options.structural_threshold;
            if !histogram_hit && !structural_hit {
                continue;
            }

            let reason = match (histogram_hit, structural_hit) {
                (true, true) => SelectionReason::HistogramAndStructural,
                (true, false) => SelectionReason::HistogramDivergence,
                _ => SelectionReason::StructuralChange,
            };

            log::debug!(
                "Frame {current_index}: divergence {divergence:.4}, similarity {similarity:.4} -> save ({reason:?})"
            );

            self.save_keyframe(&image, current_index, reason, &mut keyframes)?;
            // The signals just computed for this frame become the new
            // reference verbatim; nothing is re-normalized.
            reference = ReferenceFrame { histogram, luma };
            last_saved_index = current_index;
        }

        log::info!(
            "Keyframe selection complete: saved {} of {} decoded frames ({} dropped)",
            keyframes.len(),
            frames_decoded,
            frames_dropped,
        );

        Ok(ExtractionReport {
            frames_decoded,
            frames_dropped,
            keyframes,
        })
    }

    /// Persist one selected frame and append its record.
    fn save_keyframe(
        &self,
        image: &RgbImage,
        frame_index: u64,
        reason: SelectionReason,
        records: &mut Vec<KeyframeRecord>,
    ) -> Result<(), ReelgistError> {
        let save_index = records.len() as u64;
        let path = self
            .options
            .output_dir
            .join(keyframe_file_name(save_index, frame_index));

        image
            .save(&path)
            .map_err(|error| ReelgistError::KeyframeWrite {
                path: path.clone(),
                frame_index,
                reason: error.to_string(),
            })?;

        records.push(KeyframeRecord {
            save_index,
            frame_index,
            reason,
            path,
        });
        Ok(())
    }
}

/// Open `path` and run keyframe selection over its video stream.
///
/// Convenience wrapper combining [`VideoSource::open`] and
/// [`KeyframeSelector::run`]. The decode handle is released before this
/// function returns, on success and on error alike.
pub fn extract_keyframes(
    path: impl AsRef<Path>,
    options: SelectorOptions,
) -> Result<ExtractionReport, ReelgistError> {
    let mut source = VideoSource::open(path)?;
    KeyframeSelector::new(options).run(&mut source)
}

#[cfg(test)]
mod tests {
    use super::keyframe_file_name;

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(keyframe_file_name(0, 0), "keyframe_0000_frame_000000.jpg");
        assert_eq!(keyframe_file_name(17, 4242), "keyframe_0017_frame_004242.jpg");
    }

    #[test]
    fn file_names_sort_in_save_order() {
        let earlier = keyframe_file_name(9, 999_999);
        let later = keyframe_file_name(10, 0);
        assert!(earlier < later);
    }
}
