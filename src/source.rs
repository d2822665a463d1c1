//! Sequential video frame decoding.
//!
//! [`VideoSource`] opens a video container and yields decoded RGB frames in
//! arrival order, one per call. [`FrameSource`] is the seam between the
//! decoder and the keyframe selector: selection logic only ever sees the
//! trait, so it can be driven by synthetic in-memory streams in tests.
//!
//! The demuxer and decoder handles are owned by the `VideoSource` and
//! released when it is dropped, on every exit path.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::error::ReelgistError;

/// A sequential stream of decoded video frames.
///
/// Frames arrive in decode order. A `Some(Err(_))` item is a single
/// undecodable frame: it still occupies a position in the stream, and
/// callers may count it and keep pulling. `None` means the stream is
/// exhausted.
pub trait FrameSource {
    /// Frames per second as reported by the container, or 0.0 if unknown.
    ///
    /// Informational only; it never gates frame delivery.
    fn frame_rate(&self) -> f64;

    /// Decode the next frame.
    fn next_frame(&mut self) -> Option<Result<RgbImage, ReelgistError>>;
}

/// FFmpeg-backed [`FrameSource`] over a video file.
///
/// Opens the container, locates the best video stream, and decodes frames
/// sequentially to RGB8 at the source resolution.
///
/// # Example
///
/// ```no_run
/// use reelgist::{FrameSource, ReelgistError, VideoSource};
///
/// let mut source = VideoSource::open("ingestion/video.mp4")?;
/// while let Some(frame) = source.next_frame() {
///     let frame = frame?;
///     println!("{}x{}", frame.width(), frame.height());
/// }
/// # Ok::<(), ReelgistError>(())
/// ```
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    frame_rate: f64,
    width: u32,
    height: u32,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    /// Stream position of the next frame to yield, counting failed ones.
    position: u64,
    eof_sent: bool,
    finished: bool,
    file_path: PathBuf,
}

impl VideoSource {
    /// Open a video file for sequential decoding.
    ///
    /// # Errors
    ///
    /// Returns [`ReelgistError::StreamOpen`] if the file is missing or its
    /// container/codec cannot be read, and [`ReelgistError::NoVideoStream`]
    /// if it opens but carries no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReelgistError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video stream: {}", file_path.display());

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init().map_err(|error| ReelgistError::StreamOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| ReelgistError::StreamOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let (video_stream_index, frame_rate, codec_parameters) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(ReelgistError::NoVideoStream)?;

            // Average frame rate, falling back to the raw rate field for
            // containers that do not report one.
            let average = stream.avg_frame_rate();
            let frame_rate = if average.denominator() != 0 {
                f64::from(average.numerator()) / f64::from(average.denominator())
            } else {
                let rate = stream.rate();
                if rate.denominator() != 0 {
                    f64::from(rate.numerator()) / f64::from(rate.denominator())
                } else {
                    0.0
                }
            };

            (stream.index(), frame_rate, stream.parameters())
        };

        let decoder_context =
            CodecContext::from_parameters(codec_parameters).map_err(|error| {
                ReelgistError::StreamOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| ReelgistError::StreamOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| ReelgistError::StreamOpen {
            path: file_path.clone(),
            reason: format!("Failed to create pixel-format converter: {error}"),
        })?;

        log::info!(
            "Opened video stream: {} ({}x{}, {:.2} fps)",
            file_path.display(),
            width,
            height,
            frame_rate,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            frame_rate,
            width,
            height,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            position: 0,
            eof_sent: false,
            finished: false,
            file_path,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn frame_decode_error(&self, reason: String) -> ReelgistError {
        ReelgistError::FrameDecode {
            frame_index: self.position,
            reason,
        }
    }

    /// Scale and convert the current `decoded_frame` to an [`RgbImage`].
    fn convert_current_frame(&mut self) -> Result<RgbImage, ReelgistError> {
        self.scaler
            .run(&self.decoded_frame, &mut self.rgb_frame)
            .map_err(|error| self.frame_decode_error(error.to_string()))?;

        let buffer = frame_to_rgb_buffer(&self.rgb_frame, self.width, self.height);
        RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            self.frame_decode_error("decoded frame buffer has unexpected size".to_string())
        })
    }
}

impl FrameSource for VideoSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> Option<Result<RgbImage, ReelgistError>> {
        if self.finished {
            return None;
        }

        loop {
            // Drain frames the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let converted = self.convert_current_frame();
                self.position += 1;
                return Some(converted);
            }

            if self.eof_sent {
                self.finished = true;
                return None;
            }

            // Decoder wants more input; feed it the next video packet.
            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index
                        && let Err(error) = self.decoder.send_packet(&packet)
                    {
                        // One bad packet is one undecodable frame, not the
                        // end of the scan.
                        let failure = self.frame_decode_error(error.to_string());
                        self.position += 1;
                        return Some(Err(failure));
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        self.finished = true;
                        let failure = self.frame_decode_error(error.to_string());
                        self.position += 1;
                        return Some(Err(failure));
                    }
                    self.eof_sent = true;
                }
                Err(_) => {
                    // Transient demuxer read error; try the next packet.
                }
            }
        }
    }
}

/// Copy pixel data from a scaled RGB24 frame into a tightly-packed buffer,
/// collapsing any row padding FFmpeg may have added.
fn frame_to_rgb_buffer(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * height as usize].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            buffer.extend_from_slice(&data[start..start + row_bytes]);
        }
        buffer
    }
}
