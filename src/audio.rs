//! Audio track extraction.
//!
//! Decodes the reel's audio stream and writes a 16 kHz mono PCM WAV file,
//! the input format the transcription front-end expects. Resampling is done
//! with FFmpeg's software resampler; the WAV container is written with
//! `hound`.

use std::path::Path;

use ffmpeg_next::{
    ChannelLayout,
    codec::context::Context as CodecContext,
    format::sample::{Sample, Type as SampleType},
    frame::Audio as AudioFrame,
    media::Type,
    software::resampling::Context as ResamplingContext,
};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::ReelgistError;

/// Output sample rate in hertz.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decode the audio track of `input` and write it to `output` as 16 kHz
/// mono 16-bit PCM WAV.
///
/// Returns the number of samples written.
///
/// # Errors
///
/// - [`ReelgistError::StreamOpen`] if the input cannot be opened.
/// - [`ReelgistError::NoAudioStream`] if it carries no audio.
/// - [`ReelgistError::AudioDecode`] for decode, resample, or write failures.
pub fn extract_audio_track(input: &Path, output: &Path) -> Result<u64, ReelgistError> {
    ffmpeg_next::init().map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;

    let mut input_context =
        ffmpeg_next::format::input(&input).map_err(|error| ReelgistError::StreamOpen {
            path: input.to_path_buf(),
            reason: error.to_string(),
        })?;

    let (audio_stream_index, codec_parameters) = {
        let stream = input_context
            .streams()
            .best(Type::Audio)
            .ok_or(ReelgistError::NoAudioStream)?;
        (stream.index(), stream.parameters())
    };

    let decoder_context = CodecContext::from_parameters(codec_parameters)
        .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;
    let mut decoder = decoder_context
        .decoder()
        .audio()
        .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;

    let mut resampler = ResamplingContext::get(
        decoder.format(),
        decoder.channel_layout(),
        decoder.rate(),
        Sample::I16(SampleType::Packed),
        ChannelLayout::MONO,
        TARGET_SAMPLE_RATE,
    )
    .map_err(|error| ReelgistError::AudioDecode(format!("failed to create resampler: {error}")))?;

    let spec = WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(output, spec)
        .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;

    let mut decoded = AudioFrame::empty();
    let mut resampled = AudioFrame::empty();
    let mut samples_written: u64 = 0;

    for (stream, packet) in input_context.packets() {
        if stream.index() != audio_stream_index {
            continue;
        }

        decoder
            .send_packet(&packet)
            .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;

        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler
                .run(&decoded, &mut resampled)
                .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;
            samples_written += write_samples(&resampled, &mut writer)?;
        }
    }

    // Flush the decoder, then drain any delay buffered in the resampler.
    decoder
        .send_eof()
        .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;
    while decoder.receive_frame(&mut decoded).is_ok() {
        resampler
            .run(&decoded, &mut resampled)
            .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;
        samples_written += write_samples(&resampled, &mut writer)?;
    }

    while resampler.delay().is_some() {
        resampler
            .flush(&mut resampled)
            .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;
        if resampled.samples() == 0 {
            break;
        }
        samples_written += write_samples(&resampled, &mut writer)?;
    }

    writer
        .finalize()
        .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;

    log::info!(
        "Extracted audio track: {} samples ({:.1}s) -> {}",
        samples_written,
        samples_written as f64 / f64::from(TARGET_SAMPLE_RATE),
        output.display(),
    );

    Ok(samples_written)
}

/// Append a packed-i16 mono frame to the WAV writer.
fn write_samples<W>(
    frame: &AudioFrame,
    writer: &mut WavWriter<W>,
) -> Result<u64, ReelgistError>
where
    W: std::io::Write + std::io::Seek,
{
    let sample_count = frame.samples();
    let data = frame.data(0);
    let mut written: u64 = 0;

    for chunk in data.chunks_exact(2).take(sample_count) {
        let sample = i16::from_ne_bytes([chunk[0], chunk[1]]);
        writer
            .write_sample(sample)
            .map_err(|error| ReelgistError::AudioDecode(error.to_string()))?;
        written += 1;
    }

    Ok(written)
}
