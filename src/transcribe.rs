//! Audio transcription.
//!
//! Speech-to-text is an external collaborator: the pipeline hands it an
//! audio file and consumes whatever UTF-8 transcript it produces. The
//! [`Transcriber`] trait is the seam; [`WhisperCommand`] is the stock
//! implementation driving a Whisper-compatible CLI.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::ReelgistError;

/// Turns an audio file into a UTF-8 transcript.
pub trait Transcriber {
    /// Transcribe the audio at `audio` and return the plain text.
    fn transcribe(&self, audio: &Path) -> Result<String, ReelgistError>;
}

/// Transcription via an external Whisper-compatible command.
///
/// Runs `<program> <audio> --model <model> --output_format txt
/// --output_dir <audio's directory>` and reads the text file the command
/// writes next to the input.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use reelgist::{ReelgistError, Transcriber, WhisperCommand};
///
/// let transcriber = WhisperCommand::new().model("small").language("en");
/// let transcript = transcriber.transcribe(Path::new("ingestion/audio.wav"))?;
/// # Ok::<(), ReelgistError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct WhisperCommand {
    program: String,
    model: String,
    language: Option<String>,
}

impl WhisperCommand {
    /// Use the `whisper` binary on `PATH` with the `base` model.
    pub fn new() -> Self {
        Self {
            program: "whisper".to_string(),
            model: "base".to_string(),
            language: None,
        }
    }

    /// Use a different executable (e.g. a `whisper.cpp` wrapper).
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Select the model size or checkpoint name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Pin the spoken language instead of auto-detecting.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl Default for WhisperCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcriber for WhisperCommand {
    fn transcribe(&self, audio: &Path) -> Result<String, ReelgistError> {
        let output_dir = audio.parent().unwrap_or_else(|| Path::new("."));

        let mut command = Command::new(&self.program);
        command
            .arg(audio)
            .args(["--model", &self.model])
            .args(["--output_format", "txt"])
            .arg("--output_dir")
            .arg(output_dir)
            // Conditioning on prior text makes hallucinated loops worse on
            // music-heavy reels.
            .args(["--condition_on_previous_text", "False"])
            .args(["--fp16", "False"]);
        if let Some(language) = &self.language {
            command.args(["--language", language]);
        }

        log::info!(
            "Transcribing {} with `{}` (model {})",
            audio.display(),
            self.program,
            self.model,
        );

        let output = command.output().map_err(|error| {
            ReelgistError::Transcription(format!("failed to run `{}`: {error}", self.program))
        })?;

        if !output.status.success() {
            return Err(ReelgistError::Transcription(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim(),
            )));
        }

        let transcript_path = audio.with_extension("txt");
        let transcript = fs::read_to_string(&transcript_path).map_err(|error| {
            ReelgistError::Transcription(format!(
                "transcript not found at {}: {error}",
                transcript_path.display(),
            ))
        })?;

        Ok(transcript.trim().to_string())
    }
}
