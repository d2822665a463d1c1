//! Narrative summarization.
//!
//! The final stage folds the transcript, the per-frame annotations, and the
//! post metadata into one prompt and asks a text-generation provider for a
//! narrative summary. Provider selection is a closed set — every variant
//! exposes the same capability (prompt in, text out) and every failure
//! normalizes to [`ReelgistError::Summarization`] with the provider named.
//!
//! All configuration is explicit. The library never reads API keys or hosts
//! from the environment; the binary does that at its edge and passes them in.

use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{Value, json};

use crate::annotate::FrameAnnotation;
use crate::error::ReelgistError;
use crate::metadata::ReelMetadata;

/// Which hosted model generates the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Google Gemini over the Generative Language API.
    Gemini,
    /// OpenAI chat completions.
    OpenAi,
    /// Anthropic Claude messages API.
    Claude,
    /// A local or remote Ollama instance (no API key).
    Ollama,
}

impl Provider {
    /// Stable lowercase name used in errors and CLI parsing.
    pub fn name(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Claude => "claude",
            Provider::Ollama => "ollama",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-1.5-flash",
            Provider::OpenAi => "gpt-4o",
            Provider::Claude => "claude-3-5-sonnet-20240620",
            Provider::Ollama => "llama3",
        }
    }

    fn default_endpoint(self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Claude => "https://api.anthropic.com/v1",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    fn requires_api_key(self) -> bool {
        !matches!(self, Provider::Ollama)
    }
}

impl FromStr for Provider {
    type Err = ReelgistError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" | "chatgpt" => Ok(Provider::OpenAi),
            "claude" | "anthropic" => Ok(Provider::Claude),
            "ollama" => Ok(Provider::Ollama),
            other => Err(ReelgistError::UnknownProvider(other.to_string())),
        }
    }
}

/// Summarizer configuration.
///
/// # Example
///
/// ```
/// use reelgist::{Provider, SummarizerOptions};
///
/// let options = SummarizerOptions::new(Provider::Ollama)
///     .model("llama3:8b")
///     .endpoint("http://gpu-box:11434");
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct SummarizerOptions {
    /// Which backend generates text.
    pub provider: Provider,
    /// Model identifier. `None` selects the provider default.
    pub model: Option<String>,
    /// API key for hosted providers. Ignored by Ollama.
    pub api_key: Option<String>,
    /// Base endpoint override. `None` selects the provider default.
    pub endpoint: Option<String>,
}

impl SummarizerOptions {
    /// Create options for `provider` with defaults for everything else.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            model: None,
            api_key: None,
            endpoint: None,
        }
    }

    /// Select a specific model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Supply the provider API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the provider's base endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// A configured text-generation client.
///
/// # Example
///
/// ```no_run
/// use reelgist::{Provider, ReelgistError, Summarizer, SummarizerOptions};
///
/// let summarizer = Summarizer::new(SummarizerOptions::new(Provider::Ollama))?;
/// let text = summarizer.generate("Say hello.")?;
/// # Ok::<(), ReelgistError>(())
/// ```
pub struct Summarizer {
    http: Client,
    provider: Provider,
    model: String,
    api_key: Option<String>,
    endpoint: String,
}

impl Summarizer {
    /// Build a client from explicit options.
    ///
    /// # Errors
    ///
    /// Keyed providers refuse to construct without an API key, so a missing
    /// credential surfaces here instead of mid-pipeline.
    pub fn new(options: SummarizerOptions) -> Result<Self, ReelgistError> {
        if options.provider.requires_api_key() && options.api_key.is_none() {
            return Err(ReelgistError::Summarization {
                provider: options.provider.name(),
                reason: "missing API key".to_string(),
            });
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|error| ReelgistError::Summarization {
                provider: options.provider.name(),
                reason: format!("failed to build HTTP client: {error}"),
            })?;

        let model = options
            .model
            .unwrap_or_else(|| options.provider.default_model().to_string());
        let endpoint = options
            .endpoint
            .unwrap_or_else(|| options.provider.default_endpoint().to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http,
            provider: options.provider,
            model,
            api_key: options.api_key,
            endpoint,
        })
    }

    /// The backend this client talks to.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Generate text from a prompt.
    ///
    /// # Errors
    ///
    /// All transport and payload failures normalize to
    /// [`ReelgistError::Summarization`].
    pub fn generate(&self, prompt: &str) -> Result<String, ReelgistError> {
        log::info!(
            "Generating summary with {} (model {})",
            self.provider.name(),
            self.model,
        );

        match self.provider {
            Provider::Gemini => self.generate_gemini(prompt),
            Provider::OpenAi => self.generate_openai(prompt),
            Provider::Claude => self.generate_claude(prompt),
            Provider::Ollama => self.generate_ollama(prompt),
        }
    }

    fn generate_gemini(&self, prompt: &str) -> Result<String, ReelgistError> {
        let key = self.api_key.as_deref().unwrap_or_default();
        let url = format!(
            "{}/models/{}:generateContent?key={key}",
            self.endpoint, self.model,
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let payload = self.execute(self.http.post(url).json(&body))?;
        self.text_at(&payload, "/candidates/0/content/parts/0/text")
    }

    fn generate_openai(&self, prompt: &str) -> Result<String, ReelgistError> {
        let key = self.api_key.as_deref().unwrap_or_default();
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let payload = self.execute(
            self.http
                .post(format!("{}/chat/completions", self.endpoint))
                .bearer_auth(key)
                .json(&body),
        )?;
        self.text_at(&payload, "/choices/0/message/content")
    }

    fn generate_claude(&self, prompt: &str) -> Result<String, ReelgistError> {
        let key = self.api_key.as_deref().unwrap_or_default();
        let body = json!({
            "model": self.model,
            "max_tokens": 4096,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let payload = self.execute(
            self.http
                .post(format!("{}/messages", self.endpoint))
                .header("x-api-key", key)
                .header("anthropic-version", "2023-06-01")
                .json(&body),
        )?;
        self.text_at(&payload, "/content/0/text")
    }

    fn generate_ollama(&self, prompt: &str) -> Result<String, ReelgistError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });

        let payload = self.execute(
            self.http
                .post(format!("{}/api/chat", self.endpoint))
                .json(&body),
        )?;
        self.text_at(&payload, "/message/content")
    }

    /// Send a request and parse the JSON reply, folding every failure mode
    /// into the provider's normalized error.
    fn execute(&self, request: RequestBuilder) -> Result<Value, ReelgistError> {
        let response = request
            .send()
            .map_err(|error| self.failure(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(self.failure(format!("HTTP {status}: {}", body.trim())));
        }

        response
            .json()
            .map_err(|error| self.failure(format!("malformed response: {error}")))
    }

    fn text_at(&self, payload: &Value, pointer: &str) -> Result<String, ReelgistError> {
        payload
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| self.failure(format!("reply carries no text at {pointer}")))
    }

    fn failure(&self, reason: String) -> ReelgistError {
        ReelgistError::Summarization {
            provider: self.provider.name(),
            reason,
        }
    }
}

/// Build the summarization prompt from the three artifact streams.
///
/// The sources are labelled explicitly so the model can distinguish what was
/// heard (transcript) from what was seen (frame annotations) and what the
/// author claimed (metadata).
pub fn build_prompt(
    transcript: &str,
    annotations: &[FrameAnnotation],
    metadata: Option<&ReelMetadata>,
) -> String {
    let metadata_json = metadata
        .and_then(|metadata| serde_json::to_string_pretty(metadata).ok())
        .unwrap_or_else(|| "{}".to_string());
    let annotations_json =
        serde_json::to_string_pretty(annotations).unwrap_or_else(|_| "[]".to_string());
    let transcript = if transcript.trim().is_empty() {
        "No transcription available."
    } else {
        transcript.trim()
    };

    format!(
        "You are an expert video content analyst. A short-form social-media video has been \
decoded into three raw data streams. Synthesize them into a single, highly detailed summary \
of the video.

### DATA STREAMS

1. METADATA (context, caption, engagement):
{metadata_json}

2. AUDIO TRANSCRIPTION (spoken words):
{transcript}

3. VISUAL ANALYSIS (frame-by-frame details):
{annotations_json}

### INSTRUCTIONS
- Correlate the visual events with the spoken audio.
- Capture the intent and tone of the video from the metadata.
- Describe exactly what happens, what is said, and the overall message.
- Do not drop small details found in the visual analysis.

### OUTPUT
Respond with a structured, very detailed narrative."
    )
}
