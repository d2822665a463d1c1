use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use reelgist::{
    FfmpegLogLevel, OllamaVisionAnnotator, Pipeline, Provider, SelectorOptions, Summarizer,
    SummarizerOptions, WhisperCommand, Workspace, extract_keyframes,
};

const CLI_AFTER_HELP: &str = "Examples:\n  reelgist run https://www.instagram.com/reel/DRH9x20DB8H/ --provider ollama\n  reelgist extract ingestion/video.mp4 --out frames --histogram-threshold 0.5\n  reelgist clean --workspace .";

#[derive(Debug, Parser)]
#[command(
    name = "reelgist",
    version,
    about = "Distill social-media reels into transcripts, keyframes, and summaries",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download a reel and run the full pipeline.
    #[command(
        about = "Download and summarize a reel",
        after_help = "Examples:\n  reelgist run <url> --provider ollama --model llama3\n  GEMINI_API_KEY=... reelgist run <url> --provider gemini"
    )]
    Run {
        /// Post or reel URL.
        url: String,

        /// Workspace directory for downloads and artifacts.
        #[arg(long, default_value = ".")]
        workspace: PathBuf,

        /// Summarization provider: gemini | openai | claude | ollama.
        #[arg(long, default_value = "ollama")]
        provider: String,

        /// Summarization model (provider default when omitted).
        #[arg(long)]
        model: Option<String>,

        /// Whisper-compatible transcription command.
        #[arg(long, default_value = "whisper")]
        whisper_program: String,

        /// Whisper model size or checkpoint.
        #[arg(long, default_value = "base")]
        whisper_model: String,

        /// Spoken language hint for transcription.
        #[arg(long)]
        language: Option<String>,

        /// Vision model used to caption keyframes.
        #[arg(long, default_value = "llava")]
        annotator_model: String,

        /// Annotation worker threads.
        #[arg(long, default_value_t = 2)]
        workers: usize,

        /// Minimum histogram divergence that triggers a keyframe save.
        #[arg(long, default_value_t = reelgist::selector::DEFAULT_HISTOGRAM_THRESHOLD)]
        histogram_threshold: f64,

        /// Structural-similarity score below which a save triggers.
        #[arg(long, default_value_t = reelgist::selector::DEFAULT_STRUCTURAL_THRESHOLD)]
        structural_threshold: f64,

        /// Minimum number of frames between two saves.
        #[arg(long, default_value_t = reelgist::selector::DEFAULT_MIN_FRAME_INTERVAL)]
        min_interval: u64,
    },

    /// Select keyframes from a local video without the rest of the pipeline.
    #[command(
        about = "Extract keyframes only",
        after_help = "Examples:\n  reelgist extract input.mp4 --out frames\n  reelgist extract input.mp4 --out frames --min-interval 15 --json"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,

        /// Output directory for keyframe images.
        #[arg(long, default_value = "artifacts/video_frames")]
        out: PathBuf,

        /// Minimum histogram divergence that triggers a save.
        #[arg(long, default_value_t = reelgist::selector::DEFAULT_HISTOGRAM_THRESHOLD)]
        histogram_threshold: f64,

        /// Structural-similarity score below which a save triggers.
        #[arg(long, default_value_t = reelgist::selector::DEFAULT_STRUCTURAL_THRESHOLD)]
        structural_threshold: f64,

        /// Minimum number of frames between two saves.
        #[arg(long, default_value_t = reelgist::selector::DEFAULT_MIN_FRAME_INTERVAL)]
        min_interval: u64,

        /// Print the report as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Remove the artifacts of a previous run from the workspace.
    #[command(about = "Clear workspace artifacts")]
    Clean {
        /// Workspace directory.
        #[arg(long, default_value = ".")]
        workspace: PathBuf,
    },
}

/// Read the provider's API key from its conventional environment variable.
fn api_key_from_env(provider: Provider) -> Option<String> {
    let variable = match provider {
        Provider::Gemini => "GEMINI_API_KEY",
        Provider::OpenAi => "OPENAI_API_KEY",
        Provider::Claude => "ANTHROPIC_API_KEY",
        Provider::Ollama => return None,
    };
    std::env::var(variable).ok()
}

fn ollama_endpoint_from_env() -> String {
    std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string())
}

fn stage_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.global.verbose { "debug" } else { "info" },
    ))
    .init();

    if let Some(level) = cli.global.log_level {
        reelgist::set_ffmpeg_log_level(level);
    }

    match cli.command {
        Commands::Run {
            url,
            workspace,
            provider,
            model,
            whisper_program,
            whisper_model,
            language,
            annotator_model,
            workers,
            histogram_threshold,
            structural_threshold,
            min_interval,
        } => {
            let provider: Provider = provider.parse()?;

            let mut summarizer_options = SummarizerOptions::new(provider);
            if let Some(model) = model {
                summarizer_options = summarizer_options.model(model);
            }
            if let Some(key) = api_key_from_env(provider) {
                summarizer_options = summarizer_options.api_key(key);
            }
            if provider == Provider::Ollama {
                summarizer_options = summarizer_options.endpoint(ollama_endpoint_from_env());
            }
            let summarizer = Summarizer::new(summarizer_options)?;

            let workspace = Workspace::new(workspace);
            let selector_options = SelectorOptions::new(workspace.frames_dir())
                .histogram_threshold(histogram_threshold)
                .structural_threshold(structural_threshold)
                .min_frame_interval(min_interval);

            let mut transcriber = WhisperCommand::new()
                .program(whisper_program)
                .model(whisper_model);
            if let Some(language) = language {
                transcriber = transcriber.language(language);
            }

            let annotator_endpoint = ollama_endpoint_from_env();
            let pipeline = Pipeline::new(
                workspace.clone(),
                selector_options,
                Box::new(transcriber),
                summarizer,
            )
            .with_annotator_workers(workers);

            let report = pipeline.run(&url, || {
                OllamaVisionAnnotator::new(annotator_endpoint.clone(), annotator_model.clone())
            })?;

            eprintln!(
                "{} {} keyframes, {} decoded frames, {} dropped",
                "done:".green().bold(),
                report.extraction.keyframes.len(),
                report.extraction.frames_decoded,
                report.extraction.frames_dropped,
            );
            eprintln!(
                "{} {}",
                "summary:".green().bold(),
                workspace.summary_path().display(),
            );
            println!("{}", report.summary);
        }

        Commands::Extract {
            input,
            out,
            histogram_threshold,
            structural_threshold,
            min_interval,
            json,
        } => {
            let options = SelectorOptions::new(&out)
                .histogram_threshold(histogram_threshold)
                .structural_threshold(structural_threshold)
                .min_frame_interval(min_interval);

            let spinner = stage_spinner(&format!("scanning {}", input.display()));
            let report = extract_keyframes(&input, options);
            spinner.finish_and_clear();
            let report = report?;

            if json {
                let payload = json!({
                    "frames_decoded": report.frames_decoded,
                    "frames_dropped": report.frames_dropped,
                    "keyframes": report.keyframes.iter().map(|keyframe| json!({
                        "save_index": keyframe.save_index,
                        "frame_index": keyframe.frame_index,
                        "reason": format!("{:?}", keyframe.reason),
                        "path": keyframe.path.display().to_string(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for keyframe in &report.keyframes {
                    println!(
                        "{:>4}  frame {:>6}  {}",
                        keyframe.save_index,
                        keyframe.frame_index,
                        keyframe.path.display(),
                    );
                }
                eprintln!(
                    "{} saved {} of {} decoded frames ({} dropped) to {}",
                    "done:".green().bold(),
                    report.keyframes.len(),
                    report.frames_decoded,
                    report.frames_dropped,
                    out.display(),
                );
            }
        }

        Commands::Clean { workspace } => {
            Workspace::new(&workspace).clear()?;
            eprintln!(
                "{} cleared workspace artifacts under {}",
                "done:".green().bold(),
                workspace.display(),
            );
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use reelgist::Provider;

    use super::api_key_from_env;

    #[test]
    fn ollama_needs_no_key() {
        assert!(api_key_from_env(Provider::Ollama).is_none());
    }

    #[test]
    fn provider_parsing_accepts_aliases() {
        assert_eq!("anthropic".parse::<Provider>().ok(), Some(Provider::Claude));
        assert_eq!("chatgpt".parse::<Provider>().ok(), Some(Provider::OpenAi));
        assert!("bard".parse::<Provider>().is_err());
    }
}
