//! Summarizer configuration and prompt-building tests.
//!
//! No provider is contacted here; generation itself is exercised manually
//! against live endpoints.

use reelgist::{
    FrameAnnotation, Provider, ReelMetadata, ReelgistError, Summarizer, SummarizerOptions,
    build_prompt,
};

#[test]
fn keyed_providers_refuse_to_construct_without_a_key() {
    for provider in [Provider::Gemini, Provider::OpenAi, Provider::Claude] {
        let result = Summarizer::new(SummarizerOptions::new(provider));
        match result {
            Err(ReelgistError::Summarization { provider: name, reason }) => {
                assert_eq!(name, provider.name());
                assert!(reason.contains("API key"), "unexpected reason: {reason}");
            }
            _ => panic!("{} should require an API key", provider.name()),
        }
    }
}

#[test]
fn ollama_constructs_without_a_key() {
    let summarizer =
        Summarizer::new(SummarizerOptions::new(Provider::Ollama)).expect("construct");
    assert_eq!(summarizer.provider(), Provider::Ollama);
}

#[test]
fn provider_names_are_stable() {
    assert_eq!(Provider::Gemini.name(), "gemini");
    assert_eq!(Provider::OpenAi.name(), "openai");
    assert_eq!(Provider::Claude.name(), "claude");
    assert_eq!(Provider::Ollama.name(), "ollama");
}

#[test]
fn prompt_labels_all_three_streams() {
    let annotations = vec![FrameAnnotation {
        frame_file: "keyframe_0000_frame_000000.jpg".to_string(),
        frame_index: 0,
        timestamp: "00:00".to_string(),
        caption: "a person holding a mechanical switch".to_string(),
    }];
    let metadata = ReelMetadata {
        caption: Some("Thocky goodness!".to_string()),
        likes: Some(10),
        views: None,
        date: None,
        shortcode: "AbC123".to_string(),
        video_url: None,
    };

    let prompt = build_prompt("First, lube the switches.", &annotations, Some(&metadata));

    assert!(prompt.contains("METADATA"));
    assert!(prompt.contains("AUDIO TRANSCRIPTION"));
    assert!(prompt.contains("VISUAL ANALYSIS"));
    assert!(prompt.contains("Thocky goodness!"));
    assert!(prompt.contains("First, lube the switches."));
    assert!(prompt.contains("a person holding a mechanical switch"));
}

#[test]
fn prompt_handles_missing_inputs() {
    let prompt = build_prompt("   ", &[], None);
    assert!(prompt.contains("No transcription available."));
    assert!(prompt.contains("{}"));
    assert!(prompt.contains("[]"));
}
