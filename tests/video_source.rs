//! Decoding integration tests against a real media fixture.
//!
//! These only run when `tests/fixtures/sample_video.mp4` is present; keeping
//! binary fixtures out of the repository keeps the crate small.

use std::path::Path;

use reelgist::{FrameSource, SelectorOptions, VideoSource, extract_keyframes};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn decodes_frames_sequentially() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("open");
    assert!(source.frame_rate() > 0.0, "fixture should report a frame rate");

    let mut decoded = 0;
    while let Some(frame) = source.next_frame() {
        let frame = frame.expect("decode");
        assert_eq!(frame.width(), source.width());
        assert_eq!(frame.height(), source.height());
        decoded += 1;
        if decoded >= 30 {
            break;
        }
    }
    assert!(decoded > 0, "expected at least one decoded frame");
}

#[test]
fn extraction_on_fixture_is_deterministic() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let pairs = |directory: &Path| {
        let report =
            extract_keyframes(path, SelectorOptions::new(directory)).expect("extract");
        report
            .keyframes
            .iter()
            .map(|keyframe| (keyframe.save_index, keyframe.frame_index))
            .collect::<Vec<_>>()
    };

    let first_dir = tempfile::tempdir().expect("temp dir");
    let second_dir = tempfile::tempdir().expect("temp dir");

    let first = pairs(first_dir.path());
    let second = pairs(second_dir.path());

    assert!(!first.is_empty(), "fixture should yield at least frame 0");
    assert_eq!(first[0], (0, 0), "frame 0 is always keyframe 0");
    assert_eq!(first, second);
}
