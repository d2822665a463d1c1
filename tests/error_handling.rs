//! Error handling integration tests.
//!
//! These verify that meaningful errors come back for the failure conditions
//! that do not need a media fixture.

use reelgist::{ReelgistError, SelectorOptions, VideoSource, extract_keyframes};

#[test]
fn open_nonexistent_file() {
    let result = VideoSource::open("this_file_does_not_exist.mp4");
    assert!(result.is_err());

    let error_message = result.err().map(|error| error.to_string()).unwrap_or_default();
    assert!(
        error_message.contains("Failed to open video stream"),
        "Error message should mention stream open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let result = VideoSource::open(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid media file");
}

#[test]
fn failed_open_leaves_no_output_directory() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("frames");

    let result = extract_keyframes("this_file_does_not_exist.mp4", SelectorOptions::new(&output));

    assert!(matches!(result, Err(ReelgistError::StreamOpen { .. })));
    assert!(!output.exists(), "no partial output directory expected");
}

#[test]
fn write_failure_names_the_frame() {
    let error = ReelgistError::KeyframeWrite {
        path: "frames/keyframe_0003_frame_000120.jpg".into(),
        frame_index: 120,
        reason: "disk full".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("frame 120"));
    assert!(message.contains("disk full"));
}
