//! Workspace layout and cleanup tests.

use std::fs;

use reelgist::Workspace;

#[test]
fn layout_paths_are_rooted() {
    let workspace = Workspace::new("/tmp/demo");
    assert_eq!(
        workspace.video_path(),
        std::path::Path::new("/tmp/demo/ingestion/video.mp4")
    );
    assert_eq!(
        workspace.annotations_path(),
        std::path::Path::new("/tmp/demo/artifacts/refined_frames.json")
    );
}

#[test]
fn ensure_layout_creates_directories() {
    let directory = tempfile::tempdir().expect("temp dir");
    let workspace = Workspace::new(directory.path());

    workspace.ensure_layout().expect("ensure layout");

    assert!(directory.path().join("ingestion").is_dir());
    assert!(directory.path().join("artifacts").is_dir());

    // Idempotent.
    workspace.ensure_layout().expect("ensure layout again");
}

#[test]
fn clear_removes_run_artifacts_only() {
    let directory = tempfile::tempdir().expect("temp dir");
    let workspace = Workspace::new(directory.path());
    workspace.ensure_layout().expect("ensure layout");

    fs::write(workspace.video_path(), b"video").expect("write video");
    fs::write(workspace.transcript_path(), b"transcript").expect("write transcript");
    fs::create_dir_all(workspace.frames_dir()).expect("frames dir");
    fs::write(workspace.frames_dir().join("keyframe_0000_frame_000000.jpg"), b"jpg")
        .expect("write frame");

    // An unrelated file the pipeline knows nothing about.
    let unrelated = directory.path().join("notes.txt");
    fs::write(&unrelated, b"keep me").expect("write unrelated");

    workspace.clear().expect("clear");

    assert!(!workspace.video_path().exists());
    assert!(!workspace.transcript_path().exists());
    assert!(!workspace.frames_dir().exists());
    assert!(unrelated.exists(), "unrelated files must survive clear()");
}

#[test]
fn clear_on_pristine_workspace_is_not_an_error() {
    let directory = tempfile::tempdir().expect("temp dir");
    Workspace::new(directory.path()).clear().expect("clear");
}
