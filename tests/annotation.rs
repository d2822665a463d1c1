//! Annotation driver tests with a scripted annotator.

use std::path::Path;

use image::{Rgb, RgbImage};
use reelgist::{
    AnnotateOptions, FrameAnnotator, ReelgistError, annotate_frames, load_annotations,
    save_annotations,
};

/// Captions every frame with its file name; fails on request.
struct ScriptedAnnotator {
    fail_on: Option<String>,
}

impl FrameAnnotator for ScriptedAnnotator {
    fn annotate(&mut self, image_path: &Path) -> Result<String, ReelgistError> {
        let name = image_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(ReelgistError::Annotation("scripted failure".to_string()));
        }
        Ok(format!("caption for {name}"))
    }
}

fn write_keyframe(dir: &Path, save_index: u64, frame_index: u64) {
    let image = RgbImage::from_pixel(8, 8, Rgb([save_index as u8 * 40, 0, 0]));
    image
        .save(dir.join(reelgist::keyframe_file_name(save_index, frame_index)))
        .expect("write keyframe");
}

#[test]
fn annotates_in_save_order_with_timestamps() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_keyframe(directory.path(), 2, 300);
    write_keyframe(directory.path(), 0, 0);
    write_keyframe(directory.path(), 1, 90);

    let options = AnnotateOptions {
        workers: 2,
        frame_rate: 30.0,
    };
    let annotations = annotate_frames(directory.path(), &options, || {
        Ok(ScriptedAnnotator { fail_on: None })
    })
    .expect("annotate");

    let indices: Vec<u64> = annotations
        .iter()
        .map(|annotation| annotation.frame_index)
        .collect();
    assert_eq!(indices, vec![0, 90, 300]);

    assert_eq!(annotations[0].timestamp, "00:00");
    assert_eq!(annotations[1].timestamp, "00:03");
    assert_eq!(annotations[2].timestamp, "00:10");
    assert!(annotations[0].caption.contains("keyframe_0000"));
}

#[test]
fn one_failed_caption_does_not_lose_the_pass() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_keyframe(directory.path(), 0, 0);
    write_keyframe(directory.path(), 1, 50);
    write_keyframe(directory.path(), 2, 100);

    let options = AnnotateOptions {
        workers: 1,
        frame_rate: 25.0,
    };
    let annotations = annotate_frames(directory.path(), &options, || {
        Ok(ScriptedAnnotator {
            fail_on: Some(reelgist::keyframe_file_name(1, 50)),
        })
    })
    .expect("annotate");

    let indices: Vec<u64> = annotations
        .iter()
        .map(|annotation| annotation.frame_index)
        .collect();
    assert_eq!(indices, vec![0, 100]);
}

#[test]
fn annotator_construction_failure_is_fatal() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_keyframe(directory.path(), 0, 0);

    let options = AnnotateOptions::default();
    let result = annotate_frames(directory.path(), &options, || {
        Err::<ScriptedAnnotator, _>(ReelgistError::Annotation("no model".to_string()))
    });

    assert!(matches!(result, Err(ReelgistError::Annotation(_))));
}

#[test]
fn non_keyframe_files_are_ignored() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_keyframe(directory.path(), 0, 0);
    std::fs::write(directory.path().join("notes.txt"), b"not a frame").expect("write");
    RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]))
        .save(directory.path().join("thumbnail.jpg"))
        .expect("write thumbnail");

    let annotations = annotate_frames(directory.path(), &AnnotateOptions::default(), || {
        Ok(ScriptedAnnotator { fail_on: None })
    })
    .expect("annotate");

    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].frame_index, 0);
}

#[test]
fn empty_frame_directory_yields_no_annotations() {
    let directory = tempfile::tempdir().expect("temp dir");
    let annotations = annotate_frames(directory.path(), &AnnotateOptions::default(), || {
        Ok(ScriptedAnnotator { fail_on: None })
    })
    .expect("annotate");
    assert!(annotations.is_empty());
}

#[test]
fn annotations_round_trip_through_json() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_keyframe(directory.path(), 0, 0);
    write_keyframe(directory.path(), 1, 42);

    let options = AnnotateOptions {
        workers: 1,
        frame_rate: 24.0,
    };
    let annotations = annotate_frames(directory.path(), &options, || {
        Ok(ScriptedAnnotator { fail_on: None })
    })
    .expect("annotate");

    let path = directory.path().join("refined_frames.json");
    save_annotations(&annotations, &path).expect("save");
    let loaded = load_annotations(&path).expect("load");
    assert_eq!(loaded, annotations);
}
