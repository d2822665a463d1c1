//! On-disk pipeline workspace.
//!
//! Pipeline stages exchange artifacts through a fixed directory layout
//! rather than in-process handles, so every stage can be inspected or
//! re-run by hand:
//!
//! ```text
//! <root>/
//!   ingestion/
//!     video.mp4          downloaded reel
//!     audio.wav          extracted audio track
//!     metadata.json      post metadata
//!   artifacts/
//!     video_frames/      selected keyframe images
//!     transcription.txt  audio transcript
//!     refined_frames.json per-frame annotations
//!     summary.txt        final narrative summary
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ReelgistError;

/// Fixed file layout shared by all pipeline stages.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a workspace rooted at `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the workspace.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the downloaded reel video.
    pub fn video_path(&self) -> PathBuf {
        self.root.join("ingestion").join("video.mp4")
    }

    /// Path of the extracted audio track.
    pub fn audio_path(&self) -> PathBuf {
        self.root.join("ingestion").join("audio.wav")
    }

    /// Path of the post metadata record.
    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("ingestion").join("metadata.json")
    }

    /// Directory receiving selected keyframe images.
    pub fn frames_dir(&self) -> PathBuf {
        self.root.join("artifacts").join("video_frames")
    }

    /// Path of the audio transcript.
    pub fn transcript_path(&self) -> PathBuf {
        self.root.join("artifacts").join("transcription.txt")
    }

    /// Path of the per-frame annotation records.
    pub fn annotations_path(&self) -> PathBuf {
        self.root.join("artifacts").join("refined_frames.json")
    }

    /// Path of the final narrative summary.
    pub fn summary_path(&self) -> PathBuf {
        self.root.join("artifacts").join("summary.txt")
    }

    /// Create the `ingestion/` and `artifacts/` directories if absent.
    pub fn ensure_layout(&self) -> Result<(), ReelgistError> {
        fs::create_dir_all(self.root.join("ingestion"))?;
        fs::create_dir_all(self.root.join("artifacts"))?;
        Ok(())
    }

    /// Remove the artifacts of a previous run.
    ///
    /// Only the known per-run files and the keyframe directory are removed;
    /// anything else under the root is left alone. Missing entries are not
    /// an error.
    pub fn clear(&self) -> Result<(), ReelgistError> {
        let files = [
            self.video_path(),
            self.audio_path(),
            self.metadata_path(),
            self.transcript_path(),
            self.annotations_path(),
            self.summary_path(),
        ];

        for path in files {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("Removed {}", path.display()),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => return Err(error.into()),
            }
        }

        let frames = self.frames_dir();
        match fs::remove_dir_all(&frames) {
            Ok(()) => log::debug!("Removed {}", frames.display()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }

        Ok(())
    }
}
