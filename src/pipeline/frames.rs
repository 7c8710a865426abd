//! Discovery and ordering of the rendered frame images.
//!
//! The renderer names each image with an embedded index (`img7.png`,
//! `frame-012.png`). Plain lexical order would put `img10.png` before
//! `img2.png`, so frames are sorted by that index; names without digits go
//! last, in name order. Gaps and duplicates are not checked.
//!
//! The video script writes `img<N>.png` only. When the raw frames are the
//! deliverable they land in a directory that may already hold other
//! pictures, so [`list_video_frames`] keeps just that naming scheme.

use crate::error::ExportError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static TRAILING_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\D*$").unwrap());
static VIDEO_FRAME_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^img\d+\.png$").unwrap());

/// A staged PNG frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub path: PathBuf,
    /// Index parsed from the file name, if any.
    pub index: Option<u64>,
}

/// Extract the frame index embedded in a file stem.
pub fn frame_index(stem: &str) -> Option<u64> {
    TRAILING_INDEX
        .captures(stem)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether `path` is named like an image of the video script's sequence.
pub fn is_video_frame(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| VIDEO_FRAME_NAME.is_match(n))
        .unwrap_or(false)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

/// List the PNG frames in `dir`, ordered by frame index.
///
/// Non-PNG entries and sub-directories are ignored. Files that carry a
/// `.png` extension but cannot be decoded as images are skipped with a
/// warning.
pub fn list_frames(dir: &Path) -> Result<Vec<Frame>, ExportError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ExportError::StagingFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut frames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ExportError::StagingFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() || !is_png(&path) {
            continue;
        }

        match image::image_dimensions(&path) {
            Ok((width, height)) => {
                let index = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(frame_index);
                debug!("Frame {} is {}x{}", path.display(), width, height);
                frames.push(Frame { path, index });
            }
            Err(e) => warn!("Skipping unreadable frame {}: {}", path.display(), e),
        }
    }

    frames.sort_by(|a, b| {
        (a.index.is_none(), a.index, &a.path).cmp(&(b.index.is_none(), b.index, &b.path))
    });
    debug!("Found {} frames in {}", frames.len(), dir.display());

    Ok(frames)
}

/// List the `img<N>.png` sequence in `dir`, ordered by frame index.
///
/// Other PNG files in the directory are ignored.
pub fn list_video_frames(dir: &Path) -> Result<Vec<Frame>, ExportError> {
    let mut frames = list_frames(dir)?;
    frames.retain(|f| is_video_frame(&f.path));
    Ok(frames)
}

/// Paths of `frames`, in order.
pub fn frame_paths(frames: &[Frame]) -> Vec<PathBuf> {
    frames.iter().map(|f| f.path.clone()).collect()
}
