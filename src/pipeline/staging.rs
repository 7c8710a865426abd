//! Staging-directory lifecycle.
//!
//! Each conversion owns exactly one staging area. A temporary area is a
//! uniquely named [`TempDir`] that is removed recursively, whatever it
//! contains, when [`StagingArea::close`] runs or the value is dropped. When
//! the raw frames are the deliverable the output directory itself is the
//! staging area and it is never removed.

use crate::error::ExportError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const TEMP_PREFIX: &str = "sozi-export-";

/// Where the renderer writes its images.
#[derive(Debug)]
pub enum StagingArea {
    /// Fresh temporary directory, deleted at the end of the conversion.
    Temporary(TempDir),
    /// Caller-visible directory holding the deliverable frames. Kept.
    Deliverable(PathBuf),
}

impl StagingArea {
    /// Allocate a fresh, uniquely named temporary directory.
    pub fn temporary() -> Result<Self, ExportError> {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(|e| ExportError::StagingFailed {
                path: std::env::temp_dir(),
                source: e,
            })?;
        debug!("Created staging directory {}", dir.path().display());
        Ok(StagingArea::Temporary(dir))
    }

    /// Use `dir` (created if missing) as the staging area.
    pub fn deliverable(dir: &Path) -> Result<Self, ExportError> {
        std::fs::create_dir_all(dir).map_err(|e| ExportError::StagingFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        debug!("Staging frames directly in {}", dir.display());
        Ok(StagingArea::Deliverable(dir.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        match self {
            StagingArea::Temporary(dir) => dir.path(),
            StagingArea::Deliverable(dir) => dir,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, StagingArea::Temporary(_))
    }

    /// Finish with the staging area.
    ///
    /// Temporary areas are deleted with all their contents; deliverable
    /// areas are left untouched.
    pub fn close(self) -> Result<(), ExportError> {
        match self {
            StagingArea::Temporary(dir) => {
                let path = dir.path().to_path_buf();
                dir.close().map_err(|e| ExportError::StagingFailed {
                    path: path.clone(),
                    source: e,
                })?;
                debug!("Removed staging directory {}", path.display());
                Ok(())
            }
            StagingArea::Deliverable(_) => Ok(()),
        }
    }
}
