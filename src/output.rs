//! Result types returned by a finished export.

use crate::config::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of one conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub format: ExportFormat,
    pub input: PathBuf,
    /// The deliverable: a file, or a directory when `images_only` is set.
    pub output: PathBuf,
    /// PNG frames found in the staging directory after rendering.
    pub frame_count: usize,
    /// True when the raw frames were kept instead of being encoded.
    pub images_only: bool,
    /// Renderer exit code (None if killed by a signal).
    pub renderer_exit_code: Option<i32>,
    pub stats: ExportStats,
}

/// Timing of one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportStats {
    pub render_duration_ms: u64,
    pub assemble_duration_ms: u64,
    pub total_duration_ms: u64,
}
