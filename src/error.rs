//! Error types for the sozi-export library.
//!
//! Every fatal condition of a conversion is an [`ExportError`] returned from
//! the top-level `convert_to_*` functions. A renderer that exits with a
//! non-zero status is *not* an error: the exit code is recorded in
//! [`crate::output::ExportReport`] and the frames it did produce are still
//! assembled.
//!
//! The external-tool variants carry a remediation hint so the CLI can print
//! exactly which package is missing.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the sozi-export library.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input presentation was not found at the given path.
    #[error("Presentation file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    // ── External tool errors ──────────────────────────────────────────────
    /// The executable could not be spawned because it is not installed.
    #[error("{tool} executable not found. {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// The tool ran but exited unsuccessfully.
    #[error("{tool} exited with status {status}")]
    ToolFailed { tool: String, status: String },

    /// Spawning or waiting on the tool failed for a reason other than
    /// the executable being absent.
    #[error("I/O error running {tool}: {source}")]
    ToolIo {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The renderer produced no frame images to assemble.
    #[error("No frames were rendered into '{dir}'")]
    NoFrames { dir: PathBuf },

    // ── File system errors ────────────────────────────────────────────────
    /// Could not create, read or remove the staging directory.
    #[error("Staging directory error for '{path}': {source}")]
    StagingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building the PPTX package failed.
    #[error("Failed to build presentation package: {0}")]
    Package(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// True when the error means an external program is not installed.
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, ExportError::ToolNotFound { .. })
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(e: zip::result::ZipError) -> Self {
        ExportError::Package(e.to_string())
    }
}
