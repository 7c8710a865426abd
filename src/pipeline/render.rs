//! Frame rendering through the external headless-browser renderer.
//!
//! The renderer is a black box driven by an export script:
//!
//! ```text
//! phantomjs export-frames.js <input> <staging> <width×res> <height×res> <png> <include> <exclude>
//! phantomjs export-video.js  <input> <staging> <width>     <height>     <png>
//! ```
//!
//! These positional arguments are the renderer's whole interface, so they
//! are produced exactly as the scripts expect them. Its stdout/stderr are
//! streamed live and its exit status is recorded but not interpreted: a
//! renderer that fails half-way still leaves usable frames behind.

use crate::backend::{FrameRenderer, RenderMode, RenderOutcome, RenderRequest};
use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::tools::{is_not_found, ToolCommand, RENDERER_HINT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Script used for PDF and PPTX frames.
pub const FRAMES_SCRIPT: &str = "export-frames.js";

/// Script used for the video image sequence.
pub const VIDEO_SCRIPT: &str = "export-video.js";

/// Format a dimension the way the export scripts receive it: shortest
/// round-trip decimal, no trailing `.0` for whole numbers.
pub fn format_dimension(value: f64) -> String {
    format!("{}", value)
}

/// Positional arguments following the script path.
pub fn render_args(request: &RenderRequest) -> Vec<String> {
    let mut args = vec![
        request.input.to_string_lossy().to_string(),
        request.staging_dir.to_string_lossy().to_string(),
    ];
    match &request.mode {
        RenderMode::Frames {
            width,
            height,
            png_compression,
            include,
            exclude,
        } => {
            args.push(format_dimension(*width));
            args.push(format_dimension(*height));
            args.push(png_compression.to_string());
            args.push(include.clone());
            args.push(exclude.clone());
        }
        RenderMode::Video {
            width,
            height,
            png_compression,
        } => {
            args.push(format_dimension(*width));
            args.push(format_dimension(*height));
            args.push(png_compression.to_string());
        }
    }
    args
}

/// Directory searched for the export scripts when none is configured:
/// the directory of the running executable, else the working directory.
pub fn default_script_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Renderer backed by an external program running an export script.
#[derive(Debug, Clone)]
pub struct ExternalRenderer {
    program: PathBuf,
    script_dir: PathBuf,
}

impl ExternalRenderer {
    pub fn new(program: impl Into<PathBuf>, script_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script_dir: script_dir.into(),
        }
    }

    /// Build the renderer described by `config`.
    pub fn from_config(config: &ExportConfig) -> Self {
        let script_dir = config
            .script_dir
            .clone()
            .unwrap_or_else(default_script_dir);
        Self::new(config.renderer_program.clone(), script_dir)
    }

    /// Full path of the script for `mode`.
    pub fn script_for(&self, mode: &RenderMode) -> PathBuf {
        let name = match mode {
            RenderMode::Frames { .. } => FRAMES_SCRIPT,
            RenderMode::Video { .. } => VIDEO_SCRIPT,
        };
        self.script_dir.join(name)
    }

    /// The complete command line for `request`.
    pub fn command(&self, request: &RenderRequest) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.arg(self.script_for(&request.mode).to_string_lossy().to_string())
            .args(render_args(request));
        cmd
    }
}

#[async_trait]
impl FrameRenderer for ExternalRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutcome, ExportError> {
        let cmd = self.command(request);
        let tool = cmd.name();
        info!(
            "Rendering {} into {}",
            request.input.display(),
            request.staging_dir.display()
        );

        let status = cmd.status().await.map_err(|e| {
            if is_not_found(&e) {
                ExportError::ToolNotFound {
                    tool: tool.clone(),
                    hint: RENDERER_HINT.to_string(),
                }
            } else {
                ExportError::ToolIo {
                    tool: tool.clone(),
                    source: e,
                }
            }
        })?;

        let outcome = RenderOutcome {
            exit_code: status.code(),
        };
        if !outcome.success() {
            warn!("{} exited with {}; assembling the frames it produced", tool, status);
        }
        Ok(outcome)
    }
}
