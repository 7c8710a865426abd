//! Conversion entry points.
//!
//! Every pipeline has the same shape: resolve the output path, allocate the
//! staging area, run the renderer to completion, list the staged frames,
//! assemble them, and only then release the staging area. Each step is
//! awaited, so the temporary directory outlives every reader of it and the
//! returned `Result` is a definitive success or failure signal.

use crate::backend::{
    FrameRenderer, PageJoiner, PdfLayout, RenderRequest, Transcoder, VideoSettings,
};
use crate::config::{ExportConfig, ExportFormat};
use crate::error::ExportError;
use crate::output::{ExportReport, ExportStats};
use crate::pipeline::destination::resolve_output_path;
use crate::pipeline::frames::{self, Frame};
use crate::pipeline::pdf::Pdfjam;
use crate::pipeline::pptx;
use crate::pipeline::render::ExternalRenderer;
use crate::pipeline::staging::StagingArea;
use crate::pipeline::video::FfmpegTranscoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a presentation to a PDF document, one page per frame.
pub async fn convert_to_pdf(
    input: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    convert(input, ExportFormat::Pdf, config).await
}

/// Convert a presentation to a PPTX deck, one slide per frame.
pub async fn convert_to_pptx(
    input: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    convert(input, ExportFormat::Pptx, config).await
}

/// Convert a presentation to a video, or to a directory of raw animation
/// frames when `config.images` is set.
pub async fn convert_to_video(
    input: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    convert(input, ExportFormat::Video, config).await
}

/// Convert a presentation to `format`.
///
/// # Errors
/// - Input file not found
/// - A required external tool is not installed ([`ExportError::ToolNotFound`])
/// - The joiner or transcoder exited unsuccessfully
/// - No frames were rendered (PDF and encoded video)
/// - The PPTX package or staging directory could not be written
///
/// A renderer that exits non-zero is not an error by itself; see
/// [`ExportReport::renderer_exit_code`].
pub async fn convert(
    input: impl AsRef<Path>,
    format: ExportFormat,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    if !input.exists() {
        return Err(ExportError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    // ── Step 1: Resolve output ───────────────────────────────────────────
    let output = resolve_output_path(input, config, format);
    info!("Converting {} to {}", input.display(), output.display());
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_start(input, &output, format);
    }

    // ── Step 2: Staging area ─────────────────────────────────────────────
    let images_only = format == ExportFormat::Video && config.images;
    let staging = if images_only {
        StagingArea::deliverable(&output)?
    } else {
        StagingArea::temporary()?
    };

    // ── Step 3: Render frames ────────────────────────────────────────────
    let request = match format {
        ExportFormat::Video => RenderRequest::video(input, staging.path(), config),
        ExportFormat::Pdf | ExportFormat::Pptx => {
            RenderRequest::frames(input, staging.path(), config)
        }
    };
    let render_start = Instant::now();
    let outcome = resolve_renderer(config).render(&request).await?;
    let staged = list_staged_frames(staging.path(), format).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} frames in {}ms", staged.len(), render_duration_ms);
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(staged.len(), outcome.exit_code);
    }

    // ── Step 4: Assemble ─────────────────────────────────────────────────
    let assemble_start = Instant::now();
    let assembled = if images_only {
        info!("Keeping {} frames in {}", staged.len(), output.display());
        Ok(output.clone())
    } else {
        if let Some(ref cb) = config.progress_callback {
            cb.on_assemble_start(format, staged.len());
        }
        assemble(format, &staged, staging.path(), &output, config).await
    };
    let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;

    // ── Step 5: Release staging (after the assembler finished) ───────────
    let closed = staging.close();
    let written = assembled?;
    closed?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_export_complete(&written);
    }

    let stats = ExportStats {
        render_duration_ms,
        assemble_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Export complete: {} frames → {} in {}ms",
        staged.len(),
        written.display(),
        stats.total_duration_ms
    );

    Ok(ExportReport {
        format,
        input: input.to_path_buf(),
        output: written,
        frame_count: staged.len(),
        images_only,
        renderer_exit_code: outcome.exit_code,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    format: ExportFormat,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, format, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn resolve_renderer(config: &ExportConfig) -> Arc<dyn FrameRenderer> {
    match config.renderer {
        Some(ref renderer) => Arc::clone(renderer),
        None => Arc::new(ExternalRenderer::from_config(config)),
    }
}

fn resolve_joiner(config: &ExportConfig) -> Arc<dyn PageJoiner> {
    match config.joiner {
        Some(ref joiner) => Arc::clone(joiner),
        None => Arc::new(Pdfjam::new(config.joiner_program.clone())),
    }
}

fn resolve_transcoder(config: &ExportConfig) -> Arc<dyn Transcoder> {
    match config.transcoder {
        Some(ref transcoder) => Arc::clone(transcoder),
        None => Arc::new(FfmpegTranscoder::new(config.transcoder_programs.clone())),
    }
}

/// List the staged frames on the blocking pool (directory scan plus PNG
/// header reads). Video staging may be a shared directory, so only the
/// `img<N>.png` sequence counts there.
async fn list_staged_frames(dir: &Path, format: ExportFormat) -> Result<Vec<Frame>, ExportError> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || match format {
        ExportFormat::Video => frames::list_video_frames(&dir),
        ExportFormat::Pdf | ExportFormat::Pptx => frames::list_frames(&dir),
    })
    .await
    .map_err(|e| ExportError::Internal(format!("Frame listing task panicked: {}", e)))?
}

/// Hand the staged frames to the format's assembler and wait for it.
async fn assemble(
    format: ExportFormat,
    staged: &[Frame],
    staging_dir: &Path,
    output: &Path,
    config: &ExportConfig,
) -> Result<PathBuf, ExportError> {
    let paths = frames::frame_paths(staged);
    debug!("Assembling {} from {:?}", format, paths);

    match format {
        ExportFormat::Pdf => {
            if paths.is_empty() {
                return Err(ExportError::NoFrames {
                    dir: staging_dir.to_path_buf(),
                });
            }
            resolve_joiner(config)
                .join(&paths, &PdfLayout::from(config), output)
                .await
        }
        ExportFormat::Pptx => pptx::assemble_pptx(paths, config.wide, output).await,
        ExportFormat::Video => {
            if paths.is_empty() {
                return Err(ExportError::NoFrames {
                    dir: staging_dir.to_path_buf(),
                });
            }
            resolve_transcoder(config)
                .transcode(staging_dir, &VideoSettings::from(config), output)
                .await
        }
    }
}
