//! Capability traits for the external collaborators.
//!
//! Orchestration in [`crate::convert`] only talks to these traits. The
//! default implementations spawn the real tools (see
//! [`crate::pipeline::render::ExternalRenderer`],
//! [`crate::pipeline::pdf::Pdfjam`] and
//! [`crate::pipeline::video::FfmpegTranscoder`]); tests and embedders can
//! inject their own through [`crate::config::ExportConfigBuilder`].

use crate::config::ExportConfig;
use crate::error::ExportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Frame rate of the encoded video. The video export script emits one image
/// per 1/50 s of animation.
pub const VIDEO_FRAME_RATE: u32 = 50;

/// What the renderer is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderMode {
    /// One image per presentation frame (PDF and PPTX pipelines).
    /// Dimensions are already multiplied by the resolution.
    Frames {
        width: f64,
        height: f64,
        png_compression: u32,
        include: String,
        exclude: String,
    },
    /// One image per animation step, named `img<N>.png` (video pipeline).
    Video {
        width: f64,
        height: f64,
        png_compression: u32,
    },
}

/// A single renderer invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub input: PathBuf,
    pub staging_dir: PathBuf,
    pub mode: RenderMode,
}

impl RenderRequest {
    /// Request one image per frame, scaled by `config.resolution`.
    pub fn frames(input: &Path, staging_dir: &Path, config: &ExportConfig) -> Self {
        Self {
            input: input.to_path_buf(),
            staging_dir: staging_dir.to_path_buf(),
            mode: RenderMode::Frames {
                width: config.width * config.resolution,
                height: config.height * config.resolution,
                png_compression: config.png_compression,
                include: config.include.clone(),
                exclude: config.exclude.clone(),
            },
        }
    }

    /// Request the animation image sequence at `config.width × config.height`.
    pub fn video(input: &Path, staging_dir: &Path, config: &ExportConfig) -> Self {
        Self {
            input: input.to_path_buf(),
            staging_dir: staging_dir.to_path_buf(),
            mode: RenderMode::Video {
                width: config.width,
                height: config.height,
                png_compression: config.png_compression,
            },
        }
    }
}

/// How the renderer process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderOutcome {
    /// Exit code, or None when terminated by a signal.
    pub exit_code: Option<i32>,
}

impl RenderOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Page layout handed to the PDF joiner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfLayout {
    pub paper: String,
    pub portrait: bool,
}

impl From<&ExportConfig> for PdfLayout {
    fn from(config: &ExportConfig) -> Self {
        Self {
            paper: config.paper.clone(),
            portrait: config.portrait,
        }
    }
}

/// Encoding settings handed to the transcoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSettings {
    pub frame_rate: u32,
    pub bit_rate: String,
}

impl From<&ExportConfig> for VideoSettings {
    fn from(config: &ExportConfig) -> Self {
        Self {
            frame_rate: VIDEO_FRAME_RATE,
            bit_rate: config.bit_rate.clone(),
        }
    }
}

/// Renders a presentation into PNG images inside a staging directory.
#[async_trait]
pub trait FrameRenderer: Send + Sync {
    /// Run the renderer to completion.
    ///
    /// A renderer that starts but exits unsuccessfully is reported through
    /// [`RenderOutcome`], not as an error.
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutcome, ExportError>;
}

/// Joins one image per page into a PDF document.
#[async_trait]
pub trait PageJoiner: Send + Sync {
    /// Join `frames` (in order) into `output` and return the written path.
    async fn join(
        &self,
        frames: &[PathBuf],
        layout: &PdfLayout,
        output: &Path,
    ) -> Result<PathBuf, ExportError>;
}

/// Encodes the `img%d.png` sequence of a staging directory into a video.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Encode the sequence found in `staging_dir` into `output` and return
    /// the written path.
    async fn transcode(
        &self,
        staging_dir: &Path,
        settings: &VideoSettings,
        output: &Path,
    ) -> Result<PathBuf, ExportError>;
}
