//! Configuration types for presentation export.
//!
//! All conversion behaviour is controlled through [`ExportConfig`], built via
//! its [`ExportConfigBuilder`]. One struct carries the rendering geometry,
//! the per-format assembly options, the external tool settings and the
//! pluggable backends, so a run can be reproduced from its config alone.

use crate::backend::{FrameRenderer, PageJoiner, Transcoder};
use crate::error::ExportError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Renderer program used when none is configured.
pub const DEFAULT_RENDERER: &str = "phantomjs";

/// PDF joiner program used when none is configured.
pub const DEFAULT_JOINER: &str = "pdfjam";

/// Transcoders tried in order when none are configured.
pub const DEFAULT_TRANSCODERS: [&str; 2] = ["ffmpeg", "avconv"];

/// Configuration for a presentation export.
///
/// Built via [`ExportConfig::builder()`] / [`ExportConfig::builder_for()`]
/// or using [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use sozi_export::{ExportConfig, ExportFormat};
///
/// let config = ExportConfig::builder_for(ExportFormat::Video)
///     .bit_rate("4M")
///     .build()
///     .unwrap();
/// assert_eq!(config.width, 1024.0);
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Destination file (or directory when `images` is set).
    /// If None, derived from the input path; see
    /// [`crate::pipeline::destination::resolve_output_path`].
    pub output: Option<PathBuf>,

    /// Keep the raw frame images as the deliverable instead of a video.
    /// Only the video pipeline honours this flag for staging; all pipelines
    /// honour it when deriving the default output path.
    pub images: bool,

    /// Frame width in renderer units. Default: 29.7 (video: 1024).
    pub width: f64,

    /// Frame height in renderer units. Default: 21 (video: 768).
    pub height: f64,

    /// Pixels per renderer unit for PDF/PPTX frames. Default: 72.
    pub resolution: f64,

    /// PNG compression level passed to the renderer (0–100). Default: 100.
    pub png_compression: u32,

    /// Frames to include, in the renderer's list syntax. Default: "all".
    pub include: String,

    /// Frames to exclude, in the renderer's list syntax. Default: "none".
    pub exclude: String,

    /// PDF paper size as understood by the joiner. Default: "a4paper".
    pub paper: String,

    /// PDF portrait orientation. Default: false (landscape).
    pub portrait: bool,

    /// PPTX widescreen (16:9) slide size. Default: false (4:3).
    pub wide: bool,

    /// Video bit rate as understood by the transcoder. Default: "2M".
    pub bit_rate: String,

    /// Renderer executable. Default: [`DEFAULT_RENDERER`].
    pub renderer_program: PathBuf,

    /// Directory holding `export-frames.js` / `export-video.js`.
    /// If None, the directory of the running executable is used.
    pub script_dir: Option<PathBuf>,

    /// PDF joiner executable. Default: [`DEFAULT_JOINER`].
    pub joiner_program: String,

    /// Transcoder executables, tried in order. Default: [`DEFAULT_TRANSCODERS`].
    pub transcoder_programs: Vec<String>,

    /// Pre-constructed renderer. Takes precedence over `renderer_program`.
    pub renderer: Option<Arc<dyn FrameRenderer>>,

    /// Pre-constructed PDF joiner. Takes precedence over `joiner_program`.
    pub joiner: Option<Arc<dyn PageJoiner>>,

    /// Pre-constructed transcoder. Takes precedence over `transcoder_programs`.
    pub transcoder: Option<Arc<dyn Transcoder>>,

    /// Optional progress callback for stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output: None,
            images: false,
            width: 29.7,
            height: 21.0,
            resolution: 72.0,
            png_compression: 100,
            include: "all".to_string(),
            exclude: "none".to_string(),
            paper: "a4paper".to_string(),
            portrait: false,
            wide: false,
            bit_rate: "2M".to_string(),
            renderer_program: PathBuf::from(DEFAULT_RENDERER),
            script_dir: None,
            joiner_program: DEFAULT_JOINER.to_string(),
            transcoder_programs: DEFAULT_TRANSCODERS.iter().map(|s| s.to_string()).collect(),
            renderer: None,
            joiner: None,
            transcoder: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("output", &self.output)
            .field("images", &self.images)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("resolution", &self.resolution)
            .field("png_compression", &self.png_compression)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("paper", &self.paper)
            .field("portrait", &self.portrait)
            .field("wide", &self.wide)
            .field("bit_rate", &self.bit_rate)
            .field("renderer_program", &self.renderer_program)
            .field("script_dir", &self.script_dir)
            .field("joiner_program", &self.joiner_program)
            .field("transcoder_programs", &self.transcoder_programs)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn FrameRenderer>"))
            .field("joiner", &self.joiner.as_ref().map(|_| "<dyn PageJoiner>"))
            .field("transcoder", &self.transcoder.as_ref().map(|_| "<dyn Transcoder>"))
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder with the PDF/PPTX defaults.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Create a new builder with the defaults of the given format.
    ///
    /// Video frames are rendered at 1024×768 pixels; document frames at
    /// 29.7×21 units (A4 in centimetres) times the resolution.
    pub fn builder_for(format: ExportFormat) -> ExportConfigBuilder {
        let mut config = Self::default();
        let (width, height) = format.default_dimensions();
        config.width = width;
        config.height = height;
        ExportConfigBuilder { config }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = Some(path.into());
        self
    }

    pub fn images(mut self, v: bool) -> Self {
        self.config.images = v;
        self
    }

    pub fn width(mut self, w: f64) -> Self {
        self.config.width = w;
        self
    }

    pub fn height(mut self, h: f64) -> Self {
        self.config.height = h;
        self
    }

    pub fn resolution(mut self, r: f64) -> Self {
        self.config.resolution = r;
        self
    }

    pub fn png_compression(mut self, level: u32) -> Self {
        self.config.png_compression = level.min(100);
        self
    }

    pub fn include(mut self, frames: impl Into<String>) -> Self {
        self.config.include = frames.into();
        self
    }

    pub fn exclude(mut self, frames: impl Into<String>) -> Self {
        self.config.exclude = frames.into();
        self
    }

    pub fn paper(mut self, paper: impl Into<String>) -> Self {
        self.config.paper = paper.into();
        self
    }

    pub fn portrait(mut self, v: bool) -> Self {
        self.config.portrait = v;
        self
    }

    pub fn wide(mut self, v: bool) -> Self {
        self.config.wide = v;
        self
    }

    pub fn bit_rate(mut self, rate: impl Into<String>) -> Self {
        self.config.bit_rate = rate.into();
        self
    }

    pub fn renderer_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.renderer_program = program.into();
        self
    }

    pub fn script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.script_dir = Some(dir.into());
        self
    }

    pub fn joiner_program(mut self, program: impl Into<String>) -> Self {
        self.config.joiner_program = program.into();
        self
    }

    pub fn transcoder_programs<I, S>(mut self, programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.transcoder_programs = programs.into_iter().map(Into::into).collect();
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn FrameRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn joiner(mut self, joiner: Arc<dyn PageJoiner>) -> Self {
        self.config.joiner = Some(joiner);
        self
    }

    pub fn transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.config.transcoder = Some(transcoder);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        let c = &self.config;
        for (name, value) in [
            ("width", c.width),
            ("height", c.height),
            ("resolution", c.resolution),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ExportError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if c.paper.trim().is_empty() {
            return Err(ExportError::InvalidConfig("Paper size must not be empty".into()));
        }
        if c.bit_rate.trim().is_empty() {
            return Err(ExportError::InvalidConfig("Bit rate must not be empty".into()));
        }
        if c.transcoder.is_none() && c.transcoder_programs.is_empty() {
            return Err(ExportError::InvalidConfig(
                "At least one transcoder program is required".into(),
            ));
        }
        if let Some(ref out) = c.output {
            if out.as_os_str().is_empty() {
                return Err(ExportError::InvalidConfig("Output path must not be empty".into()));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The deliverable produced by a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One page per frame, joined by the PDF joiner.
    Pdf,
    /// One slide per frame, built in-process.
    Pptx,
    /// Animation steps encoded by the transcoder (or kept as images).
    Video,
}

impl ExportFormat {
    /// File extension of the default output path.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Pptx => "pptx",
            ExportFormat::Video => "ogv",
        }
    }

    /// Default `(width, height)` for this format.
    pub fn default_dimensions(self) -> (f64, f64) {
        match self {
            ExportFormat::Pdf | ExportFormat::Pptx => (29.7, 21.0),
            ExportFormat::Video => (1024.0, 768.0),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Pptx => "PPTX",
            ExportFormat::Video => "video",
        })
    }
}
