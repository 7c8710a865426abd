//! # sozi-export
//!
//! Export Sozi presentations (SVG + JS, rendered by a headless browser) to
//! PDF documents, PPTX decks and videos.
//!
//! ## Pipeline Overview
//!
//! ```text
//! presentation.sozi.html
//!  │
//!  ├─ 1. Destination  derive the output path once
//!  ├─ 2. Staging      temporary directory (or the deliverable for raw frames)
//!  ├─ 3. Render       headless renderer writes PNG frames, awaited to exit
//!  ├─ 4. Frames       list the staged PNGs in frame order
//!  ├─ 5. Assemble     pdfjam │ in-process PPTX writer │ ffmpeg/avconv
//!  └─ 6. Cleanup      staging removed only after the assembler finished
//! ```
//!
//! The renderer, the PDF joiner and the video transcoder are external
//! programs reached through the [`FrameRenderer`], [`PageJoiner`] and
//! [`Transcoder`] traits. The defaults spawn `phantomjs`, `pdfjam` and
//! `ffmpeg` (falling back to `avconv`); any of them can be swapped on the
//! [`ExportConfig`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sozi_export::{convert, ExportConfig, ExportFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExportConfig::builder_for(ExportFormat::Pdf)
//!         .paper("letterpaper")
//!         .build()?;
//!     let report = convert("talk.sozi.html", ExportFormat::Pdf, &config).await?;
//!     eprintln!("{} pages → {}", report.frame_count, report.output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sozi-export` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! sozi-export = { version = "0.5", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod tools;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    FrameRenderer, PageJoiner, PdfLayout, RenderOutcome, RenderRequest, Transcoder, VideoSettings,
};
pub use config::{ExportConfig, ExportConfigBuilder, ExportFormat};
pub use convert::{convert, convert_sync, convert_to_pdf, convert_to_pptx, convert_to_video};
pub use error::ExportError;
pub use output::{ExportReport, ExportStats};
pub use progress::{ExportProgressCallback, NoopProgressCallback, ProgressCallback};
pub use tools::{check_tools, ToolInfo};
