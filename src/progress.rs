//! Progress-callback trait for export stage events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves from rendering to assembly.
//!
//! The renderer and the assembling tools write their own output straight to
//! the inherited terminal streams, so events are coarse: one per stage, not
//! one per frame.
//!
//! # Example
//!
//! ```rust
//! use sozi_export::{ExportConfig, ExportProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FrameCounter {
//!     frames: AtomicUsize,
//! }
//!
//! impl ExportProgressCallback for FrameCounter {
//!     fn on_render_complete(&self, frame_count: usize, _exit_code: Option<i32>) {
//!         self.frames.store(frame_count, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(FrameCounter { frames: AtomicUsize::new(0) });
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::config::ExportFormat;
use std::path::Path;
use std::sync::Arc;

/// Called by the export pipeline at each stage boundary.
///
/// Implementations must be `Send + Sync`; the pipeline runs on a tokio
/// runtime and may call from any worker thread. All methods have default
/// no-op implementations so callers only override what they care about.
pub trait ExportProgressCallback: Send + Sync {
    /// Called once the output path is resolved, before the renderer starts.
    fn on_export_start(&self, input: &Path, output: &Path, format: ExportFormat) {
        let _ = (input, output, format);
    }

    /// Called after the renderer process exited.
    ///
    /// # Arguments
    /// * `frame_count` — PNG frames found in the staging directory
    /// * `exit_code`   — renderer exit code (None if killed by a signal)
    fn on_render_complete(&self, frame_count: usize, exit_code: Option<i32>) {
        let _ = (frame_count, exit_code);
    }

    /// Called just before the frames are handed to the assembler.
    fn on_assemble_start(&self, format: ExportFormat, frame_count: usize) {
        let _ = (format, frame_count);
    }

    /// Called once the deliverable is written (or the frames are kept).
    fn on_export_complete(&self, output: &Path) {
        let _ = output;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;
