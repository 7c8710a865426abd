//! Pipeline stages for presentation export.
//!
//! Each submodule implements exactly one step. The external tools sit behind
//! the traits in [`crate::backend`], so stages can be exercised with fakes.
//!
//! ## Data Flow
//!
//! ```text
//! destination ──▶ staging ──▶ render ──▶ frames ──▶ pdf | pptx | video
//!  (out path)     (tempdir)  (renderer)  (sorted)   (pdfjam | zip | ffmpeg)
//! ```
//!
//! 1. [`destination`] — derive the output path once, before anything runs
//! 2. [`staging`]     — temporary or deliverable directory for the images
//! 3. [`render`]      — run the headless renderer and wait for it
//! 4. [`frames`]      — list the staged PNGs in frame order
//! 5. [`pdf`], [`pptx`], [`video`] — format-specific assembly

pub mod destination;
pub mod frames;
pub mod pdf;
pub mod pptx;
pub mod render;
pub mod staging;
pub mod video;
