//! Integration tests for the export pipelines.
//!
//! The renderer is replaced by a fake that writes real PNG files into the
//! staging directory, so frame listing, ordering, cleanup and the PPTX
//! writer run for real. PDF joining and video encoding go through recording
//! fakes, or (unix only) through shell scripts standing in for pdfjam and
//! ffmpeg.

use async_trait::async_trait;
use image::RgbaImage;
use sozi_export::backend::RenderMode;
use sozi_export::{
    convert, convert_sync, convert_to_pdf, convert_to_pptx, convert_to_video, ExportConfig,
    ExportError, ExportFormat, ExportProgressCallback, FrameRenderer, PageJoiner, PdfLayout,
    RenderOutcome, RenderRequest, Transcoder, VideoSettings,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Renderer stand-in: writes `frames` PNGs named the way the export scripts
/// name them and records every request.
struct FakeRenderer {
    frames: usize,
    exit_code: Option<i32>,
    requests: Mutex<Vec<RenderRequest>>,
}

impl FakeRenderer {
    fn new(frames: usize) -> Arc<Self> {
        Self::with_exit_code(frames, Some(0))
    }

    fn with_exit_code(frames: usize, exit_code: Option<i32>) -> Arc<Self> {
        Arc::new(Self {
            frames,
            exit_code,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn staging_dirs(&self) -> Vec<PathBuf> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.staging_dir.clone())
            .collect()
    }
}

#[async_trait]
impl FrameRenderer for FakeRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutcome, ExportError> {
        self.requests.lock().unwrap().push(request.clone());
        for i in 1..=self.frames {
            let name = match request.mode {
                RenderMode::Frames { .. } => format!("frame-{i}.png"),
                RenderMode::Video { .. } => format!("img{i}.png"),
            };
            RgbaImage::from_pixel(8, 6, image::Rgba([i as u8, 0, 0, 255]))
                .save(request.staging_dir.join(name))
                .unwrap();
        }
        Ok(RenderOutcome {
            exit_code: self.exit_code,
        })
    }
}

/// Joiner stand-in: records the page list and writes a placeholder file.
#[derive(Default)]
struct RecordingJoiner {
    calls: Mutex<Vec<(Vec<PathBuf>, PdfLayout)>>,
}

#[async_trait]
impl PageJoiner for RecordingJoiner {
    async fn join(
        &self,
        frames: &[PathBuf],
        layout: &PdfLayout,
        output: &Path,
    ) -> Result<PathBuf, ExportError> {
        // Frames must still be on disk while the joiner runs.
        assert!(frames.iter().all(|f| f.exists()), "staged frames vanished");
        self.calls
            .lock()
            .unwrap()
            .push((frames.to_vec(), layout.clone()));
        std::fs::write(output, b"%PDF-1.4\n").unwrap();
        Ok(output.to_path_buf())
    }
}

/// Transcoder stand-in: records the staged image names it saw.
#[derive(Default)]
struct RecordingTranscoder {
    calls: Mutex<Vec<(Vec<String>, VideoSettings)>>,
}

#[async_trait]
impl Transcoder for RecordingTranscoder {
    async fn transcode(
        &self,
        staging_dir: &Path,
        settings: &VideoSettings,
        output: &Path,
    ) -> Result<PathBuf, ExportError> {
        let mut names: Vec<String> = std::fs::read_dir(staging_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        self.calls.lock().unwrap().push((names, settings.clone()));
        std::fs::write(output, b"video").unwrap();
        Ok(output.to_path_buf())
    }
}

/// Progress callback that records event names in order.
#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl ExportProgressCallback for RecordingProgress {
    fn on_export_start(&self, _input: &Path, _output: &Path, format: ExportFormat) {
        self.events.lock().unwrap().push(format!("start {format}"));
    }

    fn on_render_complete(&self, frame_count: usize, exit_code: Option<i32>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("rendered {frame_count} {exit_code:?}"));
    }

    fn on_assemble_start(&self, format: ExportFormat, frame_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("assemble {format} {frame_count}"));
    }

    fn on_export_complete(&self, _output: &Path) {
        self.events.lock().unwrap().push("complete".into());
    }
}

/// Route library logs to the test harness (`RUST_LOG=debug cargo test`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A placeholder presentation file inside `dir`.
fn presentation(dir: &Path) -> PathBuf {
    init_tracing();
    let path = dir.join("talk.sozi.html");
    std::fs::write(&path, "<html></html>").unwrap();
    path
}

fn read_zip_part(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut body = String::new();
    part.read_to_string(&mut body).unwrap();
    body
}

fn zip_slide_count(path: &Path) -> usize {
    let file = std::fs::File::open(path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .count()
}

// ── PDF ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_joins_every_frame_in_frame_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let renderer = FakeRenderer::new(12);
    let joiner = Arc::new(RecordingJoiner::default());
    let config = ExportConfig::builder_for(ExportFormat::Pdf)
        .renderer(renderer.clone())
        .joiner(joiner.clone())
        .build()
        .unwrap();

    let report = convert_to_pdf(&input, &config).await.unwrap();

    assert_eq!(report.output, dir.path().join("talk.sozi.pdf"));
    assert!(report.output.exists());
    assert_eq!(report.frame_count, 12);

    let calls = joiner.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (pages, layout) = &calls[0];
    let names: Vec<String> = pages
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    let expected: Vec<String> = (1..=12).map(|i| format!("frame-{i}.png")).collect();
    assert_eq!(names, expected);
    assert_eq!(layout.paper, "a4paper");
    assert!(!layout.portrait);
}

#[tokio::test]
async fn pdf_frames_request_is_scaled_by_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let renderer = FakeRenderer::new(1);
    let config = ExportConfig::builder_for(ExportFormat::Pdf)
        .resolution(2.0)
        .include("1:3")
        .renderer(renderer.clone())
        .joiner(Arc::new(RecordingJoiner::default()))
        .build()
        .unwrap();

    convert_to_pdf(&input, &config).await.unwrap();

    let requests = renderer.requests.lock().unwrap();
    match &requests[0].mode {
        RenderMode::Frames {
            width,
            height,
            include,
            exclude,
            png_compression,
        } => {
            assert!((width - 59.4).abs() < 1e-9);
            assert!((height - 42.0).abs() < 1e-9);
            assert_eq!(include, "1:3");
            assert_eq!(exclude, "none");
            assert_eq!(*png_compression, 100);
        }
        other => panic!("expected a frames request, got {other:?}"),
    }
}

#[tokio::test]
async fn pdf_runs_use_distinct_staging_that_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let renderer = FakeRenderer::new(2);
    let config = ExportConfig::builder_for(ExportFormat::Pdf)
        .renderer(renderer.clone())
        .joiner(Arc::new(RecordingJoiner::default()))
        .build()
        .unwrap();

    convert_to_pdf(&input, &config).await.unwrap();
    convert_to_pdf(&input, &config).await.unwrap();

    let staging = renderer.staging_dirs();
    assert_eq!(staging.len(), 2);
    assert_ne!(staging[0], staging[1]);
    for dir in &staging {
        assert!(!dir.exists(), "staging {} was not removed", dir.display());
    }
}

#[tokio::test]
async fn pdf_without_frames_is_an_error_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let renderer = FakeRenderer::new(0);
    let joiner = Arc::new(RecordingJoiner::default());
    let config = ExportConfig::builder_for(ExportFormat::Pdf)
        .renderer(renderer.clone())
        .joiner(joiner.clone())
        .build()
        .unwrap();

    let err = convert_to_pdf(&input, &config).await.unwrap_err();
    assert!(matches!(err, ExportError::NoFrames { .. }), "got: {err}");
    assert!(joiner.calls.lock().unwrap().is_empty());
    assert!(!dir.path().join("talk.sozi.pdf").exists());
    assert!(!renderer.staging_dirs()[0].exists());
}

#[tokio::test]
async fn renderer_failure_exit_still_assembles_frames() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let joiner = Arc::new(RecordingJoiner::default());
    let config = ExportConfig::builder_for(ExportFormat::Pdf)
        .renderer(FakeRenderer::with_exit_code(3, Some(1)))
        .joiner(joiner.clone())
        .build()
        .unwrap();

    let report = convert_to_pdf(&input, &config).await.unwrap();
    assert_eq!(report.renderer_exit_code, Some(1));
    assert_eq!(joiner.calls.lock().unwrap()[0].0.len(), 3);
}

#[tokio::test]
async fn explicit_output_is_used_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let output = dir.path().join("handout.final");
    let config = ExportConfig::builder_for(ExportFormat::Pdf)
        .output(&output)
        .portrait(true)
        .paper("letterpaper")
        .renderer(FakeRenderer::new(1))
        .joiner(Arc::new(RecordingJoiner::default()))
        .build()
        .unwrap();

    let report = convert_to_pdf(&input, &config).await.unwrap();
    assert_eq!(report.output, output);
    assert!(output.exists());
}

#[tokio::test]
async fn missing_input_is_reported_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(1);
    let config = ExportConfig::builder_for(ExportFormat::Pdf)
        .renderer(renderer.clone())
        .build()
        .unwrap();

    let err = convert_to_pdf(dir.path().join("nope.sozi.html"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::InputNotFound { .. }), "got: {err}");
    assert!(renderer.requests.lock().unwrap().is_empty());
}

// ── PPTX ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pptx_has_one_slide_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let config = ExportConfig::builder_for(ExportFormat::Pptx)
        .renderer(FakeRenderer::new(5))
        .build()
        .unwrap();

    let report = convert_to_pptx(&input, &config).await.unwrap();

    assert_eq!(report.output, dir.path().join("talk.sozi.pptx"));
    assert_eq!(zip_slide_count(&report.output), 5);
    let pres = read_zip_part(&report.output, "ppt/presentation.xml");
    assert!(pres.contains(r#"cx="9144000""#), "got: {pres}");
}

#[tokio::test]
async fn pptx_wide_applies_with_zero_slides() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let config = ExportConfig::builder_for(ExportFormat::Pptx)
        .wide(true)
        .renderer(FakeRenderer::new(0))
        .build()
        .unwrap();

    let report = convert_to_pptx(&input, &config).await.unwrap();

    assert_eq!(report.frame_count, 0);
    assert_eq!(zip_slide_count(&report.output), 0);
    let pres = read_zip_part(&report.output, "ppt/presentation.xml");
    assert!(
        pres.contains(r#"<p:sldSz cx="12192000" cy="6858000"/>"#),
        "got: {pres}"
    );
}

// ── Video ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn video_encodes_the_staged_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let renderer = FakeRenderer::new(4);
    let transcoder = Arc::new(RecordingTranscoder::default());
    let config = ExportConfig::builder_for(ExportFormat::Video)
        .bit_rate("4M")
        .renderer(renderer.clone())
        .transcoder(transcoder.clone())
        .build()
        .unwrap();

    let report = convert_to_video(&input, &config).await.unwrap();

    assert_eq!(report.output, dir.path().join("talk.sozi.ogv"));
    assert!(!report.images_only);
    let calls = transcoder.calls.lock().unwrap();
    let (names, settings) = &calls[0];
    assert_eq!(names, &["img1.png", "img2.png", "img3.png", "img4.png"]);
    assert_eq!(settings.frame_rate, 50);
    assert_eq!(settings.bit_rate, "4M");
    assert!(!renderer.staging_dirs()[0].exists());

    let requests = renderer.requests.lock().unwrap();
    assert_eq!(
        requests[0].mode,
        RenderMode::Video {
            width: 1024.0,
            height: 768.0,
            png_compression: 100
        }
    );
}

#[tokio::test]
async fn video_images_keeps_frames_and_skips_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let frames_dir = dir.path().join("frames");
    let renderer = FakeRenderer::new(3);
    let transcoder = Arc::new(RecordingTranscoder::default());
    let config = ExportConfig::builder_for(ExportFormat::Video)
        .images(true)
        .output(&frames_dir)
        .renderer(renderer.clone())
        .transcoder(transcoder.clone())
        .build()
        .unwrap();

    let report = convert_to_video(&input, &config).await.unwrap();

    assert!(report.images_only);
    assert_eq!(report.output, frames_dir);
    assert_eq!(renderer.staging_dirs(), [frames_dir.clone()]);
    assert!(transcoder.calls.lock().unwrap().is_empty());
    for i in 1..=3 {
        assert!(frames_dir.join(format!("img{i}.png")).exists());
    }
}

#[tokio::test]
async fn video_images_default_output_is_input_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let config = ExportConfig::builder_for(ExportFormat::Video)
        .images(true)
        .renderer(FakeRenderer::new(2))
        .build()
        .unwrap();

    let report = convert_to_video(&input, &config).await.unwrap();

    assert_eq!(report.output, dir.path());
    assert!(dir.path().join("img1.png").exists());
    assert!(input.exists());
}

#[tokio::test]
async fn video_images_count_only_rendered_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    for asset in ["logo.png", "photo.png"] {
        RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]))
            .save(dir.path().join(asset))
            .unwrap();
    }
    let progress = Arc::new(RecordingProgress::default());
    let config = ExportConfig::builder_for(ExportFormat::Video)
        .images(true)
        .renderer(FakeRenderer::new(2))
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    let report = convert_to_video(&input, &config).await.unwrap();

    assert_eq!(report.frame_count, 2);
    assert!(progress
        .events
        .lock()
        .unwrap()
        .contains(&"rendered 2 Some(0)".to_string()));
    assert!(dir.path().join("logo.png").exists());
    assert!(dir.path().join("photo.png").exists());
}

// ── Progress & sync wrapper ──────────────────────────────────────────────────

#[tokio::test]
async fn progress_events_follow_pipeline_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let progress = Arc::new(RecordingProgress::default());
    let config = ExportConfig::builder_for(ExportFormat::Pptx)
        .renderer(FakeRenderer::with_exit_code(2, None))
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    convert(&input, ExportFormat::Pptx, &config).await.unwrap();

    assert_eq!(
        *progress.events.lock().unwrap(),
        [
            "start PPTX",
            "rendered 2 None",
            "assemble PPTX 2",
            "complete"
        ]
    );
}

#[test]
fn convert_sync_runs_without_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let config = ExportConfig::builder_for(ExportFormat::Pptx)
        .renderer(FakeRenderer::new(1))
        .build()
        .unwrap();

    let report = convert_sync(&input, ExportFormat::Pptx, &config).unwrap();
    assert_eq!(report.format, ExportFormat::Pptx);
    assert_eq!(report.frame_count, 1);
}

#[test]
fn report_serialises_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = presentation(dir.path());
    let config = ExportConfig::builder_for(ExportFormat::Pptx)
        .renderer(FakeRenderer::new(1))
        .build()
        .unwrap();

    let report = tokio_test::block_on(convert(&input, ExportFormat::Pptx, &config)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["format"], "pptx");
    assert_eq!(json["frame_count"], 1);
    assert!(json["stats"]["total_duration_ms"].is_u64());
}

// ── External tool stand-ins (unix only) ──────────────────────────────────────

#[cfg(unix)]
mod scripts {
    use super::*;
    use sozi_export::pipeline::pdf::pdfjam_args;
    use sozi_export::pipeline::video::transcode_args;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable that records its arguments (one per line) into
    /// `args_file` and creates `output`.
    fn recording_tool(dir: &Path, name: &str, args_file: &Path, output: &Path) -> PathBuf {
        let path = dir.join(name);
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n: > '{}'\n",
            args_file.display(),
            output.display()
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn recorded_args(args_file: &Path) -> Vec<String> {
        std::fs::read_to_string(args_file)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn secondary_transcoder_gets_identical_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let input = presentation(dir.path());
        let args_file = dir.path().join("avconv.args");
        let avconv = recording_tool(
            dir.path(),
            "avconv-stand-in",
            &args_file,
            &dir.path().join("talk.sozi.ogv"),
        );
        let renderer = FakeRenderer::new(3);
        let config = ExportConfig::builder_for(ExportFormat::Video)
            .renderer(renderer.clone())
            .transcoder_programs([
                "nonexistent_ffmpeg_for_test".to_string(),
                avconv.to_string_lossy().to_string(),
            ])
            .build()
            .unwrap();

        let report = convert_to_video(&input, &config).await.unwrap();

        assert!(report.output.exists());
        let staging = &renderer.staging_dirs()[0];
        let settings = VideoSettings::from(&config);
        assert_eq!(
            recorded_args(&args_file),
            transcode_args(staging, &settings, &report.output)
        );
    }

    #[tokio::test]
    async fn missing_transcoders_are_terminal_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = presentation(dir.path());
        let renderer = FakeRenderer::new(2);
        let config = ExportConfig::builder_for(ExportFormat::Video)
            .renderer(renderer.clone())
            .transcoder_programs(["nonexistent_ffmpeg_for_test", "nonexistent_avconv_for_test"])
            .build()
            .unwrap();

        let err = convert_to_video(&input, &config).await.unwrap_err();

        assert!(err.is_tool_missing(), "got: {err}");
        assert!(!dir.path().join("talk.sozi.ogv").exists());
        assert!(!renderer.staging_dirs()[0].exists());
    }

    #[tokio::test]
    async fn pdfjam_stand_in_receives_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let input = presentation(dir.path());
        let args_file = dir.path().join("pdfjam.args");
        let pdfjam = recording_tool(
            dir.path(),
            "pdfjam-stand-in",
            &args_file,
            &dir.path().join("talk.sozi.pdf"),
        );
        let config = ExportConfig::builder_for(ExportFormat::Pdf)
            .renderer(FakeRenderer::new(3))
            .joiner_program(pdfjam.to_string_lossy().to_string())
            .build()
            .unwrap();

        let report = convert_to_pdf(&input, &config).await.unwrap();

        assert!(report.output.exists());
        let args = recorded_args(&args_file);
        let pages: Vec<&String> = args.iter().filter(|a| a.ends_with(".png")).collect();
        assert_eq!(pages.len(), 3);
        assert_eq!(args.last().map(String::as_str), Some("1"));
        let out_at = args.iter().position(|a| a == "--outfile").unwrap();
        assert_eq!(PathBuf::from(&args[out_at + 1]), report.output);
        let fixed = pdfjam_args(&[], &PdfLayout::from(&config), &report.output);
        assert_eq!(args.len(), fixed.len() + 3);
    }

    #[tokio::test]
    async fn failing_joiner_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = presentation(dir.path());
        let config = ExportConfig::builder_for(ExportFormat::Pdf)
            .renderer(FakeRenderer::new(1))
            .joiner_program("false")
            .build()
            .unwrap();

        let err = convert_to_pdf(&input, &config).await.unwrap_err();
        assert!(matches!(err, ExportError::ToolFailed { .. }), "got: {err}");
    }
}
