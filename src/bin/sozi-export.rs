//! CLI binary for sozi-export.
//!
//! A thin shim over the library crate that maps subcommands and flags
//! to `ExportConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sozi_export::{
    check_tools, convert, ExportConfig, ExportConfigBuilder, ExportFormat,
    ExportProgressCallback, ExportReport, ProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a single spinner whose prefix follows the
/// pipeline stage, with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Clear the spinner after a failed conversion.
    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_export_start(&self, input: &Path, output: &Path, format: ExportFormat) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Exporting {} to {} ({format})",
                input.display(),
                output.display()
            ))
        ));
        self.bar.set_prefix("Rendering");
        self.bar.set_message(input.display().to_string());
    }

    fn on_render_complete(&self, frame_count: usize, exit_code: Option<i32>) {
        match exit_code {
            Some(0) => self.bar.println(format!(
                "  {} {} frames rendered",
                green("✓"),
                frame_count
            )),
            code => self.bar.println(format!(
                "  {} {} frames rendered  {}",
                cyan("⚠"),
                frame_count,
                dim(&format!(
                    "renderer exited with {}",
                    code.map_or("a signal".to_string(), |c| format!("code {c}"))
                ))
            )),
        }
    }

    fn on_assemble_start(&self, format: ExportFormat, frame_count: usize) {
        self.bar.set_prefix("Assembling");
        self.bar.set_message(format!("{frame_count} frames into {format}"));
    }

    // The summary line after `convert` returns reports the deliverable.
    fn on_export_complete(&self, _output: &Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # A4 landscape PDF, one page per frame
  sozi-export pdf talk.sozi.html

  # Letter portrait, only frames 1 to 5
  sozi-export pdf -p letterpaper -P -i 1:5 talk.sozi.html -o handout.pdf

  # Widescreen PowerPoint deck
  sozi-export pptx --wide talk.sozi.html

  # 1280x720 video at 4 Mbit/s
  sozi-export video -W 1280 -H 720 -b 4M talk.sozi.html

  # Keep the raw animation frames instead of encoding a video
  sozi-export video -I talk.sozi.html -o frames/

  # Which external tools are installed?
  sozi-export check-tools

EXTERNAL TOOLS:
  phantomjs        renders the presentation frames (all formats)
  pdfjam           joins frame images into a PDF (texlive-extra-utils)
  ffmpeg / avconv  encodes frames into a video (FFMPEG or libav)

ENVIRONMENT VARIABLES:
  SOZI_EXPORT_RENDERER    Renderer executable (default: phantomjs)
  SOZI_EXPORT_SCRIPT_DIR  Directory holding export-frames.js / export-video.js
  RUST_LOG                Override the log filter
"#;

/// Export Sozi presentations to PDF, PPTX and video.
#[derive(Parser, Debug)]
#[command(
    name = "sozi-export",
    version,
    about = "Export Sozi presentations to PDF, PPTX and video",
    long_about = "Export Sozi presentations to PDF documents, PowerPoint decks and videos. \
Frames are rendered by a headless browser (PhantomJS) and assembled with pdfjam, \
an in-process PPTX writer, or ffmpeg/avconv.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print the export report (or tool list) as JSON on stdout.
    #[arg(long, global = true, env = "SOZI_EXPORT_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "SOZI_EXPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SOZI_EXPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SOZI_EXPORT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export to a PDF document, one page per frame.
    Pdf(PdfArgs),
    /// Export to a PowerPoint deck, one slide per frame.
    Pptx(PptxArgs),
    /// Export to a video, or to raw animation frames with --images.
    Video(VideoArgs),
    /// Report which external tools are installed.
    CheckTools,
}

/// Flags shared by every export subcommand.
#[derive(Args, Debug)]
struct CommonArgs {
    /// Sozi presentation (.sozi.html).
    input: PathBuf,

    /// Output file (directory with --images). Default: input with the
    /// format's extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Frame width (renderer units; pixels for video).
    #[arg(short = 'W', long)]
    width: Option<f64>,

    /// Frame height (renderer units; pixels for video).
    #[arg(short = 'H', long)]
    height: Option<f64>,

    /// PNG compression level passed to the renderer (0–100).
    #[arg(short = 'c', long, default_value_t = 100,
          value_parser = clap::value_parser!(u32).range(0..=100))]
    png_compression: u32,

    /// Renderer executable.
    #[arg(long, env = "SOZI_EXPORT_RENDERER")]
    renderer: Option<PathBuf>,

    /// Directory holding the renderer scripts. Default: next to this binary.
    #[arg(long, env = "SOZI_EXPORT_SCRIPT_DIR")]
    script_dir: Option<PathBuf>,
}

/// Frame selection and scale shared by PDF and PPTX.
#[derive(Args, Debug)]
struct FrameArgs {
    /// Pixels per unit of width/height.
    #[arg(short, long, default_value_t = 72.0)]
    resolution: f64,

    /// Frames to include (renderer list syntax, e.g. "all", "1,3:5").
    #[arg(short, long, default_value = "all")]
    include: String,

    /// Frames to exclude (renderer list syntax).
    #[arg(short = 'x', long, default_value = "none")]
    exclude: String,
}

#[derive(Args, Debug)]
struct PdfArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    frames: FrameArgs,

    /// Paper size as understood by pdfjam (a4paper, letterpaper, …).
    #[arg(short, long, default_value = "a4paper")]
    paper: String,

    /// Portrait orientation (default: landscape).
    #[arg(short = 'P', long)]
    portrait: bool,
}

#[derive(Args, Debug)]
struct PptxArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    frames: FrameArgs,

    /// 16:9 slides instead of 4:3.
    #[arg(long)]
    wide: bool,
}

#[derive(Args, Debug)]
struct VideoArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Video bit rate as understood by ffmpeg.
    #[arg(short, long, default_value = "2M")]
    bit_rate: String,

    /// Keep the raw frame images instead of encoding a video.
    #[arg(short = 'I', long)]
    images: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries the stage feedback; only errors get through
    // alongside it.
    let exporting = !matches!(cli.command, Command::CheckTools);
    let show_progress = exporting && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Tool check ───────────────────────────────────────────────────────
    if !exporting {
        return print_tools(cli.json);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let (format, input, builder) = builder_for(&cli.command)?;
    let builder = match progress {
        Some(ref cb) => builder.progress_callback(Arc::clone(cb) as ProgressCallback),
        None => builder,
    };
    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let report = match convert(&input, format, &config).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(ref cb) = progress {
                cb.abandon();
            }
            return Err(e).with_context(|| format!("{format} export failed"));
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        for line in summary_lines(&report) {
            eprintln!("{line}");
        }
    }

    Ok(())
}

/// Map a subcommand to its format, input and a populated builder.
fn builder_for(command: &Command) -> Result<(ExportFormat, PathBuf, ExportConfigBuilder)> {
    let (format, common, builder) = match command {
        Command::Pdf(args) => {
            let builder = apply_frames(ExportConfig::builder_for(ExportFormat::Pdf), &args.frames)
                .paper(args.paper.clone())
                .portrait(args.portrait);
            (ExportFormat::Pdf, &args.common, builder)
        }
        Command::Pptx(args) => {
            let builder = apply_frames(ExportConfig::builder_for(ExportFormat::Pptx), &args.frames)
                .wide(args.wide);
            (ExportFormat::Pptx, &args.common, builder)
        }
        Command::Video(args) => {
            let builder = ExportConfig::builder_for(ExportFormat::Video)
                .bit_rate(args.bit_rate.clone())
                .images(args.images);
            (ExportFormat::Video, &args.common, builder)
        }
        Command::CheckTools => anyhow::bail!("check-tools does not export anything"),
    };
    Ok((format, common.input.clone(), apply_common(builder, common)))
}

fn apply_frames(builder: ExportConfigBuilder, frames: &FrameArgs) -> ExportConfigBuilder {
    builder
        .resolution(frames.resolution)
        .include(frames.include.clone())
        .exclude(frames.exclude.clone())
}

fn apply_common(mut builder: ExportConfigBuilder, common: &CommonArgs) -> ExportConfigBuilder {
    builder = builder.png_compression(common.png_compression);
    if let Some(ref output) = common.output {
        builder = builder.output(output.clone());
    }
    if let Some(width) = common.width {
        builder = builder.width(width);
    }
    if let Some(height) = common.height {
        builder = builder.height(height);
    }
    if let Some(ref renderer) = common.renderer {
        builder = builder.renderer_program(renderer.clone());
    }
    if let Some(ref dir) = common.script_dir {
        builder = builder.script_dir(dir.clone());
    }
    builder
}

/// Final report lines; the only success line of a run.
fn summary_lines(report: &ExportReport) -> Vec<String> {
    let what = if report.images_only { "frames kept in" } else { "frames" };
    let mut lines = vec![
        format!(
            "{}  {} {}  {}ms  →  {}",
            green("✔"),
            report.frame_count,
            what,
            report.stats.total_duration_ms,
            bold(&report.output.display().to_string()),
        ),
        format!(
            "   {}",
            dim(&format!(
                "render {}ms  /  assemble {}ms",
                report.stats.render_duration_ms, report.stats.assemble_duration_ms
            )),
        ),
    ];
    if let Some(code) = report.renderer_exit_code.filter(|c| *c != 0) {
        lines.push(format!("   {} renderer exited with code {}", cyan("⚠"), code));
    }
    lines
}

fn print_tools(json: bool) -> Result<()> {
    let tools = check_tools();

    if json {
        let json = serde_json::to_string_pretty(&tools).context("Failed to serialise tool list")?;
        println!("{json}");
        return Ok(());
    }

    for tool in &tools {
        if tool.available {
            let path = tool
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!("{} {:<8} {:<22} {}", green("✓"), tool.name, tool.role, dim(&path));
        } else {
            println!("{} {:<8} {:<22} {}", red("✗"), tool.name, tool.role, tool.hint);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sozi_export::ExportStats;

    fn report() -> ExportReport {
        ExportReport {
            format: ExportFormat::Pdf,
            input: PathBuf::from("talk.sozi.html"),
            output: PathBuf::from("talk.sozi.pdf"),
            frame_count: 3,
            images_only: false,
            renderer_exit_code: Some(0),
            stats: ExportStats::default(),
        }
    }

    #[test]
    fn spinner_completion_only_clears_the_bar() {
        let cb = CliProgressCallback {
            bar: ProgressBar::hidden(),
        };
        cb.on_export_complete(Path::new("talk.sozi.pdf"));
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn summary_has_a_single_success_line() {
        let lines = summary_lines(&report());
        let successes = lines.iter().filter(|l| l.contains('✔')).count();
        assert_eq!(successes, 1);
        assert!(lines[0].contains("talk.sozi.pdf"));
    }

    #[test]
    fn summary_flags_renderer_exit_code() {
        let mut report = report();
        report.renderer_exit_code = Some(2);
        let lines = summary_lines(&report);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("code 2"));
    }
}
