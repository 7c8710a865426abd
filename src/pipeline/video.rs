//! Video assembly with ffmpeg, falling back to avconv.
//!
//! ```text
//! ffmpeg -r 50 -f image2 -i <staging>/img%d.png -b:v <bit rate> -y <output>
//! ```
//!
//! Programs are tried in order; the next one is attempted only when the
//! previous executable is not installed. A transcoder that starts and then
//! fails is not retried with the next program.

use crate::backend::{Transcoder, VideoSettings};
use crate::error::ExportError;
use crate::tools::{is_not_found, ToolCommand, TRANSCODER_HINT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Input file pattern written by the video export script.
pub const IMAGE_PATTERN: &str = "img%d.png";

/// Build the transcoder argument list.
pub fn transcode_args(staging_dir: &Path, settings: &VideoSettings, output: &Path) -> Vec<String> {
    vec![
        "-r".to_string(),
        settings.frame_rate.to_string(),
        "-f".to_string(),
        "image2".to_string(),
        "-i".to_string(),
        staging_dir.join(IMAGE_PATTERN).to_string_lossy().to_string(),
        "-b:v".to_string(),
        settings.bit_rate.clone(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// [`Transcoder`] that runs the first installed program of a list.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    programs: Vec<String>,
}

impl FfmpegTranscoder {
    pub fn new<I, S>(programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            programs: programs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn programs(&self) -> &[String] {
        &self.programs
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TRANSCODERS)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        staging_dir: &Path,
        settings: &VideoSettings,
        output: &Path,
    ) -> Result<PathBuf, ExportError> {
        let args = transcode_args(staging_dir, settings, output);
        info!("Encoding {} into {}", staging_dir.join(IMAGE_PATTERN).display(), output.display());

        for (i, program) in self.programs.iter().enumerate() {
            let mut cmd = ToolCommand::new(program);
            cmd.args(args.iter().cloned());
            let tool = cmd.name();

            match cmd.status().await {
                Ok(status) if status.success() => return Ok(output.to_path_buf()),
                Ok(status) => {
                    return Err(ExportError::ToolFailed {
                        tool,
                        status: status.to_string(),
                    })
                }
                Err(e) if is_not_found(&e) => {
                    if let Some(next) = self.programs.get(i + 1) {
                        info!("{} executable not found. Trying {}.", tool, next);
                    }
                }
                Err(e) => return Err(ExportError::ToolIo { tool, source: e }),
            }
        }

        let tools = self.programs.join(" or ");
        error!("Could not run {}. {}", tools, TRANSCODER_HINT);
        Err(ExportError::ToolNotFound {
            tool: tools,
            hint: TRANSCODER_HINT.to_string(),
        })
    }
}
