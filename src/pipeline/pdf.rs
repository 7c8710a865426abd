//! PDF assembly with `pdfjam`.
//!
//! Each frame image becomes one page. The argument list is:
//!
//! ```text
//! pdfjam --paper <paper> --rotateoversize false <--landscape|--no-landscape>
//!        --outfile <output> <frame1.png> ... <frameN.png> 1
//! ```
//!
//! The trailing `1` is a page selector: pdfjam applies a selector to the
//! file it follows, so it only pins the last image to its first page; the
//! other images use the default selection, which for a single-page PNG is
//! the same page.

use crate::backend::{PageJoiner, PdfLayout};
use crate::error::ExportError;
use crate::tools::{is_not_found, ToolCommand, PDFJAM_HINT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Build the pdfjam argument list for `frames`.
pub fn pdfjam_args(frames: &[PathBuf], layout: &PdfLayout, output: &Path) -> Vec<String> {
    let mut args = vec![
        "--paper".to_string(),
        layout.paper.clone(),
        "--rotateoversize".to_string(),
        "false".to_string(),
        if layout.portrait {
            "--no-landscape".to_string()
        } else {
            "--landscape".to_string()
        },
        "--outfile".to_string(),
        output.to_string_lossy().to_string(),
    ];
    args.extend(frames.iter().map(|f| f.to_string_lossy().to_string()));
    args.push("1".to_string());
    args
}

/// [`PageJoiner`] that runs pdfjam.
#[derive(Debug, Clone)]
pub struct Pdfjam {
    program: String,
}

impl Pdfjam {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Pdfjam {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_JOINER)
    }
}

#[async_trait]
impl PageJoiner for Pdfjam {
    async fn join(
        &self,
        frames: &[PathBuf],
        layout: &PdfLayout,
        output: &Path,
    ) -> Result<PathBuf, ExportError> {
        let mut cmd = ToolCommand::new(&self.program);
        cmd.args(pdfjam_args(frames, layout, output));
        let tool = cmd.name();
        info!("Joining {} pages into {}", frames.len(), output.display());

        let status = match cmd.status().await {
            Ok(status) => status,
            Err(e) if is_not_found(&e) => {
                error!("{} executable not found. {}", tool, PDFJAM_HINT);
                return Err(ExportError::ToolNotFound {
                    tool,
                    hint: PDFJAM_HINT.to_string(),
                });
            }
            Err(e) => return Err(ExportError::ToolIo { tool, source: e }),
        };

        if !status.success() {
            return Err(ExportError::ToolFailed {
                tool,
                status: status.to_string(),
            });
        }
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(portrait: bool) -> PdfLayout {
        PdfLayout {
            paper: "a4paper".into(),
            portrait,
        }
    }

    #[test]
    fn args_list_every_frame_then_selector() {
        let frames: Vec<PathBuf> = (1..=3)
            .map(|i| PathBuf::from(format!("/s/img{i}.png")))
            .collect();
        let args = pdfjam_args(&frames, &layout(false), Path::new("out.pdf"));
        assert_eq!(
            args,
            [
                "--paper",
                "a4paper",
                "--rotateoversize",
                "false",
                "--landscape",
                "--outfile",
                "out.pdf",
                "/s/img1.png",
                "/s/img2.png",
                "/s/img3.png",
                "1"
            ]
        );
    }

    #[test]
    fn portrait_flag() {
        let args = pdfjam_args(&[], &layout(true), Path::new("out.pdf"));
        assert_eq!(args[4], "--no-landscape");
        assert_eq!(args.last().map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn missing_pdfjam_names_package() {
        let joiner = Pdfjam::new("nonexistent_pdfjam_12345");
        let err = joiner
            .join(&[PathBuf::from("a.png")], &layout(false), Path::new("out.pdf"))
            .await
            .unwrap_err();
        assert!(err.is_tool_missing());
        assert!(err.to_string().contains("texlive-extra-utils"), "got: {err}");
    }
}
