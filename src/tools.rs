//! External tool invocation and detection.
//!
//! Every collaborator (renderer, PDF joiner, transcoder) is run through
//! [`ToolCommand`], which inherits the caller's stdout/stderr so the tool's
//! own progress output reaches the terminal live.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Remediation hint for the renderer.
pub const RENDERER_HINT: &str = "Check that PhantomJS is installed.";

/// Remediation hint for pdfjam.
pub const PDFJAM_HINT: &str = "Check that texlive-extra-utils is installed.";

/// Remediation hint for ffmpeg / avconv.
pub const TRANSCODER_HINT: &str = "Check that FFMPEG or libav is installed.";

/// A program plus positional arguments, run with inherited stdio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    /// Create a new command for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Short program name for log and error messages.
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Spawn the program and wait for it to exit.
    ///
    /// stdin is closed; stdout and stderr go straight to the caller's
    /// streams. A missing executable surfaces as an `io::Error` of kind
    /// [`io::ErrorKind::NotFound`].
    pub async fn status(&self) -> io::Result<ExitStatus> {
        debug!("Running {} {:?}", self.program.display(), self.args);
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
    }
}

/// Whether a spawn error means the executable is not installed.
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// What the tool is used for.
    pub role: &'static str,
    /// Whether the tool was found on PATH.
    pub available: bool,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
    /// What to install when it is missing.
    pub hint: &'static str,
}

/// Look up a single tool on PATH.
pub fn check_tool(name: &str, role: &'static str, hint: &'static str) -> ToolInfo {
    let path = which::which(name).ok();
    ToolInfo {
        name: name.to_string(),
        role,
        available: path.is_some(),
        path,
        hint,
    }
}

/// Check every external collaborator with its default program name.
pub fn check_tools() -> Vec<ToolInfo> {
    vec![
        check_tool(crate::config::DEFAULT_RENDERER, "renderer", RENDERER_HINT),
        check_tool(crate::config::DEFAULT_JOINER, "pdf joiner", PDFJAM_HINT),
        check_tool("ffmpeg", "transcoder", TRANSCODER_HINT),
        check_tool("avconv", "transcoder (fallback)", TRANSCODER_HINT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_args_in_order() {
        let mut cmd = ToolCommand::new("pdfjam");
        cmd.arg("--paper").arg("a4paper").args(["a.png", "b.png"]);
        assert_eq!(cmd.get_args(), ["--paper", "a4paper", "a.png", "b.png"]);
        assert_eq!(cmd.name(), "pdfjam");
    }

    #[test]
    fn name_strips_directories() {
        let cmd = ToolCommand::new("/usr/local/bin/ffmpeg");
        assert_eq!(cmd.name(), "ffmpeg");
    }

    #[test]
    fn check_tool_not_found() {
        let info = check_tool("nonexistent_tool_12345", "test", "n/a");
        assert!(!info.available);
        assert!(info.path.is_none());
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let err = ToolCommand::new("nonexistent_tool_xyz_12345")
            .status()
            .await
            .unwrap_err();
        assert!(is_not_found(&err), "got: {err:?}");
    }
}
