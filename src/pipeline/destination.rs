//! Output-path resolution.
//!
//! The destination is computed exactly once per conversion, before the
//! renderer starts, and threaded through the rest of the pipeline.

use crate::config::{ExportConfig, ExportFormat};
use std::path::{Path, PathBuf};

/// Resolve where a conversion writes its deliverable.
///
/// * An explicit `config.output` is used verbatim.
/// * With `config.images`, the input's containing directory (the frames are
///   the deliverable, so the output is a directory).
/// * Otherwise the input path with its extension replaced by the format's
///   (`pdf`, `pptx`, `ogv`); an input without extension gets one appended.
///
/// Existing files are not checked; later writes overwrite them.
pub fn resolve_output_path(input: &Path, config: &ExportConfig, format: ExportFormat) -> PathBuf {
    if let Some(ref output) = config.output {
        return output.clone();
    }

    if config.images {
        return match input.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
    }

    input.with_extension(format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExportConfig {
        ExportConfig::default()
    }

    #[test]
    fn replaces_extension_per_format() {
        let input = Path::new("/talks/intro.sozi.svg");
        let c = config();
        assert_eq!(
            resolve_output_path(input, &c, ExportFormat::Pdf),
            PathBuf::from("/talks/intro.sozi.pdf")
        );
        assert_eq!(
            resolve_output_path(input, &c, ExportFormat::Pptx),
            PathBuf::from("/talks/intro.sozi.pptx")
        );
        assert_eq!(
            resolve_output_path(input, &c, ExportFormat::Video),
            PathBuf::from("/talks/intro.sozi.ogv")
        );
    }

    #[test]
    fn appends_extension_when_missing() {
        assert_eq!(
            resolve_output_path(Path::new("slides"), &config(), ExportFormat::Pdf),
            PathBuf::from("slides.pdf")
        );
    }

    #[test]
    fn explicit_output_wins() {
        let mut c = config();
        c.output = Some(PathBuf::from("/out/custom.bin"));
        c.images = true;
        assert_eq!(
            resolve_output_path(Path::new("a.svg"), &c, ExportFormat::Video),
            PathBuf::from("/out/custom.bin")
        );
    }

    #[test]
    fn images_resolve_to_containing_directory() {
        let mut c = config();
        c.images = true;
        assert_eq!(
            resolve_output_path(Path::new("/talks/intro.svg"), &c, ExportFormat::Video),
            PathBuf::from("/talks")
        );
        assert_eq!(
            resolve_output_path(Path::new("intro.svg"), &c, ExportFormat::Video),
            PathBuf::from(".")
        );
    }
}
