//! PPTX assembly: one full-bleed picture slide per frame.
//!
//! The deck is built in memory as a minimal PresentationML package (one
//! blank layout, one master, one theme) and written with the `zip` crate.
//! Each picture sits at the slide origin and is stretched to the full slide
//! size, whatever the image's own aspect ratio.

use crate::error::ExportError;
use std::fmt::Write as _;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 4:3 slide width in EMU (10 in).
pub const STANDARD_WIDTH: i64 = 9_144_000;

/// 16:9 slide width in EMU (13.333 in).
pub const WIDESCREEN_WIDTH: i64 = 12_192_000;

/// Slide height in EMU (7.5 in), shared by both aspects.
pub const SLIDE_HEIGHT: i64 = 6_858_000;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

#[derive(Debug, Clone)]
struct SlideImage {
    name: String,
    png: Vec<u8>,
}

/// An in-memory slide deck of full-slide images.
#[derive(Debug, Clone, Default)]
pub struct PptxDeck {
    widescreen: bool,
    slides: Vec<SlideImage>,
}

impl PptxDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch between 16:9 (`true`) and 4:3 (`false`) slides.
    pub fn set_widescreen(&mut self, wide: bool) {
        self.widescreen = wide;
    }

    pub fn is_widescreen(&self) -> bool {
        self.widescreen
    }

    /// Slide size `(cx, cy)` in EMU.
    pub fn slide_size(&self) -> (i64, i64) {
        if self.widescreen {
            (WIDESCREEN_WIDTH, SLIDE_HEIGHT)
        } else {
            (STANDARD_WIDTH, SLIDE_HEIGHT)
        }
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Append a slide showing the PNG at `path`.
    pub fn add_image_slide(&mut self, path: &Path) -> Result<(), ExportError> {
        let png = std::fs::read(path).map_err(|e| ExportError::StagingFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("image{}.png", self.slides.len() + 1));
        self.add_image_slide_bytes(name, png);
        Ok(())
    }

    /// Append a slide showing an in-memory PNG.
    pub fn add_image_slide_bytes(&mut self, name: impl Into<String>, png: Vec<u8>) {
        self.slides.push(SlideImage {
            name: name.into(),
            png,
        });
    }

    /// Serialise the package into `writer`.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<W, ExportError> {
        let mut zip = ZipWriter::new(writer);
        let xml = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let media = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        put(&mut zip, "[Content_Types].xml", self.content_types_xml().as_bytes(), xml)?;
        put(&mut zip, "_rels/.rels", root_rels_xml().as_bytes(), xml)?;
        put(&mut zip, "ppt/presentation.xml", self.presentation_xml().as_bytes(), xml)?;
        put(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            self.presentation_rels_xml().as_bytes(),
            xml,
        )?;
        put(&mut zip, "ppt/slideMasters/slideMaster1.xml", slide_master_xml().as_bytes(), xml)?;
        put(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            slide_master_rels_xml().as_bytes(),
            xml,
        )?;
        put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", slide_layout_xml().as_bytes(), xml)?;
        put(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            slide_layout_rels_xml().as_bytes(),
            xml,
        )?;
        put(&mut zip, "ppt/theme/theme1.xml", THEME_XML.as_bytes(), xml)?;

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            put(
                &mut zip,
                &format!("ppt/slides/slide{n}.xml"),
                self.slide_xml(n, &slide.name).as_bytes(),
                xml,
            )?;
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{n}.xml.rels"),
                slide_rels_xml(n).as_bytes(),
                xml,
            )?;
            put(&mut zip, &format!("ppt/media/image{n}.png"), &slide.png, media)?;
        }

        Ok(zip.finish()?)
    }

    /// Write the deck to `path`.
    ///
    /// The package is written to a temporary file next to the destination and
    /// persisted into place. On any error the temporary file is removed, so
    /// neither a truncated deck nor a stray temporary is left behind.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ExportError> {
        let write_err = |e: std::io::Error| ExportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(write_err)?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".sozi-export-")
            .suffix(".pptx.tmp")
            .tempfile_in(&dir)
            .map_err(write_err)?;
        self.write(std::io::BufWriter::new(tmp.as_file_mut()))?
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?
            .sync_all()
            .map_err(write_err)?;

        tmp.persist(path).map_err(|e| write_err(e.error))?;
        debug!("Wrote {} slides to {}", self.slides.len(), path.display());
        Ok(())
    }

    // ── Part generators ──────────────────────────────────────────────────

    fn content_types_xml(&self) -> String {
        let mut xml = String::with_capacity(2048);
        xml.push_str(XML_DECL);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
        for n in 1..=self.slides.len() {
            let _ = write!(
                xml,
                r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            );
        }
        xml.push_str("</Types>");
        xml
    }

    fn presentation_xml(&self) -> String {
        let (cx, cy) = self.slide_size();
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECL);
        let _ = write!(
            xml,
            r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
        );
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for i in 0..self.slides.len() {
                let _ = write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, 3 + i);
            }
            xml.push_str("</p:sldIdLst>");
        }
        let size_type = if self.widescreen { "" } else { r#" type="screen4x3""# };
        let _ = write!(xml, r#"<p:sldSz cx="{cx}" cy="{cy}"{size_type}/>"#);
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        xml
    }

    fn presentation_rels_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECL);
        let _ = write!(xml, r#"<Relationships xmlns="{NS_REL}">"#);
        let _ = write!(
            xml,
            r#"<Relationship Id="rId1" Type="{REL_BASE}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#
        );
        let _ = write!(
            xml,
            r#"<Relationship Id="rId2" Type="{REL_BASE}/theme" Target="theme/theme1.xml"/>"#
        );
        for i in 0..self.slides.len() {
            let _ = write!(
                xml,
                r#"<Relationship Id="rId{}" Type="{REL_BASE}/slide" Target="slides/slide{}.xml"/>"#,
                3 + i,
                1 + i
            );
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn slide_xml(&self, n: usize, name: &str) -> String {
        let (cx, cy) = self.slide_size();
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECL);
        let _ = write!(xml, r#"<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#);
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(EMPTY_GROUP_PROPS);
        xml.push_str("<p:pic><p:nvPicPr>");
        let _ = write!(
            xml,
            r#"<p:cNvPr id="2" name="Picture {n}" descr="{}"/>"#,
            xml_escape(name)
        );
        xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
        xml.push_str(r#"<p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#);
        let _ = write!(
            xml,
            r#"<p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#
        );
        xml.push_str("</p:pic></p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
        xml
    }
}

/// Build a deck from ordered frame images and write it to `output`.
///
/// Runs on the blocking pool; the returned future completes only once the
/// file is fully written.
pub async fn assemble_pptx(
    frames: Vec<PathBuf>,
    wide: bool,
    output: &Path,
) -> Result<PathBuf, ExportError> {
    let output = output.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<PathBuf, ExportError> {
        let mut deck = PptxDeck::new();
        if wide {
            deck.set_widescreen(true);
        }
        for frame in &frames {
            deck.add_image_slide(frame)?;
        }
        deck.write_to_file(&output)?;
        info!("Finished creating PowerPoint file: {}", output.display());
        Ok(output)
    })
    .await
    .map_err(|e| ExportError::Internal(format!("PPTX task panicked: {}", e)))?
}

// ── Static parts ─────────────────────────────────────────────────────────

fn put<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    body: &[u8],
    options: SimpleFileOptions,
) -> Result<(), ExportError> {
    zip.start_file(name, options)?;
    zip.write_all(body)
        .map_err(|e| ExportError::Package(format!("{name}: {e}")))
}

const EMPTY_GROUP_PROPS: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<Relationships xmlns="{NS_REL}">"#);
    for (id, kind, target) in entries {
        let _ = write!(
            xml,
            r#"<Relationship Id="{id}" Type="{REL_BASE}/{kind}" Target="{target}"/>"#
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn root_rels_xml() -> String {
    rels(&[("rId1", "officeDocument", "ppt/presentation.xml")])
}

fn slide_master_rels_xml() -> String {
    rels(&[
        ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
        ("rId2", "theme", "../theme/theme1.xml"),
    ])
}

fn slide_layout_rels_xml() -> String {
    rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")])
}

fn slide_rels_xml(n: usize) -> String {
    let image = format!("../media/image{n}.png");
    rels(&[
        ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
        ("rId2", "image", &image),
    ])
}

fn slide_master_xml() -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#);
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(EMPTY_GROUP_PROPS);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(concat!(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
        r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
        r#"hlink="hlink" folHlink="folHlink"/>"#
    ));
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    xml
}

fn slide_layout_xml() -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    let _ = write!(
        xml,
        r#"<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1">"#
    );
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree>"#);
    xml.push_str(EMPTY_GROUP_PROPS);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    xml
}

const THEME_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">"#,
    r#"<a:themeElements>"#,
    r#"<a:clrScheme name="Office">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
    r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="1F497D"/></a:dk2>"#,
    r#"<a:lt2><a:srgbClr val="EEECE1"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="4F81BD"/></a:accent1>"#,
    r#"<a:accent2><a:srgbClr val="C0504D"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="9BBB59"/></a:accent3>"#,
    r#"<a:accent4><a:srgbClr val="8064A2"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="4BACC6"/></a:accent5>"#,
    r#"<a:accent6><a:srgbClr val="F79646"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0000FF"/></a:hlink>"#,
    r#"<a:folHlink><a:srgbClr val="800080"/></a:folHlink>"#,
    r#"</a:clrScheme>"#,
    r#"<a:fontScheme name="Office">"#,
    r#"<a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    r#"</a:fontScheme>"#,
    r#"<a:fmtScheme name="Office">"#,
    r#"<a:fillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"</a:fillStyleLst>"#,
    r#"<a:lnStyleLst>"#,
    r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"</a:lnStyleLst>"#,
    r#"<a:effectStyleLst>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"</a:effectStyleLst>"#,
    r#"<a:bgFillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"</a:bgFillStyleLst>"#,
    r#"</a:fmtScheme>"#,
    r#"</a:themeElements>"#,
    r#"</a:theme>"#
);

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
