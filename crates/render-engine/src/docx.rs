//! DOCX (Office Open XML) flow-document exporter.
//!
//! Blocks are streamed straight into `word/document.xml` with no page
//! layout; the word processor reflows them. Frame images are stored under
//! `word/media/` and referenced by relationship id.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use framedoc_common::error::{ErrorKind, FramedocError, FramedocResult};
use framedoc_project_model::frame::FrameImage;
use framedoc_project_model::options::{ExportFormat, MAX_IMAGE_SCALE_PERCENT, MIN_IMAGE_SCALE_PERCENT};

use crate::document::ContentBlock;
use crate::export::{DocumentMetadata, ExportWarning, Exporter, RenderedDocument};

const EMU_PER_INCH: u64 = 914_400;
/// Full-width image size before scaling.
const FULL_IMAGE_WIDTH_INCHES: f64 = 6.0;
/// Indent for sub-steps, warnings and tips (half an inch).
const INDENT_TWIPS: u32 = 720;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

/// Headings in the red accent color used across framedoc documents.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="24"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="CC0000"/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:color w:val="CC0000"/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Caption"><w:name w:val="caption"/><w:basedOn w:val="Normal"/><w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:i/><w:sz w:val="20"/></w:rPr></w:style></w:styles>"#;

const DOCUMENT_NS: [(&str, &str); 5] = [
    ("xmlns:w", "http://schemas.openxmlformats.org/wordprocessingml/2006/main"),
    ("xmlns:r", "http://schemas.openxmlformats.org/officeDocument/2006/relationships"),
    ("xmlns:wp", "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"),
    ("xmlns:a", "http://schemas.openxmlformats.org/drawingml/2006/main"),
    ("xmlns:pic", "http://schemas.openxmlformats.org/drawingml/2006/picture"),
];

const CORE_NS: [(&str, &str); 4] = [
    ("xmlns:cp", "http://schemas.openxmlformats.org/package/2006/metadata/core-properties"),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:dcterms", "http://purl.org/dc/terms/"),
    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
];

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const STYLES_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const PICTURE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Streams blocks into a `.docx` package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocxExporter {
    image_scale_percent: u8,
}

impl Default for DocxExporter {
    fn default() -> Self {
        Self::new(MAX_IMAGE_SCALE_PERCENT)
    }
}

/// An image accepted for the package.
struct MediaPart {
    rel_id: String,
    path: String,
    bytes: Vec<u8>,
}

impl DocxExporter {
    /// `image_scale_percent` is clamped to 10-100.
    pub fn new(image_scale_percent: u8) -> Self {
        Self {
            image_scale_percent: image_scale_percent
                .clamp(MIN_IMAGE_SCALE_PERCENT, MAX_IMAGE_SCALE_PERCENT),
        }
    }

    fn image_extent(&self, width_px: u32, height_px: u32) -> (u64, u64) {
        let scale = f64::from(self.image_scale_percent) / 100.0;
        let cx = (FULL_IMAGE_WIDTH_INCHES * scale * EMU_PER_INCH as f64).round();
        let aspect = if width_px == 0 {
            0.0
        } else {
            f64::from(height_px) / f64::from(width_px)
        };
        (cx as u64, (cx * aspect).round() as u64)
    }

    /// `word/document.xml`, plus the images it references.
    fn document(
        &self,
        blocks: &[ContentBlock],
    ) -> FramedocResult<(Vec<u8>, Vec<MediaPart>, Vec<ExportWarning>)> {
        let mut xml = XmlPart::new()?;
        let mut media = Vec::new();
        let mut warnings = Vec::new();

        xml.start("w:document", &DOCUMENT_NS)?;
        xml.start("w:body", &[])?;

        for (index, block) in blocks.iter().enumerate() {
            match block {
                ContentBlock::Heading { level, text } => {
                    let style = if *level <= 1 { "Heading1" } else { "Heading2" };
                    styled_paragraph(&mut xml, style, text)?;
                }
                ContentBlock::Paragraph { text } => {
                    xml.start("w:p", &[])?;
                    run(&mut xml, text, false)?;
                    xml.end("w:p")?;
                }
                ContentBlock::Bullet { text, indent } => {
                    prefixed(&mut xml, text, "\u{2022} ", INDENT_TWIPS * u32::from(*indent))?;
                }
                ContentBlock::Warning { text } => {
                    prefixed(&mut xml, text, "\u{26A0}\u{FE0F} ", INDENT_TWIPS)?;
                }
                ContentBlock::Tip { text } => {
                    prefixed(&mut xml, text, "\u{1F4A1} ", INDENT_TWIPS)?;
                }
                ContentBlock::Image { image, caption, .. } => {
                    let (width, height, extension) = match inspect(image) {
                        Ok(header) => header,
                        Err(e) => {
                            tracing::warn!(block = index, error = %e, "Skipping image");
                            warnings.push(ExportWarning {
                                kind: ErrorKind::Render,
                                block_index: index,
                                detail: e.detail(),
                            });
                            continue;
                        }
                    };
                    let n = media.len() + 1;
                    let rel_id = format!("rIdImg{n}");
                    let (cx, cy) = self.image_extent(width, height);
                    drawing(&mut xml, &rel_id, n, cx, cy)?;
                    styled_paragraph(&mut xml, "Caption", caption)?;
                    media.push(MediaPart {
                        rel_id,
                        path: format!("media/image{n}.{extension}"),
                        bytes: image.bytes.clone(),
                    });
                }
            }
        }

        xml.start("w:sectPr", &[])?;
        xml.empty("w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
        xml.empty(
            "w:pgMar",
            &[
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
                ("w:header", "708"),
                ("w:footer", "708"),
                ("w:gutter", "0"),
            ],
        )?;
        xml.end("w:sectPr")?;
        xml.end("w:body")?;
        xml.end("w:document")?;

        Ok((xml.finish(), media, warnings))
    }
}

impl Exporter for DocxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn render(&self, blocks: &[ContentBlock], metadata: &DocumentMetadata) -> FramedocResult<RenderedDocument> {
        let (document, media, warnings) = self.document(blocks)?;
        let rels = document_rels(&media)?;
        let core = core_properties(metadata)?;

        let mut package = Package::new();
        package.add("[Content_Types].xml", CONTENT_TYPES.as_bytes(), true)?;
        package.add("_rels/.rels", PACKAGE_RELS.as_bytes(), true)?;
        package.add("docProps/core.xml", &core, true)?;
        package.add("word/document.xml", &document, true)?;
        package.add("word/styles.xml", STYLES.as_bytes(), true)?;
        package.add("word/_rels/document.xml.rels", &rels, true)?;
        for part in &media {
            package.add(&format!("word/{}", part.path), &part.bytes, false)?;
        }
        let bytes = package.finish()?;

        tracing::info!(
            blocks = blocks.len(),
            images = media.len(),
            skipped_images = warnings.len(),
            bytes = bytes.len(),
            "Rendered DOCX"
        );

        Ok(RenderedDocument {
            bytes,
            warnings,
            page_count: None,
        })
    }
}

/// `word/_rels/document.xml.rels`: the styles part and one entry per image.
fn document_rels(media: &[MediaPart]) -> FramedocResult<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start("Relationships", &[("xmlns", RELS_NS)])?;
    xml.empty(
        "Relationship",
        &[("Id", "rId1"), ("Type", STYLES_REL), ("Target", "styles.xml")],
    )?;
    for part in media {
        xml.empty(
            "Relationship",
            &[
                ("Id", part.rel_id.as_str()),
                ("Type", IMAGE_REL),
                ("Target", part.path.as_str()),
            ],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml.finish())
}

/// `docProps/core.xml`.
fn core_properties(metadata: &DocumentMetadata) -> FramedocResult<Vec<u8>> {
    let created = metadata.generated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut xml = XmlPart::new()?;
    xml.start("cp:coreProperties", &CORE_NS)?;
    xml.element("dc:title", &[], &metadata.title)?;
    xml.element("dc:creator", &[], "framedoc")?;
    xml.element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

/// One XML package part, written event by event.
struct XmlPart {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlPart {
    fn new() -> FramedocResult<Self> {
        let mut part = Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        };
        part.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(part)
    }

    fn event(&mut self, event: Event<'_>) -> FramedocResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| FramedocError::render(format!("xml write: {e}")))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> FramedocResult<()> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(tag))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> FramedocResult<()> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(tag))
    }

    fn end(&mut self, name: &str) -> FramedocResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// Escaped character data; characters XML 1.0 cannot carry are dropped.
    fn text(&mut self, text: &str) -> FramedocResult<()> {
        let text = xml_chars(text);
        self.event(Event::Text(BytesText::new(&text)))
    }

    fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> FramedocResult<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

/// Zip container for the package parts.
struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl Package {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Media is stored as-is; it is already compressed.
    fn add(&mut self, name: &str, data: &[u8], compress: bool) -> FramedocResult<()> {
        let method = if compress {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        let options = SimpleFileOptions::default().compression_method(method);
        self.zip
            .start_file(name, options)
            .map_err(|e| FramedocError::render(format!("zip entry {name}: {e}")))?;
        self.zip.write_all(data)?;
        Ok(())
    }

    fn finish(self) -> FramedocResult<Vec<u8>> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| FramedocError::render(format!("zip finish: {e}")))?;
        Ok(cursor.into_inner())
    }
}

/// Dimensions and file extension from the image header.
fn inspect(image: &FrameImage) -> FramedocResult<(u32, u32, &'static str)> {
    let reader = image::ImageReader::new(Cursor::new(&image.bytes))
        .with_guessed_format()
        .map_err(|e| FramedocError::render(format!("cannot read image: {e}")))?;
    let extension = match reader.format() {
        Some(image::ImageFormat::Jpeg) => "jpeg",
        Some(image::ImageFormat::Png) => "png",
        Some(other) => {
            return Err(FramedocError::render(format!(
                "unsupported image format {other:?}"
            )))
        }
        None => return Err(FramedocError::render("cannot decode image: unknown format")),
    };
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| FramedocError::render(format!("cannot decode image: {e}")))?;
    if width == 0 || height == 0 {
        return Err(FramedocError::render("image has zero size"));
    }
    Ok((width, height, extension))
}

fn run(xml: &mut XmlPart, text: &str, bold: bool) -> FramedocResult<()> {
    xml.start("w:r", &[])?;
    if bold {
        xml.start("w:rPr", &[])?;
        xml.empty("w:b", &[])?;
        xml.end("w:rPr")?;
    }
    xml.element("w:t", &[("xml:space", "preserve")], text)?;
    xml.end("w:r")
}

fn styled_paragraph(xml: &mut XmlPart, style: &str, text: &str) -> FramedocResult<()> {
    xml.start("w:p", &[])?;
    xml.start("w:pPr", &[])?;
    xml.empty("w:pStyle", &[("w:val", style)])?;
    xml.end("w:pPr")?;
    run(xml, text, false)?;
    xml.end("w:p")
}

/// Paragraph with a bold marker run in front of the text.
fn prefixed(xml: &mut XmlPart, text: &str, marker: &str, indent_twips: u32) -> FramedocResult<()> {
    xml.start("w:p", &[])?;
    if indent_twips > 0 {
        xml.start("w:pPr", &[])?;
        let indent = indent_twips.to_string();
        xml.empty("w:ind", &[("w:left", indent.as_str())])?;
        xml.end("w:pPr")?;
    }
    run(xml, marker, true)?;
    run(xml, text, false)?;
    xml.end("w:p")
}

fn drawing(xml: &mut XmlPart, rel_id: &str, n: usize, cx: u64, cy: u64) -> FramedocResult<()> {
    let (id, cx, cy) = (n.to_string(), cx.to_string(), cy.to_string());
    let zero = "0";

    xml.start("w:p", &[])?;
    xml.start("w:pPr", &[])?;
    xml.empty("w:jc", &[("w:val", "center")])?;
    xml.end("w:pPr")?;
    xml.start("w:r", &[])?;
    xml.start("w:drawing", &[])?;
    xml.start(
        "wp:inline",
        &[("distT", zero), ("distB", zero), ("distL", zero), ("distR", zero)],
    )?;
    xml.empty("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    let (picture, image) = (format!("Picture {n}"), format!("image{n}"));
    xml.empty("wp:docPr", &[("id", id.as_str()), ("name", picture.as_str())])?;
    xml.start("wp:cNvGraphicFramePr", &[])?;
    xml.empty("a:graphicFrameLocks", &[("noChangeAspect", "1")])?;
    xml.end("wp:cNvGraphicFramePr")?;
    xml.start("a:graphic", &[])?;
    xml.start("a:graphicData", &[("uri", PICTURE_URI)])?;
    xml.start("pic:pic", &[])?;

    xml.start("pic:nvPicPr", &[])?;
    xml.empty("pic:cNvPr", &[("id", id.as_str()), ("name", image.as_str())])?;
    xml.empty("pic:cNvPicPr", &[])?;
    xml.end("pic:nvPicPr")?;

    xml.start("pic:blipFill", &[])?;
    xml.empty("a:blip", &[("r:embed", rel_id)])?;
    xml.start("a:stretch", &[])?;
    xml.empty("a:fillRect", &[])?;
    xml.end("a:stretch")?;
    xml.end("pic:blipFill")?;

    xml.start("pic:spPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", zero), ("y", zero)])?;
    xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.end("a:xfrm")?;
    xml.start("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.end("a:prstGeom")?;
    xml.end("pic:spPr")?;

    xml.end("pic:pic")?;
    xml.end("a:graphicData")?;
    xml.end("a:graphic")?;
    xml.end("wp:inline")?;
    xml.end("w:drawing")?;
    xml.end("w:r")?;
    xml.end("w:p")
}

/// `text` without the control characters XML 1.0 cannot carry.
fn xml_chars(text: &str) -> Cow<'_, str> {
    let allowed = |c: char| c >= ' ' || matches!(c, '\t' | '\n' | '\r');
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| allowed(c)).collect())
    }
}
