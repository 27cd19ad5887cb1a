//! PDF exporter.
//!
//! ```text
//! PageLayout
//!     ↓
//! [ContentStream] (placed elements → page operators)
//!     ↓
//! [PdfWriter] (objects, byte offsets, xref, trailer)
//!     ↓
//! PDF bytes
//! ```
//!
//! Text uses the standard Helvetica and Helvetica-Bold fonts with
//! WinAnsiEncoding, so nothing is embedded except the frame images, which
//! go in as DCTDecode (JPEG) XObjects.

use std::fmt::Write as _;
use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};

use framedoc_common::error::{ErrorKind, FramedocResult};
use framedoc_project_model::frame::{FrameImage, ImageEncoding};
use framedoc_project_model::options::{ExportFormat, PageGeometry, PT_PER_MM};

use crate::document::ContentBlock;
use crate::export::{DocumentMetadata, ExportWarning, Exporter, RenderedDocument};
use crate::images::prepare_image;
use crate::layout::{PageFlowLayout, PageLayout, PlacedElement, TextAlign};
use crate::metrics::TextMetrics;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// Renders blocks to PDF through [`PageFlowLayout`].
#[derive(Debug, Clone)]
pub struct PdfExporter {
    layout: PageFlowLayout,
}

impl PdfExporter {
    /// Fails with `LayoutOverflow` for degenerate geometry.
    pub fn new(geometry: PageGeometry) -> FramedocResult<Self> {
        Ok(Self {
            layout: PageFlowLayout::new(geometry)?,
        })
    }

    /// Serialize an existing layout.
    ///
    /// An image that cannot be decoded is skipped together with its caption
    /// and reported as a warning; everything else is still written.
    pub fn render_layout(&self, layout: &PageLayout, metadata: &DocumentMetadata) -> RenderedDocument {
        let geometry = &layout.geometry;
        let metrics = TextMetrics::new(&geometry.typography);
        let page_height_pt = geometry.page_height * PT_PER_MM;

        let mut writer = PdfWriter::new();
        let catalog_id = writer.reserve();
        let pages_id = writer.reserve();
        let regular_id = writer.reserve();
        let bold_id = writer.reserve();
        writer.write_object(
            regular_id,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        writer.write_object(
            bold_id,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        );

        let mut warnings = Vec::new();
        let mut skipped_sources = Vec::new();
        let mut streams: Vec<ContentStream> = (0..layout.page_count).map(|_| ContentStream::default()).collect();
        let mut page_images: Vec<Vec<(String, u32)>> = vec![Vec::new(); layout.page_count];

        for element in &layout.elements {
            if skipped_sources.contains(&element.source_index) {
                continue;
            }
            let Some(stream) = streams.get_mut(element.page) else {
                continue;
            };

            match &element.block {
                ContentBlock::Image { image, .. } if !element.is_caption => {
                    let jpeg = match embeddable_jpeg(image) {
                        Ok(jpeg) => jpeg,
                        Err(e) => {
                            tracing::warn!(block = element.source_index, error = %e, "Skipping image");
                            warnings.push(ExportWarning {
                                kind: ErrorKind::Render,
                                block_index: element.source_index,
                                detail: e.detail(),
                            });
                            skipped_sources.push(element.source_index);
                            continue;
                        }
                    };
                    let id = writer.reserve();
                    writer.write_stream(
                        id,
                        &format!(
                            "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
                            jpeg.width, jpeg.height
                        ),
                        &jpeg.bytes,
                    );
                    let name = format!("Im{id}");
                    stream.image(&name, element, page_height_pt);
                    page_images[element.page].push((name, id));
                }
                _ => stream.text(element, &metrics, page_height_pt),
            }
        }

        let width_pt = geometry.page_width * PT_PER_MM;
        let mut kids = Vec::with_capacity(layout.page_count);
        for (stream, images) in streams.into_iter().zip(page_images) {
            let content_id = writer.reserve();
            writer.write_stream(content_id, "", stream.as_bytes());

            let mut xobjects = String::new();
            for (name, id) in &images {
                let _ = write!(xobjects, "/{name} {id} 0 R ");
            }
            let page_id = writer.reserve();
            writer.write_object(
                page_id,
                &format!(
                    "<< /Type /Page /Parent {pages_id} 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /{FONT_REGULAR} {regular_id} 0 R /{FONT_BOLD} {bold_id} 0 R >> \
                     /XObject << {xobjects}>> >> /Contents {content_id} 0 R >>",
                    num(width_pt),
                    num(page_height_pt)
                ),
            );
            kids.push(format!("{page_id} 0 R"));
        }

        writer.write_object(
            pages_id,
            &format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                kids.len()
            ),
        );
        writer.write_object(
            catalog_id,
            &format!("<< /Type /Catalog /Pages {pages_id} 0 R >>"),
        );

        let info_id = writer.reserve();
        let mut info = b"<< /Title ".to_vec();
        info.extend(pdf_string(&metadata.title));
        info.extend(
            format!(
                " /Producer (framedoc) /CreationDate (D:{}+00'00') >>",
                metadata.generated_at.format("%Y%m%d%H%M%S")
            )
            .into_bytes(),
        );
        writer.write_object_bytes(info_id, &info);

        let bytes = writer.finish(catalog_id, info_id);
        tracing::info!(
            pages = layout.page_count,
            bytes = bytes.len(),
            skipped_images = warnings.len(),
            "Rendered PDF"
        );

        RenderedDocument {
            bytes,
            warnings,
            page_count: Some(layout.page_count),
        }
    }
}

impl Exporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn render(&self, blocks: &[ContentBlock], metadata: &DocumentMetadata) -> FramedocResult<RenderedDocument> {
        let layout = self.layout.layout(blocks);
        Ok(self.render_layout(&layout, metadata))
    }
}

/// JPEG bytes a PDF viewer can draw with DCTDecode and DeviceRGB.
///
/// RGB JPEGs pass through unchanged; anything else is decoded and
/// re-encoded.
fn embeddable_jpeg(image: &FrameImage) -> FramedocResult<FrameImage> {
    if image.encoding == ImageEncoding::Jpeg {
        if let Ok(decoder) = JpegDecoder::new(Cursor::new(&image.bytes)) {
            if decoder.color_type() == ColorType::Rgb8 {
                let (width, height) = decoder.dimensions();
                return Ok(FrameImage::new(
                    ImageEncoding::Jpeg,
                    width,
                    height,
                    image.bytes.clone(),
                ));
            }
        }
    }
    prepare_image(image, 0)
}

/// Operators for one page's content stream.
#[derive(Debug, Default)]
struct ContentStream {
    buf: Vec<u8>,
}

impl ContentStream {
    fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn text(&mut self, element: &PlacedElement, metrics: &TextMetrics, page_height_pt: f64) {
        if element.lines.is_empty() {
            return;
        }
        let font = if element.bold { FONT_BOLD } else { FONT_REGULAR };
        let size = element.font_size;
        let size_mm = size / PT_PER_MM;
        let line_height = element.height / element.lines.len() as f64;

        for (i, line) in element.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let x = match element.align {
                TextAlign::Left => element.x,
                TextAlign::Center => {
                    let w = metrics.width(line, size, element.bold);
                    element.x + ((element.width - w) / 2.0).max(0.0)
                }
            };
            let baseline = element.y + i as f64 * line_height + (line_height - size_mm) / 2.0 + size_mm * 0.8;

            self.buf.extend(
                format!(
                    "BT /{font} {} Tf {} {} Td ",
                    num(size),
                    num(x * PT_PER_MM),
                    num(page_height_pt - baseline * PT_PER_MM)
                )
                .into_bytes(),
            );
            self.buf.extend(pdf_string(line));
            self.buf.extend(b" Tj ET\n");
        }
    }

    fn image(&mut self, name: &str, element: &PlacedElement, page_height_pt: f64) {
        let w = element.width * PT_PER_MM;
        let h = element.height * PT_PER_MM;
        let x = element.x * PT_PER_MM;
        let y = page_height_pt - element.bottom() * PT_PER_MM;
        self.buf.extend(
            format!(
                "q {} 0 0 {} {} {} cm /{name} Do Q\n",
                num(w),
                num(h),
                num(x),
                num(y)
            )
            .into_bytes(),
        );
    }
}

/// Sequential object writer tracking byte offsets for the xref table.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Allocate an object number to be written later.
    fn reserve(&mut self) -> u32 {
        self.offsets.push(0);
        self.offsets.len() as u32
    }

    fn begin(&mut self, id: u32) {
        self.offsets[id as usize - 1] = self.buf.len();
        self.buf.extend(format!("{id} 0 obj\n").into_bytes());
    }

    fn write_object(&mut self, id: u32, body: &str) {
        self.write_object_bytes(id, body.as_bytes());
    }

    fn write_object_bytes(&mut self, id: u32, body: &[u8]) {
        self.begin(id);
        self.buf.extend(body);
        self.buf.extend(b"\nendobj\n");
    }

    fn write_stream(&mut self, id: u32, dict_entries: &str, data: &[u8]) {
        self.begin(id);
        let sep = if dict_entries.is_empty() { "" } else { " " };
        self.buf
            .extend(format!("<< {dict_entries}{sep}/Length {} >>\nstream\n", data.len()).into_bytes());
        self.buf.extend(data);
        self.buf.extend(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, root: u32, info: u32) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;
        self.buf.extend(format!("xref\n0 {size}\n0000000000 65535 f \n").into_bytes());
        for offset in &self.offsets {
            self.buf.extend(format!("{offset:010} 00000 n \n").into_bytes());
        }
        self.buf.extend(
            format!(
                "trailer\n<< /Size {size} /Root {root} 0 R /Info {info} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
            )
            .into_bytes(),
        );
        self.buf
    }
}

/// A number formatted for PDF operators: two decimals, no exponent.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// A literal string `( ... )` in WinAnsiEncoding.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            ' '..='~' => out.push(c as u8),
            _ => {
                let byte = win_ansi(c).unwrap_or(b'?');
                out.extend(format!("\\{byte:03o}").into_bytes());
            }
        }
    }
    out.push(b')');
    out
}

/// WinAnsiEncoding code for non-ASCII characters the base fonts carry.
fn win_ansi(c: char) -> Option<u8> {
    let code = match c {
        '\u{20AC}' => 0x80,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{2122}' => 0x99,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::test_images;
    use chrono::{TimeZone, Utc};

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            title: "Fix (the) printer".into(),
            generated_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap(),
        }
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_pdf_structure() {
        let exporter = PdfExporter::new(PageGeometry::a4()).unwrap();
        let blocks = vec![
            ContentBlock::heading(1, "Fix (the) printer"),
            ContentBlock::bullet("Unplug it", 0),
        ];
        let doc = exporter.render(&blocks, &metadata()).unwrap();
        let bytes = &doc.bytes;

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(doc.page_count, Some(1));
        assert_eq!(count(bytes, b"/Type /Page "), 1);
        assert_eq!(count(bytes, b"(Fix \\(the\\) printer) Tj"), 1);
        assert_eq!(count(bytes, b"(\\225 Unplug it) Tj"), 1);
        assert_eq!(count(bytes, b"/CreationDate (D:20240309140500+00'00')"), 1);
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let exporter = PdfExporter::new(PageGeometry::a4()).unwrap();
        let doc = exporter
            .render(&[ContentBlock::paragraph("hello")], &metadata())
            .unwrap();
        let marker = doc
            .bytes
            .windows(10)
            .rposition(|w| w == b"startxref\n")
            .unwrap();
        let tail = std::str::from_utf8(&doc.bytes[marker + 10..]).unwrap();
        let xref_at: usize = tail.lines().next().unwrap().parse().unwrap();
        let xref = std::str::from_utf8(&doc.bytes[xref_at..]).unwrap();
        assert!(xref.starts_with("xref"));

        let entries: Vec<usize> = xref
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert!(doc.bytes[*offset..].starts_with(expected.as_bytes()));
        }
    }

    #[test]
    fn test_corrupt_image_skipped_with_caption() {
        let exporter = PdfExporter::new(PageGeometry::a4()).unwrap();
        let blocks = vec![
            ContentBlock::image(test_images::png(64, 36), "Step 1 - 00:00:01"),
            ContentBlock::image(test_images::corrupt(), "Step 1 - 00:00:02"),
            ContentBlock::image(test_images::png(64, 48), "Step 2 - 00:00:03"),
        ];
        let doc = exporter.render(&blocks, &metadata()).unwrap();

        assert_eq!(count(&doc.bytes, b"/Subtype /Image"), 2);
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].block_index, 1);
        assert_eq!(doc.warnings[0].kind, ErrorKind::Render);
        assert_eq!(count(&doc.bytes, b"00:00:02"), 0);
        assert_eq!(count(&doc.bytes, b"00:00:03"), 1);
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(595.2756), "595.28");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(0.5), "0.5");
    }

    #[test]
    fn test_win_ansi_mapping() {
        assert_eq!(pdf_string("é"), b"(\\351)".to_vec());
        assert_eq!(pdf_string("\u{1F4A1}"), b"(\\077)".to_vec());
    }
}
