//! End-to-end export: frames aligned to steps, rendered to each format.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use framedoc_processing_core::step_align::align_procedure;
use framedoc_project_model::frame::{FrameCapture, FrameImage, ImageEncoding};
use framedoc_project_model::options::{ExportFormat, ExportOptions};
use framedoc_project_model::procedure::{Procedure, ProcedureStep};
use framedoc_render_engine::document::{
    build_document, ContentBlock, PREREQUISITES_HEADING, TROUBLESHOOTING_HEADING,
};
use framedoc_render_engine::{export_procedure, DocumentMetadata};

fn jpeg(width: u32, height: u32, shade: u8) -> FrameImage {
    let img = RgbImage::from_pixel(width, height, Rgb([shade, 128, 255 - shade]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    FrameImage::new(ImageEncoding::Jpeg, width, height, bytes)
}

fn corrupt() -> FrameImage {
    FrameImage::new(ImageEncoding::Png, 320, 180, vec![0x89, b'P', b'N', b'G', 0, 0])
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn three_step_procedure() -> Procedure {
    let mut procedure = Procedure::new("Calibrate the Scanner");
    procedure.overview = "Align the scan head.".into();
    procedure.steps = vec![
        ProcedureStep::new("Open settings"),
        ProcedureStep::new("Run calibration"),
        ProcedureStep::new("Confirm result"),
    ];
    procedure.verification = "Test scan is sharp.".into();
    procedure
}

#[test]
fn empty_sections_still_emit_headings() {
    let procedure = three_step_procedure();
    assert!(procedure.prerequisites.is_empty());
    assert!(procedure.troubleshooting.is_empty());

    let blocks = build_document(&procedure);
    for heading in [PREREQUISITES_HEADING, TROUBLESHOOTING_HEADING] {
        let matches = blocks
            .iter()
            .filter(|b| **b == ContentBlock::heading(2, heading))
            .count();
        assert_eq!(matches, 1, "{heading}");
    }
    assert_eq!(
        blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::Bullet { .. }))
            .count(),
        0
    );
}

#[test]
fn pdf_keeps_valid_images_when_one_is_corrupt() {
    let frames = vec![
        FrameCapture::new(5.0, jpeg(320, 180, 10)),
        FrameCapture::new(40.0, jpeg(320, 240, 80)),
        FrameCapture::new(45.0, corrupt()),
        FrameCapture::new(80.0, jpeg(180, 320, 200)),
    ];
    let aligned = align_procedure(&three_step_procedure(), &frames, Some(90.0));
    assert_eq!(aligned.procedure.frame_count(), 4);

    let metadata = DocumentMetadata::for_procedure(&aligned.procedure);
    let artifact = export_procedure(&aligned.procedure, &ExportOptions::default(), &metadata).unwrap();

    assert_eq!(count(&artifact.bytes, b"/Subtype /Image"), 3);
    assert_eq!(artifact.warnings.len(), 1);
    assert_eq!(artifact.filename, "calibrate-the-scanner-procedure.pdf");
}

#[test]
fn docx_keeps_valid_images_when_one_is_corrupt() {
    let frames = vec![
        FrameCapture::new(1.0, jpeg(64, 36, 30)),
        FrameCapture::new(2.0, corrupt()),
        FrameCapture::new(70.0, jpeg(64, 36, 90)),
    ];
    let aligned = align_procedure(&three_step_procedure(), &frames, Some(90.0));

    let options = ExportOptions {
        format: ExportFormat::Docx,
        ..ExportOptions::default()
    };
    let metadata = DocumentMetadata::for_procedure(&aligned.procedure);
    let artifact = export_procedure(&aligned.procedure, &options, &metadata).unwrap();

    assert!(artifact.bytes.starts_with(b"PK"));
    let archive = zip::ZipArchive::new(Cursor::new(&artifact.bytes)).unwrap();
    let media = archive
        .file_names()
        .filter(|name| name.starts_with("word/media/"))
        .count();
    assert_eq!(media, 2);
    assert_eq!(artifact.warnings.len(), 1);
}

#[test]
fn many_frames_paginate() {
    let frames: Vec<_> = (0..12)
        .map(|i| FrameCapture::new(i as f64 * 7.0, jpeg(160, 90, (i * 20) as u8)))
        .collect();
    let aligned = align_procedure(&three_step_procedure(), &frames, Some(90.0));
    let metadata = DocumentMetadata::for_procedure(&aligned.procedure);
    let artifact = export_procedure(&aligned.procedure, &ExportOptions::default(), &metadata).unwrap();

    assert_eq!(count(&artifact.bytes, b"/Subtype /Image"), 12);
    assert!(artifact.page_count.unwrap_or(0) > 1);
    assert!(artifact.warnings.is_empty());
}
