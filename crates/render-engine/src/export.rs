//! Export pipeline: procedure in, downloadable document bytes out.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use framedoc_common::error::{ErrorKind, FramedocResult};
use framedoc_project_model::options::{ExportFormat, ExportOptions};
use framedoc_project_model::procedure::Procedure;

use crate::document::{ContentBlock, DocumentBuilder};
use crate::docx::DocxExporter;
use crate::images::prepare_image;
use crate::pdf::PdfExporter;
use crate::text::TextExporter;

/// Document-level metadata passed to every renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub generated_at: DateTime<Utc>,
}

impl DocumentMetadata {
    /// Metadata for `procedure`, stamped with the current time.
    pub fn for_procedure(procedure: &Procedure) -> Self {
        Self {
            title: procedure.title.clone(),
            generated_at: Utc::now(),
        }
    }
}

/// A recoverable problem hit while exporting (e.g. an image that could not
/// be decoded and was left out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportWarning {
    pub kind: ErrorKind,
    /// Index of the offending block in the document model.
    pub block_index: usize,
    pub detail: String,
}

/// Output of one renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub warnings: Vec<ExportWarning>,
    /// Page count for paginated formats.
    pub page_count: Option<usize>,
}

/// Trait for document renderers (PDF, DOCX, text).
///
/// Renderers do not mutate their input. A block that cannot be rendered is
/// skipped and reported in [`RenderedDocument::warnings`].
pub trait Exporter {
    /// Format this renderer produces.
    fn format(&self) -> ExportFormat;

    /// Renderer name, for logs.
    fn name(&self) -> &str;

    /// Render `blocks` to bytes.
    fn render(&self, blocks: &[ContentBlock], metadata: &DocumentMetadata) -> FramedocResult<RenderedDocument>;
}

/// The renderer for `options.format`.
pub fn exporter_for(options: &ExportOptions) -> FramedocResult<Box<dyn Exporter>> {
    Ok(match options.format {
        ExportFormat::Pdf => Box::new(PdfExporter::new(options.geometry)?),
        ExportFormat::Docx => Box::new(DocxExporter::new(options.image_scale_percent())),
        ExportFormat::Text => Box::new(TextExporter),
    })
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    BuildingDocument,
    PreparingImages,
    Rendering,
    Complete,
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportStage) + Send>;

/// A finished export ready to be offered for download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// Suggested file name, e.g. `reset-the-router-procedure.pdf`.
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub warnings: Vec<ExportWarning>,
    pub page_count: Option<usize>,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its suggested name.
    pub fn write_to(&self, dir: &Path) -> FramedocResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Export `procedure` in the format and geometry given by `options`.
///
/// This is the main entry point for rendering.
pub fn export_procedure(
    procedure: &Procedure,
    options: &ExportOptions,
    metadata: &DocumentMetadata,
) -> FramedocResult<ExportArtifact> {
    export_procedure_with_progress(procedure, options, metadata, None)
}

/// [`export_procedure`] reporting each stage to `progress`.
pub fn export_procedure_with_progress(
    procedure: &Procedure,
    options: &ExportOptions,
    metadata: &DocumentMetadata,
    progress: Option<ProgressCallback>,
) -> FramedocResult<ExportArtifact> {
    let report = |stage| {
        if let Some(cb) = &progress {
            cb(stage);
        }
    };

    tracing::info!(
        title = %procedure.title,
        format = ?options.format,
        steps = procedure.steps.len(),
        frames = procedure.frame_count(),
        "Starting export"
    );

    // Degenerate geometry is fatal before any work is done.
    report(ExportStage::Preparing);
    options.geometry.validate()?;
    let exporter = exporter_for(options)?;

    report(ExportStage::BuildingDocument);
    let blocks = DocumentBuilder::from_options(options).build(procedure);

    // Warning indices refer to `blocks`; `source_index` maps rendered
    // positions back to them.
    let (mut blocks, mut source_index, mut warnings) = if options.format == ExportFormat::Text {
        let n = blocks.len();
        (blocks, (0..n).collect::<Vec<_>>(), vec![])
    } else {
        report(ExportStage::PreparingImages);
        prepare_images(blocks, options.pdf_image_size.max_width_px())
    };

    if options.format == ExportFormat::Pdf {
        let stamp = metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC");
        // Below the title; attributed to it.
        let at = blocks.len().min(1);
        blocks.insert(at, ContentBlock::paragraph(format!("Generated: {stamp}")));
        source_index.insert(at, source_index.first().copied().unwrap_or(0));
    }

    report(ExportStage::Rendering);
    tracing::debug!(renderer = exporter.name(), blocks = blocks.len(), "Rendering");
    let rendered = exporter.render(&blocks, metadata)?;
    warnings.extend(rendered.warnings.into_iter().map(|mut w| {
        w.block_index = source_index.get(w.block_index).copied().unwrap_or(w.block_index);
        w
    }));

    let artifact = ExportArtifact {
        filename: procedure.suggested_filename(options.format.extension()),
        mime_type: options.format.mime_type(),
        bytes: rendered.bytes,
        warnings,
        page_count: rendered.page_count,
    };

    report(ExportStage::Complete);
    tracing::info!(
        filename = %artifact.filename,
        bytes = artifact.bytes.len(),
        warnings = artifact.warnings.len(),
        "Export complete"
    );
    Ok(artifact)
}

/// Decode and downscale every image block.
///
/// Images that fail to decode are dropped so the layout closes the gap, and
/// reported as warnings. Returns the surviving blocks, each one's index in
/// the input, and the warnings.
fn prepare_images(
    blocks: Vec<ContentBlock>,
    max_width: u32,
) -> (Vec<ContentBlock>, Vec<usize>, Vec<ExportWarning>) {
    let mut kept = Vec::with_capacity(blocks.len());
    let mut source_index = Vec::with_capacity(blocks.len());
    let mut warnings = Vec::new();

    for (index, block) in blocks.into_iter().enumerate() {
        let block = match block {
            ContentBlock::Image { image, caption, .. } => match prepare_image(&image, max_width) {
                Ok(prepared) => ContentBlock::image(prepared, caption),
                Err(e) => {
                    tracing::warn!(block = index, caption = %caption, error = %e, "Dropping image");
                    warnings.push(ExportWarning {
                        kind: ErrorKind::Render,
                        block_index: index,
                        detail: format!("{caption}: {}", e.detail()),
                    });
                    continue;
                }
            },
            other => other,
        };
        kept.push(block);
        source_index.push(index);
    }

    (kept, source_index, warnings)
}
