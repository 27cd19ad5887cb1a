//! Export a session's procedure as a document.

use std::path::PathBuf;

use framedoc_project_model::options::{ExportOptions, PageGeometry};
use framedoc_render_engine::export::{export_procedure_with_progress, DocumentMetadata, ExportStage};

use super::load_session;

/// Command-line overrides on top of the session's export settings.
pub struct Overrides {
    pub format: Option<String>,
    pub image_scale: Option<u8>,
    pub image_size: Option<String>,
    pub page_size: Option<String>,
    pub include_frames: bool,
    pub include_token_usage: bool,
}

impl Overrides {
    fn apply(self, base: &ExportOptions) -> anyhow::Result<ExportOptions> {
        let mut options = base.clone();
        if let Some(format) = self.format {
            options.format = format.parse()?;
        }
        if let Some(size) = self.image_size {
            options.pdf_image_size = size.parse()?;
        }
        if let Some(page) = self.page_size {
            options.geometry = PageGeometry {
                image_scale_percent: options.geometry.image_scale_percent,
                ..PageGeometry::preset(&page)?
            };
        }
        if let Some(scale) = self.image_scale {
            options.geometry = options.geometry.with_image_scale(scale);
        }
        options.include_frames &= self.include_frames;
        options.include_token_usage &= self.include_token_usage;
        Ok(options)
    }
}

pub fn run(path: PathBuf, output: Option<PathBuf>, overrides: Overrides) -> anyhow::Result<()> {
    println!("Exporting session at: {}", path.display());

    let session = load_session(&path)?;
    let procedure = session
        .procedure
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No procedure attached; run `framedoc attach` first"))?;
    let options = overrides.apply(&session.session.export)?;

    println!("  Procedure: {}", procedure.title);
    println!("  Format: {}", options.format.extension());
    println!(
        "  Page: {:.0}x{:.0}mm, images at {}%",
        options.geometry.page_width,
        options.geometry.page_height,
        options.image_scale_percent()
    );
    println!("  Frames: {}", procedure.frame_count());

    let metadata = DocumentMetadata::for_procedure(procedure);
    let artifact = export_procedure_with_progress(
        procedure,
        &options,
        &metadata,
        Some(Box::new(|stage| {
            let label = match stage {
                ExportStage::Preparing => "Preparing",
                ExportStage::BuildingDocument => "Building document",
                ExportStage::PreparingImages => "Preparing images",
                ExportStage::Rendering => "Rendering",
                ExportStage::Complete => "Complete",
            };
            tracing::debug!("Export stage: {label}");
        })),
    )?;

    let dir = output.unwrap_or_else(|| session.exports_dir());
    let written = artifact.write_to(&dir)?;

    println!();
    println!("Export complete: {}", written.display());
    println!("  Size: {} bytes", artifact.bytes.len());
    if let Some(pages) = artifact.page_count {
        println!("  Pages: {pages}");
    }
    if !artifact.warnings.is_empty() {
        println!("\n{} item(s) were left out:", artifact.warnings.len());
        for warning in &artifact.warnings {
            println!("  - {}", warning.detail);
        }
    }

    Ok(())
}
