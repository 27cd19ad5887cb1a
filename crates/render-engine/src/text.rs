//! Plain-text exporter, for pasting a procedure into chats and tickets.

use framedoc_common::error::FramedocResult;
use framedoc_project_model::options::ExportFormat;

use crate::document::ContentBlock;
use crate::export::{DocumentMetadata, Exporter, RenderedDocument};

/// Renders blocks as UTF-8 text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextExporter;

impl TextExporter {
    pub fn render_string(&self, blocks: &[ContentBlock]) -> String {
        let mut out = String::new();
        for block in blocks {
            match block {
                ContentBlock::Heading { level, text } => {
                    if !out.is_empty() && !out.ends_with("\n\n") {
                        out.push('\n');
                    }
                    out.push_str(text);
                    out.push('\n');
                    if *level <= 1 {
                        out.push('\n');
                    }
                }
                ContentBlock::Paragraph { text } => {
                    out.push_str(text);
                    out.push('\n');
                }
                ContentBlock::Bullet { text, indent } => {
                    out.push_str(&"   ".repeat(usize::from(*indent)));
                    out.push_str("- ");
                    out.push_str(text);
                    out.push('\n');
                }
                ContentBlock::Warning { text } => {
                    out.push_str("   \u{26A0}\u{FE0F} ");
                    out.push_str(text);
                    out.push('\n');
                }
                ContentBlock::Tip { text } => {
                    out.push_str("   \u{1F4A1} ");
                    out.push_str(text);
                    out.push('\n');
                }
                ContentBlock::Image { caption, .. } => {
                    out.push_str("   [image: ");
                    out.push_str(caption);
                    out.push_str("]\n");
                }
            }
        }
        out
    }
}

impl Exporter for TextExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Text
    }

    fn name(&self) -> &str {
        "text"
    }

    fn render(&self, blocks: &[ContentBlock], _metadata: &DocumentMetadata) -> FramedocResult<RenderedDocument> {
        Ok(RenderedDocument {
            bytes: self.render_string(blocks).into_bytes(),
            warnings: vec![],
            page_count: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::build_document;
    use framedoc_project_model::procedure::{Procedure, ProcedureStep};

    #[test]
    fn test_text_shape() {
        let mut procedure = Procedure::new("Clean the filter");
        procedure.overview = "Monthly maintenance.".into();
        procedure.prerequisites = vec!["Screwdriver".into()];
        let mut step = ProcedureStep::new("Remove cover");
        step.sub = vec!["Loosen two screws".into()];
        step.warnings = vec!["Power off first".into()];
        procedure.steps = vec![step];
        procedure.verification = "Airflow restored.".into();

        let text = TextExporter.render_string(&build_document(&procedure));
        let expected = [
            "Clean the filter",
            "",
            "Overview",
            "Monthly maintenance.",
            "",
            "Prerequisites",
            "- Screwdriver",
            "",
            "Procedure",
            "",
            "1. Remove cover",
            "   - Loosen two screws",
            "   \u{26A0}\u{FE0F} Power off first",
            "",
            "Verification",
            "Airflow restored.",
            "",
            "Troubleshooting",
            "",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }
}
