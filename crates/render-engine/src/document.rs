//! Document model: a procedure as an ordered list of typed content blocks.
//!
//! Blocks carry no page coordinates and no target-format details. The PDF
//! path lays them out onto pages; the DOCX and text paths stream them.

use framedoc_project_model::frame::FrameImage;
use framedoc_project_model::options::ExportOptions;
use framedoc_project_model::procedure::{Procedure, TokenUsage};

/// Section heading texts, in document order.
pub const OVERVIEW_HEADING: &str = "Overview";
pub const PREREQUISITES_HEADING: &str = "Prerequisites";
pub const PROCEDURE_HEADING: &str = "Procedure";
pub const VERIFICATION_HEADING: &str = "Verification";
pub const TROUBLESHOOTING_HEADING: &str = "Troubleshooting";
pub const TOKEN_USAGE_HEADING: &str = "Token Usage & Cost";

/// One logical unit of document content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Level 1 is the document title; level 2 is a section or step heading.
    Heading { level: u8, text: String },
    Paragraph { text: String },
    /// Indent 0 for top-level lists, 1 for sub-steps.
    Bullet { text: String, indent: u8 },
    Warning { text: String },
    Tip { text: String },
    Image {
        image: FrameImage,
        caption: String,
        /// Height divided by width.
        aspect_ratio: f64,
    },
}

impl ContentBlock {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    pub fn bullet(text: impl Into<String>, indent: u8) -> Self {
        Self::Bullet {
            text: text.into(),
            indent,
        }
    }

    pub fn image(image: FrameImage, caption: impl Into<String>) -> Self {
        let aspect_ratio = image.aspect_ratio();
        Self::Image {
            image,
            caption: caption.into(),
            aspect_ratio,
        }
    }

    /// Text of a text block, `None` for images.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Heading { text, .. }
            | Self::Paragraph { text }
            | Self::Bullet { text, .. }
            | Self::Warning { text }
            | Self::Tip { text } => Some(text),
            Self::Image { .. } => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }

    /// Short tag used in logs and warnings.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Paragraph { .. } => "paragraph",
            Self::Bullet { .. } => "bullet",
            Self::Warning { .. } => "warning",
            Self::Tip { .. } => "tip",
            Self::Image { .. } => "image",
        }
    }
}

/// Turns a [`Procedure`] into content blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentBuilder {
    /// Emit an image block per aligned frame.
    pub include_frames: bool,
    /// Emit the token usage section when the procedure carries usage data.
    pub include_token_usage: bool,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self {
            include_frames: true,
            include_token_usage: true,
        }
    }
}

impl DocumentBuilder {
    pub fn from_options(options: &ExportOptions) -> Self {
        Self {
            include_frames: options.include_frames,
            include_token_usage: options.include_token_usage,
        }
    }

    /// Build the block sequence.
    ///
    /// Every section heading is emitted even when its list is empty, so the
    /// output always mirrors the procedure's section order.
    pub fn build(&self, procedure: &Procedure) -> Vec<ContentBlock> {
        let mut blocks = vec![ContentBlock::heading(1, &procedure.title)];

        blocks.push(ContentBlock::heading(2, OVERVIEW_HEADING));
        blocks.push(ContentBlock::paragraph(&procedure.overview));

        blocks.push(ContentBlock::heading(2, PREREQUISITES_HEADING));
        blocks.extend(
            procedure
                .prerequisites
                .iter()
                .map(|p| ContentBlock::bullet(p, 0)),
        );

        blocks.push(ContentBlock::heading(2, PROCEDURE_HEADING));
        for (i, step) in procedure.steps.iter().enumerate() {
            let number = i + 1;
            blocks.push(ContentBlock::heading(2, format!("{number}. {}", step.main)));
            blocks.extend(step.sub.iter().map(|s| ContentBlock::bullet(s, 1)));
            blocks.extend(step.warnings.iter().map(|w| ContentBlock::Warning {
                text: w.clone(),
            }));
            blocks.extend(step.tips.iter().map(|t| ContentBlock::Tip { text: t.clone() }));
            if self.include_frames {
                blocks.extend(step.frames.iter().map(|frame| {
                    ContentBlock::image(
                        frame.image().clone(),
                        format!("Step {number} - {}", frame.label()),
                    )
                }));
            }
        }

        blocks.push(ContentBlock::heading(2, VERIFICATION_HEADING));
        blocks.push(ContentBlock::paragraph(&procedure.verification));

        blocks.push(ContentBlock::heading(2, TROUBLESHOOTING_HEADING));
        blocks.extend(
            procedure
                .troubleshooting
                .iter()
                .map(|t| ContentBlock::bullet(t, 0)),
        );

        if let (true, Some(usage)) = (self.include_token_usage, &procedure.token_usage) {
            blocks.push(ContentBlock::heading(2, TOKEN_USAGE_HEADING));
            blocks.extend(usage_lines(usage).into_iter().map(ContentBlock::paragraph));
        }

        tracing::debug!(
            blocks = blocks.len(),
            steps = procedure.steps.len(),
            "Built document model"
        );
        blocks
    }
}

/// Build blocks with every optional section enabled.
pub fn build_document(procedure: &Procedure) -> Vec<ContentBlock> {
    DocumentBuilder::default().build(procedure)
}

/// Token usage rendered as plain text lines.
pub fn usage_lines(usage: &TokenUsage) -> Vec<String> {
    vec![
        format!("Prompt Tokens: {}", usage.prompt_tokens),
        format!("Response Tokens: {}", usage.response_tokens),
        format!("Total Tokens: {}", usage.total_tokens),
        format!("Input Cost: ${}", usage.costs.input_cost),
        format!("Output Cost: ${}", usage.costs.output_cost),
        format!("Total Cost: ${}", usage.costs.total_cost),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use framedoc_project_model::frame::{FrameCapture, ImageEncoding};
    use framedoc_project_model::procedure::{CostBreakdown, ProcedureStep};

    fn sample() -> Procedure {
        let mut procedure = Procedure::new("Reset the router");
        procedure.overview = "Restore factory settings.".into();
        procedure.prerequisites = vec!["Paperclip".into()];
        let mut step = ProcedureStep::new("Hold reset");
        step.sub = vec!["Press for 10 seconds".into()];
        step.warnings = vec!["Do not unplug".into()];
        step.tips = vec!["Lights will blink".into()];
        step.frames = vec![FrameCapture::new(
            3661.0,
            FrameImage::new(ImageEncoding::Jpeg, 160, 90, vec![1, 2, 3]),
        )];
        procedure.steps = vec![step, ProcedureStep::new("Reconnect")];
        procedure.verification = "Admin page loads.".into();
        procedure
    }

    fn headings(blocks: &[ContentBlock]) -> Vec<&str> {
        blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Heading { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_block_order() {
        let blocks = build_document(&sample());
        assert_eq!(blocks[0], ContentBlock::heading(1, "Reset the router"));
        assert_eq!(
            headings(&blocks),
            vec![
                "Reset the router",
                "Overview",
                "Prerequisites",
                "Procedure",
                "1. Hold reset",
                "2. Reconnect",
                "Verification",
                "Troubleshooting",
            ]
        );

        let step_start = blocks
            .iter()
            .position(|b| b == &ContentBlock::heading(2, "1. Hold reset"))
            .unwrap();
        assert_eq!(blocks[step_start + 1], ContentBlock::bullet("Press for 10 seconds", 1));
        assert_eq!(
            blocks[step_start + 2],
            ContentBlock::Warning {
                text: "Do not unplug".into()
            }
        );
        assert_eq!(
            blocks[step_start + 3],
            ContentBlock::Tip {
                text: "Lights will blink".into()
            }
        );
        match &blocks[step_start + 4] {
            ContentBlock::Image {
                caption,
                aspect_ratio,
                ..
            } => {
                assert_eq!(caption, "Step 1 - 01:01:01");
                assert!((aspect_ratio - 0.5625).abs() < 1e-9);
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_sections_keep_headings() {
        let blocks = build_document(&sample());
        let troubleshooting = blocks
            .iter()
            .position(|b| b == &ContentBlock::heading(2, TROUBLESHOOTING_HEADING))
            .unwrap();
        assert_eq!(troubleshooting, blocks.len() - 1);
    }

    #[test]
    fn test_frames_can_be_excluded() {
        let builder = DocumentBuilder {
            include_frames: false,
            ..DocumentBuilder::default()
        };
        assert!(!builder.build(&sample()).iter().any(ContentBlock::is_image));
    }

    #[test]
    fn test_token_usage_section() {
        let mut procedure = sample();
        procedure.token_usage = Some(TokenUsage {
            prompt_tokens: 1200,
            response_tokens: 300,
            total_tokens: 1500,
            costs: CostBreakdown {
                input_cost: 0.0012,
                output_cost: 0.0006,
                total_cost: 0.0018,
            },
        });

        let blocks = build_document(&procedure);
        let start = blocks
            .iter()
            .position(|b| b == &ContentBlock::heading(2, TOKEN_USAGE_HEADING))
            .unwrap();
        let lines: Vec<_> = blocks[start + 1..].iter().filter_map(ContentBlock::text).collect();
        assert_eq!(lines[0], "Prompt Tokens: 1200");
        assert_eq!(lines[5], "Total Cost: $0.0018");

        let hidden = DocumentBuilder {
            include_token_usage: false,
            ..DocumentBuilder::default()
        }
        .build(&procedure);
        assert!(!headings(&hidden).contains(&TOKEN_USAGE_HEADING));
    }
}
