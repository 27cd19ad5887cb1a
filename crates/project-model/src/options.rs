//! Export options and page geometry.
//!
//! [`ExportOptions`] is the single settings value threaded through document
//! building, layout, and rendering. Layout units are millimetres; font sizes
//! are points.

use serde::{Deserialize, Serialize};

use framedoc_common::error::{FramedocError, FramedocResult};

/// Points per millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// Smallest allowed image scale percentage.
pub const MIN_IMAGE_SCALE_PERCENT: u8 = 10;
/// Largest allowed image scale percentage.
pub const MAX_IMAGE_SCALE_PERCENT: u8 = 100;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Docx,
    #[serde(rename = "txt")]
    Text,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = FramedocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            "txt" | "text" => Ok(Self::Text),
            other => Err(FramedocError::config(format!(
                "Unknown format: {other}. Use: pdf, docx, txt"
            ))),
        }
    }
}

/// Width class used to pick the source resolution of frames before layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PdfImageSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl PdfImageSize {
    /// Maximum pixel width for this class.
    pub fn max_width_px(&self) -> u32 {
        match self {
            Self::Small => 854,
            Self::Medium => 1280,
            Self::Large => 1920,
        }
    }
}

impl std::str::FromStr for PdfImageSize {
    type Err = FramedocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(FramedocError::config(format!(
                "Unknown image size: {other}. Use: small, medium, large"
            ))),
        }
    }
}

/// Font sizes and spacing used by the layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    /// Level-1 heading size (pt).
    pub title_size: f64,
    /// Level-2+ heading size (pt).
    pub heading_size: f64,
    /// Paragraph, bullet, warning, and tip size (pt).
    pub body_size: f64,
    /// Image caption size (pt).
    pub caption_size: f64,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
    /// Average glyph advance as a fraction of the font size.
    pub avg_char_width_em: f64,
    /// Vertical gap after each block (mm).
    pub block_spacing: f64,
    /// Horizontal indent per bullet level and for warnings/tips (mm).
    pub indent_step: f64,
    /// Gap between an image and its caption (mm).
    pub caption_gap: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            title_size: 16.0,
            heading_size: 14.0,
            body_size: 12.0,
            caption_size: 10.0,
            line_height_factor: 1.65,
            avg_char_width_em: 0.5,
            block_spacing: 3.0,
            indent_step: 10.0,
            caption_gap: 2.0,
        }
    }
}

impl Typography {
    /// Height of one text line at `font_size_pt`, in mm.
    pub fn line_height(&self, font_size_pt: f64) -> f64 {
        font_size_pt / PT_PER_MM * self.line_height_factor
    }
}

/// Page dimensions and image sizing limits, in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,

    /// Fraction of the page height a single image may occupy.
    pub max_image_height_fraction: f64,

    /// Image width as a percentage of the content width (10-100).
    pub image_scale_percent: u8,

    #[serde(default)]
    pub typography: Typography,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// ISO A4 portrait with 15 mm margins.
    pub fn a4() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 15.0,
            max_image_height_fraction: 0.4,
            image_scale_percent: 100,
            typography: Typography::default(),
        }
    }

    /// US Letter portrait with 15 mm margins.
    pub fn letter() -> Self {
        Self {
            page_width: 215.9,
            page_height: 279.4,
            ..Self::a4()
        }
    }

    /// Look up a named page preset.
    pub fn preset(name: &str) -> FramedocResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::a4()),
            "letter" => Ok(Self::letter()),
            other => Err(FramedocError::config(format!(
                "Unknown page size: {other}. Use: a4, letter"
            ))),
        }
    }

    /// Copy with a different image scale, clamped to 10-100.
    pub fn with_image_scale(mut self, percent: u8) -> Self {
        self.image_scale_percent = percent.clamp(MIN_IMAGE_SCALE_PERCENT, MAX_IMAGE_SCALE_PERCENT);
        self
    }

    /// Width available for content between the margins.
    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    /// Lowest y any element may extend to.
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.margin
    }

    /// Height available for content between the margins.
    pub fn usable_height(&self) -> f64 {
        self.page_height - 2.0 * self.margin
    }

    /// Maximum rendered image height.
    pub fn max_image_height(&self) -> f64 {
        self.page_height * self.max_image_height_fraction
    }

    /// Reject geometry with no room for content.
    pub fn validate(&self) -> FramedocResult<()> {
        let finite = [
            self.page_width,
            self.page_height,
            self.margin,
            self.max_image_height_fraction,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite || self.margin < 0.0 {
            return Err(FramedocError::layout_overflow(
                "page geometry must be finite with a non-negative margin",
            ));
        }
        if self.margin * 2.0 >= self.page_width {
            return Err(FramedocError::layout_overflow(format!(
                "margins ({} mm each) leave no content width on a {} mm wide page",
                self.margin, self.page_width
            )));
        }
        if self.margin * 2.0 >= self.page_height {
            return Err(FramedocError::layout_overflow(format!(
                "margins ({} mm each) leave no content height on a {} mm tall page",
                self.margin, self.page_height
            )));
        }
        if !(self.max_image_height_fraction > 0.0 && self.max_image_height_fraction <= 1.0) {
            return Err(FramedocError::layout_overflow(format!(
                "max image height fraction {} is outside (0, 1]",
                self.max_image_height_fraction
            )));
        }
        if !(MIN_IMAGE_SCALE_PERCENT..=MAX_IMAGE_SCALE_PERCENT).contains(&self.image_scale_percent)
        {
            return Err(FramedocError::layout_overflow(format!(
                "image scale {}% is outside 10-100%",
                self.image_scale_percent
            )));
        }
        let t = &self.typography;
        if t.line_height_factor <= 0.0 || t.avg_char_width_em <= 0.0 {
            return Err(FramedocError::layout_overflow(
                "typography metrics must be positive",
            ));
        }
        if t.indent_step * 2.0 >= self.content_width() {
            return Err(FramedocError::layout_overflow(
                "indent step leaves no room for indented text",
            ));
        }
        Ok(())
    }
}

/// Everything that shapes an export, passed explicitly to each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub geometry: PageGeometry,
    pub pdf_image_size: PdfImageSize,

    /// Emit image blocks for aligned frames.
    pub include_frames: bool,

    /// Emit the token usage section when the procedure carries one.
    pub include_token_usage: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Pdf,
            geometry: PageGeometry::a4(),
            pdf_image_size: PdfImageSize::Medium,
            include_frames: true,
            include_token_usage: true,
        }
    }
}

impl ExportOptions {
    pub fn image_scale_percent(&self) -> u8 {
        self.geometry.image_scale_percent
    }
}
