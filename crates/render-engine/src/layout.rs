//! Page flow layout: place content blocks onto fixed-size pages.
//!
//! # Algorithm
//!
//! A single top-to-bottom pass with a cursor (`page`, `y`) starting at the
//! top margin of page 0.
//!
//! 1. **Text** blocks are wrapped to the content width (less any indent) and
//!    take `lines * line_height` of vertical space.
//! 2. **Image** blocks are sized to `content_width * scale%`, keeping the
//!    aspect ratio, then clamped to the page's image height cap. The image
//!    and its caption are reserved together so they never split.
//! 3. If a reservation does not fit above the bottom margin, the cursor moves
//!    to the next page first. A reservation that exactly reaches the bottom
//!    margin stays on the current page.
//! 4. A block taller than a whole page is placed alone on a fresh page and
//!    allowed to overflow; it is never split or dropped.
//!
//! All coordinates are millimetres from the top-left corner of the page.

use framedoc_common::error::FramedocResult;
use framedoc_project_model::frame::DEFAULT_ASPECT_RATIO;
use framedoc_project_model::options::PageGeometry;

use crate::document::ContentBlock;
use crate::metrics::TextMetrics;

/// Tolerance for float comparisons against the page bottom.
const FIT_EPSILON: f64 = 1e-9;

/// Horizontal alignment of text lines within an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// A block (or an image caption) with its page and position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedElement {
    pub block: ContentBlock,
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    /// Wrapped display lines; empty for images.
    pub lines: Vec<String>,
    pub font_size: f64,
    pub bold: bool,
    pub align: TextAlign,

    /// Index of the source block. An image and its caption share one.
    pub source_index: usize,

    /// True for the caption element placed under an image.
    pub is_caption: bool,
}

impl PlacedElement {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Result of a layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub elements: Vec<PlacedElement>,
    pub page_count: usize,
    pub geometry: PageGeometry,
}

impl PageLayout {
    /// Elements on `page`, in placement order.
    pub fn page(&self, page: usize) -> impl Iterator<Item = &PlacedElement> {
        self.elements.iter().filter(move |e| e.page == page)
    }
}

/// Vertical position state carried through the layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    pub page: usize,
    pub y: f64,
    top: f64,
    bottom: f64,
}

impl PageCursor {
    pub fn new(geometry: &PageGeometry) -> Self {
        Self::with_bounds(geometry.margin, geometry.content_bottom())
    }

    /// A cursor at the top of page 0 with explicit content bounds.
    pub fn with_bounds(top: f64, bottom: f64) -> Self {
        Self {
            page: 0,
            y: top,
            top,
            bottom,
        }
    }

    /// Whether `height` fits between the cursor and the bottom bound.
    pub fn fits(&self, height: f64) -> bool {
        self.y + height <= self.bottom + FIT_EPSILON
    }

    /// Nothing has been placed on the current page yet.
    pub fn page_is_empty(&self) -> bool {
        self.y <= self.top + FIT_EPSILON
    }

    pub fn new_page(&mut self) {
        self.page += 1;
        self.y = self.top;
    }

    /// Claim `height` of vertical space, moving to a new page first if it
    /// does not fit here. Returns the page and y of the claimed space.
    pub fn reserve(&mut self, height: f64) -> (usize, f64) {
        if !self.fits(height) && !self.page_is_empty() {
            self.new_page();
        }
        let at = (self.page, self.y);
        self.y += height;
        at
    }

    /// Add spacing after a block.
    pub fn advance(&mut self, spacing: f64) {
        self.y += spacing;
    }
}

/// Rendered image size for `aspect_ratio` under `geometry`.
///
/// Width is the scaled content width; if the resulting height exceeds the
/// image height cap, height is set to the cap and width recomputed.
pub fn fit_image(geometry: &PageGeometry, aspect_ratio: f64) -> (f64, f64) {
    let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        aspect_ratio
    } else {
        DEFAULT_ASPECT_RATIO
    };
    let scale = f64::from(geometry.image_scale_percent) / 100.0;
    let width = geometry.content_width() * scale;
    let height = width * aspect;
    let cap = geometry.max_image_height();
    if height > cap {
        (cap / aspect, cap)
    } else {
        (width, height)
    }
}

/// Lays out content blocks on pages of one geometry.
#[derive(Debug, Clone)]
pub struct PageFlowLayout {
    geometry: PageGeometry,
    metrics: TextMetrics,
}

impl PageFlowLayout {
    /// Fails with `LayoutOverflow` when the geometry leaves no content area.
    pub fn new(geometry: PageGeometry) -> FramedocResult<Self> {
        geometry.validate()?;
        Ok(Self {
            metrics: TextMetrics::new(&geometry.typography),
            geometry,
        })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn layout(&self, blocks: &[ContentBlock]) -> PageLayout {
        let mut cursor = PageCursor::new(&self.geometry);
        let mut elements = Vec::with_capacity(blocks.len() + blocks.len() / 4);

        for (index, block) in blocks.iter().enumerate() {
            match block {
                ContentBlock::Image {
                    caption,
                    aspect_ratio,
                    ..
                } => self.place_image(&mut cursor, &mut elements, index, block, caption, *aspect_ratio),
                _ => self.place_text(&mut cursor, &mut elements, index, block),
            }
            cursor.advance(self.geometry.typography.block_spacing);
        }

        let page_count = elements.last().map_or(1, |e| e.page + 1);
        tracing::debug!(
            blocks = blocks.len(),
            elements = elements.len(),
            pages = page_count,
            "Laid out document"
        );

        PageLayout {
            elements,
            page_count,
            geometry: self.geometry,
        }
    }

    fn place_text(
        &self,
        cursor: &mut PageCursor,
        elements: &mut Vec<PlacedElement>,
        index: usize,
        block: &ContentBlock,
    ) {
        let style = self.text_style(block);
        let x = self.geometry.margin + style.indent;
        let width = self.geometry.content_width() - style.indent;
        let text = display_text(block);
        let lines = self.metrics.wrap(&text, width, style.font_size, style.bold);
        let height = lines.len() as f64 * self.geometry.typography.line_height(style.font_size);

        let (page, y) = cursor.reserve(height);
        if height > self.geometry.usable_height() {
            tracing::warn!(
                block = index,
                kind = block.kind_name(),
                height,
                "Block taller than a page; placed alone"
            );
        }

        elements.push(PlacedElement {
            block: block.clone(),
            page,
            x,
            y,
            width,
            height,
            lines,
            font_size: style.font_size,
            bold: style.bold,
            align: TextAlign::Left,
            source_index: index,
            is_caption: false,
        });
    }

    fn place_image(
        &self,
        cursor: &mut PageCursor,
        elements: &mut Vec<PlacedElement>,
        index: usize,
        block: &ContentBlock,
        caption: &str,
        aspect_ratio: f64,
    ) {
        let typo = &self.geometry.typography;
        let content_width = self.geometry.content_width();
        let (width, height) = fit_image(&self.geometry, aspect_ratio);

        let caption_lines = self
            .metrics
            .wrap(caption, content_width, typo.caption_size, false);
        let caption_height = caption_lines.len() as f64 * typo.line_height(typo.caption_size);
        let group_height = height + typo.caption_gap + caption_height;

        // The cursor ends past the bottom bound after an oversize
        // reservation, so the next block always starts a new page.
        let (page, y) = cursor.reserve(group_height);

        elements.push(PlacedElement {
            block: block.clone(),
            page,
            x: self.geometry.margin + (content_width - width) / 2.0,
            y,
            width,
            height,
            lines: vec![],
            font_size: 0.0,
            bold: false,
            align: TextAlign::Center,
            source_index: index,
            is_caption: false,
        });
        elements.push(PlacedElement {
            block: ContentBlock::paragraph(caption),
            page,
            x: self.geometry.margin,
            y: y + height + typo.caption_gap,
            width: content_width,
            height: caption_height,
            lines: caption_lines,
            font_size: typo.caption_size,
            bold: false,
            align: TextAlign::Center,
            source_index: index,
            is_caption: true,
        });
    }

    fn text_style(&self, block: &ContentBlock) -> TextStyle {
        let typo = &self.geometry.typography;
        let max_indent = self.geometry.content_width() / 2.0;
        match block {
            ContentBlock::Heading { level, .. } => TextStyle {
                font_size: if *level <= 1 {
                    typo.title_size
                } else {
                    typo.heading_size
                },
                bold: true,
                indent: 0.0,
            },
            ContentBlock::Bullet { indent, .. } => TextStyle {
                font_size: typo.body_size,
                bold: false,
                indent: (typo.indent_step * f64::from(*indent)).min(max_indent),
            },
            ContentBlock::Warning { .. } | ContentBlock::Tip { .. } => TextStyle {
                font_size: typo.body_size,
                bold: false,
                indent: typo.indent_step.min(max_indent),
            },
            ContentBlock::Paragraph { .. } | ContentBlock::Image { .. } => TextStyle {
                font_size: typo.body_size,
                bold: false,
                indent: 0.0,
            },
        }
    }
}

struct TextStyle {
    font_size: f64,
    bold: bool,
    indent: f64,
}

/// Text as drawn, with list and callout prefixes.
pub fn display_text(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Bullet { text, .. } => format!("\u{2022} {text}"),
        ContentBlock::Warning { text } => format!("Warning: {text}"),
        ContentBlock::Tip { text } => format!("Tip: {text}"),
        ContentBlock::Heading { text, .. } | ContentBlock::Paragraph { text } => text.clone(),
        ContentBlock::Image { caption, .. } => caption.clone(),
    }
}

/// Validate `geometry` and lay out `blocks` in one call.
pub fn layout(blocks: &[ContentBlock], geometry: &PageGeometry) -> FramedocResult<PageLayout> {
    Ok(PageFlowLayout::new(*geometry)?.layout(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use framedoc_common::error::ErrorKind;
    use framedoc_project_model::frame::{FrameImage, ImageEncoding};
    use proptest::prelude::*;

    fn image_block(width: u32, height: u32) -> ContentBlock {
        ContentBlock::image(
            FrameImage::new(ImageEncoding::Jpeg, width, height, vec![0xFF, 0xD8]),
            "Step 1 - 00:00:01",
        )
    }

    /// Every element either fits above the bottom margin or shares its page
    /// only with elements from the same source block.
    fn assert_page_boundary(layout: &PageLayout) {
        let bottom = layout.geometry.content_bottom();
        for e in &layout.elements {
            if e.bottom() > bottom + FIT_EPSILON {
                assert!(
                    layout.page(e.page).all(|o| o.source_index == e.source_index),
                    "overflowing element shares page {}",
                    e.page
                );
            }
        }
    }

    #[test]
    fn test_exact_fit_stays_on_page() {
        let mut cursor = PageCursor::with_bounds(0.0, 100.0);
        cursor.y = 90.0;
        assert_eq!(cursor.reserve(10.0), (0, 90.0));

        let mut cursor = PageCursor::with_bounds(0.0, 100.0);
        cursor.y = 90.0;
        assert_eq!(cursor.reserve(11.0), (1, 0.0));
    }

    #[test]
    fn test_exact_fit_with_margins() {
        let mut cursor = PageCursor::with_bounds(15.0, 115.0);
        cursor.y = 105.0;
        assert_eq!(cursor.reserve(10.0), (0, 105.0));
        cursor.y = 105.0;
        assert_eq!(cursor.reserve(10.5), (1, 15.0));
    }

    #[test]
    fn test_oversize_on_empty_page_does_not_advance() {
        let mut cursor = PageCursor::with_bounds(15.0, 115.0);
        assert_eq!(cursor.reserve(500.0), (0, 15.0));
        assert_eq!(cursor.reserve(1.0), (1, 15.0));
    }

    #[test]
    fn test_text_flows_to_next_page() {
        let blocks: Vec<_> = (0..80)
            .map(|i| ContentBlock::paragraph(format!("Paragraph {i}")))
            .collect();
        let layout = layout(&blocks, &PageGeometry::a4()).unwrap();
        assert!(layout.page_count > 1);
        assert_eq!(layout.elements.len(), 80);
        let first_on_page_two = layout.page(1).next().unwrap();
        assert_eq!(first_on_page_two.y, 15.0);
        assert_page_boundary(&layout);
    }

    #[test]
    fn test_image_is_centered_with_caption_below() {
        let geometry = PageGeometry::a4().with_image_scale(50);
        let layout = layout(&[image_block(1600, 900)], &geometry).unwrap();
        assert_eq!(layout.elements.len(), 2);

        let image = &layout.elements[0];
        assert!((image.width - 90.0).abs() < 1e-9);
        assert!((image.height - 90.0 * 0.5625).abs() < 1e-9);
        assert!((image.x - (15.0 + 45.0)).abs() < 1e-9);

        let caption = &layout.elements[1];
        assert!(caption.is_caption);
        assert_eq!(caption.source_index, 0);
        assert_eq!(caption.align, TextAlign::Center);
        assert!((caption.y - (image.bottom() + geometry.typography.caption_gap)).abs() < 1e-9);
    }

    #[test]
    fn test_tall_image_clamped_to_cap() {
        let geometry = PageGeometry::a4();
        let (w, h) = fit_image(&geometry, 2.0);
        assert_eq!(h, 297.0 * 0.4);
        assert!((w - h / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_indents() {
        let blocks = vec![
            ContentBlock::bullet("top", 0),
            ContentBlock::bullet("nested", 1),
            ContentBlock::Warning { text: "careful".into() },
        ];
        let layout = layout(&blocks, &PageGeometry::a4()).unwrap();
        assert_eq!(layout.elements[0].x, 15.0);
        assert_eq!(layout.elements[1].x, 25.0);
        assert_eq!(layout.elements[2].x, 25.0);
        assert_eq!(layout.elements[0].lines, vec!["\u{2022} top"]);
        assert_eq!(layout.elements[2].lines, vec!["Warning: careful"]);
    }

    #[test]
    fn test_huge_paragraph_gets_its_own_page() {
        let blocks = vec![
            ContentBlock::paragraph("intro"),
            ContentBlock::paragraph("word ".repeat(4000)),
            ContentBlock::paragraph("after"),
        ];
        let layout = layout(&blocks, &PageGeometry::a4()).unwrap();
        let pages: Vec<_> = layout.elements.iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![0, 1, 2]);
        assert_page_boundary(&layout);
    }

    #[test]
    fn test_degenerate_geometry_rejected_before_layout() {
        let geometry = PageGeometry {
            margin: 105.0,
            ..PageGeometry::a4()
        };
        let err = layout(&[ContentBlock::paragraph("x")], &geometry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LayoutOverflow);
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let layout = layout(&[], &PageGeometry::a4()).unwrap();
        assert_eq!(layout.page_count, 1);
        assert!(layout.elements.is_empty());
    }

    fn arb_block() -> impl Strategy<Value = ContentBlock> {
        prop_oneof![
            "[a-z ]{0,400}".prop_map(|t| ContentBlock::paragraph(t)),
            ("[a-z ]{1,80}", 0u8..3).prop_map(|(t, i)| ContentBlock::bullet(t, i)),
            "[a-z ]{1,60}".prop_map(|t| ContentBlock::heading(2, t)),
            (1u32..4000, 1u32..4000).prop_map(|(w, h)| image_block(w, h)),
        ]
    }

    proptest! {
        #[test]
        fn prop_page_boundary_holds(
            blocks in prop::collection::vec(arb_block(), 0..60),
            scale in 10u8..=100,
        ) {
            let geometry = PageGeometry::a4().with_image_scale(scale);
            let layout = layout(&blocks, &geometry).unwrap();
            assert_page_boundary(&layout);

            let pages: Vec<_> = layout.elements.iter().map(|e| e.page).collect();
            prop_assert!(pages.windows(2).all(|w| w[0] <= w[1]));
        }

        #[test]
        fn prop_image_scaling_preserves_aspect(
            aspect in 0.05f64..5.0,
            scale in 10u8..=100,
        ) {
            let geometry = PageGeometry::a4().with_image_scale(scale);
            let (w, h) = fit_image(&geometry, aspect);
            let cap = geometry.max_image_height();
            prop_assert!(h <= cap + 1e-9);
            if h == cap {
                prop_assert!((w * aspect - cap).abs() < 1e-6);
            } else {
                prop_assert!((h / w - aspect).abs() < 1e-9);
                prop_assert!((w - geometry.content_width() * f64::from(scale) / 100.0).abs() < 1e-9);
            }
        }
    }
}
