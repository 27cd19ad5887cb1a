//! framedoc Render Engine
//!
//! Turns a step-aligned procedure into a downloadable document.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Procedure ── DocumentBuilder ──▶ [ContentBlock]
//!                                      │
//!                      prepare_image (decode, downscale, JPEG)
//!                                      │
//!              ┌───────────────────────┼───────────────────────┐
//!              ▼                       ▼                       ▼
//!       PageFlowLayout           DocxExporter            TextExporter
//!              │                       │                       │
//!              ▼                       ▼                       ▼
//!         PdfExporter               .docx                    .txt
//!              │
//!              ▼
//!            .pdf
//! ```

pub mod document;
pub mod docx;
pub mod export;
pub mod images;
pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod text;

pub use document::{build_document, ContentBlock, DocumentBuilder};
pub use export::*;
pub use layout::{layout, PageFlowLayout, PageLayout, PlacedElement};
pub use pdf::PdfExporter;
pub use docx::DocxExporter;
pub use text::TextExporter;
