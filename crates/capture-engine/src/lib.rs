//! framedoc Capture Engine
//!
//! Turns what is on screen into timestamped frame captures and keeps them
//! in playback order.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   snapshot    ┌───────────────┐   FrameCapture   ┌───────────────┐
//! │  MediaSurface  │ ────────────▶ │ FrameCapturer │ ───────────────▶ │ TimelineStore │
//! │ (still / seq.) │               │ scale, encode │                  │ sorted by time│
//! └────────────────┘               └───────────────┘                  └───────────────┘
//! ```

pub mod capture;
pub mod surface;
pub mod timeline;

pub use capture::{CaptureConfig, FrameCapturer};
pub use surface::{MediaSurface, SequenceSurface, StillSurface};
pub use timeline::{SharedTimeline, TimelineStore};
