//! framedoc Common Utilities
//!
//! Shared infrastructure for all framedoc crates:
//! - Error taxonomy and result aliases
//! - `HH:MM:SS` timestamp labels
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
pub use timecode::*;
