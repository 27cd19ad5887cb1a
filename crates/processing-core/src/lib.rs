//! framedoc Processing Core
//!
//! Decides which frames belong where:
//! - **Step alignment:** Bin captured frames into procedure steps by time window
//! - **Sampling:** Pick capture times up front, or detect scene changes in decoded frames
//!
//! This crate is pure computation: no I/O, no image codecs.
//! All inputs are data; all outputs are data.

pub mod sampling;
pub mod step_align;

pub use sampling::{keyframe_times, SceneDetector};
pub use step_align::{align, align_procedure, AlignedProcedure, Alignment, AlignmentAdvisory};
