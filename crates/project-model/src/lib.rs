//! framedoc Project Model
//!
//! Defines the core data contracts for framedoc:
//! - **Frames:** Timestamped stills captured from the video
//! - **Procedure:** The generated step-by-step procedure, steps, and usage
//! - **Options:** Export settings and page geometry
//! - **Session:** On-disk bundle tying a video, its frames, and its procedure
//!
//! Layout measurements are millimetres; font sizes are points.

pub mod frame;
pub mod options;
pub mod procedure;
pub mod session;

pub use frame::*;
pub use options::*;
pub use procedure::*;
pub use session::*;
