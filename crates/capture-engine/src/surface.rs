//! Media surfaces: the playback view a capture is taken from.
//!
//! The UI layer owns the real video element; the engine only sees the
//! [`MediaSurface`] capability and queries it at the moment of capture.

use std::path::Path;

use framedoc_common::error::{FramedocError, FramedocResult};
use framedoc_project_model::frame::RasterFrame;

/// Read-only view of a playing (or paused) video.
pub trait MediaSurface {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Total duration in seconds, `None` until metadata has loaded.
    fn duration(&self) -> Option<f64>;

    /// The frame currently on screen at native resolution, if one is ready.
    fn snapshot(&self) -> Option<RasterFrame>;
}

/// Validate a seek target against an optional duration.
fn check_seek(time_secs: f64, duration: Option<f64>) -> FramedocResult<()> {
    let max = duration.unwrap_or(f64::INFINITY);
    if !time_secs.is_finite() || time_secs < 0.0 || time_secs > max {
        return Err(FramedocError::invalid_time(
            time_secs,
            duration.unwrap_or(0.0),
        ));
    }
    Ok(())
}

/// A single still presented over a declared duration.
///
/// Used when the caller already holds the frame image (for example a
/// screenshot exported by a player) and only needs the playhead bookkeeping.
#[derive(Debug, Clone)]
pub struct StillSurface {
    frame: Option<RasterFrame>,
    duration: Option<f64>,
    position: f64,
}

impl StillSurface {
    pub fn new(frame: RasterFrame, duration: Option<f64>) -> Self {
        Self {
            frame: Some(frame),
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
            position: 0.0,
        }
    }

    /// A surface whose media has not produced a frame yet.
    pub fn unloaded(duration: Option<f64>) -> Self {
        Self {
            frame: None,
            duration,
            position: 0.0,
        }
    }

    /// Decode an image file into a surface.
    pub fn open(path: impl AsRef<Path>, duration: Option<f64>) -> FramedocResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FramedocError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let decoded = image::open(path).map_err(|e| {
            FramedocError::capture_unavailable(format!("cannot decode {}: {e}", path.display()))
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::new(
            RasterFrame::new(width, height, rgba.into_raw()),
            duration,
        ))
    }

    /// Move the playhead; rejects positions outside `[0, duration]`.
    pub fn seek(&mut self, time_secs: f64) -> FramedocResult<()> {
        check_seek(time_secs, self.duration)?;
        self.position = time_secs;
        Ok(())
    }
}

impl MediaSurface for StillSurface {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn snapshot(&self) -> Option<RasterFrame> {
        self.frame.clone()
    }
}

/// Pre-decoded frames keyed by presentation time.
///
/// `snapshot` returns the latest frame whose time is at or before the
/// playhead, the way a paused player shows the last decoded frame.
#[derive(Debug, Clone, Default)]
pub struct SequenceSurface {
    frames: Vec<(f64, RasterFrame)>,
    duration: Option<f64>,
    position: f64,
}

impl SequenceSurface {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            frames: vec![],
            duration,
            position: 0.0,
        }
    }

    /// Add a decoded frame; frames are kept sorted by time.
    pub fn push(&mut self, time_secs: f64, frame: RasterFrame) {
        let idx = self.frames.partition_point(|(t, _)| *t <= time_secs);
        self.frames.insert(idx, (time_secs, frame));
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// All frames with their times, in time order.
    pub fn frames(&self) -> &[(f64, RasterFrame)] {
        &self.frames
    }

    pub fn seek(&mut self, time_secs: f64) -> FramedocResult<()> {
        check_seek(time_secs, self.duration)?;
        self.position = time_secs;
        Ok(())
    }
}

impl MediaSurface for SequenceSurface {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn snapshot(&self) -> Option<RasterFrame> {
        let idx = self.frames.partition_point(|(t, _)| *t <= self.position);
        idx.checked_sub(1).map(|i| self.frames[i].1.clone())
    }
}
