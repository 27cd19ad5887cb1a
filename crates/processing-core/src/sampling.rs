//! Frame sampling: choosing which moments of a video to capture.

use image::{GrayImage, RgbaImage};

use framedoc_project_model::frame::RasterFrame;

/// `count` capture times spread evenly over `[0, duration]`, both ends
/// included. A single sample is taken at 0.
pub fn keyframe_times(duration_secs: f64, count: usize) -> Vec<f64> {
    let duration = if duration_secs.is_finite() {
        duration_secs.max(0.0)
    } else {
        0.0
    };
    match count {
        0 => vec![],
        1 => vec![0.0],
        n => (0..n)
            .map(|i| duration * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Detects cuts between consecutive decoded frames.
///
/// A frame is a scene change when the mean absolute grayscale difference to
/// the frame before it exceeds `threshold` (0-255 scale).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneDetector {
    pub threshold: f64,
}

impl Default for SceneDetector {
    fn default() -> Self {
        Self { threshold: 30.0 }
    }
}

impl SceneDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Times of the frames that start a new scene. The first frame never
    /// counts.
    pub fn detect(&self, frames: &[(f64, RasterFrame)]) -> Vec<f64> {
        let mut changes = Vec::new();
        let mut prev: Option<GrayImage> = None;

        for (time, frame) in frames {
            let Some(gray) = luma(frame) else {
                tracing::debug!(time = *time, "Skipping malformed frame");
                continue;
            };
            if let Some(prev_gray) = &prev {
                let diff = if prev_gray.dimensions() == gray.dimensions() {
                    mean_abs_diff(prev_gray.as_raw(), gray.as_raw())
                } else {
                    f64::INFINITY
                };
                if diff > self.threshold {
                    tracing::debug!(time = *time, diff, "Detected scene change");
                    changes.push(*time);
                }
            }
            prev = Some(gray);
        }

        tracing::info!(
            frames = frames.len(),
            changes = changes.len(),
            "Scene detection finished"
        );
        changes
    }
}

/// Grayscale copy of a raster; `None` when the buffer does not match its size.
fn luma(frame: &RasterFrame) -> Option<GrayImage> {
    if !frame.is_consistent() {
        return None;
    }
    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())?;
    Some(image::imageops::grayscale(&rgba))
}

fn mean_abs_diff(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return if a.len() == b.len() { 0.0 } else { f64::INFINITY };
    }
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.len() as f64
}
