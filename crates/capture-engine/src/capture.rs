//! The capture operation: snapshot a surface and encode it.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};

use framedoc_common::error::{FramedocError, FramedocResult};
use framedoc_project_model::frame::{FrameCapture, FrameImage, ImageEncoding, RasterFrame};
use framedoc_project_model::options::PdfImageSize;

use crate::surface::MediaSurface;

/// Settings for encoding captured frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConfig {
    /// Output encoding.
    pub encoding: ImageEncoding,

    /// JPEG quality (1-100); ignored for PNG.
    pub jpeg_quality: u8,

    /// Downscale frames wider than this, keeping the aspect ratio.
    /// `None` keeps the surface's native resolution.
    pub max_width: Option<u32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            encoding: ImageEncoding::Jpeg,
            jpeg_quality: 85,
            max_width: None,
        }
    }
}

impl CaptureConfig {
    /// Limit frame width to a PDF image size class.
    pub fn for_image_size(size: PdfImageSize) -> Self {
        Self {
            max_width: Some(size.max_width_px()),
            ..Self::default()
        }
    }
}

/// Turns surface snapshots into [`FrameCapture`]s.
#[derive(Debug, Clone, Default)]
pub struct FrameCapturer {
    config: CaptureConfig,
}

impl FrameCapturer {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Capture `surface` at `time_secs`.
    ///
    /// The time must lie within the surface's duration when that is known.
    /// Fails with `CaptureUnavailable` when the surface has no frame ready;
    /// nothing is mutated in either failure case.
    pub fn capture(
        &self,
        surface: &dyn MediaSurface,
        time_secs: f64,
    ) -> FramedocResult<FrameCapture> {
        let duration = surface.duration().filter(|d| d.is_finite() && *d > 0.0);
        if !time_secs.is_finite()
            || time_secs < 0.0
            || duration.is_some_and(|d| time_secs > d)
        {
            return Err(FramedocError::invalid_time(
                time_secs,
                duration.unwrap_or(0.0),
            ));
        }

        let raster = surface
            .snapshot()
            .ok_or_else(|| FramedocError::capture_unavailable("surface has no frame loaded"))?;
        let image = self.encode(raster)?;

        let frame = FrameCapture::new(time_secs, image);
        tracing::debug!(
            id = %frame.id(),
            time = time_secs,
            label = frame.label(),
            bytes = frame.image().bytes.len(),
            "Captured frame"
        );
        Ok(frame)
    }

    /// Capture at the surface's current playback position.
    pub fn capture_now(&self, surface: &dyn MediaSurface) -> FramedocResult<FrameCapture> {
        self.capture(surface, surface.current_time())
    }

    /// Encode a raster per the capture config.
    pub fn encode(&self, raster: RasterFrame) -> FramedocResult<FrameImage> {
        if !raster.is_consistent() {
            return Err(FramedocError::capture_unavailable(format!(
                "snapshot buffer of {} bytes does not match {}x{}",
                raster.rgba.len(),
                raster.width,
                raster.height
            )));
        }

        let rgba = RgbaImage::from_raw(raster.width, raster.height, raster.rgba).ok_or_else(
            || FramedocError::capture_unavailable("snapshot buffer is not RGBA"),
        )?;
        let rgba = match self.config.max_width {
            Some(max) if max > 0 && rgba.width() > max => {
                let height = scaled_height(rgba.width(), rgba.height(), max);
                image::imageops::resize(&rgba, max, height, FilterType::Triangle)
            }
            _ => rgba,
        };
        let (width, height) = rgba.dimensions();

        let mut bytes = Vec::new();
        match self.config.encoding {
            ImageEncoding::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
                let quality = self.config.jpeg_quality.clamp(1, 100);
                JpegEncoder::new_with_quality(&mut bytes, quality)
                    .encode_image(&rgb)
                    .map_err(|e| FramedocError::capture_unavailable(format!("JPEG encode: {e}")))?;
            }
            ImageEncoding::Png => {
                rgba.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                    .map_err(|e| FramedocError::capture_unavailable(format!("PNG encode: {e}")))?;
            }
        }

        Ok(FrameImage::new(self.config.encoding, width, height, bytes))
    }
}

/// Height after scaling `width` down to `target_width`, at least 1 px.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (height as f64 * target_width as f64 / width as f64).round();
    (scaled as u32).max(1)
}
