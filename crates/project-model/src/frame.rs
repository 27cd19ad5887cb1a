//! Frame capture types.
//!
//! A [`FrameCapture`] is an encoded still taken from the video at a given
//! playback time. In JSON the image travels as a `data:` URL, the same
//! shape the procedure tooling exchanges with the browser.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use framedoc_common::timecode::format_timestamp;

/// Aspect ratio (height / width) assumed when an image has no usable size.
pub const DEFAULT_ASPECT_RATIO: f64 = 9.0 / 16.0;

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub u64);

impl FrameId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Make sure future allocations never collide with `id`.
    ///
    /// Called when frames are loaded back from disk.
    pub fn reserve(id: FrameId) {
        NEXT_FRAME_ID.fetch_max(id.0 + 1, Ordering::Relaxed);
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Container format of an encoded frame image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    #[default]
    Jpeg,
    Png,
}

impl ImageEncoding {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// An encoded image buffer. The bytes are opaque to the model; only the
/// exporters decode them.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage {
    pub encoding: ImageEncoding,
    /// Pixel width as captured (0 if unknown).
    pub width: u32,
    /// Pixel height as captured (0 if unknown).
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl FrameImage {
    pub fn new(encoding: ImageEncoding, width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            encoding,
            width,
            height,
            bytes,
        }
    }

    /// Height divided by width.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            DEFAULT_ASPECT_RATIO
        } else {
            self.height as f64 / self.width as f64
        }
    }

    /// Encode as a `data:<mime>;base64,...` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.encoding.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }

    /// Decode a `data:` URL. Bare base64 is accepted and assumed to be JPEG.
    pub fn from_data_url(url: &str) -> Result<Self, String> {
        let (encoding, payload) = match url.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| "data URL has no payload".to_string())?;
                let mime = header.trim_end_matches(";base64");
                let encoding = ImageEncoding::from_mime(mime)
                    .ok_or_else(|| format!("unsupported image type {mime:?}"))?;
                (encoding, payload)
            }
            None => (ImageEncoding::Jpeg, url),
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| format!("invalid base64 image payload: {e}"))?;
        Ok(Self::new(encoding, 0, 0, bytes))
    }
}

/// An uncompressed RGBA raster as handed over by a media surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA, row-major, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl RasterFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// A single-color raster.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self::new(width, height, rgba.repeat(pixels))
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Whether the buffer length matches the declared dimensions.
    pub fn is_consistent(&self) -> bool {
        self.pixel_count() > 0 && self.rgba.len() == self.pixel_count() * 4
    }

}

/// A still captured from the video at a playback time.
///
/// Immutable once created: fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCapture {
    id: FrameId,

    /// Playback time in seconds.
    #[serde(rename = "time")]
    time_secs: f64,

    /// `HH:MM:SS` label derived from `time_secs`.
    #[serde(rename = "timestamp")]
    label: String,

    #[serde(with = "data_url")]
    image: FrameImage,

    /// Pixel dimensions of the encoded image, kept beside the data URL.
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

impl FrameCapture {
    /// Create a capture with a freshly allocated id.
    pub fn new(time_secs: f64, image: FrameImage) -> Self {
        Self::with_id(FrameId::next(), time_secs, image)
    }

    pub fn with_id(id: FrameId, time_secs: f64, image: FrameImage) -> Self {
        Self {
            id,
            label: format_timestamp(time_secs),
            time_secs,
            width: image.width,
            height: image.height,
            image,
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn time_secs(&self) -> f64 {
        self.time_secs
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn image(&self) -> &FrameImage {
        &self.image
    }

    /// Restore the pixel size carried next to the data URL after deserialization.
    pub(crate) fn restore_dimensions(mut self) -> Self {
        if self.image.width == 0 && self.image.height == 0 {
            self.image.width = self.width;
            self.image.height = self.height;
        }
        self
    }
}

/// Parse a JSON array of frames, restoring image dimensions and reserving ids.
pub fn parse_frames(json: &str) -> Result<Vec<FrameCapture>, serde_json::Error> {
    let frames: Vec<FrameCapture> = serde_json::from_str(json)?;
    Ok(frames
        .into_iter()
        .map(|frame| {
            FrameId::reserve(frame.id);
            frame.restore_dimensions()
        })
        .collect())
}

mod data_url {
    use super::*;

    pub fn serialize<S: Serializer>(image: &FrameImage, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&image.to_data_url())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FrameImage, D::Error> {
        let url = String::deserialize(deserializer)?;
        FrameImage::from_data_url(&url).map_err(serde::de::Error::custom)
    }
}
