//! Image preparation for embedding: decode, downscale, re-encode as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use framedoc_common::error::{FramedocError, FramedocResult};
use framedoc_project_model::frame::{FrameImage, ImageEncoding};

/// Quality used when re-encoding frames for documents.
pub const EMBED_JPEG_QUALITY: u8 = 90;

/// Decode `image`, shrink it to at most `max_width` pixels wide, and
/// re-encode it as baseline RGB JPEG.
///
/// The returned image's dimensions are the decoded ones, so its aspect
/// ratio is correct even if the stored metadata was not.
pub fn prepare_image(image: &FrameImage, max_width: u32) -> FramedocResult<FrameImage> {
    let decoded = image::load_from_memory(&image.bytes)
        .map_err(|e| FramedocError::render(format!("cannot decode image: {e}")))?;

    let decoded = if max_width > 0 && decoded.width() > max_width {
        let height = ((decoded.height() as f64 * max_width as f64 / decoded.width() as f64)
            .round() as u32)
            .max(1);
        decoded.resize_exact(max_width, height, FilterType::Triangle)
    } else {
        decoded
    };

    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, EMBED_JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| FramedocError::render(format!("cannot encode image: {e}")))?;

    Ok(FrameImage::new(ImageEncoding::Jpeg, width, height, bytes))
}

#[cfg(test)]
pub(crate) mod test_images {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use framedoc_project_model::frame::{FrameImage, ImageEncoding};

    /// A gradient PNG of the given size.
    pub fn png(width: u32, height: u32) -> FrameImage {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("png encode");
        FrameImage::new(ImageEncoding::Png, width, height, bytes)
    }

    /// Bytes that no decoder accepts.
    pub fn corrupt() -> FrameImage {
        FrameImage::new(ImageEncoding::Jpeg, 640, 360, b"not an image".to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framedoc_common::error::ErrorKind;

    #[test]
    fn test_prepare_downscales_and_converts_to_jpeg() {
        let prepared = prepare_image(&test_images::png(200, 100), 100).unwrap();
        assert_eq!(prepared.encoding, ImageEncoding::Jpeg);
        assert_eq!((prepared.width, prepared.height), (100, 50));
        assert_eq!(&prepared.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_prepare_keeps_small_images() {
        let prepared = prepare_image(&test_images::png(40, 30), 1280).unwrap();
        assert_eq!((prepared.width, prepared.height), (40, 30));
    }

    #[test]
    fn test_prepare_fixes_wrong_metadata() {
        let mut image = test_images::png(30, 60);
        image.width = 1;
        image.height = 1;
        let prepared = prepare_image(&image, 1280).unwrap();
        assert!((prepared.aspect_ratio() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_corrupt_image_is_render_error() {
        let err = prepare_image(&test_images::corrupt(), 1280).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
    }
}
