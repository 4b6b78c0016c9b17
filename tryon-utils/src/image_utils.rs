use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage, RgbaImage};

/// Load an image from disk into memory.
///
/// # Arguments
///
/// * `path` - The path to the image file.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path_ref = path.as_ref();
    image::open(path_ref).with_context(|| format!("failed to open image {}", path_ref.display()))
}

/// Decode encoded image bytes (PNG/JPEG/...) into an RGB frame buffer.
///
/// # Arguments
///
/// * `bytes` - The encoded image payload.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    let decoded = image::load_from_memory(bytes).context("failed to decode image bytes")?;
    Ok(decoded.to_rgb8())
}

/// Promote any image into RGBA. Three-channel sources become fully opaque.
///
/// # Arguments
///
/// * `image` - The image to promote.
pub fn ensure_rgba(image: &DynamicImage) -> RgbaImage {
    image.to_rgba8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    #[test]
    fn decode_round_trips_png_bytes() {
        let mut source = RgbImage::new(3, 2);
        source.put_pixel(1, 1, Rgb([10, 20, 30]));

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(source.clone())
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");

        let decoded = decode_image(&bytes).expect("decode");
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn ensure_rgba_promotes_rgb_to_opaque() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([5, 6, 7])));
        let rgba = ensure_rgba(&source);
        assert_eq!(rgba.get_pixel(0, 0).0, [5, 6, 7, 255]);
    }
}
