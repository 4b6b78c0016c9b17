//! Elliptical restore masks for the clothing pipeline.
//!
//! Clothing overlays routinely cover the neck and chin. After the final draw
//! pass, an elliptical region centered above the shoulder midpoint copies
//! the original (pre-overlay) pixels back in. Only the lower half of the
//! ellipse is used, matching the open neckline shape.

use image::{GrayImage, Luma, RgbImage};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

use crate::error::TryOnError;
use tryon_utils::Point;

/// Neck patch width as a fraction of the shoulder span (one ellipse radius).
pub const NECK_RADIUS_FRAC: f32 = 0.2;
/// Upward shift of the patch center as a fraction of the shoulder span.
pub const NECK_RAISE_FRAC: f32 = 0.28;

/// Rasterize the lower half of an ellipse as an 8-bit coverage mask.
///
/// Returns `None` when the ellipse has no area or lies entirely outside the
/// frame.
///
/// # Arguments
///
/// * `frame_dims` - Mask dimensions (matching the target frame).
/// * `center` - Ellipse center in frame pixels.
/// * `radii` - Horizontal and vertical radii in pixels.
pub fn lower_ellipse_mask(
    frame_dims: (u32, u32),
    center: Point,
    radii: (f32, f32),
) -> Option<GrayImage> {
    let (width, height) = frame_dims;
    let (rx, ry) = radii;
    if width == 0 || height == 0 || rx < 1.0 || ry < 1.0 {
        return None;
    }

    let mut pixmap = Pixmap::new(width, height)?;
    let oval = Rect::from_xywh(center.x - rx, center.y - ry, rx * 2.0, ry * 2.0)?;
    let path = PathBuilder::from_oval(oval)?;

    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    let data = pixmap.data();
    let mut mask = GrayImage::new(width, height);
    let mut covered = false;
    for y in 0..height {
        // Upper half of the ellipse is discarded.
        if (y as f32) < center.y {
            continue;
        }
        for x in 0..width {
            let alpha = data[((y * width + x) * 4 + 3) as usize];
            if alpha > 0 {
                covered = true;
                mask.put_pixel(x, y, Luma([alpha]));
            }
        }
    }

    covered.then_some(mask)
}

/// Copy `original` pixels back into `frame` wherever the mask covers.
///
/// # Arguments
///
/// * `frame` - Composited frame, mutated in place.
/// * `original` - Pre-overlay copy of the same frame.
/// * `mask` - Coverage mask; values above 127 restore the pixel.
pub fn restore_masked(
    frame: &mut RgbImage,
    original: &RgbImage,
    mask: &GrayImage,
) -> Result<(), TryOnError> {
    let dims = frame.dimensions();
    if original.dimensions() != dims || mask.dimensions() != dims {
        return Err(TryOnError::CompositingBounds(format!(
            "restore mask/original dimensions disagree with frame {:?}",
            dims
        )));
    }

    for (x, y, pixel) in frame.enumerate_pixels_mut() {
        if mask.get_pixel(x, y)[0] > 127 {
            *pixel = *original.get_pixel(x, y);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn mask_covers_only_the_lower_half() {
        let mask = lower_ellipse_mask((100, 100), Point::new(50.0, 50.0), (20.0, 15.0))
            .expect("mask");
        // Below center, inside the ellipse.
        assert!(mask.get_pixel(50, 60)[0] > 127);
        // Above center is always clear.
        assert_eq!(mask.get_pixel(50, 40)[0], 0);
        // Outside the horizontal extent.
        assert_eq!(mask.get_pixel(10, 55)[0], 0);
    }

    #[test]
    fn degenerate_radii_produce_no_mask() {
        assert!(lower_ellipse_mask((100, 100), Point::new(50.0, 50.0), (0.5, 10.0)).is_none());
        assert!(lower_ellipse_mask((0, 0), Point::new(0.0, 0.0), (5.0, 5.0)).is_none());
    }

    #[test]
    fn off_frame_ellipse_produces_no_mask() {
        assert!(lower_ellipse_mask((50, 50), Point::new(500.0, 500.0), (5.0, 5.0)).is_none());
    }

    #[test]
    fn restore_copies_original_under_the_mask() {
        let mut frame = RgbImage::from_pixel(20, 20, Rgb([200, 200, 200]));
        let original = RgbImage::from_pixel(20, 20, Rgb([10, 20, 30]));
        let mut mask = GrayImage::new(20, 20);
        mask.put_pixel(5, 5, Luma([255]));
        mask.put_pixel(6, 5, Luma([100])); // below threshold

        restore_masked(&mut frame, &original, &mask).expect("restore");
        assert_eq!(frame.get_pixel(5, 5).0, [10, 20, 30]);
        assert_eq!(frame.get_pixel(6, 5).0, [200, 200, 200]);
        assert_eq!(frame.get_pixel(0, 0).0, [200, 200, 200]);
    }

    #[test]
    fn restore_rejects_mismatched_dimensions() {
        let mut frame = RgbImage::new(10, 10);
        let original = RgbImage::new(8, 8);
        let mask = GrayImage::new(10, 10);
        assert!(matches!(
            restore_masked(&mut frame, &original, &mask),
            Err(TryOnError::CompositingBounds(_))
        ));
    }
}
