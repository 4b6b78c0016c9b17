//! Alpha compositing of a resolved overlay into a frame.
//!
//! The compositor mutates the frame in place. It resizes and rotates the
//! overlay per the anchor spec, jointly clips the source and destination
//! rectangles against the frame, and blends per pixel. Every failure mode
//! leaves the frame untouched; compositing is a best-effort visual
//! enhancement, so callers absorb errors rather than abort requests.

use image::{GrayImage, RgbImage, Rgba, RgbaImage, imageops::FilterType};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

use crate::anchor::AnchorSpec;
use crate::error::TryOnError;

/// Rotations smaller than this are treated as axis-aligned placements.
const ROTATION_EPS_DEG: f32 = 0.01;

/// What the compositor did with the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendOutcome {
    /// The overlay was blended into the frame.
    Applied,
    /// The destination rectangle did not intersect the frame; no-op.
    OffFrame,
}

/// Blend an overlay into `frame` at the anchor's placement.
///
/// # Arguments
///
/// * `frame` - Target frame, mutated in place.
/// * `asset` - Overlay raster (RGBA; opaque if promoted from RGB).
/// * `anchor` - Resolved placement from the anchor resolver.
pub fn blend(
    frame: &mut RgbImage,
    asset: &RgbaImage,
    anchor: &AnchorSpec,
) -> Result<BlendOutcome, TryOnError> {
    blend_with_mask(frame, asset, anchor, None)
}

/// Blend an overlay, optionally suppressing its alpha under hair pixels.
///
/// The hair mask is a soft segmentation (255 = hair) aligned with the frame;
/// `behind_hair` anchors multiply overlay alpha by `(1 - mask)` so hair
/// occludes the accessory.
///
/// # Arguments
///
/// * `frame` - Target frame, mutated in place.
/// * `asset` - Overlay raster.
/// * `anchor` - Resolved placement.
/// * `hair_mask` - Optional frame-aligned segmentation mask.
pub fn blend_with_mask(
    frame: &mut RgbImage,
    asset: &RgbaImage,
    anchor: &AnchorSpec,
    hair_mask: Option<&GrayImage>,
) -> Result<BlendOutcome, TryOnError> {
    let (frame_w, frame_h) = frame.dimensions();
    if frame_w == 0 || frame_h == 0 {
        return Ok(BlendOutcome::OffFrame);
    }
    if asset.width() == 0 || asset.height() == 0 {
        return Err(TryOnError::CompositingBounds(
            "overlay asset has a zero dimension".to_string(),
        ));
    }
    if let Some(mask) = hair_mask {
        if mask.dimensions() != (frame_w, frame_h) {
            return Err(TryOnError::CompositingBounds(format!(
                "hair mask is {:?}, frame is {:?}",
                mask.dimensions(),
                (frame_w, frame_h)
            )));
        }
    }

    let target_w = anchor.width.round().max(1.0) as u32;
    let target_h = anchor.height.round().max(1.0) as u32;

    let mut overlay = if asset.dimensions() == (target_w, target_h) {
        asset.clone()
    } else {
        image::imageops::resize(asset, target_w, target_h, FilterType::Lanczos3)
    };

    if anchor.rotation_deg.abs() > ROTATION_EPS_DEG {
        // Areas exposed by the rotation stay fully transparent.
        overlay = rotate_about_center(
            &overlay,
            anchor.rotation_deg.to_radians(),
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        );
    }

    let (overlay_w, overlay_h) = overlay.dimensions();
    let left = (overlay_w as f32).mul_add(-0.5, anchor.center.x).round() as i64;
    let top = (overlay_h as f32).mul_add(-0.5, anchor.center.y).round() as i64;

    // Joint clip of source and destination rectangles.
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + overlay_w as i64).min(frame_w as i64);
    let y1 = (top + overlay_h as i64).min(frame_h as i64);
    if x0 >= x1 || y0 >= y1 {
        return Ok(BlendOutcome::OffFrame);
    }

    let span_w = (x1 - x0) as u32;
    let span_h = (y1 - y0) as u32;
    let src_x0 = (x0 - left) as u32;
    let src_y0 = (y0 - top) as u32;
    if src_x0 + span_w > overlay_w || src_y0 + span_h > overlay_h {
        return Err(TryOnError::CompositingBounds(format!(
            "clipped source {}x{}+{}+{} exceeds overlay {}x{}",
            span_w, span_h, src_x0, src_y0, overlay_w, overlay_h
        )));
    }

    for dy in 0..span_h {
        let frame_y = y0 as u32 + dy;
        let src_y = src_y0 + dy;
        for dx in 0..span_w {
            let frame_x = x0 as u32 + dx;
            let src = overlay.get_pixel(src_x0 + dx, src_y);

            let mut alpha = src[3] as f32 / 255.0;
            if let Some(mask) = hair_mask {
                alpha *= 1.0 - mask.get_pixel(frame_x, frame_y)[0] as f32 / 255.0;
            }
            if alpha <= 0.0 {
                continue;
            }

            let dst = frame.get_pixel_mut(frame_x, frame_y);
            if alpha >= 1.0 {
                dst.0 = [src[0], src[1], src[2]];
            } else {
                for channel in 0..3 {
                    let blended = (src[channel] as f32).mul_add(
                        alpha,
                        dst[channel] as f32 * (1.0 - alpha),
                    );
                    dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    Ok(BlendOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tryon_utils::Point;

    fn anchor_at(x: f32, y: f32, width: f32, height: f32) -> AnchorSpec {
        AnchorSpec {
            center: Point::new(x, y),
            width,
            height,
            rotation_deg: 0.0,
            behind_hair: false,
        }
    }

    fn solid_asset(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    #[test]
    fn opaque_overlay_replaces_the_region_exactly() {
        let mut frame = RgbImage::from_pixel(40, 40, image::Rgb([10, 10, 10]));
        let asset = solid_asset(10, 10, [200, 50, 25, 255]);

        let outcome = blend(&mut frame, &asset, &anchor_at(20.0, 20.0, 10.0, 10.0))
            .expect("blend should succeed");
        assert_eq!(outcome, BlendOutcome::Applied);

        assert_eq!(frame.get_pixel(20, 20).0, [200, 50, 25]);
        assert_eq!(frame.get_pixel(15, 15).0, [200, 50, 25]);
        assert_eq!(frame.get_pixel(24, 24).0, [200, 50, 25]);
        // Just outside the destination rectangle.
        assert_eq!(frame.get_pixel(14, 14).0, [10, 10, 10]);
        assert_eq!(frame.get_pixel(25, 25).0, [10, 10, 10]);
    }

    #[test]
    fn transparent_overlay_is_a_round_trip_no_op() {
        let mut frame = RgbImage::from_pixel(32, 32, image::Rgb([77, 88, 99]));
        let original = frame.clone();
        let asset = solid_asset(16, 16, [255, 255, 255, 0]);

        blend(&mut frame, &asset, &anchor_at(16.0, 16.0, 16.0, 16.0)).expect("blend");
        assert_eq!(frame, original);
    }

    #[test]
    fn half_alpha_blends_linearly() {
        let mut frame = RgbImage::from_pixel(8, 8, image::Rgb([0, 0, 0]));
        let asset = solid_asset(8, 8, [200, 100, 50, 128]);

        blend(&mut frame, &asset, &anchor_at(4.0, 4.0, 8.0, 8.0)).expect("blend");
        let pixel = frame.get_pixel(4, 4);
        // 128/255 of the overlay value, rounded.
        assert_eq!(pixel.0, [100, 50, 25]);
    }

    #[test]
    fn overlay_larger_than_frame_is_cropped_not_skipped() {
        let mut frame = RgbImage::from_pixel(20, 20, image::Rgb([1, 2, 3]));
        let asset = solid_asset(10, 10, [250, 250, 250, 255]);

        let outcome = blend(&mut frame, &asset, &anchor_at(10.0, 10.0, 100.0, 100.0))
            .expect("blend");
        assert_eq!(outcome, BlendOutcome::Applied);
        assert_eq!(frame.get_pixel(0, 0).0, [250, 250, 250]);
        assert_eq!(frame.get_pixel(19, 19).0, [250, 250, 250]);
    }

    #[test]
    fn disjoint_destination_is_a_clean_off_frame() {
        let mut frame = RgbImage::from_pixel(16, 16, image::Rgb([9, 9, 9]));
        let original = frame.clone();
        let asset = solid_asset(4, 4, [255, 0, 0, 255]);

        let outcome = blend(&mut frame, &asset, &anchor_at(100.0, 100.0, 4.0, 4.0))
            .expect("blend");
        assert_eq!(outcome, BlendOutcome::OffFrame);
        assert_eq!(frame, original);
    }

    #[test]
    fn corner_placement_stays_in_bounds() {
        for &(cx, cy) in &[(0.0f32, 0.0f32), (16.0, 0.0), (0.0, 16.0), (16.0, 16.0)] {
            let mut frame = RgbImage::from_pixel(16, 16, image::Rgb([5, 5, 5]));
            let asset = solid_asset(8, 8, [200, 0, 0, 255]);
            blend(&mut frame, &asset, &anchor_at(cx, cy, 8.0, 8.0)).expect("blend");
            // Reaching here without a panic means no out-of-bounds writes.
            assert_eq!(frame.dimensions(), (16, 16));
        }
    }

    #[test]
    fn hair_mask_suppresses_overlay_alpha() {
        let mut frame = RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0]));
        let asset = solid_asset(10, 10, [200, 200, 200, 255]);
        let mut mask = GrayImage::from_pixel(10, 10, image::Luma([0]));
        // Hair covers the left half.
        for y in 0..10 {
            for x in 0..5 {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }

        blend_with_mask(
            &mut frame,
            &asset,
            &anchor_at(5.0, 5.0, 10.0, 10.0),
            Some(&mask),
        )
        .expect("blend");

        assert_eq!(frame.get_pixel(2, 5).0, [0, 0, 0]);
        assert_eq!(frame.get_pixel(7, 5).0, [200, 200, 200]);
    }

    #[test]
    fn mismatched_hair_mask_leaves_the_frame_unchanged() {
        let mut frame = RgbImage::from_pixel(10, 10, image::Rgb([3, 3, 3]));
        let original = frame.clone();
        let asset = solid_asset(4, 4, [255, 255, 255, 255]);
        let mask = GrayImage::new(5, 5);

        let result = blend_with_mask(
            &mut frame,
            &asset,
            &anchor_at(5.0, 5.0, 4.0, 4.0),
            Some(&mask),
        );
        assert!(matches!(result, Err(TryOnError::CompositingBounds(_))));
        assert_eq!(frame, original);
    }

    #[test]
    fn rotation_exposes_transparent_corners() {
        let mut frame = RgbImage::from_pixel(40, 40, image::Rgb([7, 7, 7]));
        let asset = solid_asset(20, 20, [255, 255, 255, 255]);
        let anchor = AnchorSpec {
            center: Point::new(20.0, 20.0),
            width: 20.0,
            height: 20.0,
            rotation_deg: 45.0,
            behind_hair: false,
        };

        blend(&mut frame, &asset, &anchor).expect("blend");
        // The rotated square's corners fall outside the diamond; the frame
        // shows through there.
        assert_eq!(frame.get_pixel(11, 11).0, [7, 7, 7]);
        // The center is still covered.
        assert_eq!(frame.get_pixel(20, 20).0, [255, 255, 255]);
    }
}
