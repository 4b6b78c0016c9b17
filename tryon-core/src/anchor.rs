//! Anchor resolution: from landmark geometry to a placement rectangle.
//!
//! `resolve` is a pure function over a landmark set and a category policy.
//! It derives the overlay size from the policy's reference spans, positions
//! the anchor point, applies the category offsets and orientation, and clamps
//! the resulting rectangle against the frame so the overlay never starts
//! outside it. Degenerate geometry floors the size instead of failing.

use crate::error::TryOnError;
use crate::landmarks::LandmarkSet;
use crate::policy::{AnchorAt, CategoryPolicy, OffsetBasis, VerticalAnchor};
use tryon_utils::Point;

/// Smallest overlay edge the resolver will produce, in pixels.
///
/// A zero or near-zero reference distance (collapsed landmarks) floors the
/// overlay at this size rather than producing a zero-size or NaN placement.
pub const MIN_OVERLAY_PX: f32 = 4.0;

/// Resolved placement for one overlay: where it goes and how big it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorSpec {
    /// Center of the destination rectangle, in frame pixels.
    pub center: Point,
    /// Overlay width after scaling, always >= [`MIN_OVERLAY_PX`].
    pub width: f32,
    /// Overlay height after scaling, always >= [`MIN_OVERLAY_PX`].
    pub height: f32,
    /// Rotation applied about the overlay center, degrees.
    pub rotation_deg: f32,
    /// Whether hair pixels should occlude the overlay.
    pub behind_hair: bool,
}

impl AnchorSpec {
    /// Destination top-left corner implied by the center and size.
    pub fn top_left(&self) -> Point {
        Point {
            x: self.width.mul_add(-0.5, self.center.x),
            y: self.height.mul_add(-0.5, self.center.y),
        }
    }
}

/// Resolve an overlay placement.
///
/// The algorithm proceeds as follows:
/// 1. Measure the policy's width span; `width = distance * multiplier`.
/// 2. Measure the height span when the policy has one, otherwise keep the
///    asset's native aspect ratio.
/// 3. Floor both edges at [`MIN_OVERLAY_PX`] and apply the wearer scale.
/// 4. Position the anchor point and apply the category offsets.
/// 5. Apply orientation: backward offset along the axis direction and/or a
///    damped rotation angle.
/// 6. Clamp the destination rectangle so it never starts outside the frame;
///    an overlay larger than the frame starts at the near edge and is
///    cropped on the far side by the compositor.
///
/// # Arguments
///
/// * `landmarks` - Detected subject the policy's spans are measured on.
/// * `policy` - Placement geometry for the requested category and wearer.
/// * `asset_dims` - Native (width, height) of the overlay asset.
/// * `frame_dims` - Target frame (width, height) used for clamping.
/// * `overlay_scale` - Uniform wearer scale (e.g. 0.85 for kids).
pub fn resolve(
    landmarks: &LandmarkSet,
    policy: &CategoryPolicy,
    asset_dims: (u32, u32),
    frame_dims: (u32, u32),
    overlay_scale: f32,
) -> Result<AnchorSpec, TryOnError> {
    let (span_a, span_b) = policy.width_span.resolve(landmarks).ok_or_else(|| {
        TryOnError::GeometryDegenerate(format!(
            "{:?} span unavailable on {:?} landmarks",
            policy.width_span,
            landmarks.kind()
        ))
    })?;
    let ref_dist = span_a.distance(span_b);

    let (asset_w, asset_h) = (asset_dims.0 as f32, asset_dims.1 as f32);
    if asset_w < 1.0 || asset_h < 1.0 {
        return Err(TryOnError::GeometryDegenerate(
            "overlay asset has a zero dimension".to_string(),
        ));
    }

    let scale_adjust = if overlay_scale.is_finite() && overlay_scale > 0.0 {
        overlay_scale
    } else {
        1.0
    };

    let width = (ref_dist * policy.width_mult * scale_adjust).max(MIN_OVERLAY_PX);
    let height = match policy.height {
        Some((span, mult)) => {
            let (ha, hb) = span.resolve(landmarks).ok_or_else(|| {
                TryOnError::GeometryDegenerate(format!(
                    "{:?} height span unavailable on {:?} landmarks",
                    span,
                    landmarks.kind()
                ))
            })?;
            (ha.distance(hb) * mult * scale_adjust).max(MIN_OVERLAY_PX)
        }
        None => (width * asset_h / asset_w).max(MIN_OVERLAY_PX),
    };

    // Anchor point before offsets.
    let mut anchor = match policy.anchor {
        AnchorAt::SpanMid(span) => {
            let (a, b) = span.resolve(landmarks).ok_or_else(|| {
                TryOnError::GeometryDegenerate(format!("{:?} anchor span unavailable", span))
            })?;
            a.midpoint(b)
        }
        AnchorAt::SpanTop(span) => {
            let (a, b) = span.resolve(landmarks).ok_or_else(|| {
                TryOnError::GeometryDegenerate(format!("{:?} anchor span unavailable", span))
            })?;
            Point {
                x: (a.x + b.x) * 0.5,
                y: a.y.min(b.y),
            }
        }
        AnchorAt::Landmark(index) => landmarks.point(index).ok_or_else(|| {
            TryOnError::GeometryDegenerate(format!("anchor landmark {} unavailable", index))
        })?,
    };

    anchor.x += policy.h_offset * ref_dist;
    anchor.y += match policy.v_offset_basis {
        OffsetBasis::RefDistance => policy.v_offset * ref_dist,
        OffsetBasis::AssetHeight => policy.v_offset * height,
    };
    anchor.y += policy.frame_v_offset * frame_dims.1 as f32;

    let mut rotation_deg = 0.0;
    if let Some(rotation) = policy.rotation {
        if let Some((axis_a, axis_b)) = rotation.axis.resolve(landmarks) {
            if let Some(direction) = axis_a.direction_to(axis_b) {
                rotation_deg = axis_a.angle_to(axis_b) * rotation.damping;
                // Push opposite the axis direction (e.g. a watch face sits
                // away from the fingers).
                anchor = direction.mul_add(-(rotation.backward_offset * ref_dist), anchor);
            }
        }
    }

    let center = match policy.vertical {
        VerticalAnchor::Center => anchor,
        VerticalAnchor::TopEdge => Point {
            x: anchor.x,
            y: height.mul_add(0.5, anchor.y),
        },
    };

    Ok(AnchorSpec {
        center: clamp_center(center, width, height, frame_dims),
        width,
        height,
        rotation_deg,
        behind_hair: policy.behind_hair,
    })
}

/// Clamp the destination rectangle's top-left corner into the frame.
///
/// An overlay wider or taller than the frame keeps its near edge at zero and
/// relies on the compositor to crop the far side.
fn clamp_center(center: Point, width: f32, height: f32, frame_dims: (u32, u32)) -> Point {
    let (frame_w, frame_h) = (frame_dims.0 as f32, frame_dims.1 as f32);
    let left = width.mul_add(-0.5, center.x);
    let top = height.mul_add(-0.5, center.y);
    let left = left.clamp(0.0, (frame_w - width).max(0.0));
    let top = top.clamp(0.0, (frame_h - height).max(0.0));
    Point {
        x: width.mul_add(0.5, left),
        y: height.mul_add(0.5, top),
    }
}
