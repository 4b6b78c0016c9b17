//! Landmark sets and the fixed index topology of the consumed detectors.
//!
//! A detector returns a dense, fixed-order list of points per subject; the
//! set is either fully present or the detection failed. The index constants
//! below name the anatomical points the anchor resolver builds its reference
//! spans from.

use serde::{Deserialize, Serialize};
use tryon_utils::Point;

use crate::error::TryOnError;

/// Kind of subject a landmark set describes, which fixes its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Dense face mesh (468 points).
    Face,
    /// Single hand skeleton (21 points).
    Hand,
    /// Full-body pose skeleton (33 points).
    Pose,
}

impl SubjectKind {
    /// Number of points the detector emits for this topology.
    pub fn point_count(self) -> usize {
        match self {
            SubjectKind::Face => face::POINT_COUNT,
            SubjectKind::Hand => hand::POINT_COUNT,
            SubjectKind::Pose => pose::POINT_COUNT,
        }
    }
}

/// Face mesh indices used by the placement formulas.
pub mod face {
    pub const POINT_COUNT: usize = 468;

    /// Top of the forehead at the hairline.
    pub const FOREHEAD_TOP: usize = 10;
    /// Chin center.
    pub const CHIN: usize = 152;
    /// Left face-width boundary (cheekbone edge).
    pub const LEFT_EDGE: usize = 234;
    /// Right face-width boundary.
    pub const RIGHT_EDGE: usize = 454;
    /// Left eye outer corner.
    pub const LEFT_EYE_OUTER: usize = 33;
    /// Right eye outer corner.
    pub const RIGHT_EYE_OUTER: usize = 263;
    /// Nose tip.
    pub const NOSE_TIP: usize = 1;
    /// Nose base, just under the tip.
    pub const NOSE_BASE: usize = 2;
    /// Left eyebrow arch peak.
    pub const LEFT_BROW_ARCH: usize = 105;
    /// Right eyebrow arch peak.
    pub const RIGHT_BROW_ARCH: usize = 334;
}

/// Hand skeleton indices.
pub mod hand {
    pub const POINT_COUNT: usize = 21;

    /// Wrist joint.
    pub const WRIST: usize = 0;
    /// Index-finger metacarpophalangeal joint.
    pub const INDEX_MCP: usize = 5;
    /// Middle-finger metacarpophalangeal joint.
    pub const MIDDLE_MCP: usize = 9;
}

/// Body pose indices.
pub mod pose {
    pub const POINT_COUNT: usize = 33;

    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
    pub const LEFT_TOE: usize = 31;
    pub const RIGHT_TOE: usize = 32;
}

/// Ordered landmark points for one detected subject in one frame.
///
/// Points are pixel coordinates in the frame the detection ran on. Indices
/// are stable per [`SubjectKind`]; partial sets are rejected at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    kind: SubjectKind,
    points: Vec<Point>,
}

impl LandmarkSet {
    /// Build a landmark set from pixel-space points.
    ///
    /// # Arguments
    ///
    /// * `kind` - Subject topology the points follow.
    /// * `points` - One point per topology index, in order.
    pub fn from_pixels(kind: SubjectKind, points: Vec<Point>) -> Result<Self, TryOnError> {
        if points.len() < kind.point_count() {
            return Err(TryOnError::GeometryDegenerate(format!(
                "{:?} topology needs {} points, got {}",
                kind,
                kind.point_count(),
                points.len()
            )));
        }
        Ok(Self { kind, points })
    }

    /// Build a landmark set from detector-normalized coordinates in `[0, 1]`.
    ///
    /// # Arguments
    ///
    /// * `kind` - Subject topology the points follow.
    /// * `normalized` - `[x, y]` pairs normalized to the frame.
    /// * `frame_width`, `frame_height` - Frame dimensions used to denormalize.
    pub fn from_normalized(
        kind: SubjectKind,
        normalized: &[[f32; 2]],
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Self, TryOnError> {
        let (w, h) = (frame_width as f32, frame_height as f32);
        let points = normalized
            .iter()
            .map(|[x, y]| Point::new(x * w, y * h))
            .collect();
        Self::from_pixels(kind, points)
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at a topology index, if present.
    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Pair of points for a landmark span, if both endpoints are present.
    pub fn span(&self, a: usize, b: usize) -> Option<(Point, Point)> {
        Some((self.point(a)?, self.point(b)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(kind: SubjectKind, value: Point) -> Vec<Point> {
        vec![value; kind.point_count()]
    }

    #[test]
    fn rejects_partial_sets() {
        let result = LandmarkSet::from_pixels(SubjectKind::Hand, vec![Point::new(1.0, 1.0); 5]);
        assert!(matches!(result, Err(TryOnError::GeometryDegenerate(_))));
    }

    #[test]
    fn denormalizes_against_frame_dimensions() {
        let normalized = vec![[0.5f32, 0.25f32]; SubjectKind::Hand.point_count()];
        let set = LandmarkSet::from_normalized(SubjectKind::Hand, &normalized, 640, 480)
            .expect("valid set");
        let wrist = set.point(hand::WRIST).expect("wrist");
        assert!((wrist.x - 320.0).abs() < f32::EPSILON);
        assert!((wrist.y - 120.0).abs() < f32::EPSILON);
    }

    #[test]
    fn span_requires_both_endpoints() {
        let set = LandmarkSet::from_pixels(
            SubjectKind::Pose,
            filled(SubjectKind::Pose, Point::new(2.0, 3.0)),
        )
        .expect("valid set");
        assert!(set.span(pose::LEFT_SHOULDER, pose::RIGHT_SHOULDER).is_some());
        assert!(set.span(pose::LEFT_SHOULDER, 500).is_none());
    }
}
