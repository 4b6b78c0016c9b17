//! Category policy table: per-category placement geometry.
//!
//! Every try-on category resolves to a closed [`Category`] variant once, at
//! request decode time, and from there to a [`CategoryPolicy`] describing
//! which landmark spans size the overlay, where it anchors, and how it is
//! offset and rotated. The multipliers are empirically tuned per category and
//! wearer group; treat them as configuration, not as math to simplify.

use serde::{Deserialize, Serialize};

use crate::error::TryOnError;
use crate::landmarks::{LandmarkSet, SubjectKind, face, hand, pose};
use tryon_utils::Point;

/// Wearer group selecting a tuned multiplier set for clothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Wearer {
    Male,
    #[default]
    Female,
    KidBoy,
    KidGirl,
}

impl Wearer {
    /// Uniform shrink applied to overlays for child wearers.
    pub fn overlay_scale(self) -> f32 {
        match self {
            Wearer::KidBoy | Wearer::KidGirl => 0.85,
            _ => 1.0,
        }
    }

    pub fn is_kid(self) -> bool {
        matches!(self, Wearer::KidBoy | Wearer::KidGirl)
    }

    /// Wearer group encoded in a tag prefix (`m_`, `f_`, `kb_`, `kg_`).
    pub fn from_tag_prefix(tag: &str) -> Option<Wearer> {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.starts_with("kb_") {
            Some(Wearer::KidBoy)
        } else if tag.starts_with("kg_") {
            Some(Wearer::KidGirl)
        } else if tag.starts_with("m_") {
            Some(Wearer::Male)
        } else if tag.starts_with("f_") {
            Some(Wearer::Female)
        } else {
            None
        }
    }
}

/// Which clothing slot a category occupies when building an outfit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Accessory,
    Top,
    Bottom,
    Dress,
}

/// Closed set of try-on categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Glasses,
    Cap,
    Hat,
    Moustache,
    Beard,
    Nosepin,
    Earrings,
    Bindi,
    Tikka,
    Necklace,
    Watch,
    Shirt,
    Polo,
    Kurta,
    Blouse,
    Pant,
    Pajama,
    Jeans,
    Tunic,
    Skirt,
    Shorts,
    FullSuit,
    Sundress,
    Gown,
    Saree,
    Lehenga,
}

/// Tag fragments matched against incoming category strings, most specific
/// first so e.g. `full_suit` never falls through to `suit`-as-substring of
/// something shorter and `tshirt` resolves to `Shirt`.
const TAG_TABLE: &[(&str, Category)] = &[
    ("lehenga", Category::Lehenga),
    ("sundress", Category::Sundress),
    ("full_suit", Category::FullSuit),
    ("moustache", Category::Moustache),
    ("necklace", Category::Necklace),
    ("earring", Category::Earrings),
    ("glasses", Category::Glasses),
    ("nosepin", Category::Nosepin),
    ("pajama", Category::Pajama),
    ("blouse", Category::Blouse),
    ("shorts", Category::Shorts),
    ("beard", Category::Beard),
    ("bindi", Category::Bindi),
    ("jeans", Category::Jeans),
    ("kurta", Category::Kurta),
    ("saree", Category::Saree),
    ("shirt", Category::Shirt),
    ("skirt", Category::Skirt),
    ("tikka", Category::Tikka),
    ("tunic", Category::Tunic),
    ("watch", Category::Watch),
    ("gown", Category::Gown),
    ("pant", Category::Pant),
    ("polo", Category::Polo),
    ("suit", Category::FullSuit),
    ("cap", Category::Cap),
    ("hat", Category::Hat),
];

impl Category {
    /// Resolve a category from a request tag (e.g. `m_shirt1`, `kg_tshirt`,
    /// `glasses`). Returns `None` for tags outside the closed set.
    pub fn from_tag(tag: &str) -> Option<Category> {
        let tag = tag.trim().to_ascii_lowercase();
        let bare = Wearer::from_tag_prefix(&tag)
            .map(|_| tag.splitn(2, '_').nth(1).unwrap_or(&tag).to_string())
            .unwrap_or(tag);
        TAG_TABLE
            .iter()
            .find(|(fragment, _)| bare.contains(*fragment))
            .map(|(_, category)| *category)
    }

    /// Outfit slot this category occupies.
    pub fn slot(self) -> Slot {
        match self {
            Category::Shirt | Category::Polo | Category::Kurta | Category::Blouse => Slot::Top,
            Category::Pant
            | Category::Pajama
            | Category::Jeans
            | Category::Tunic
            | Category::Skirt
            | Category::Shorts => Slot::Bottom,
            Category::FullSuit
            | Category::Sundress
            | Category::Gown
            | Category::Saree
            | Category::Lehenga => Slot::Dress,
            _ => Slot::Accessory,
        }
    }

    pub fn is_clothing(self) -> bool {
        self.slot() != Slot::Accessory
    }

    /// Asset directory name for this category.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Glasses => "glasses",
            Category::Cap => "caps",
            Category::Hat => "hats",
            Category::Moustache => "moustache",
            Category::Beard => "beard",
            Category::Nosepin => "nosepin",
            Category::Earrings => "earrings",
            Category::Bindi => "bindi",
            Category::Tikka => "tikka",
            Category::Necklace => "necklace",
            Category::Watch => "watches",
            Category::Shirt => "shirts",
            Category::Polo => "polos",
            Category::Kurta => "kurtas",
            Category::Blouse => "blouses",
            Category::Pant => "pants",
            Category::Pajama => "pajamas",
            Category::Jeans => "jeans",
            Category::Tunic => "tunics",
            Category::Skirt => "skirts",
            Category::Shorts => "shorts",
            Category::FullSuit => "suits",
            Category::Sundress => "sundresses",
            Category::Gown => "gowns",
            Category::Saree => "sarees",
            Category::Lehenga => "lehengas",
        }
    }
}

/// A landmark pair whose distance (or axis) drives sizing and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSpan {
    /// Outer eye corners (face 33-263).
    EyeSpan,
    /// Face-width boundary (face 234-454).
    FaceWidth,
    /// Forehead to chin (face 10-152).
    FaceHeight,
    /// Brow arch peaks (face 105-334).
    BrowSpan,
    /// Nose tip to base (face 1-2), used for orientation.
    NoseAxis,
    /// Shoulders (pose 11-12).
    ShoulderSpan,
    /// Hips (pose 23-24).
    HipSpan,
    /// Shoulder to hip (pose 11-23).
    TorsoHeight,
    /// Hip to toe (pose 23-31).
    LegHeight,
    /// Shoulder to toe (pose 11-31).
    FullHeight,
    /// Wrist to middle-finger base (hand 0-9).
    HandAxis,
}

impl RefSpan {
    /// Subject kind and endpoint indices for this span.
    pub fn endpoints(self) -> (SubjectKind, usize, usize) {
        match self {
            RefSpan::EyeSpan => (
                SubjectKind::Face,
                face::LEFT_EYE_OUTER,
                face::RIGHT_EYE_OUTER,
            ),
            RefSpan::FaceWidth => (SubjectKind::Face, face::LEFT_EDGE, face::RIGHT_EDGE),
            RefSpan::FaceHeight => (SubjectKind::Face, face::FOREHEAD_TOP, face::CHIN),
            RefSpan::BrowSpan => (SubjectKind::Face, face::LEFT_BROW_ARCH, face::RIGHT_BROW_ARCH),
            RefSpan::NoseAxis => (SubjectKind::Face, face::NOSE_TIP, face::NOSE_BASE),
            RefSpan::ShoulderSpan => (SubjectKind::Pose, pose::LEFT_SHOULDER, pose::RIGHT_SHOULDER),
            RefSpan::HipSpan => (SubjectKind::Pose, pose::LEFT_HIP, pose::RIGHT_HIP),
            RefSpan::TorsoHeight => (SubjectKind::Pose, pose::LEFT_SHOULDER, pose::LEFT_HIP),
            RefSpan::LegHeight => (SubjectKind::Pose, pose::LEFT_HIP, pose::LEFT_TOE),
            RefSpan::FullHeight => (SubjectKind::Pose, pose::LEFT_SHOULDER, pose::LEFT_TOE),
            RefSpan::HandAxis => (SubjectKind::Hand, hand::WRIST, hand::MIDDLE_MCP),
        }
    }

    /// Resolve the span endpoints against a landmark set.
    ///
    /// Returns `None` when the set has the wrong subject kind or is missing
    /// an endpoint.
    pub fn resolve(self, landmarks: &LandmarkSet) -> Option<(Point, Point)> {
        let (kind, a, b) = self.endpoints();
        if landmarks.kind() != kind {
            return None;
        }
        landmarks.span(a, b)
    }
}

/// Where the anchor point sits relative to the landmark geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorAt {
    /// Midpoint of a span.
    SpanMid(RefSpan),
    /// Span midpoint x, topmost endpoint y (clothing hangs from here).
    SpanTop(RefSpan),
    /// A single landmark index of the policy's subject kind.
    Landmark(usize),
}

/// Whether the anchor point is the overlay center or its top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Center,
    TopEdge,
}

/// What the vertical offset fraction is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetBasis {
    /// The width-span reference distance.
    RefDistance,
    /// The resolved overlay height.
    AssetHeight,
}

/// Orientation handling for categories that follow a landmark axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSpec {
    /// Landmark pair defining the direction vector.
    pub axis: RefSpan,
    /// Fraction of the axis angle applied as overlay rotation.
    pub damping: f32,
    /// Positional shift opposite the axis direction, as a fraction of the
    /// width-span reference distance (places a watch face away from the
    /// fingers).
    pub backward_offset: f32,
}

/// Placement geometry for one category and wearer group.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPolicy {
    pub category: Category,
    /// Span and multiplier that set the overlay width.
    pub width_span: RefSpan,
    pub width_mult: f32,
    /// Independent height span and multiplier; `None` preserves the asset's
    /// native aspect ratio.
    pub height: Option<(RefSpan, f32)>,
    pub anchor: AnchorAt,
    pub vertical: VerticalAnchor,
    /// Horizontal offset as a fraction of the width-span distance, +right.
    pub h_offset: f32,
    /// Vertical offset fraction, +down, measured against `v_offset_basis`.
    pub v_offset: f32,
    pub v_offset_basis: OffsetBasis,
    /// Additional vertical offset as a fraction of the frame height, +down.
    pub frame_v_offset: f32,
    pub rotation: Option<RotationSpec>,
    /// Suppress overlay alpha under hair pixels (earrings).
    pub behind_hair: bool,
    /// Second placement at this landmark with the horizontal offset negated
    /// (paired accessories such as earrings).
    pub mirror_landmark: Option<usize>,
}

impl CategoryPolicy {
    fn new(category: Category, width_span: RefSpan, width_mult: f32, anchor: AnchorAt) -> Self {
        Self {
            category,
            width_span,
            width_mult,
            height: None,
            anchor,
            vertical: VerticalAnchor::Center,
            h_offset: 0.0,
            v_offset: 0.0,
            v_offset_basis: OffsetBasis::RefDistance,
            frame_v_offset: 0.0,
            rotation: None,
            behind_hair: false,
            mirror_landmark: None,
        }
    }

    fn with_height(mut self, span: RefSpan, mult: f32) -> Self {
        self.height = Some((span, mult));
        self
    }

    fn top_edge(mut self) -> Self {
        self.vertical = VerticalAnchor::TopEdge;
        self
    }

    fn offset(mut self, h: f32, v: f32, basis: OffsetBasis) -> Self {
        self.h_offset = h;
        self.v_offset = v;
        self.v_offset_basis = basis;
        self
    }

    fn frame_offset(mut self, v: f32) -> Self {
        self.frame_v_offset = v;
        self
    }

    fn rotated(mut self, axis: RefSpan, damping: f32, backward_offset: f32) -> Self {
        self.rotation = Some(RotationSpec {
            axis,
            damping,
            backward_offset,
        });
        self
    }

    fn behind_hair(mut self) -> Self {
        self.behind_hair = true;
        self
    }

    fn mirrored(mut self, landmark: usize) -> Self {
        self.mirror_landmark = Some(landmark);
        self
    }

    /// Subject kind this policy's geometry is defined over.
    pub fn subject_kind(&self) -> SubjectKind {
        self.width_span.endpoints().0
    }
}

/// The static policy table. Construct once at startup via [`PolicyTable::new`],
/// which validates every entry; a malformed table is a fatal startup error.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    _validated: (),
}

impl PolicyTable {
    pub fn new() -> Result<Self, TryOnError> {
        let table = Self { _validated: () };
        table.validate()?;
        Ok(table)
    }

    /// Look up the placement policy for a category worn by `wearer`.
    ///
    /// Returns `None` for combinations the product does not place (e.g. a
    /// female full suit), which callers treat as a no-op passthrough.
    pub fn policy_for(&self, category: Category, wearer: Wearer) -> Option<CategoryPolicy> {
        use Category as C;
        use OffsetBasis::{AssetHeight, RefDistance};

        let policy = match (category, wearer) {
            // Accessories are wearer-independent.
            (C::Glasses, _) => CategoryPolicy::new(
                C::Glasses,
                RefSpan::EyeSpan,
                1.4,
                AnchorAt::SpanMid(RefSpan::EyeSpan),
            )
            .top_edge()
            .offset(0.0, -0.26, RefDistance),
            (C::Cap, _) => CategoryPolicy::new(
                C::Cap,
                RefSpan::FaceWidth,
                1.3,
                AnchorAt::Landmark(face::FOREHEAD_TOP),
            )
            .top_edge()
            .offset(0.0, -0.60, AssetHeight),
            (C::Hat, _) => CategoryPolicy::new(
                C::Hat,
                RefSpan::FaceWidth,
                2.3,
                AnchorAt::Landmark(face::FOREHEAD_TOP),
            )
            .top_edge()
            .offset(0.0, -0.75, AssetHeight),
            (C::Moustache, _) => CategoryPolicy::new(
                C::Moustache,
                RefSpan::FaceWidth,
                0.65,
                AnchorAt::Landmark(face::NOSE_BASE),
            )
            .top_edge()
            .offset(0.0, 0.02, RefDistance),
            (C::Beard, _) => CategoryPolicy::new(
                C::Beard,
                RefSpan::FaceWidth,
                0.70,
                AnchorAt::Landmark(face::CHIN),
            )
            .offset(0.0, 0.05, RefDistance),
            (C::Nosepin, _) => CategoryPolicy::new(
                C::Nosepin,
                RefSpan::FaceWidth,
                0.10,
                AnchorAt::Landmark(face::NOSE_TIP),
            )
            .offset(0.13, -0.06, RefDistance)
            .rotated(RefSpan::NoseAxis, 0.6, 0.0),
            (C::Earrings, _) => CategoryPolicy::new(
                C::Earrings,
                RefSpan::FaceWidth,
                0.28,
                AnchorAt::Landmark(face::LEFT_EDGE),
            )
            .offset(0.01, 0.13, RefDistance)
            .behind_hair()
            .mirrored(face::RIGHT_EDGE),
            (C::Bindi, _) => CategoryPolicy::new(
                C::Bindi,
                RefSpan::FaceWidth,
                0.09,
                AnchorAt::SpanMid(RefSpan::BrowSpan),
            )
            .offset(0.0, -0.01, RefDistance),
            (C::Tikka, _) => CategoryPolicy::new(
                C::Tikka,
                RefSpan::FaceWidth,
                0.50,
                AnchorAt::SpanMid(RefSpan::BrowSpan),
            )
            .offset(0.0, -0.40, RefDistance),
            (C::Necklace, _) => CategoryPolicy::new(
                C::Necklace,
                RefSpan::FaceWidth,
                0.85,
                AnchorAt::Landmark(face::CHIN),
            )
            .offset(0.0, 0.28, RefDistance),
            (C::Watch, _) => CategoryPolicy::new(
                C::Watch,
                RefSpan::HandAxis,
                1.8,
                AnchorAt::Landmark(hand::WRIST),
            )
            .with_height(RefSpan::HandAxis, 1.8)
            .rotated(RefSpan::HandAxis, 0.0, 0.6),

            // Male clothing.
            (C::Shirt | C::Polo | C::Kurta, Wearer::Male) => CategoryPolicy::new(
                category,
                RefSpan::ShoulderSpan,
                2.0,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::TorsoHeight, 1.4)
            .top_edge()
            .offset(0.0, -0.15, AssetHeight),
            (C::Pant | C::Pajama, Wearer::Male) => CategoryPolicy::new(
                category,
                RefSpan::HipSpan,
                2.2,
                AnchorAt::SpanTop(RefSpan::HipSpan),
            )
            .with_height(RefSpan::LegHeight, 1.1)
            .top_edge(),
            (C::FullSuit, Wearer::Male) => CategoryPolicy::new(
                C::FullSuit,
                RefSpan::ShoulderSpan,
                4.0,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::FullHeight, 1.1)
            .top_edge()
            .offset(0.0, -0.14, AssetHeight),

            // Female clothing.
            (C::Blouse, Wearer::Female) => CategoryPolicy::new(
                C::Blouse,
                RefSpan::ShoulderSpan,
                2.3,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::TorsoHeight, 2.3)
            .top_edge()
            .offset(0.0, -0.25, AssetHeight)
            .frame_offset(-0.02),
            (C::Jeans | C::Tunic, Wearer::Female) => CategoryPolicy::new(
                category,
                RefSpan::HipSpan,
                3.6,
                AnchorAt::SpanTop(RefSpan::HipSpan),
            )
            .with_height(RefSpan::LegHeight, 1.1)
            .top_edge()
            .offset(0.0, -0.12, AssetHeight)
            .frame_offset(-0.05),
            (C::Sundress | C::Gown, Wearer::Female) => CategoryPolicy::new(
                category,
                RefSpan::ShoulderSpan,
                3.4,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::FullHeight, 1.1)
            .top_edge()
            .offset(0.0, -0.07, AssetHeight)
            .frame_offset(-0.02),
            (C::Skirt | C::Saree | C::Lehenga, Wearer::Female) => CategoryPolicy::new(
                category,
                RefSpan::ShoulderSpan,
                3.4,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::FullHeight, 1.1)
            .top_edge()
            .offset(0.0, -0.07, AssetHeight)
            .frame_offset(-0.05),

            // Kid girl clothing.
            (C::Shirt, Wearer::KidGirl) => CategoryPolicy::new(
                C::Shirt,
                RefSpan::ShoulderSpan,
                2.4,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::TorsoHeight, 2.0)
            .top_edge()
            .offset(0.0, -0.10, AssetHeight)
            .frame_offset(-0.03),
            (C::Skirt, Wearer::KidGirl) => CategoryPolicy::new(
                C::Skirt,
                RefSpan::ShoulderSpan,
                2.5,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::LegHeight, 1.1)
            .top_edge()
            .offset(0.0, -0.10, AssetHeight)
            .frame_offset(-0.03),
            (C::FullSuit, Wearer::KidGirl) => CategoryPolicy::new(
                C::FullSuit,
                RefSpan::ShoulderSpan,
                3.0,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::TorsoHeight, 3.3)
            .top_edge()
            .offset(0.0, -0.10, AssetHeight)
            .frame_offset(-0.03),

            // Kid boy clothing.
            (C::Shirt, Wearer::KidBoy) => CategoryPolicy::new(
                C::Shirt,
                RefSpan::ShoulderSpan,
                2.2,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::TorsoHeight, 1.7)
            .top_edge()
            .offset(0.0, -0.10, AssetHeight)
            .frame_offset(-0.03),
            (C::Shorts | C::Pant | C::Pajama, Wearer::KidBoy) => CategoryPolicy::new(
                category,
                RefSpan::ShoulderSpan,
                2.0,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::LegHeight, 1.0)
            .top_edge()
            .offset(0.0, -0.10, AssetHeight)
            .frame_offset(-0.03),
            (C::FullSuit, Wearer::KidBoy) => CategoryPolicy::new(
                C::FullSuit,
                RefSpan::ShoulderSpan,
                2.8,
                AnchorAt::SpanTop(RefSpan::ShoulderSpan),
            )
            .with_height(RefSpan::TorsoHeight, 3.0)
            .top_edge()
            .offset(0.0, -0.10, AssetHeight)
            .frame_offset(-0.03),

            // Unsupported wearer/category combinations place nothing.
            _ => return None,
        };

        Some(policy)
    }

    /// Check every table entry for constants that could not produce a valid
    /// placement. Runs once at startup; failures here are fatal.
    fn validate(&self) -> Result<(), TryOnError> {
        use Category::*;
        const ALL_CATEGORIES: &[Category] = &[
            Glasses, Cap, Hat, Moustache, Beard, Nosepin, Earrings, Bindi, Tikka, Necklace,
            Watch, Shirt, Polo, Kurta, Blouse, Pant, Pajama, Jeans, Tunic, Skirt, Shorts,
            FullSuit, Sundress, Gown, Saree, Lehenga,
        ];
        const ALL_WEARERS: &[Wearer] = &[
            Wearer::Male,
            Wearer::Female,
            Wearer::KidBoy,
            Wearer::KidGirl,
        ];

        for &category in ALL_CATEGORIES {
            let mut supported_somewhere = false;
            for &wearer in ALL_WEARERS {
                let Some(policy) = self.policy_for(category, wearer) else {
                    continue;
                };
                supported_somewhere = true;

                if !(policy.width_mult.is_finite() && policy.width_mult > 0.0) {
                    return Err(TryOnError::Config(format!(
                        "{:?}/{:?}: non-positive width multiplier {}",
                        category, wearer, policy.width_mult
                    )));
                }
                if let Some((_, mult)) = policy.height {
                    if !(mult.is_finite() && mult > 0.0) {
                        return Err(TryOnError::Config(format!(
                            "{:?}/{:?}: non-positive height multiplier {}",
                            category, wearer, mult
                        )));
                    }
                }
                if let Some(rotation) = policy.rotation {
                    if !(0.0..=1.0).contains(&rotation.damping) {
                        return Err(TryOnError::Config(format!(
                            "{:?}/{:?}: rotation damping {} outside [0, 1]",
                            category, wearer, rotation.damping
                        )));
                    }
                }
                if let AnchorAt::Landmark(index) = policy.anchor {
                    if index >= policy.subject_kind().point_count() {
                        return Err(TryOnError::Config(format!(
                            "{:?}/{:?}: anchor landmark {} outside topology",
                            category, wearer, index
                        )));
                    }
                }
            }
            if !supported_somewhere {
                return Err(TryOnError::Config(format!(
                    "{:?}: no wearer group places this category",
                    category
                )));
            }
        }
        Ok(())
    }
}
