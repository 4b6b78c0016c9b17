//! The try-on pipeline: detector, policy table, assets, and compositor
//! wired together.
//!
//! Recoverable failures (no subject, degenerate geometry, off-frame
//! placement, missing clothing assets) are logged and absorbed into the
//! report; the frame comes back unchanged or partially dressed rather than
//! the request failing. Hard errors are reserved for bad input and for
//! explicitly selected assets that cannot be read.

use image::{GrayImage, RgbImage};
use log::{Level, warn};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::anchor::{AnchorSpec, resolve};
use crate::assets::{AssetLibrary, AssetSelection, OverlayAsset};
use crate::compositor::{BlendOutcome, blend_with_mask};
use crate::error::TryOnError;
use crate::landmarks::LandmarkSet;
use crate::mask::{NECK_RADIUS_FRAC, NECK_RAISE_FRAC, lower_ellipse_mask, restore_masked};
use crate::outfit::{OutfitItem, OutfitSelection, plan_passes};
use crate::policy::{AnchorAt, Category, PolicyTable, RefSpan, Slot, Wearer};
use crate::provider::{HairMaskProvider, LandmarkProvider};
use tryon_utils::{Point, timing_guard};

/// Faces narrower than this (in pixels) skip earring placement; the ears are
/// not reliably visible.
const MIN_EAR_SPAN_PX: f32 = 60.0;

/// Outcome of one try-on request.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TryOnReport {
    /// Categories that were actually blended into the frame.
    pub applied: Vec<Category>,
    /// Soft conditions absorbed along the way.
    pub warnings: Vec<String>,
    /// The landmark provider found nothing; the frame is untouched.
    pub no_subject: bool,
    /// Number of placeholder substitutions for missing clothing assets.
    pub placeholders: u32,
}

impl TryOnReport {
    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Whether the request changed the frame at all.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Decode encoded image bytes into a frame, mapping failures to the
/// client-error taxonomy.
pub fn decode_frame(bytes: &[u8]) -> Result<RgbImage, TryOnError> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|e| TryOnError::InvalidImage(e.to_string()))
}

/// The assembled try-on engine.
pub struct TryOnPipeline<P: LandmarkProvider> {
    provider: P,
    hair: Option<Box<dyn HairMaskProvider + Send + Sync>>,
    assets: AssetLibrary,
    policies: PolicyTable,
    rng: StdRng,
}

impl<P: LandmarkProvider> TryOnPipeline<P> {
    /// Assemble a pipeline.
    ///
    /// # Arguments
    ///
    /// * `provider` - Landmark detector (or offline stand-in).
    /// * `assets` - Overlay asset tree.
    /// * `seed` - Variant-selection seed; `None` uses an entropy seed.
    pub fn new(provider: P, assets: AssetLibrary, seed: Option<u64>) -> Result<Self, TryOnError> {
        Ok(Self {
            provider,
            hair: None,
            assets,
            policies: PolicyTable::new()?,
            rng: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        })
    }

    /// Attach a hair segmentation oracle for behind-hair categories.
    pub fn with_hair_provider(
        mut self,
        hair: Box<dyn HairMaskProvider + Send + Sync>,
    ) -> Self {
        self.hair = Some(hair);
        self
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    /// Apply a request tag: accessories place directly, clothing tags become
    /// a single-slot outfit.
    ///
    /// # Arguments
    ///
    /// * `frame` - Target frame, mutated in place.
    /// * `tag` - Category tag (e.g. `glasses`, `m_shirt1`).
    /// * `selection` - Explicit asset choice; `None` lets the system pick.
    pub fn apply_tag(
        &mut self,
        frame: &mut RgbImage,
        tag: &str,
        selection: Option<AssetSelection>,
    ) -> Result<TryOnReport, TryOnError> {
        let category =
            Category::from_tag(tag).ok_or_else(|| TryOnError::UnknownCategory(tag.to_string()))?;

        if category.is_clothing() {
            let item = match selection {
                Some(selection) => OutfitItem {
                    category,
                    selection,
                },
                None => OutfitItem::from_tag(tag)?,
            };
            let mut outfit = OutfitSelection {
                wearer: Wearer::from_tag_prefix(tag).unwrap_or_default(),
                ..OutfitSelection::default()
            };
            match category.slot() {
                Slot::Top => outfit.top = Some(item),
                Slot::Bottom => outfit.bottom = Some(item),
                Slot::Dress => outfit.dress = Some(item),
                Slot::Accessory => unreachable!("clothing categories have clothing slots"),
            }
            self.apply_outfit(frame, &outfit)
        } else {
            let selection = selection.unwrap_or(AssetSelection::Variant);
            self.apply_accessory(frame, category, &selection)
        }
    }

    /// Place one accessory on the detected subject.
    ///
    /// A missing asset is a hard error here: the caller asked for a specific
    /// style (or an existing gallery), so silently showing nothing would be
    /// misleading.
    pub fn apply_accessory(
        &mut self,
        frame: &mut RgbImage,
        category: Category,
        selection: &AssetSelection,
    ) -> Result<TryOnReport, TryOnError> {
        let _guard = timing_guard("tryon_core::apply_accessory", Level::Debug);
        let mut report = TryOnReport::default();

        if category.is_clothing() {
            return Err(TryOnError::UnknownCategory(format!(
                "{:?} is clothing; use apply_outfit",
                category
            )));
        }

        let policy = self
            .policies
            .policy_for(category, Wearer::default())
            .ok_or_else(|| TryOnError::UnknownCategory(format!("{:?}", category)))?;

        let landmarks = match self.provider.detect(frame)? {
            Some(landmarks) => landmarks,
            None => {
                report.no_subject = true;
                report.warn("no subject detected; frame returned unchanged");
                return Ok(report);
            }
        };

        if category == Category::Earrings {
            if let Some((left, right)) = RefSpan::FaceWidth.resolve(&landmarks) {
                if left.distance(right) < MIN_EAR_SPAN_PX {
                    report.warn("ears not visible; skipping earrings");
                    return Ok(report);
                }
            }
        }

        let asset = self.assets.resolve(category, selection, &mut self.rng)?;
        let hair = if policy.behind_hair {
            self.request_hair_mask(frame, &mut report)
        } else {
            None
        };

        let mut placed = false;
        placed |= self.place_one(frame, &landmarks, &policy, &asset, hair.as_ref(), &mut report);

        if let Some(mirror_index) = policy.mirror_landmark {
            let mut mirrored = policy.clone();
            mirrored.anchor = AnchorAt::Landmark(mirror_index);
            mirrored.h_offset = -policy.h_offset;
            placed |=
                self.place_one(frame, &landmarks, &mirrored, &asset, hair.as_ref(), &mut report);
        }

        if placed {
            report.applied.push(category);
        }
        Ok(report)
    }

    /// Render a complete outfit: planned passes, then the neck restore.
    pub fn apply_outfit(
        &mut self,
        frame: &mut RgbImage,
        selection: &OutfitSelection,
    ) -> Result<TryOnReport, TryOnError> {
        let _guard = timing_guard("tryon_core::apply_outfit", Level::Debug);
        let mut report = TryOnReport::default();
        if selection.is_empty() {
            return Ok(report);
        }

        let landmarks = match self.provider.detect(frame)? {
            Some(landmarks) => landmarks,
            None => {
                report.no_subject = true;
                report.warn("no subject detected; frame returned unchanged");
                return Ok(report);
            }
        };

        let original = frame.clone();
        for pass in plan_passes(selection) {
            let category = pass.item.category;
            let Some(policy) = self.policies.policy_for(category, selection.wearer) else {
                report.warn(format!(
                    "{:?} has no placement for {:?}; skipped",
                    category, selection.wearer
                ));
                continue;
            };

            let (asset, substituted) =
                self.assets
                    .resolve_or_placeholder(category, &pass.item.selection, &mut self.rng);
            if substituted {
                report.placeholders += 1;
                report.warn(format!("{:?} asset missing; placeholder substituted", category));
            }

            match resolve(
                &landmarks,
                &policy,
                asset.dimensions(),
                frame.dimensions(),
                selection.wearer.overlay_scale(),
            ) {
                Ok(anchor) => {
                    if self.blend_into(frame, &asset, &anchor, None, &mut report)
                        && !report.applied.contains(&category)
                    {
                        report.applied.push(category);
                    }
                }
                Err(error) if error.is_recoverable() => {
                    report.warn(format!("{:?} placement skipped: {}", category, error));
                }
                Err(error) => return Err(error),
            }
        }

        if !report.applied.is_empty() {
            self.restore_neck(frame, &original, &landmarks, &mut report);
        }
        Ok(report)
    }

    /// Resolve and blend one placement, absorbing recoverable failures.
    fn place_one(
        &self,
        frame: &mut RgbImage,
        landmarks: &LandmarkSet,
        policy: &crate::policy::CategoryPolicy,
        asset: &OverlayAsset,
        hair: Option<&GrayImage>,
        report: &mut TryOnReport,
    ) -> bool {
        match resolve(landmarks, policy, asset.dimensions(), frame.dimensions(), 1.0) {
            Ok(anchor) => self.blend_into(frame, asset, &anchor, hair, report),
            Err(error) if error.is_recoverable() => {
                report.warn(format!("{:?} placement skipped: {}", policy.category, error));
                false
            }
            Err(error) => {
                report.warn(format!("{:?} placement failed: {}", policy.category, error));
                false
            }
        }
    }

    fn blend_into(
        &self,
        frame: &mut RgbImage,
        asset: &OverlayAsset,
        anchor: &AnchorSpec,
        hair: Option<&GrayImage>,
        report: &mut TryOnReport,
    ) -> bool {
        let _guard = timing_guard("tryon_core::blend", Level::Trace);
        match blend_with_mask(frame, &asset.image, anchor, hair) {
            Ok(BlendOutcome::Applied) => true,
            Ok(BlendOutcome::OffFrame) => {
                report.warn("overlay fell entirely outside the frame");
                false
            }
            Err(error) => {
                report.warn(format!("compositing absorbed: {}", error));
                false
            }
        }
    }

    fn request_hair_mask(
        &self,
        frame: &RgbImage,
        report: &mut TryOnReport,
    ) -> Option<GrayImage> {
        let provider = self.hair.as_ref()?;
        match provider.hair_mask(frame) {
            Ok(mask) => mask,
            Err(error) => {
                report.warn(format!("hair mask unavailable: {}", error));
                None
            }
        }
    }

    /// Copy the original pixels back over the neck region after all clothing
    /// layers, compensating for overlays that cover the chin.
    fn restore_neck(
        &self,
        frame: &mut RgbImage,
        original: &RgbImage,
        landmarks: &LandmarkSet,
        report: &mut TryOnReport,
    ) {
        let Some((left, right)) = RefSpan::ShoulderSpan.resolve(landmarks) else {
            return;
        };
        let span = left.distance(right);
        if span < 1.0 {
            return;
        }

        let center = Point {
            x: (left.x + right.x) * 0.5,
            y: left.y.min(right.y) - NECK_RAISE_FRAC * span,
        };
        let radius = span * NECK_RADIUS_FRAC;
        if let Some(mask) = lower_ellipse_mask(frame.dimensions(), center, (radius, radius)) {
            if let Err(error) = restore_masked(frame, original, &mask) {
                report.warn(format!("neck restore skipped: {}", error));
            }
        }
    }
}
