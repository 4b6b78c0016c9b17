//! Core try-on engine.
//!
//! This crate turns a detected landmark set and a selected RGBA overlay
//! asset into a composited frame: the anchor resolver derives a placement
//! rectangle from category-specific landmark geometry, and the compositor
//! alpha-blends the asset into the frame with boundary clipping. The
//! landmark detector itself is an external collaborator consumed through
//! the [`provider::LandmarkProvider`] trait.

/// Anchor resolution: landmark geometry to placement rectangle.
pub mod anchor;
/// Overlay asset loading, variant selection, and caching.
pub mod assets;
/// In-place alpha compositing with clipping and behind-hair masking.
pub mod compositor;
/// Failure taxonomy.
pub mod error;
/// Landmark sets and detector topology constants.
pub mod landmarks;
/// Elliptical restore masks (neck patch).
pub mod mask;
/// Outfit selection and draw-pass planning.
pub mod outfit;
/// The assembled try-on pipeline.
pub mod pipeline;
/// Category policy table.
pub mod policy;
/// Consumed detector interfaces and offline stand-ins.
pub mod provider;
/// Bounded recent-frame ring for the realtime loop.
pub mod ring;

pub use anchor::{AnchorSpec, MIN_OVERLAY_PX, resolve};
pub use assets::{AssetLibrary, AssetSelection, OverlayAsset, PLACEHOLDER_SIZE, placeholder_asset};
pub use compositor::{BlendOutcome, blend, blend_with_mask};
pub use error::TryOnError;
pub use landmarks::{LandmarkSet, SubjectKind, face, hand, pose};
pub use outfit::{DrawPass, OutfitItem, OutfitSelection, plan_passes};
pub use pipeline::{TryOnPipeline, TryOnReport, decode_frame};
pub use policy::{Category, CategoryPolicy, PolicyTable, RefSpan, Slot, Wearer};
pub use provider::{
    HairMaskProvider, JsonLandmarkProvider, LandmarkProvider, LandmarkRecord, StaticHairMask,
    StaticProvider, TimeoutProvider, detect_with_timeout,
};
pub use ring::{FrameRing, RING_CAPACITY};

/// Returns the crate version for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
