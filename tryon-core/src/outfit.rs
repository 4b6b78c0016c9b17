//! Outfit selection and draw-pass planning.
//!
//! Outfits draw in a deterministic order: bottom before top so waistbands
//! tuck correctly, with a redraw of the top for pairings where the bottom
//! would otherwise cover it, and a selected one-piece dress drawn instead of
//! (for kids: after) the two-piece layers. The plan is an explicit ordered
//! pass list; rendering walks it without further conditionals.

use std::path::PathBuf;

use crate::assets::AssetSelection;
use crate::error::TryOnError;
use crate::policy::{Category, Slot, Wearer};

/// One selected garment.
#[derive(Debug, Clone, PartialEq)]
pub struct OutfitItem {
    pub category: Category,
    pub selection: AssetSelection,
}

impl OutfitItem {
    /// Build an item from a request tag (e.g. `m_shirt1`, `f_saree`).
    ///
    /// Categories with texture variants (sarees, lehengas) select randomly
    /// from their folder; everything else maps the bare tag to a file name,
    /// so `m_shirt1` wears `shirt1.png` from the shirts folder.
    pub fn from_tag(tag: &str) -> Result<Self, TryOnError> {
        let category = Category::from_tag(tag)
            .ok_or_else(|| TryOnError::UnknownCategory(tag.to_string()))?;
        let selection = match category {
            Category::Saree | Category::Lehenga => AssetSelection::Variant,
            _ => {
                let bare = tag
                    .trim()
                    .to_ascii_lowercase()
                    .split_once('_')
                    .map(|(_, rest)| rest.to_string())
                    .unwrap_or_else(|| tag.trim().to_ascii_lowercase());
                AssetSelection::Named(PathBuf::from(format!("{bare}.png")))
            }
        };
        Ok(Self {
            category,
            selection,
        })
    }
}

/// A complete outfit request: wearer group plus up to three slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutfitSelection {
    pub wearer: Wearer,
    pub top: Option<OutfitItem>,
    pub bottom: Option<OutfitItem>,
    pub dress: Option<OutfitItem>,
}

impl OutfitSelection {
    /// Build a selection from request tags.
    ///
    /// The wearer group is taken from `wearer` when given, otherwise
    /// inferred from the first tag carrying a wearer prefix.
    ///
    /// # Arguments
    ///
    /// * `top`, `bottom`, `dress` - Optional garment tags per slot.
    /// * `wearer` - Explicit wearer group override.
    pub fn from_tags(
        top: Option<&str>,
        bottom: Option<&str>,
        dress: Option<&str>,
        wearer: Option<Wearer>,
    ) -> Result<Self, TryOnError> {
        let inferred = wearer.or_else(|| {
            [top, bottom, dress]
                .iter()
                .flatten()
                .find_map(|tag| Wearer::from_tag_prefix(tag))
        });

        Ok(Self {
            wearer: inferred.unwrap_or_default(),
            top: top.map(OutfitItem::from_tag).transpose()?,
            bottom: bottom.map(OutfitItem::from_tag).transpose()?,
            dress: dress.map(OutfitItem::from_tag).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.bottom.is_none() && self.dress.is_none()
    }
}

/// One compositing pass of the outfit plan.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPass {
    pub slot: Slot,
    pub item: OutfitItem,
}

/// Pairings whose top must be redrawn after the bottom to stay in front.
fn top_needs_redraw(top: Category, bottom: Category) -> bool {
    matches!(
        (top, bottom),
        (
            Category::Blouse | Category::Tunic,
            Category::Skirt | Category::Jeans
        ) | (Category::Kurta, Category::Pant | Category::Pajama)
    )
}

/// Expand an outfit selection into its ordered draw passes.
///
/// Adults wearing a one-piece dress draw only that; otherwise bottom
/// precedes top, with a top redraw for the pairings that need it. Kids
/// always layer bottom, then top, then dress.
pub fn plan_passes(selection: &OutfitSelection) -> Vec<DrawPass> {
    let mut passes = Vec::new();
    let push = |passes: &mut Vec<DrawPass>, slot: Slot, item: &Option<OutfitItem>| {
        if let Some(item) = item {
            passes.push(DrawPass {
                slot,
                item: item.clone(),
            });
        }
    };

    if selection.wearer.is_kid() {
        push(&mut passes, Slot::Bottom, &selection.bottom);
        push(&mut passes, Slot::Top, &selection.top);
        push(&mut passes, Slot::Dress, &selection.dress);
        return passes;
    }

    if selection.dress.is_some() {
        push(&mut passes, Slot::Dress, &selection.dress);
        return passes;
    }

    push(&mut passes, Slot::Bottom, &selection.bottom);
    push(&mut passes, Slot::Top, &selection.top);

    if let (Some(top), Some(bottom)) = (&selection.top, &selection.bottom) {
        if top_needs_redraw(top.category, bottom.category) {
            push(&mut passes, Slot::Top, &selection.top);
        }
    }

    passes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(passes: &[DrawPass]) -> Vec<Category> {
        passes.iter().map(|p| p.item.category).collect()
    }

    #[test]
    fn bottom_draws_before_top() {
        let selection = OutfitSelection::from_tags(Some("m_shirt1"), Some("m_pant"), None, None)
            .expect("selection");
        assert_eq!(selection.wearer, Wearer::Male);
        assert_eq!(
            categories(&plan_passes(&selection)),
            vec![Category::Pant, Category::Shirt]
        );
    }

    #[test]
    fn blouse_redraws_over_skirt() {
        let selection = OutfitSelection::from_tags(Some("f_blouse"), Some("f_skirt"), None, None)
            .expect("selection");
        assert_eq!(
            categories(&plan_passes(&selection)),
            vec![Category::Skirt, Category::Blouse, Category::Blouse]
        );
    }

    #[test]
    fn kurta_redraws_over_pajama() {
        let selection = OutfitSelection::from_tags(Some("m_kurta"), Some("m_pajama"), None, None)
            .expect("selection");
        assert_eq!(
            categories(&plan_passes(&selection)),
            vec![Category::Pajama, Category::Kurta, Category::Kurta]
        );
    }

    #[test]
    fn dress_supersedes_two_piece_for_adults() {
        let selection = OutfitSelection::from_tags(
            Some("f_blouse"),
            Some("f_skirt"),
            Some("f_saree"),
            None,
        )
        .expect("selection");
        assert_eq!(categories(&plan_passes(&selection)), vec![Category::Saree]);
    }

    #[test]
    fn kids_layer_bottom_top_dress() {
        let selection = OutfitSelection::from_tags(
            Some("kg_tshirt"),
            Some("kg_skirt"),
            Some("kg_suit"),
            None,
        )
        .expect("selection");
        assert_eq!(selection.wearer, Wearer::KidGirl);
        assert_eq!(
            categories(&plan_passes(&selection)),
            vec![Category::Skirt, Category::Shirt, Category::FullSuit]
        );
    }

    #[test]
    fn variant_categories_sample_their_folder() {
        let item = OutfitItem::from_tag("f_lehenga").expect("item");
        assert_eq!(item.selection, AssetSelection::Variant);

        let item = OutfitItem::from_tag("m_shirt2").expect("item");
        assert_eq!(
            item.selection,
            AssetSelection::Named(PathBuf::from("shirt2.png"))
        );
    }

    #[test]
    fn unknown_tags_are_rejected() {
        assert!(matches!(
            OutfitItem::from_tag("m_hoodie"),
            Err(TryOnError::UnknownCategory(_))
        ));
    }

    #[test]
    fn plan_is_deterministic() {
        let selection = OutfitSelection::from_tags(Some("f_blouse"), Some("f_jeans"), None, None)
            .expect("selection");
        let first = plan_passes(&selection);
        let second = plan_passes(&selection);
        assert_eq!(first, second);
    }
}
