//! Overlay asset loading, variant selection, and caching.
//!
//! Assets live in a directory tree with one folder per category slug (e.g.
//! `assets/glasses/glasses_1.png`). Categories with several textures of the
//! same item (sarees, lehengas) keep all variants in the folder and one is
//! picked uniformly at random per request. The random source is injected so
//! placement geometry stays deterministic under a fixed seed.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use image::{Rgba, RgbaImage};
use log::warn;
use rand::{Rng, rngs::StdRng};
use walkdir::WalkDir;

use crate::error::TryOnError;
use crate::policy::Category;

/// Default edge length of the placeholder raster substituted for missing
/// clothing assets.
pub const PLACEHOLDER_SIZE: u32 = 200;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// A loaded overlay raster plus its source path.
#[derive(Debug, Clone)]
pub struct OverlayAsset {
    pub image: Arc<RgbaImage>,
    pub path: PathBuf,
}

impl OverlayAsset {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// How the caller wants the overlay chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSelection {
    /// A specific file, relative to the category folder or absolute.
    Named(PathBuf),
    /// Uniform random choice among the category's variants.
    Variant,
}

/// Read-only asset tree with a per-path cache.
#[derive(Debug)]
pub struct AssetLibrary {
    root: PathBuf,
    cache: Mutex<HashMap<PathBuf, Arc<RgbaImage>>>,
}

impl AssetLibrary {
    /// # Arguments
    ///
    /// * `root` - Directory containing one subfolder per category slug.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding a category's variants.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.slug())
    }

    /// Enumerate a category's variant files, sorted for determinism.
    pub fn list_variants(&self, category: Category) -> Vec<PathBuf> {
        let dir = self.category_dir(category);
        let mut variants: Vec<PathBuf> = WalkDir::new(&dir)
            .max_depth(2)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        variants.sort();
        variants
    }

    /// Pick one variant uniformly at random.
    ///
    /// # Arguments
    ///
    /// * `category` - Category whose folder is sampled.
    /// * `rng` - Injected random source; seed it for reproducible choices.
    pub fn pick_variant(
        &self,
        category: Category,
        rng: &mut StdRng,
    ) -> Result<PathBuf, TryOnError> {
        let variants = self.list_variants(category);
        if variants.is_empty() {
            return Err(TryOnError::AssetMissing(format!(
                "no variants under {}",
                self.category_dir(category).display()
            )));
        }
        let index = rng.gen_range(0..variants.len());
        Ok(variants[index].clone())
    }

    /// Load an overlay raster, promoting RGB sources to opaque RGBA.
    ///
    /// Results are cached per path; the cache is never invalidated because
    /// the asset tree is read-only for the process lifetime.
    pub fn load(&self, path: &Path) -> Result<OverlayAsset, TryOnError> {
        if let Some(cached) = self.cache.lock().ok().and_then(|c| c.get(path).cloned()) {
            return Ok(OverlayAsset {
                image: cached,
                path: path.to_path_buf(),
            });
        }

        let decoded = image::open(path)
            .map_err(|e| TryOnError::AssetMissing(format!("{}: {}", path.display(), e)))?;
        let rgba = Arc::new(decoded.to_rgba8());

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(path.to_path_buf(), Arc::clone(&rgba));
        }
        Ok(OverlayAsset {
            image: rgba,
            path: path.to_path_buf(),
        })
    }

    /// Resolve a selection to a loaded asset.
    ///
    /// Named selections resolve relative to the category folder (absolute
    /// paths are honored as-is). Variant selections sample the folder.
    pub fn resolve(
        &self,
        category: Category,
        selection: &AssetSelection,
        rng: &mut StdRng,
    ) -> Result<OverlayAsset, TryOnError> {
        let path = match selection {
            AssetSelection::Named(name) => {
                if name.is_absolute() {
                    name.clone()
                } else {
                    self.category_dir(category).join(name)
                }
            }
            AssetSelection::Variant => self.pick_variant(category, rng)?,
        };
        self.load(&path)
    }

    /// Resolve a clothing selection, substituting a placeholder when the
    /// asset is missing so the preview pipeline stays non-blocking.
    ///
    /// Returns the asset and whether a placeholder was substituted.
    pub fn resolve_or_placeholder(
        &self,
        category: Category,
        selection: &AssetSelection,
        rng: &mut StdRng,
    ) -> (OverlayAsset, bool) {
        match self.resolve(category, selection, rng) {
            Ok(asset) => (asset, false),
            Err(error) => {
                warn!("{}; substituting placeholder", error);
                (placeholder_asset(), true)
            }
        }
    }
}

/// Fully transparent placeholder raster at the documented default size.
pub fn placeholder_asset() -> OverlayAsset {
    let image = RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, Rgba([0, 0, 0, 0]));
    OverlayAsset {
        image: Arc::new(image),
        path: PathBuf::from("<placeholder>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn write_png(path: &Path, width: u32, height: u32) {
        let image = RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]));
        image.save(path).expect("write asset");
    }

    fn library_with_glasses(count: usize) -> (tempfile::TempDir, AssetLibrary) {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let glasses = dir.path().join("glasses");
        std::fs::create_dir_all(&glasses).expect("category dir");
        for i in 0..count {
            write_png(&glasses.join(format!("glasses_{i}.png")), 20, 8);
        }
        let library = AssetLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn variants_are_listed_sorted() {
        let (_dir, library) = library_with_glasses(3);
        let variants = library.list_variants(Category::Glasses);
        assert_eq!(variants.len(), 3);
        assert!(variants[0] < variants[1] && variants[1] < variants[2]);
    }

    #[test]
    fn seeded_choice_is_reproducible() {
        let (_dir, library) = library_with_glasses(4);
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a = library.pick_variant(Category::Glasses, &mut rng_a).unwrap();
        let b = library.pick_variant(Category::Glasses, &mut rng_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn load_caches_per_path() {
        let (_dir, library) = library_with_glasses(1);
        let path = library.list_variants(Category::Glasses)[0].clone();
        let first = library.load(&path).expect("load");
        let second = library.load(&path).expect("load again");
        assert!(Arc::ptr_eq(&first.image, &second.image));
    }

    #[test]
    fn missing_named_asset_errors() {
        let (_dir, library) = library_with_glasses(1);
        let result = library.resolve(
            Category::Glasses,
            &AssetSelection::Named(PathBuf::from("missing.png")),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(TryOnError::AssetMissing(_))));
    }

    #[test]
    fn empty_category_has_no_variants() {
        let (_dir, library) = library_with_glasses(0);
        let result = library.pick_variant(Category::Glasses, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(TryOnError::AssetMissing(_))));
    }

    #[test]
    fn placeholder_substitution_reports_itself() {
        let (_dir, library) = library_with_glasses(0);
        let (asset, substituted) = library.resolve_or_placeholder(
            Category::FullSuit,
            &AssetSelection::Named(PathBuf::from("full_suit.png")),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(substituted);
        assert_eq!(asset.dimensions(), (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE));
        // The placeholder is fully transparent.
        assert_eq!(asset.image.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn rgb_sources_become_opaque() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("opaque.png");
        let rgb = image::RgbImage::from_pixel(6, 6, image::Rgb([9, 8, 7]));
        rgb.save(&path).expect("write rgb png");

        let library = AssetLibrary::new(dir.path());
        let asset = library.load(&path).expect("load");
        assert_eq!(asset.image.get_pixel(3, 3).0, [9, 8, 7, 255]);
    }
}
