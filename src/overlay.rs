use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use glam::Vec3;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use crate::errors::OverlayError;

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.json");
const ROTATION_STEP: f32 = 0.01;

fn default_scale() -> f32 {
    0.03
}

fn default_position() -> Vec3 {
    Vec3::new(0.0, -1.0, 0.0)
}

/// One selectable overlay model and how to place it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayAsset {
    pub id: String,
    pub weight: u32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_position")]
    pub position: Vec3,
}

impl OverlayAsset {
    pub fn transform(&self) -> OverlayTransform {
        OverlayTransform {
            scale: Vec3::splat(self.scale),
            position: self.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    pub scale: Vec3,
    pub position: Vec3,
}

/// Weighted table of overlay assets.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    assets: Vec<OverlayAsset>,
    index: WeightedIndex<u32>,
}

impl AssetCatalog {
    pub fn new(assets: Vec<OverlayAsset>) -> Result<Self, OverlayError> {
        if assets.is_empty() {
            return Err(OverlayError::EmptyCatalog);
        }
        let index = WeightedIndex::new(assets.iter().map(|a| a.weight))
            .map_err(|e| OverlayError::InvalidWeights(e.to_string()))?;
        Ok(AssetCatalog { assets, index })
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, OverlayError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, OverlayError> {
        let assets: Vec<OverlayAsset> = serde_json::from_str(json)?;
        Self::new(assets)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, OverlayError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Picks an asset with probability proportional to its weight.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &OverlayAsset {
        &self.assets[self.index.sample(rng)]
    }

    pub fn get(&self, id: &str) -> Option<&OverlayAsset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn assets(&self) -> &[OverlayAsset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// The two renderer operations recognition drives.
pub trait OverlayRenderer {
    /// Replaces the current overlay with `asset`, hidden.
    fn load(&mut self, asset: &OverlayAsset) -> Result<(), OverlayError>;
    fn set_visible(&mut self, visible: bool);
}

/// State shared between the recognition loop and the render callback.
#[derive(Debug, Default)]
pub struct OverlayState {
    visible: AtomicBool,
    rotation_bits: AtomicU32,
}

impl OverlayState {
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn rotation_y(&self) -> f32 {
        f32::from_bits(self.rotation_bits.load(Ordering::Relaxed))
    }

    fn set_rotation_y(&self, radians: f32) {
        self.rotation_bits.store(radians.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOverlay {
    pub id: String,
    pub transform: OverlayTransform,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub asset: Option<String>,
    pub visible: bool,
    pub rotation_y: f32,
}

/// Renderer without a display: tracks what would be drawn.
#[derive(Debug, Default)]
pub struct HeadlessOverlay {
    state: Arc<OverlayState>,
    asset_root: Option<PathBuf>,
    loaded: Option<LoadedOverlay>,
}

impl HeadlessOverlay {
    /// With an `asset_root`, loading fails for assets missing on disk.
    pub fn new(asset_root: Option<PathBuf>) -> Self {
        HeadlessOverlay {
            state: Arc::new(OverlayState::default()),
            asset_root,
            loaded: None,
        }
    }

    pub fn state(&self) -> Arc<OverlayState> {
        Arc::clone(&self.state)
    }

    pub fn loaded(&self) -> Option<&LoadedOverlay> {
        self.loaded.as_ref()
    }

    /// Per display refresh: spins the model and reports what is shown.
    pub fn render_frame(&self) -> FrameSnapshot {
        if self.loaded.is_some() {
            let r = self.state.rotation_y() + ROTATION_STEP;
            self.state.set_rotation_y(r);
        }
        FrameSnapshot {
            asset: self.loaded.as_ref().map(|l| l.id.clone()),
            visible: self.state.is_visible(),
            rotation_y: self.state.rotation_y(),
        }
    }
}

impl OverlayRenderer for HeadlessOverlay {
    fn load(&mut self, asset: &OverlayAsset) -> Result<(), OverlayError> {
        // the previous model is gone even if the new one fails to load
        self.loaded = None;
        self.state.set_visible(false);
        self.state.set_rotation_y(0.0);
        if let Some(root) = &self.asset_root {
            let path = root.join(&asset.id);
            if !path.is_file() {
                return Err(OverlayError::MissingAsset(path));
            }
        }
        self.loaded = Some(LoadedOverlay {
            id: asset.id.clone(),
            transform: asset.transform(),
        });
        log::debug!("overlay {} loaded with scale {}", asset.id, asset.scale);
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        self.state.set_visible(visible);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_spins_only_loaded_models() {
        let mut overlay = HeadlessOverlay::new(None);
        assert_eq!(overlay.render_frame().rotation_y, 0.0);

        let catalog = AssetCatalog::builtin().unwrap();
        overlay.load(catalog.get("pikachu.glb").unwrap()).unwrap();
        overlay.render_frame();
        let snapshot = overlay.render_frame();
        assert!((snapshot.rotation_y - 0.02).abs() < 1e-6);
        assert!(!snapshot.visible);
        assert_eq!(snapshot.asset.as_deref(), Some("pikachu.glb"));
    }

    #[test]
    fn shared_state_sees_visibility() {
        let mut overlay = HeadlessOverlay::new(None);
        let state = overlay.state();
        overlay.set_visible(true);
        assert!(state.is_visible());
    }
}
