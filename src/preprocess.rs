use std::num::NonZeroUsize;
use std::path::Path;

use image::{GrayImage, RgbaImage};

use crate::config::RecognizerConfig;
use crate::errors::StartupError;
use crate::features::{FeatureSet, OrbExtractor};
use crate::imgproc;
use crate::io::load_rgba;
use crate::types::Resolution;

/// Normalization applied to both the reference image and every frame region:
/// area resize to the template resolution, grayscale, histogram equalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    resolution: Resolution,
}

impl Normalizer {
    pub fn new(resolution: Resolution) -> Self {
        Normalizer { resolution }
    }

    pub fn from_config(config: &RecognizerConfig) -> Self {
        Normalizer::new(config.template_resolution)
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn normalize(&self, image: &RgbaImage) -> GrayImage {
        let resized = imgproc::resize_area(image, self.resolution.width, self.resolution.height);
        let gray = imgproc::grayscale(&resized);
        imgproc::equalize_histogram(&gray)
    }
}

/// Normalized reference image and its features. Built once, read only.
#[derive(Debug, Clone)]
pub struct ReferenceTemplate {
    normalized: GrayImage,
    features: FeatureSet,
    feature_count: NonZeroUsize,
}

impl ReferenceTemplate {
    /// Normalizes `reference` and extracts its features. A template without
    /// features can never be recognized and is rejected.
    pub fn build(
        reference: &RgbaImage,
        normalizer: &Normalizer,
        extractor: &OrbExtractor,
    ) -> Result<Self, StartupError> {
        let normalized = normalizer.normalize(reference);
        let features = extractor.extract(&normalized);
        let template = Self::from_features(normalized, features)?;
        log::info!(
            "reference template {} with {} features",
            normalizer.resolution(),
            template.feature_count
        );
        Ok(template)
    }

    /// Pairs an already normalized image with its features. The feature
    /// count is taken from `features`, so it can never disagree with them.
    pub fn from_features(normalized: GrayImage, features: FeatureSet) -> Result<Self, StartupError> {
        let feature_count = NonZeroUsize::new(features.len()).ok_or(StartupError::EmptyTemplate)?;
        Ok(ReferenceTemplate {
            normalized,
            features,
            feature_count,
        })
    }

    pub fn load<P: AsRef<Path>>(
        path: P,
        normalizer: &Normalizer,
        extractor: &OrbExtractor,
    ) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let reference = load_rgba(path).map_err(|source| StartupError::TemplateUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::build(&reference, normalizer, extractor)
    }

    pub fn normalized(&self) -> &GrayImage {
        &self.normalized
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn feature_count(&self) -> NonZeroUsize {
        self.feature_count
    }
}

/// One tick's frame region. Dropped once the tick has been scored.
pub struct FrameSample {
    pub region: RgbaImage,
    pub normalized: GrayImage,
}

impl FrameSample {
    pub fn new(region: RgbaImage, normalizer: &Normalizer) -> Self {
        let normalized = normalizer.normalize(&region);
        FrameSample { region, normalized }
    }
}
