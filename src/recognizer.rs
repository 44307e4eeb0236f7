use std::path::Path;

use image::RgbaImage;

use crate::config::RecognizerConfig;
use crate::errors::{CaptureError, StartupError};
use crate::features::OrbExtractor;
use crate::imgproc;
use crate::matcher::{HammingMatcher, MatchResult, SimilarityScore};
use crate::preprocess::{FrameSample, Normalizer, ReferenceTemplate};
use crate::types::Rect;

/// Scores camera frames against the reference template.
#[derive(Debug, Clone)]
pub struct Recognizer {
    roi: Rect,
    normalizer: Normalizer,
    extractor: OrbExtractor,
    matcher: HammingMatcher,
    template: ReferenceTemplate,
}

impl Recognizer {
    /// Validates `config` and builds the template from an in-memory image.
    pub fn new(config: &RecognizerConfig, reference: &RgbaImage) -> Result<Self, StartupError> {
        config.validate()?;
        let normalizer = Normalizer::from_config(config);
        let extractor = OrbExtractor::from_config(config);
        let template = ReferenceTemplate::build(reference, &normalizer, &extractor)?;
        Ok(Self::assemble(config, normalizer, extractor, template))
    }

    pub fn from_path<P: AsRef<Path>>(config: &RecognizerConfig, path: P) -> Result<Self, StartupError> {
        config.validate()?;
        let normalizer = Normalizer::from_config(config);
        let extractor = OrbExtractor::from_config(config);
        let template = ReferenceTemplate::load(path, &normalizer, &extractor)?;
        Ok(Self::assemble(config, normalizer, extractor, template))
    }

    fn assemble(
        config: &RecognizerConfig,
        normalizer: Normalizer,
        extractor: OrbExtractor,
        template: ReferenceTemplate,
    ) -> Self {
        Recognizer {
            roi: config.region_of_interest,
            normalizer,
            extractor,
            matcher: HammingMatcher::default(),
            template,
        }
    }

    pub fn template(&self) -> &ReferenceTemplate {
        &self.template
    }

    pub fn region_of_interest(&self) -> Rect {
        self.roi
    }

    /// Crops the region of interest and normalizes it.
    pub fn sample(&self, frame: &RgbaImage) -> Result<FrameSample, CaptureError> {
        let region = imgproc::crop(frame, &self.roi)?;
        Ok(FrameSample::new(region, &self.normalizer))
    }

    pub fn match_sample(&self, sample: &FrameSample) -> MatchResult {
        let frame_features = self.extractor.extract(&sample.normalized);
        self.matcher.match_template(&self.template, &frame_features)
    }

    /// Full per-tick pipeline on one camera frame.
    pub fn score_frame(&self, frame: &RgbaImage) -> Result<SimilarityScore, CaptureError> {
        let sample = self.sample(frame)?;
        let result = self.match_sample(&sample);
        let score = result.similarity();
        log::trace!(
            "{} of {} reference features matched, score {:.3}",
            result.len(),
            self.template.feature_count(),
            score.value()
        );
        Ok(score)
    }
}
