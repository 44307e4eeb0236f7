use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::camera::CameraConstraints;
use crate::errors::ConfigError;
use crate::types::{Rect, Resolution};

/// Upper bound on `keypointBudget`; far above what a template resolution
/// can yield.
pub const MAX_KEYPOINT_BUDGET: usize = 100_000;

/// What to do with the overlay when the camera cannot be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionPolicy {
    /// Stay idle; the overlay is never revealed.
    #[default]
    FailClosed,
    /// Reveal the overlay straight away.
    FailOpen,
}

/// Tuning of the ORB extractor. The keypoint budget lives on
/// [`RecognizerConfig`] since it is a recognized top level option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractorConfig {
    pub pyramid_levels: usize,
    pub scale_factor: f32,
    pub fast_threshold: u8,
    pub edge_threshold: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            pyramid_levels: 8,
            scale_factor: 1.2,
            fast_threshold: 20,
            edge_threshold: 31,
        }
    }
}

/// Shared configuration of the recognition pipeline.
///
/// Template and frame normalization both read `template_resolution` from here,
/// so the two paths cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecognizerConfig {
    pub region_of_interest: Rect,
    pub sampling_period_ms: u64,
    pub keypoint_budget: usize,
    pub recognition_threshold: f32,
    pub template_resolution: Resolution,
    pub extractor: ExtractorConfig,
    pub camera: CameraConstraints,
    pub permission_policy: PermissionPolicy,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            region_of_interest: Rect::new(100, 100, 400, 300),
            sampling_period_ms: 100,
            keypoint_budget: 1000,
            recognition_threshold: 0.37,
            template_resolution: Resolution::new(400, 300),
            extractor: ExtractorConfig::default(),
            camera: CameraConstraints::default(),
            permission_policy: PermissionPolicy::default(),
        }
    }
}

impl RecognizerConfig {
    /// Loads and validates a config from a JSON file. Missing keys keep their
    /// defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RecognizerConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.recognition_threshold = threshold;
        self
    }

    pub fn sampling_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.sampling_period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.recognition_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::Invalid(format!(
                "recognitionThreshold must be in [0, 1], got {}",
                t
            )));
        }
        if self.keypoint_budget == 0 || self.keypoint_budget > MAX_KEYPOINT_BUDGET {
            return Err(ConfigError::Invalid(format!(
                "keypointBudget must be in [1, {}], got {}",
                MAX_KEYPOINT_BUDGET, self.keypoint_budget
            )));
        }
        if self.sampling_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "samplingPeriodMs must be positive".to_string(),
            ));
        }
        if self.region_of_interest.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "regionOfInterest {} is empty",
                self.region_of_interest
            )));
        }
        if self.template_resolution.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "templateResolution {} is empty",
                self.template_resolution
            )));
        }
        if self.extractor.pyramid_levels == 0 {
            return Err(ConfigError::Invalid(
                "extractor.pyramidLevels must be positive".to_string(),
            ));
        }
        if self.extractor.scale_factor.is_nan() || self.extractor.scale_factor <= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "extractor.scaleFactor must be greater than 1, got {}",
                self.extractor.scale_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RecognizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.region_of_interest, Rect::new(100, 100, 400, 300));
        assert_eq!(config.template_resolution, Resolution::new(400, 300));
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let config = RecognizerConfig::default().with_threshold(f32::NAN);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RecognizerConfig =
            serde_json::from_str(r#"{"recognitionThreshold": 0.28, "permissionPolicy": "failOpen"}"#)
                .unwrap();
        assert_eq!(config.recognition_threshold, 0.28);
        assert_eq!(config.permission_policy, PermissionPolicy::FailOpen);
        assert_eq!(config.keypoint_budget, 1000);
        assert_eq!(config.sampling_period_ms, 100);
    }
}
