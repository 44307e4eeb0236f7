use cardar::config::{MAX_KEYPOINT_BUDGET, PermissionPolicy, RecognizerConfig};
use cardar::errors::ConfigError;
use cardar::types::{Rect, Resolution};
use tempfile::TempDir;

#[test]
fn test_config_from_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "regionOfInterest": {"x": 0, "y": 0, "width": 320, "height": 240},
            "samplingPeriodMs": 50,
            "keypointBudget": 500,
            "recognitionThreshold": 0.3,
            "templateResolution": {"width": 320, "height": 240},
            "extractor": {"pyramidLevels": 4},
            "camera": {"facing": "front"},
            "permissionPolicy": "failOpen"
        }"#,
    )
    .unwrap();

    let config = RecognizerConfig::from_json_file(&path).unwrap();
    assert_eq!(config.region_of_interest, Rect::new(0, 0, 320, 240));
    assert_eq!(config.sampling_period().as_millis(), 50);
    assert_eq!(config.keypoint_budget, 500);
    assert_eq!(config.template_resolution, Resolution::new(320, 240));
    assert_eq!(config.extractor.pyramid_levels, 4);
    // untouched nested fields keep their defaults
    assert_eq!(config.extractor.fast_threshold, 20);
    assert_eq!(config.camera.ideal_width, 1280);
    assert_eq!(config.permission_policy, PermissionPolicy::FailOpen);
}

#[test]
fn test_invalid_values_are_rejected() {
    let base = RecognizerConfig::default();
    assert!(base.clone().with_threshold(1.5).validate().is_err());
    assert!(base.clone().with_threshold(-0.1).validate().is_err());

    let mut zero_budget = base.clone();
    zero_budget.keypoint_budget = 0;
    assert!(zero_budget.validate().is_err());

    let mut huge_budget = base.clone();
    huge_budget.keypoint_budget = MAX_KEYPOINT_BUDGET + 1;
    assert!(huge_budget.validate().is_err());

    let mut zero_period = base.clone();
    zero_period.sampling_period_ms = 0;
    assert!(zero_period.validate().is_err());

    let mut empty_roi = base.clone();
    empty_roi.region_of_interest = Rect::new(0, 0, 0, 300);
    assert!(empty_roi.validate().is_err());

    let mut flat_pyramid = base;
    flat_pyramid.extractor.scale_factor = 1.0;
    assert!(flat_pyramid.validate().is_err());
}

#[test]
fn test_config_file_errors() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(
        RecognizerConfig::from_json_file(temp_dir.path().join("missing.json")),
        Err(ConfigError::Io(_))
    ));

    let broken = temp_dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        RecognizerConfig::from_json_file(&broken),
        Err(ConfigError::Json(_))
    ));

    let absurd_budget = temp_dir.path().join("budget.json");
    std::fs::write(&absurd_budget, r#"{"keypointBudget": 1000000000000000000}"#).unwrap();
    assert!(matches!(
        RecognizerConfig::from_json_file(&absurd_budget),
        Err(ConfigError::Invalid(_))
    ));

    let out_of_range = temp_dir.path().join("range.json");
    std::fs::write(&out_of_range, r#"{"recognitionThreshold": 2.0}"#).unwrap();
    assert!(matches!(
        RecognizerConfig::from_json_file(&out_of_range),
        Err(ConfigError::Invalid(_))
    ));
}
