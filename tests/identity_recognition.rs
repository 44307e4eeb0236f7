mod common;

use cardar::config::RecognizerConfig;
use cardar::errors::{CaptureError, StartupError};
use cardar::imgproc::resize_area;
use cardar::recognizer::Recognizer;
use cardar::types::Rect;
use common::{blank_frame, frame_with_card, textured_card};
use image::{Rgba, RgbaImage};

#[test]
fn test_card_in_roi_matches_template() {
    let config = RecognizerConfig::default();
    let card = textured_card(400, 300, 5);
    let recognizer = Recognizer::new(&config, &card).unwrap();
    assert!(recognizer.template().feature_count().get() > 100);
    assert_eq!(recognizer.region_of_interest(), config.region_of_interest);

    let frame = frame_with_card(640, 480, &card, &recognizer.region_of_interest());
    let score = recognizer.score_frame(&frame).unwrap();
    assert!(score.value() >= 0.95, "score {}", score.value());
}

#[test]
fn test_larger_template_is_normalized_to_roi_size() {
    let config = RecognizerConfig::default();
    let card = textured_card(800, 600, 6);
    let recognizer = Recognizer::new(&config, &card).unwrap();

    let shown = resize_area(&card, 400, 300);
    let frame = frame_with_card(640, 480, &shown, &config.region_of_interest);
    let score = recognizer.score_frame(&frame).unwrap();
    assert!(score.value() >= config.recognition_threshold, "score {}", score.value());
}

#[test]
fn test_blank_frame_scores_zero() {
    let config = RecognizerConfig::default();
    let recognizer = Recognizer::new(&config, &textured_card(400, 300, 7)).unwrap();
    let score = recognizer.score_frame(&blank_frame(640, 480)).unwrap();
    assert_eq!(score.value(), 0.0);
}

#[test]
fn test_roi_outside_frame_is_a_capture_error() {
    let config = RecognizerConfig::default();
    let recognizer = Recognizer::new(&config, &textured_card(400, 300, 8)).unwrap();
    let small = blank_frame(320, 240);
    assert!(matches!(
        recognizer.score_frame(&small),
        Err(CaptureError::RoiOutOfBounds { width: 320, height: 240, .. })
    ));
}

#[test]
fn test_featureless_template_is_rejected() {
    let flat = RgbaImage::from_pixel(400, 300, Rgba([200, 200, 200, 255]));
    assert!(matches!(
        Recognizer::new(&RecognizerConfig::default(), &flat),
        Err(StartupError::EmptyTemplate)
    ));
}

#[test]
fn test_oversized_budget_is_a_config_error() {
    let config: RecognizerConfig =
        serde_json::from_str(r#"{"keypointBudget": 1000000000000000000}"#).unwrap();
    assert!(matches!(
        Recognizer::new(&config, &textured_card(400, 300, 5)),
        Err(StartupError::Config(_))
    ));
}

#[test]
fn test_invalid_config_is_fatal() {
    let config = RecognizerConfig {
        region_of_interest: Rect::new(0, 0, 0, 0),
        ..Default::default()
    };
    assert!(matches!(
        Recognizer::new(&config, &textured_card(400, 300, 9)),
        Err(StartupError::Config(_))
    ));
}
