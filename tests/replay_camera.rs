use cardar::camera::{CameraConstraints, CameraProvider, FrameSource, ReplayCamera, frame_paths};
use cardar::errors::{CameraError, CaptureError};
use image::{Rgba, RgbaImage};
use tempfile::TempDir;

fn write_frames(dir: &std::path::Path, shades: &[u8]) {
    for (i, shade) in shades.iter().enumerate() {
        RgbaImage::from_pixel(8, 6, Rgba([*shade, 0, 0, 255]))
            .save(dir.join(format!("frame_{:03}.png", i)))
            .unwrap();
    }
}

#[test]
fn test_frame_paths_are_sorted_images_only() {
    let temp_dir = TempDir::new().unwrap();
    write_frames(temp_dir.path(), &[10, 20, 30]);
    std::fs::write(temp_dir.path().join("notes.txt"), "not a frame").unwrap();

    let paths = frame_paths(temp_dir.path()).unwrap();
    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["frame_000.png", "frame_001.png", "frame_002.png"]);
}

#[tokio::test]
async fn test_replay_plays_frames_in_order() {
    let temp_dir = TempDir::new().unwrap();
    write_frames(temp_dir.path(), &[10, 20]);

    let mut camera = ReplayCamera::new(temp_dir.path(), false);
    let mut frames = camera.open(&CameraConstraints::default()).await.unwrap();
    assert_eq!(frames.capture().unwrap().get_pixel(0, 0)[0], 10);
    assert_eq!(frames.capture().unwrap().get_pixel(0, 0)[0], 20);
    assert!(matches!(frames.capture(), Err(CaptureError::StreamEnded)));
}

#[tokio::test]
async fn test_empty_or_missing_folder_is_no_device() {
    let temp_dir = TempDir::new().unwrap();
    let mut empty = ReplayCamera::new(temp_dir.path(), true);
    assert!(matches!(
        empty.open(&CameraConstraints::default()).await,
        Err(CameraError::NoDevice(_))
    ));

    let mut missing = ReplayCamera::new(temp_dir.path().join("nope"), true);
    assert!(matches!(
        missing.open(&CameraConstraints::default()).await,
        Err(CameraError::NoDevice(_))
    ));
}

#[tokio::test]
async fn test_corrupt_frame_is_a_decode_error() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("broken.png"), b"not a png").unwrap();
    let mut camera = ReplayCamera::new(temp_dir.path(), true);
    assert!(matches!(
        camera.open(&CameraConstraints::default()).await,
        Err(CameraError::Decode { .. })
    ));
}
