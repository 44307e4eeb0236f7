use std::future::Future;
use std::path::{Path, PathBuf};

use glob::glob;
use image::RgbaImage;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{CameraError, CaptureError};
use crate::io::load_rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Facing {
    #[default]
    Rear,
    Front,
}

/// Preferred stream properties handed to the camera provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::Rear,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// A live stream the sampler can pull the current frame from.
pub trait FrameSource {
    fn capture(&mut self) -> Result<RgbaImage, CaptureError>;
}

/// Acquires a frame source. Awaited once before sampling starts.
pub trait CameraProvider {
    type Source: FrameSource + Send;

    fn open(
        &mut self,
        constraints: &CameraConstraints,
    ) -> impl Future<Output = Result<Self::Source, CameraError>> + Send;
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        let lower = p.as_os_str().to_string_lossy().to_lowercase();
        for ext in &[".png", ".jpg", ".jpeg"] {
            if lower.ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Sorted image paths directly inside `folder`.
pub fn frame_paths(folder: &Path) -> Result<Vec<PathBuf>, CameraError> {
    let pattern = format!("{}/*", folder.display());
    let entries = glob(&pattern).map_err(|e| CameraError::NoDevice(e.to_string()))?;
    let mut paths: Vec<PathBuf> = entries.filter_map(img_filter).collect();
    paths.sort();
    Ok(paths)
}

/// Plays back a folder of recorded frames as a camera stream.
#[derive(Debug, Clone)]
pub struct ReplayCamera {
    folder: PathBuf,
    looping: bool,
}

impl ReplayCamera {
    pub fn new<P: AsRef<Path>>(folder: P, looping: bool) -> Self {
        ReplayCamera {
            folder: folder.as_ref().to_path_buf(),
            looping,
        }
    }
}

fn load_frames(folder: &Path) -> Result<Vec<RgbaImage>, CameraError> {
    if !folder.is_dir() {
        return Err(CameraError::NoDevice(format!(
            "{} is not a directory",
            folder.display()
        )));
    }
    let paths = frame_paths(folder)?;
    if paths.is_empty() {
        return Err(CameraError::NoDevice(format!(
            "no frames in {}",
            folder.display()
        )));
    }
    log::trace!("decoding {} frames from {}", paths.len(), folder.display());
    paths
        .par_iter()
        .progress_count(paths.len() as u64)
        .map(|path| {
            load_rgba(path).map_err(|source| CameraError::Decode {
                path: path.clone(),
                source,
            })
        })
        .collect()
}

impl CameraProvider for ReplayCamera {
    type Source = ReplayFrames;

    fn open(
        &mut self,
        constraints: &CameraConstraints,
    ) -> impl Future<Output = Result<ReplayFrames, CameraError>> + Send {
        let folder = self.folder.clone();
        let looping = self.looping;
        let constraints = *constraints;
        async move {
            let frames = tokio::task::spawn_blocking(move || load_frames(&folder))
                .await
                .map_err(std::io::Error::other)??;
            if let Some(first) = frames.first()
                && first.dimensions() != (constraints.ideal_width, constraints.ideal_height)
            {
                log::debug!(
                    "replay frames are {}x{}, ideal was {}x{}",
                    first.width(),
                    first.height(),
                    constraints.ideal_width,
                    constraints.ideal_height
                );
            }
            Ok(ReplayFrames {
                frames,
                cursor: 0,
                looping,
            })
        }
    }
}

pub struct ReplayFrames {
    frames: Vec<RgbaImage>,
    cursor: usize,
    looping: bool,
}

impl ReplayFrames {
    pub fn new(frames: Vec<RgbaImage>, looping: bool) -> Self {
        ReplayFrames {
            frames,
            cursor: 0,
            looping,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplayFrames {
    fn capture(&mut self) -> Result<RgbaImage, CaptureError> {
        if self.frames.is_empty() {
            return Err(CaptureError::NotReady);
        }
        if self.cursor >= self.frames.len() {
            if !self.looping {
                return Err(CaptureError::StreamEnded);
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(frame)
    }
}

/// A camera that always shows the same image.
#[derive(Debug, Clone)]
pub struct StillCamera {
    image: RgbaImage,
}

impl StillCamera {
    pub fn new(image: RgbaImage) -> Self {
        StillCamera { image }
    }
}

impl FrameSource for StillCamera {
    fn capture(&mut self) -> Result<RgbaImage, CaptureError> {
        Ok(self.image.clone())
    }
}

impl CameraProvider for StillCamera {
    type Source = StillCamera;

    fn open(
        &mut self,
        _constraints: &CameraConstraints,
    ) -> impl Future<Output = Result<StillCamera, CameraError>> + Send {
        let camera = self.clone();
        async move { Ok(camera) }
    }
}
