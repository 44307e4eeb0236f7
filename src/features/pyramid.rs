use image::GrayImage;

use crate::imgproc::resize_area;

pub struct PyramidLevel {
    pub image: GrayImage,
    /// Multiply level coordinates by this to get level-0 coordinates.
    pub scale: f32,
}

/// Scale pyramid used by the ORB extractor.
pub struct ScalePyramid {
    levels: Vec<PyramidLevel>,
}

impl ScalePyramid {
    /// Builds up to `max_levels` levels, each `scale_factor` smaller than the
    /// previous. Construction stops early once a level would be narrower than
    /// `min_side` in either dimension.
    pub fn build(base: &GrayImage, max_levels: usize, scale_factor: f32, min_side: u32) -> Self {
        let mut levels = Vec::with_capacity(max_levels);
        for level in 0..max_levels {
            let scale = scale_factor.powi(level as i32);
            let w = (base.width() as f32 / scale).round() as u32;
            let h = (base.height() as f32 / scale).round() as u32;
            if w < min_side || h < min_side {
                break;
            }
            let image = if level == 0 {
                base.clone()
            } else {
                resize_area(base, w, h)
            };
            levels.push(PyramidLevel { image, scale });
        }
        log::trace!(
            "pyramid of {} levels from {}x{}",
            levels.len(),
            base.width(),
            base.height()
        );
        ScalePyramid { levels }
    }

    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
