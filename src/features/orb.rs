use std::sync::OnceLock;

use image::GrayImage;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::fast::{self, Corner};
use super::pyramid::{PyramidLevel, ScalePyramid};
use super::{DESCRIPTOR_BYTES, Descriptor, Feature, FeatureSet, Keypoint};
use crate::config::RecognizerConfig;

const PATCH_SIZE: u32 = 31;
const HALF_PATCH: i32 = 15;
const HARRIS_BLOCK: u32 = 7;
const BLUR_SIGMA: f32 = 2.0;
const PATTERN_SEED: u64 = 0x0b5e_55ed_ca4d;

/// Oriented FAST and Rotated BRIEF extractor with a fixed keypoint budget.
///
/// Keypoints are found on every level of a scale pyramid, ranked by Harris
/// response and capped per level so that the level quotas sum to the budget.
/// Each keypoint gets an intensity-centroid orientation and a 256-bit
/// descriptor of rotated pairwise intensity tests on a smoothed patch.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbExtractor {
    budget: usize,
    levels: usize,
    scale_factor: f32,
    fast_threshold: u8,
    edge_threshold: u32,
}

impl OrbExtractor {
    pub fn new(budget: usize) -> Self {
        let config = RecognizerConfig::default();
        Self {
            budget,
            ..Self::from_config(&config)
        }
    }

    pub fn from_config(config: &RecognizerConfig) -> Self {
        Self {
            budget: config.keypoint_budget,
            levels: config.extractor.pyramid_levels,
            scale_factor: config.extractor.scale_factor,
            fast_threshold: config.extractor.fast_threshold,
            edge_threshold: config.extractor.edge_threshold,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    fn border(&self) -> u32 {
        self.edge_threshold.max(HALF_PATCH as u32 + 1)
    }

    /// Extracts at most `budget` features from a normalized grayscale image.
    pub fn extract(&self, image: &GrayImage) -> FeatureSet {
        let border = self.border();
        let pyramid = ScalePyramid::build(image, self.levels, self.scale_factor, 2 * border + 1);
        if pyramid.is_empty() || self.budget == 0 {
            return FeatureSet::default();
        }

        let quotas = level_quotas(self.budget, pyramid.len(), self.scale_factor);
        let mut features = Vec::new();
        for (octave, (level, quota)) in pyramid.levels().iter().zip(quotas).enumerate() {
            if quota == 0 {
                continue;
            }
            let corners = self.best_corners(level, quota, border);
            let smoothed = image::imageops::blur(&level.image, BLUR_SIGMA);
            for (corner, response) in corners {
                let angle = orientation(&level.image, corner.x as i32, corner.y as i32);
                let descriptor = describe(&smoothed, corner.x as i32, corner.y as i32, angle);
                let mut degrees = angle.to_degrees().rem_euclid(360.0);
                if degrees >= 360.0 {
                    degrees = 0.0;
                }
                features.push(Feature {
                    keypoint: Keypoint {
                        x: corner.x as f32 * level.scale,
                        y: corner.y as f32 * level.scale,
                        size: PATCH_SIZE as f32 * level.scale,
                        angle: degrees,
                        response,
                        octave: octave as u8,
                    },
                    descriptor,
                });
            }
        }
        log::trace!(
            "extracted {} features over {} levels",
            features.len(),
            pyramid.len()
        );
        FeatureSet::new(features)
    }

    fn best_corners(&self, level: &PyramidLevel, quota: usize, border: u32) -> Vec<(Corner, f32)> {
        let mut scored: Vec<(Corner, f32)> = fast::detect(&level.image, self.fast_threshold, border)
            .into_iter()
            .map(|c| {
                let r = fast::harris_response(&level.image, c.x, c.y, HARRIS_BLOCK);
                (c, r)
            })
            .collect();
        // stable: equal responses keep scan order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(quota);
        scored
    }
}

/// Splits `budget` across `levels` geometrically, finer levels first.
fn level_quotas(budget: usize, levels: usize, scale_factor: f32) -> Vec<usize> {
    if levels == 1 {
        return vec![budget];
    }
    let factor = 1.0 / scale_factor as f64;
    let mut desired = budget as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));
    let mut quotas = Vec::with_capacity(levels);
    let mut assigned = 0usize;
    for _ in 0..levels - 1 {
        let q = (desired.round() as usize).min(budget - assigned);
        quotas.push(q);
        assigned += q;
        desired *= factor;
    }
    quotas.push(budget - assigned);
    quotas
}

/// Horizontal half-widths of the circular patch, one per row offset.
fn patch_spans() -> &'static [i32] {
    static SPANS: OnceLock<Vec<i32>> = OnceLock::new();
    SPANS.get_or_init(|| {
        (-HALF_PATCH..=HALF_PATCH)
            .map(|dy| {
                let r2 = (HALF_PATCH * HALF_PATCH - dy * dy) as f32;
                r2.sqrt().floor() as i32
            })
            .collect()
    })
}

/// Intensity centroid angle in radians.
fn orientation(image: &GrayImage, cx: i32, cy: i32) -> f32 {
    let raw = image.as_raw();
    let stride = image.width() as i32;
    let mut m01 = 0i64;
    let mut m10 = 0i64;
    for (row, span) in patch_spans().iter().enumerate() {
        let dy = row as i32 - HALF_PATCH;
        let base = (cy + dy) * stride + cx;
        for dx in -span..=*span {
            let v = raw[(base + dx) as usize] as i64;
            m10 += dx as i64 * v;
            m01 += dy as i64 * v;
        }
    }
    if m10 == 0 && m01 == 0 {
        0.0
    } else {
        (m01 as f32).atan2(m10 as f32)
    }
}

#[derive(Clone, Copy)]
struct TestPair {
    a: (i32, i32),
    b: (i32, i32),
}

/// Deterministic BRIEF sampling pattern inside the patch circle.
fn pattern() -> &'static [TestPair] {
    static PATTERN: OnceLock<Vec<TestPair>> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
        let mut point = move || loop {
            let x = rng.random_range(-HALF_PATCH..=HALF_PATCH);
            let y = rng.random_range(-HALF_PATCH..=HALF_PATCH);
            if x * x + y * y <= HALF_PATCH * HALF_PATCH {
                return (x, y);
            }
        };
        let mut pairs = Vec::with_capacity(DESCRIPTOR_BYTES * 8);
        while pairs.len() < DESCRIPTOR_BYTES * 8 {
            let a = point();
            let b = point();
            if a != b {
                pairs.push(TestPair { a, b });
            }
        }
        pairs
    })
}

fn describe(smoothed: &GrayImage, cx: i32, cy: i32, angle: f32) -> Descriptor {
    let raw = smoothed.as_raw();
    let stride = smoothed.width() as i32;
    let (sin, cos) = angle.sin_cos();
    let sample = |(px, py): (i32, i32)| {
        let (px, py) = (px as f32, py as f32);
        let x = cx + (cos * px - sin * py).round() as i32;
        let y = cy + (sin * px + cos * py).round() as i32;
        raw[(y * stride + x) as usize]
    };

    let mut bytes = [0u8; DESCRIPTOR_BYTES];
    for (i, pair) in pattern().iter().enumerate() {
        if sample(pair.a) < sample(pair.b) {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    Descriptor(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blocks(w: u32, h: u32, seed: u64) -> GrayImage {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cells: Vec<u8> = (0..(w / 8 + 1) * (h / 8 + 1))
            .map(|_| rng.random_range(0..=255u8))
            .collect();
        GrayImage::from_fn(w, h, |x, y| Luma([cells[((y / 8) * (w / 8 + 1) + x / 8) as usize]]))
    }

    #[test]
    fn quotas_sum_to_budget() {
        for levels in 1..9 {
            let q = level_quotas(1000, levels, 1.2);
            assert_eq!(q.len(), levels);
            assert_eq!(q.iter().sum::<usize>(), 1000);
            assert!(q.windows(2).take(levels.saturating_sub(2)).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn budget_is_respected() {
        let img = blocks(400, 300, 3);
        let extractor = OrbExtractor::new(200);
        let features = extractor.extract(&img);
        assert!(!features.is_empty());
        assert!(features.len() <= extractor.budget());
    }

    #[test]
    fn oversized_budget_only_caps_the_count() {
        let img = blocks(200, 160, 4);
        let capped = OrbExtractor::new(usize::MAX / 2).extract(&img);
        assert!(!capped.is_empty());
        assert_eq!(capped.len(), OrbExtractor::new(100_000).extract(&img).len());
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = blocks(200, 160, 9);
        let extractor = OrbExtractor::new(300);
        assert_eq!(extractor.extract(&img), extractor.extract(&img));
    }

    #[test]
    fn featureless_image_gives_empty_set() {
        let img = GrayImage::from_pixel(400, 300, Luma([0]));
        assert!(OrbExtractor::new(1000).extract(&img).is_empty());
    }

    #[test]
    fn pattern_stays_inside_patch() {
        let p = pattern();
        assert_eq!(p.len(), 256);
        for pair in p {
            for (x, y) in [pair.a, pair.b] {
                assert!(x * x + y * y <= HALF_PATCH * HALF_PATCH);
            }
        }
    }

    #[test]
    fn keypoints_are_in_level_zero_coordinates() {
        let img = blocks(400, 300, 5);
        let features = OrbExtractor::new(1000).extract(&img);
        for kp in features.keypoints() {
            assert!(kp.x >= 0.0 && kp.x < 400.0);
            assert!(kp.y >= 0.0 && kp.y < 300.0);
            assert!((0.0..360.0).contains(&kp.angle));
        }
        assert!(features.keypoints().any(|kp| kp.octave > 0));
    }
}
