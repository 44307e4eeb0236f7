use std::num::NonZeroUsize;

use crate::features::FeatureSet;
use crate::preprocess::ReferenceTemplate;

/// One accepted correspondence between a reference and a frame feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondence {
    /// Index into the reference feature set (query side).
    pub reference_idx: usize,
    /// Index into the frame feature set (train side).
    pub frame_idx: usize,
    /// Hamming distance between the two descriptors.
    pub distance: u32,
}

/// Accepted correspondences for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub correspondences: Vec<Correspondence>,
    reference_count: NonZeroUsize,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.correspondences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }

    pub fn similarity(&self) -> SimilarityScore {
        SimilarityScore::from_counts(self.correspondences.len(), self.reference_count)
    }
}

/// Fraction of reference features matched in a frame, always in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SimilarityScore(f32);

impl SimilarityScore {
    pub const ZERO: SimilarityScore = SimilarityScore(0.0);

    /// The reference count is non-zero by construction: an empty reference
    /// set is rejected when the template is built.
    pub fn from_counts(accepted: usize, reference_count: NonZeroUsize) -> Self {
        let ratio = accepted as f32 / reference_count.get() as f32;
        SimilarityScore(ratio.clamp(0.0, 1.0))
    }

    /// Wraps a raw value, mapping NaN to 0 and clamping into [0, 1].
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            SimilarityScore::ZERO
        } else {
            SimilarityScore(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

/// Brute force nearest neighbour matcher under Hamming distance.
///
/// With cross-check enabled a pair is accepted only when each side is the
/// other's nearest neighbour. Ties resolve to the lower index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HammingMatcher {
    pub cross_check: bool,
    /// Reject pairs farther apart than this. `None` disables the filter.
    pub max_distance: Option<u32>,
}

impl Default for HammingMatcher {
    fn default() -> Self {
        HammingMatcher {
            cross_check: true,
            max_distance: None,
        }
    }
}

impl HammingMatcher {
    /// Matches the template's features (query) against a frame (train) set.
    /// The similarity denominator is the template's own feature count.
    pub fn match_template(&self, template: &ReferenceTemplate, frame: &FeatureSet) -> MatchResult {
        let reference = template.features();
        let correspondences = if frame.is_empty() {
            Vec::new()
        } else {
            let query = reference.descriptors();
            let train = frame.descriptors();
            let forward = nearest(&query, &train);
            let backward = if self.cross_check {
                Some(nearest(&train, &query))
            } else {
                None
            };

            forward
                .iter()
                .enumerate()
                .filter_map(|(q, &(t, distance))| {
                    if let Some(backward) = &backward
                        && backward[t].0 != q
                    {
                        return None;
                    }
                    if let Some(max) = self.max_distance
                        && distance > max
                    {
                        return None;
                    }
                    Some(Correspondence {
                        reference_idx: q,
                        frame_idx: t,
                        distance,
                    })
                })
                .collect()
        };
        MatchResult {
            correspondences,
            reference_count: template.feature_count(),
        }
    }
}

/// For every descriptor in `from`, the index and distance of its nearest
/// neighbour in `to`. `to` must be non-empty.
fn nearest(
    from: &[crate::features::Descriptor],
    to: &[crate::features::Descriptor],
) -> Vec<(usize, u32)> {
    from.iter()
        .map(|d| {
            let mut best = (0usize, u32::MAX);
            for (j, other) in to.iter().enumerate() {
                let dist = d.hamming(other);
                if dist < best.1 {
                    best = (j, dist);
                }
            }
            best
        })
        .collect()
}
