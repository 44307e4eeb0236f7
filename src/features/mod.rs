use serde::{Deserialize, Serialize};

pub mod fast;
pub mod orb;
pub mod pyramid;

pub use orb::OrbExtractor;

/// Descriptor length in bytes (256 binary tests).
pub const DESCRIPTOR_BYTES: usize = 32;

/// A detected keypoint in level-0 pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the described patch at level 0.
    pub size: f32,
    /// Orientation in degrees, [0, 360).
    pub angle: f32,
    #[serde(skip)]
    pub response: f32,
    #[serde(skip)]
    pub octave: u8,
}

/// Fixed length binary descriptor compared under Hamming distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor(pub [u8; DESCRIPTOR_BYTES]);

impl Descriptor {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .chunks_exact(8)
            .zip(other.0.chunks_exact(8))
            .map(|(a, b)| {
                let a = u64::from_le_bytes([a[0], a[1], a[2], a[3], a[4], a[5], a[6], a[7]]);
                let b = u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
                (a ^ b).count_ones()
            })
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

/// Ordered keypoint/descriptor pairs extracted from one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(features: Vec<Feature>) -> FeatureSet {
        FeatureSet { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn keypoints(&self) -> impl Iterator<Item = &Keypoint> {
        self.iter().map(|f| &f.keypoint)
    }

    pub fn descriptors(&self) -> Vec<Descriptor> {
        self.iter().map(|f| f.descriptor).collect()
    }

    /// Serializable view: keypoints plus raw descriptor bytes.
    pub fn export(&self) -> ExportedFeatures {
        ExportedFeatures {
            keypoints: self.keypoints().copied().collect(),
            descriptors: self.iter().map(|f| f.descriptor.0.to_vec()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedFeatures {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Vec<u8>>,
}
