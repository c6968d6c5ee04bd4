#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A correspondence between a keypoint on the previous frame and a keypoint
/// on the current frame.
///
/// Both members are indices into the keypoint (and descriptor row) sequences
/// of their respective frames.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FeatureMatch {
    /// Keypoint index on the previous frame
    pub previous: usize,
    /// Keypoint index on the current frame
    pub current: usize,
    /// Descriptor distance reported by the matcher
    pub distance: f32,
}

impl FeatureMatch {
    pub fn new(previous: usize, current: usize, distance: f32) -> Self {
        Self {
            previous,
            current,
            distance,
        }
    }
}
