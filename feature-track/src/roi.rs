use crate::ConfigError;
use float_ord::FloatOrd;
use track_core::KeyPoint;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// An axis aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Tests if a point lies in the rectangle.
    ///
    /// The left and top edges are inside, the right and bottom edges are outside.
    pub fn contains(&self, (x, y): (f32, f32)) -> bool {
        self.x <= x && x < self.x + self.width && self.y <= y && y < self.y + self.height
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width > 0.0 && self.height > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidRoi)
        }
    }
}

impl Default for Rect {
    /// The preceding vehicle in the KITTI `2011_09_26` camera 0 sequence.
    fn default() -> Self {
        Rect::new(535.0, 180.0, 180.0, 150.0)
    }
}

/// Keeps the keypoints that lie in `rect`, preserving their order.
pub fn filter_keypoints(keypoints: &[KeyPoint], rect: &Rect) -> Vec<KeyPoint> {
    keypoints
        .iter()
        .filter(|keypoint| rect.contains(keypoint.point))
        .copied()
        .collect()
}

/// Keeps the `limit` keypoints with the strongest response, preserving their order.
///
/// Keypoints with equal response are kept in detection order.
pub fn retain_strongest(keypoints: &mut Vec<KeyPoint>, limit: usize) {
    if keypoints.len() <= limit {
        return;
    }
    let mut ranked: Vec<usize> = (0..keypoints.len()).collect();
    ranked.sort_by_key(|&ix| std::cmp::Reverse(FloatOrd(keypoints[ix].response)));
    let mut keep = vec![false; keypoints.len()];
    for &ix in &ranked[..limit] {
        keep[ix] = true;
    }
    let mut flags = keep.into_iter();
    keypoints.retain(|_| flags.next().unwrap_or(false));
}

/// The region of interest policy applied after detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiFilter {
    pub enabled: bool,
    pub rect: Rect,
}

impl RoiFilter {
    pub fn new(rect: Rect) -> Self {
        Self {
            enabled: true,
            rect,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            rect: Rect::default(),
        }
    }

    pub fn apply(&self, keypoints: Vec<KeyPoint>) -> Vec<KeyPoint> {
        if self.enabled {
            filter_keypoints(&keypoints, &self.rect)
        } else {
            keypoints
        }
    }
}
