#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A point of interest in an image.
///
/// This follows OpenCV conventions so that results are comparable with
/// OpenCV based tooling.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint {
    /// The `(x, y)` pixel position. `+x` faces right and `+y` faces down,
    /// with the origin at the top left corner of the image.
    pub point: (f32, f32),
    /// The diameter of the meaningful keypoint neighborhood, in pixels.
    pub size: f32,
    /// The orientation angle in degrees, or `-1.0` if not applicable.
    pub angle: f32,
    /// The magnitude of response from the detector.
    pub response: f32,
    /// The level of scale space in which the keypoint was detected.
    pub octave: usize,
}

impl KeyPoint {
    /// Creates an unoriented keypoint with no response at the octave zero.
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            point: (x, y),
            size,
            angle: -1.0,
            response: 0.0,
            octave: 0,
        }
    }

    /// Sets the detector response.
    pub fn with_response(self, response: f32) -> Self {
        Self { response, ..self }
    }

    /// Sets the orientation angle in degrees.
    pub fn with_angle(self, angle: f32) -> Self {
        Self { angle, ..self }
    }

    pub fn x(&self) -> f32 {
        self.point.0
    }

    pub fn y(&self) -> f32 {
        self.point.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keypoints_are_unoriented() {
        let keypoint = KeyPoint::new(3.5, 7.0, 9.0);
        assert_eq!((keypoint.x(), keypoint.y()), (3.5, 7.0));
        assert_eq!(keypoint.angle, -1.0);
        assert_eq!(keypoint.response, 0.0);
        assert_eq!(keypoint.octave, 0);

        let keypoint = keypoint.with_response(0.25).with_angle(45.0);
        assert_eq!(keypoint.response, 0.25);
        assert_eq!(keypoint.angle, 45.0);
        assert_eq!(keypoint.size, 9.0);
    }
}
