//! Binary descriptors.
//!
//! BRIEF and ORB compare the intensities of point pairs around the keypoint on a
//! smoothed image. AKAZE uses the M-LDB descriptors computed by the `akaze` crate.

use crate::detectors::intensity_centroid_angle;
use akaze::Akaze;
use feature_track::track_core::ndarray::Array2;
use feature_track::track_core::{Descriptors, KeyPoint};
use feature_track::{BoxError, Describer};
use image::{DynamicImage, GrayImage};
use imageproc::filter::gaussian_blur_f32;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::collections::HashMap;
use thiserror::Error;

/// The length of BRIEF and ORB descriptors in bytes.
pub const BINARY_TEST_BYTES: usize = 32;
/// The length of AKAZE descriptors in bytes.
pub const AKAZE_BYTES: usize = 64;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DescribeError {
    #[error("AKAZE cannot describe the keypoint at ({x}, {y}), which it did not detect")]
    ForeignKeypoint { x: f32, y: f32 },
}

/// Point pairs whose intensity comparison makes up one descriptor bit each.
#[derive(Debug, Clone)]
pub struct TestPattern {
    pairs: Vec<[(f32, f32); 2]>,
}

impl TestPattern {
    /// Samples `8 * bytes` pairs uniformly in a square of `±radius` pixels.
    pub fn random(seed: u64, bytes: usize, radius: f32) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let offset = Uniform::new_inclusive(-radius, radius);
        let mut point = || (offset.sample(&mut rng).round(), offset.sample(&mut rng).round());
        Self {
            pairs: (0..bytes * 8).map(|_| [point(), point()]).collect(),
        }
    }

    pub fn bytes(&self) -> usize {
        self.pairs.len() / 8
    }

    /// Appends the descriptor of the patch around `center` to `out`.
    ///
    /// The pattern is rotated by `angle` degrees when it is given. Samples falling
    /// outside of the image are clamped to the border.
    fn describe_into(
        &self,
        image: &GrayImage,
        center: (f32, f32),
        angle: Option<f32>,
        out: &mut Vec<u8>,
    ) {
        let (sin, cos) = angle.map_or((0.0, 1.0), |angle| angle.to_radians().sin_cos());
        let sample = |(dx, dy): (f32, f32)| {
            let x = center.0 + cos * dx - sin * dy;
            let y = center.1 + sin * dx + cos * dy;
            let x = (x.round().max(0.0) as u32).min(image.width() - 1);
            let y = (y.round().max(0.0) as u32).min(image.height() - 1);
            image.get_pixel(x, y)[0]
        };
        for byte in self.pairs.chunks(8) {
            out.push(
                byte.iter()
                    .enumerate()
                    .filter(|(_, [a, b])| sample(*a) < sample(*b))
                    .fold(0u8, |bits, (bit, _)| bits | 1 << bit),
            );
        }
    }
}

fn binary_rows(width: usize, rows: Vec<u8>) -> Result<Descriptors, BoxError> {
    Ok(Descriptors::Binary(Array2::from_shape_vec(
        (rows.len() / width, width),
        rows,
    )?))
}

/// BRIEF: unoriented binary tests.
#[derive(Debug, Clone)]
pub struct BriefDescriber {
    pub pattern: TestPattern,
    pub sigma: f32,
}

impl Default for BriefDescriber {
    fn default() -> Self {
        Self {
            pattern: TestPattern::random(0xB41EF, BINARY_TEST_BYTES, 15.0),
            sigma: 2.0,
        }
    }
}

impl Describer for BriefDescriber {
    fn describe(
        &mut self,
        image: &GrayImage,
        keypoints: &[KeyPoint],
    ) -> Result<Descriptors, BoxError> {
        let width = self.pattern.bytes();
        if keypoints.is_empty() || image.width() == 0 || image.height() == 0 {
            return Ok(Descriptors::Binary(Array2::zeros((keypoints.len(), width))));
        }
        let smoothed = gaussian_blur_f32(image, self.sigma);
        let mut rows = Vec::with_capacity(keypoints.len() * width);
        for keypoint in keypoints {
            self.pattern
                .describe_into(&smoothed, keypoint.point, None, &mut rows);
        }
        binary_rows(width, rows)
    }
}

/// ORB: binary tests steered by the keypoint orientation.
///
/// Keypoints without an orientation are oriented by their intensity centroid.
#[derive(Debug, Clone)]
pub struct OrbDescriber {
    pub pattern: TestPattern,
    pub sigma: f32,
    pub patch_radius: i32,
}

impl Default for OrbDescriber {
    fn default() -> Self {
        Self {
            pattern: TestPattern::random(0x0_2B, BINARY_TEST_BYTES, 13.0),
            sigma: 2.0,
            patch_radius: 15,
        }
    }
}

impl Describer for OrbDescriber {
    fn describe(
        &mut self,
        image: &GrayImage,
        keypoints: &[KeyPoint],
    ) -> Result<Descriptors, BoxError> {
        let width = self.pattern.bytes();
        if keypoints.is_empty() || image.width() == 0 || image.height() == 0 {
            return Ok(Descriptors::Binary(Array2::zeros((keypoints.len(), width))));
        }
        let smoothed = gaussian_blur_f32(image, self.sigma);
        let mut rows = Vec::with_capacity(keypoints.len() * width);
        for keypoint in keypoints {
            let angle = if keypoint.angle >= 0.0 {
                keypoint.angle
            } else {
                intensity_centroid_angle(image, keypoint.point, self.patch_radius)
            };
            self.pattern
                .describe_into(&smoothed, keypoint.point, Some(angle), &mut rows);
        }
        binary_rows(width, rows)
    }
}

fn position_key((x, y): (f32, f32)) -> (u32, u32) {
    (x.to_bits(), y.to_bits())
}

/// AKAZE M-LDB descriptors.
///
/// AKAZE describes keypoints in its own scale space, so it can only describe the
/// keypoints the AKAZE detector found on the same image. The keypoints are
/// recognized by their exact position.
#[derive(Debug, Clone, Copy, Default)]
pub struct AkazeDescriber {
    pub akaze: Akaze,
}

impl Describer for AkazeDescriber {
    fn describe(
        &mut self,
        image: &GrayImage,
        keypoints: &[KeyPoint],
    ) -> Result<Descriptors, BoxError> {
        if keypoints.is_empty() {
            return Ok(Descriptors::Binary(Array2::zeros((0, AKAZE_BYTES))));
        }
        let (extracted, descriptors) = self
            .akaze
            .extract(&DynamicImage::ImageLuma8(image.clone()));
        let by_position: HashMap<_, _> = extracted
            .iter()
            .map(|keypoint| position_key(keypoint.point))
            .zip(&descriptors)
            .collect();
        let mut rows = Vec::with_capacity(keypoints.len() * AKAZE_BYTES);
        for keypoint in keypoints {
            let descriptor = by_position
                .get(&position_key(keypoint.point))
                .ok_or(DescribeError::ForeignKeypoint {
                    x: keypoint.x(),
                    y: keypoint.y(),
                })?;
            rows.extend_from_slice(descriptor.bytes());
        }
        binary_rows(AKAZE_BYTES, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_track::track_core::hamming_distance;
    use image::Luma;

    fn texture() -> GrayImage {
        GrayImage::from_fn(96, 96, |x, y| Luma([((x * 37 + y * 91 + x * y) % 251) as u8]))
    }

    fn keypoints() -> Vec<KeyPoint> {
        vec![
            KeyPoint::new(30.0, 30.0, 7.0),
            KeyPoint::new(60.0, 40.0, 7.0),
            KeyPoint::new(1.0, 94.0, 7.0),
        ]
    }

    #[test]
    fn patterns_are_deterministic() {
        let a = TestPattern::random(7, 32, 15.0);
        let b = TestPattern::random(7, 32, 15.0);
        assert_eq!(a.bytes(), 32);
        assert_eq!(a.pairs, b.pairs);
        assert!(a
            .pairs
            .iter()
            .flatten()
            .all(|&(x, y)| x.abs() <= 15.0 && y.abs() <= 15.0));
    }

    #[test]
    fn brief_describes_every_keypoint() {
        let descriptors = BriefDescriber::default()
            .describe(&texture(), &keypoints())
            .unwrap();
        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors.width(), BINARY_TEST_BYTES);
    }

    #[test]
    fn brief_is_repeatable() {
        let mut describer = BriefDescriber::default();
        let a = describer.describe(&texture(), &keypoints()).unwrap();
        let b = describer.describe(&texture(), &keypoints()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_keypoints_give_empty_descriptors() {
        let descriptors = OrbDescriber::default().describe(&texture(), &[]).unwrap();
        assert!(descriptors.is_empty());
        assert_eq!(descriptors.width(), BINARY_TEST_BYTES);
        let descriptors = AkazeDescriber::default().describe(&texture(), &[]).unwrap();
        assert!(descriptors.is_empty());
    }

    #[test]
    fn orb_follows_the_orientation() {
        let image = texture();
        let keypoint = KeyPoint::new(48.0, 48.0, 31.0);
        let mut describer = OrbDescriber::default();
        let describe = |describer: &mut OrbDescriber, keypoint: KeyPoint| match describer
            .describe(&image, &[keypoint])
            .unwrap()
        {
            Descriptors::Binary(rows) => rows,
            Descriptors::Float(_) => unreachable!(),
        };
        let upright = describe(&mut describer, keypoint.with_angle(0.0));
        let again = describe(&mut describer, keypoint.with_angle(0.0));
        let turned = describe(&mut describer, keypoint.with_angle(90.0));
        assert_eq!(hamming_distance(upright.row(0), again.row(0)), 0);
        assert!(hamming_distance(upright.row(0), turned.row(0)) > 0);
    }

    #[test]
    fn akaze_rejects_foreign_keypoints() {
        let foreign = [KeyPoint::new(30.123, 30.456, 7.0)];
        let error = AkazeDescriber::default()
            .describe(&texture(), &foreign)
            .unwrap_err();
        assert!(error.to_string().contains("did not detect"));
    }
}
