//! Keypoint detectors built on `imageproc` and `akaze`.
//!
//! All detectors work on a single scale except for AKAZE, which searches its own
//! nonlinear scale space.

use akaze::Akaze;
use feature_track::track_core::KeyPoint;
use feature_track::Detector;
use float_ord::FloatOrd;
use image::{DynamicImage, GrayImage};
use imageproc::corners::{corners_fast9, Corner};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::suppress::local_maxima;
use log::*;
use std::cmp::Reverse;

/// Windowed sums of the products of the image gradients.
struct StructureTensor {
    width: usize,
    height: usize,
    xx: Vec<f32>,
    xy: Vec<f32>,
    yy: Vec<f32>,
}

impl StructureTensor {
    fn new(image: &GrayImage, block: usize) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let gx = horizontal_sobel(image);
        let gy = vertical_sobel(image);
        let products = |f: fn(f32, f32) -> f32| -> Vec<f32> {
            gx.pixels()
                .zip(gy.pixels())
                .map(|(x, y)| f(x[0] as f32, y[0] as f32))
                .collect()
        };
        Self {
            width,
            height,
            xx: box_sum(&products(|x, _| x * x), width, height, block),
            xy: box_sum(&products(|x, y| x * y), width, height, block),
            yy: box_sum(&products(|_, y| y * y), width, height, block),
        }
    }

    /// Evaluates `f(xx, xy, yy)` at every pixel.
    fn response(&self, f: impl Fn(f32, f32, f32) -> f32) -> Vec<f32> {
        self.xx
            .iter()
            .zip(&self.xy)
            .zip(&self.yy)
            .map(|((&xx, &xy), &yy)| f(xx, xy, yy))
            .collect()
    }

    fn at(&self, x: usize, y: usize, f: impl Fn(f32, f32, f32) -> f32) -> f32 {
        let ix = y * self.width + x;
        f(self.xx[ix], self.xy[ix], self.yy[ix])
    }
}

fn harris(k: f32) -> impl Fn(f32, f32, f32) -> f32 {
    move |xx, xy, yy| xx * yy - xy * xy - k * (xx + yy) * (xx + yy)
}

fn min_eigenvalue(xx: f32, xy: f32, yy: f32) -> f32 {
    0.5 * ((xx + yy) - ((xx - yy) * (xx - yy) + 4.0 * xy * xy).sqrt())
}

/// Sums `values` over a `block` sized square window anchored like OpenCV's box filter.
fn box_sum(values: &[f32], width: usize, height: usize, block: usize) -> Vec<f32> {
    let stride = width + 1;
    let mut integral = vec![0.0f64; stride * (height + 1)];
    for y in 0..height {
        let mut row = 0.0;
        for x in 0..width {
            row += values[y * width + x] as f64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row;
        }
    }
    let half = block / 2;
    let mut sums = Vec::with_capacity(width * height);
    for y in 0..height {
        let (y0, y1) = (y.saturating_sub(half), (y + block - half).min(height));
        for x in 0..width {
            let (x0, x1) = (x.saturating_sub(half), (x + block - half).min(width));
            let sum = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                - integral[y1 * stride + x0]
                + integral[y0 * stride + x0];
            sums.push(sum as f32);
        }
    }
    sums
}

/// Finds pixels whose response exceeds `threshold` and is maximal within `radius`.
///
/// On a plateau only the first pixel in raster order survives.
fn grid_maxima(
    response: &[f32],
    width: usize,
    height: usize,
    radius: usize,
    threshold: f32,
) -> Vec<(usize, usize, f32)> {
    let mut maxima = vec![];
    for y in 0..height {
        for x in 0..width {
            let ix = y * width + x;
            let value = response[ix];
            if value <= threshold {
                continue;
            }
            let is_maximum = (y.saturating_sub(radius)..(y + radius + 1).min(height))
                .flat_map(|ny| {
                    (x.saturating_sub(radius)..(x + radius + 1).min(width)).map(move |nx| (nx, ny))
                })
                .all(|(nx, ny)| {
                    let nix = ny * width + nx;
                    match nix.cmp(&ix) {
                        std::cmp::Ordering::Less => response[nix] < value,
                        std::cmp::Ordering::Equal => true,
                        std::cmp::Ordering::Greater => response[nix] <= value,
                    }
                });
            if is_maximum {
                maxima.push((x, y, value));
            }
        }
    }
    maxima
}

/// The orientation of the patch around `(x, y)` from its intensity centroid, in degrees.
pub fn intensity_centroid_angle(image: &GrayImage, (x, y): (f32, f32), radius: i32) -> f32 {
    let (width, height) = (image.width() as i32, image.height() as i32);
    let (cx, cy) = (x.round() as i32, y.round() as i32);
    let (mut m10, mut m01) = (0.0f32, 0.0f32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let px = (cx + dx).clamp(0, width - 1) as u32;
            let py = (cy + dy).clamp(0, height - 1) as u32;
            let intensity = image.get_pixel(px, py)[0] as f32;
            m10 += dx as f32 * intensity;
            m01 += dy as f32 * intensity;
        }
    }
    m01.atan2(m10).to_degrees().rem_euclid(360.0)
}

/// Shi-Tomasi "good features to track".
#[derive(Debug, Clone, Copy)]
pub struct ShiTomasiDetector {
    pub block_size: usize,
    /// Corners weaker than this fraction of the strongest corner are rejected.
    pub quality_level: f32,
    pub min_distance: f32,
}

impl Default for ShiTomasiDetector {
    fn default() -> Self {
        Self {
            block_size: 4,
            quality_level: 0.01,
            min_distance: 4.0,
        }
    }
}

impl Detector for ShiTomasiDetector {
    fn detect(&mut self, image: &GrayImage) -> Vec<KeyPoint> {
        if image.width() == 0 || image.height() == 0 {
            return vec![];
        }
        let tensor = StructureTensor::new(image, self.block_size);
        let response = tensor.response(min_eigenvalue);
        let strongest = response.iter().copied().fold(0.0f32, f32::max);
        if strongest <= 0.0 {
            return vec![];
        }
        let mut candidates = grid_maxima(
            &response,
            tensor.width,
            tensor.height,
            1,
            self.quality_level * strongest,
        );
        candidates.sort_by_key(|&(_, _, value)| Reverse(FloatOrd(value)));

        let max_corners = tensor.width * tensor.height / (self.min_distance.max(1.0) as usize);
        let cell = self.min_distance.max(1.0);
        let grid_width = (tensor.width as f32 / cell).ceil() as usize;
        let grid_height = (tensor.height as f32 / cell).ceil() as usize;
        let mut grid: Vec<Vec<(f32, f32)>> = vec![vec![]; grid_width * grid_height];
        let mut keypoints = vec![];
        for (x, y, value) in candidates {
            if keypoints.len() >= max_corners {
                break;
            }
            let (fx, fy) = (x as f32, y as f32);
            let (gx, gy) = ((fx / cell) as usize, (fy / cell) as usize);
            let crowded = (gy.saturating_sub(1)..(gy + 2).min(grid_height))
                .flat_map(|ny| (gx.saturating_sub(1)..(gx + 2).min(grid_width)).map(move |nx| (nx, ny)))
                .flat_map(|(nx, ny)| grid[ny * grid_width + nx].iter())
                .any(|&(ox, oy)| {
                    (ox - fx).powi(2) + (oy - fy).powi(2) < self.min_distance.powi(2)
                });
            if crowded {
                continue;
            }
            grid[gy * grid_width + gx].push((fx, fy));
            keypoints.push(KeyPoint::new(fx, fy, self.block_size as f32).with_response(value));
        }
        trace!("Shi-Tomasi kept {} corners", keypoints.len());
        keypoints
    }
}

/// Harris corners with non-maximum suppression on the normalized response.
#[derive(Debug, Clone, Copy)]
pub struct HarrisDetector {
    pub block_size: usize,
    /// The Harris free parameter.
    pub k: f32,
    /// The minimum response after normalizing the response to `[0, 255]`.
    pub min_response: f32,
    pub aperture_size: usize,
}

impl Default for HarrisDetector {
    fn default() -> Self {
        Self {
            block_size: 2,
            k: 0.04,
            min_response: 100.0,
            aperture_size: 3,
        }
    }
}

impl Detector for HarrisDetector {
    fn detect(&mut self, image: &GrayImage) -> Vec<KeyPoint> {
        if image.width() == 0 || image.height() == 0 {
            return vec![];
        }
        let tensor = StructureTensor::new(image, self.block_size);
        let raw = tensor.response(harris(self.k));
        let (low, high) = raw
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), &value| {
                (low.min(value), high.max(value))
            });
        if high <= 0.0 || high <= low {
            return vec![];
        }
        // Flat regions normalize to a positive value, only corners have a positive raw response.
        let normalized: Vec<f32> = raw
            .iter()
            .map(|&value| {
                if value > 0.0 {
                    (value - low) / (high - low) * 255.0
                } else {
                    0.0
                }
            })
            .collect();
        let size = (2 * self.aperture_size) as f32;
        grid_maxima(
            &normalized,
            tensor.width,
            tensor.height,
            self.aperture_size,
            self.min_response,
        )
        .into_iter()
        .map(|(x, y, value)| KeyPoint::new(x as f32, y as f32, size).with_response(value))
        .collect()
    }
}

/// FAST-9 corners with non-maximum suppression.
#[derive(Debug, Clone, Copy)]
pub struct FastDetector {
    pub threshold: u8,
}

impl Default for FastDetector {
    fn default() -> Self {
        Self { threshold: 30 }
    }
}

fn suppressed_fast_corners(image: &GrayImage, threshold: u8) -> Vec<Corner> {
    local_maxima(&corners_fast9(image, threshold), 1)
}

impl Detector for FastDetector {
    fn detect(&mut self, image: &GrayImage) -> Vec<KeyPoint> {
        suppressed_fast_corners(image, self.threshold)
            .into_iter()
            .map(|corner| {
                KeyPoint::new(corner.x as f32, corner.y as f32, 7.0).with_response(corner.score)
            })
            .collect()
    }
}

/// Oriented FAST: FAST corners ranked by their Harris response and oriented by
/// their intensity centroid.
#[derive(Debug, Clone, Copy)]
pub struct OrbDetector {
    pub max_features: usize,
    pub fast_threshold: u8,
    /// Corners closer than this to the image border are discarded.
    pub edge_threshold: u32,
    pub patch_size: u32,
}

impl Default for OrbDetector {
    fn default() -> Self {
        Self {
            max_features: 500,
            fast_threshold: 20,
            edge_threshold: 31,
            patch_size: 31,
        }
    }
}

impl Detector for OrbDetector {
    fn detect(&mut self, image: &GrayImage) -> Vec<KeyPoint> {
        let (width, height) = image.dimensions();
        let border = self.edge_threshold / 2;
        if width <= 2 * border || height <= 2 * border {
            return vec![];
        }
        let tensor = StructureTensor::new(image, 7);
        let mut keypoints: Vec<KeyPoint> = suppressed_fast_corners(image, self.fast_threshold)
            .into_iter()
            .filter(|c| c.x >= border && c.y >= border && c.x < width - border && c.y < height - border)
            .map(|c| {
                let response = tensor.at(c.x as usize, c.y as usize, harris(0.04));
                KeyPoint::new(c.x as f32, c.y as f32, self.patch_size as f32).with_response(response)
            })
            .collect();
        keypoints.sort_by_key(|keypoint| Reverse(FloatOrd(keypoint.response)));
        keypoints.truncate(self.max_features);
        let radius = (self.patch_size / 2) as i32;
        for keypoint in &mut keypoints {
            keypoint.angle = intensity_centroid_angle(image, keypoint.point, radius);
        }
        keypoints
    }
}

/// Converts an AKAZE keypoint, whose angle is in radians.
pub(crate) fn from_akaze(keypoint: akaze::KeyPoint) -> KeyPoint {
    KeyPoint {
        point: keypoint.point,
        size: keypoint.size,
        angle: keypoint.angle.to_degrees().rem_euclid(360.0),
        response: keypoint.response,
        octave: keypoint.octave,
    }
}

/// Keypoints from the AKAZE nonlinear scale space.
#[derive(Debug, Clone, Copy, Default)]
pub struct AkazeDetector {
    pub akaze: Akaze,
}

impl Detector for AkazeDetector {
    fn detect(&mut self, image: &GrayImage) -> Vec<KeyPoint> {
        let (keypoints, descriptors) = self.akaze.extract(&DynamicImage::ImageLuma8(image.clone()));
        // Only keypoints that AKAZE can describe are reported.
        keypoints
            .into_iter()
            .zip(&descriptors)
            .map(|(keypoint, _)| from_akaze(keypoint))
            .collect()
    }
}
