use derive_more::Display;
use ndarray::{Array2, ArrayView1};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The numeric nature of a descriptor, which decides the distance metric
/// that can be used to compare two descriptors.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum DescriptorFamily {
    /// Packed bit strings (BRIEF, ORB, BRISK, FREAK, AKAZE)
    #[display(fmt = "binary")]
    Binary,
    /// Floating point vectors (SIFT)
    #[display(fmt = "float")]
    Float,
}

/// A row-per-keypoint descriptor matrix.
///
/// Row `i` describes keypoint `i` of the frame the descriptors were computed on.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptors {
    /// Each row holds the packed bytes of one binary descriptor.
    Binary(Array2<u8>),
    /// Each row holds one floating point descriptor vector.
    Float(Array2<f32>),
}

impl Descriptors {
    /// The number of rows, which is the number of described keypoints.
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary(rows) => rows.nrows(),
            Descriptors::Float(rows) => rows.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The length of a single descriptor, in bytes for binary descriptors
    /// and in elements for float descriptors.
    pub fn width(&self) -> usize {
        match self {
            Descriptors::Binary(rows) => rows.ncols(),
            Descriptors::Float(rows) => rows.ncols(),
        }
    }

    pub fn family(&self) -> DescriptorFamily {
        match self {
            Descriptors::Binary(_) => DescriptorFamily::Binary,
            Descriptors::Float(_) => DescriptorFamily::Float,
        }
    }
}

/// Computes the number of differing bits between two packed binary descriptors.
pub fn hamming_distance(a: ArrayView1<u8>, b: ArrayView1<u8>) -> u32 {
    a.iter().zip(b.iter()).map(|(a, b)| (a ^ b).count_ones()).sum()
}

/// Computes the euclidean distance between two float descriptors.
pub fn l2_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn hamming_counts_differing_bits() {
        let a = array![0b1111_0000u8, 0xFF];
        let b = array![0b0000_0000u8, 0x7F];
        assert_eq!(hamming_distance(a.view(), b.view()), 5);
    }

    #[test]
    fn l2_matches_pythagoras() {
        let a = array![0.0f32, 0.0];
        let b = array![3.0f32, 4.0];
        assert!((l2_distance(a.view(), b.view()) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn rows_are_keypoints() {
        let float = Descriptors::Float(Array2::zeros((7, 128)));
        assert_eq!(float.len(), 7);
        assert_eq!(float.width(), 128);
        assert_eq!(float.family(), DescriptorFamily::Float);
        assert!(Descriptors::Binary(Array2::zeros((0, 32))).is_empty());
    }
}
