//! # Track Core
//!
//! Common types for sparse feature tracking. Everything that flows between the
//! tracking pipeline and the strategy providers that plug into it lives here:
//! keypoints, keypoint matches between two frames, and row-aligned descriptor
//! matrices.
//!
//! The crate is kept deliberately small. Providers (detectors, describers,
//! matchers) and the pipeline orchestrator depend on it so that they can be
//! swapped independently.
//!
//! ## Descriptors
//!
//! A descriptor set is a matrix with one row per keypoint. Row `i` always
//! describes keypoint `i` of the frame it was computed on. Descriptors come in
//! two numeric families:
//!
//! * [`DescriptorFamily::Binary`] - bit strings compared with the Hamming distance
//! * [`DescriptorFamily::Float`] - gradient histograms compared with the L2 distance
//!
//! ```
//! use track_core::{Descriptors, DescriptorFamily};
//! use track_core::ndarray::Array2;
//!
//! let descriptors = Descriptors::Binary(Array2::zeros((3, 32)));
//! assert_eq!(descriptors.len(), 3);
//! assert_eq!(descriptors.family(), DescriptorFamily::Binary);
//! ```

mod descriptors;
mod keypoint;
mod matches;

pub use descriptors::*;
pub use keypoint::*;
pub use matches::*;
pub use ndarray;
