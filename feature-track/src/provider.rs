//! The narrow interfaces through which the pipeline reaches its external collaborators.
//!
//! None of these ever call back into the pipeline.

use crate::{BoxError, BruteForceMatcher, ConfigError, DescriptorType, DetectorType, MatchPolicy};
use crate::{FrameRecord, MatcherBackend};
use image::GrayImage;
use track_core::{Descriptors, FeatureMatch, KeyPoint};

/// Produces the decoded grayscale image for a frame index.
pub trait FrameSource {
    /// A missing or undecodable frame is an error; there is no way to skip a frame.
    fn load(&mut self, index: usize) -> Result<GrayImage, BoxError>;
}

/// Finds keypoints on an image.
pub trait Detector {
    fn detect(&mut self, image: &GrayImage) -> Vec<KeyPoint>;
}

/// Computes descriptors for keypoints.
pub trait Describer {
    /// Must return exactly one row per keypoint, in the order of `keypoints`.
    fn describe(&mut self, image: &GrayImage, keypoints: &[KeyPoint])
        -> Result<Descriptors, BoxError>;
}

/// Finds correspondences between the descriptors of two frames.
pub trait Matcher {
    /// `previous` are the query descriptors and `current` the train descriptors, so
    /// [`FeatureMatch::previous`] indexes rows of `previous`.
    fn match_descriptors(
        &mut self,
        previous: &Descriptors,
        current: &Descriptors,
        policy: &MatchPolicy,
    ) -> Result<Vec<FeatureMatch>, BoxError>;
}

impl<T: Detector + ?Sized> Detector for Box<T> {
    fn detect(&mut self, image: &GrayImage) -> Vec<KeyPoint> {
        (**self).detect(image)
    }
}

impl<T: Describer + ?Sized> Describer for Box<T> {
    fn describe(
        &mut self,
        image: &GrayImage,
        keypoints: &[KeyPoint],
    ) -> Result<Descriptors, BoxError> {
        (**self).describe(image, keypoints)
    }
}

impl<T: Matcher + ?Sized> Matcher for Box<T> {
    fn match_descriptors(
        &mut self,
        previous: &Descriptors,
        current: &Descriptors,
        policy: &MatchPolicy,
    ) -> Result<Vec<FeatureMatch>, BoxError> {
        (**self).match_descriptors(previous, current, policy)
    }
}

/// Builds providers for strategies.
///
/// Asking for a strategy that has no implementation is a configuration error,
/// which is reported before a run loads its first frame.
pub trait ProviderFactory {
    fn detector(&mut self, detector: DetectorType) -> Result<Box<dyn Detector>, ConfigError>;

    fn describer(&mut self, descriptor: DescriptorType)
        -> Result<Box<dyn Describer>, ConfigError>;

    fn matcher(&mut self, backend: MatcherBackend) -> Result<Box<dyn Matcher>, ConfigError> {
        match backend {
            MatcherBackend::BruteForce => Ok(Box::new(BruteForceMatcher)),
        }
    }
}

/// A stage completion that an [`Observer`] is told about.
#[derive(Debug, Clone, Copy)]
pub enum StageEvent<'a> {
    Detected(&'a FrameRecord),
    Filtered(&'a FrameRecord),
    Described(&'a FrameRecord),
    Matched {
        previous: &'a FrameRecord,
        current: &'a FrameRecord,
    },
}

/// Side effect only hook called after every stage (e.g. for visualization).
///
/// Observers only ever see shared references and cannot alter the results of a run.
pub trait Observer {
    fn observe(&mut self, event: StageEvent<'_>);
}

/// An observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl Observer for NoObserver {
    fn observe(&mut self, _: StageEvent<'_>) {}
}
