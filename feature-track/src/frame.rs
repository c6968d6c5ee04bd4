use derive_more::Display;
use image::GrayImage;
use track_core::{Descriptors, FeatureMatch, KeyPoint};

/// The processing state of a frame, in the order the states are reached.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameState {
    #[display(fmt = "loaded")]
    Loaded,
    #[display(fmt = "detected")]
    Detected,
    #[display(fmt = "filtered")]
    Filtered,
    #[display(fmt = "described")]
    Described,
    /// Matched against the previous frame.
    #[display(fmt = "matched")]
    Matched,
    /// There was no previous frame to match against.
    #[display(fmt = "skipped match")]
    SkippedMatch,
}

impl FrameState {
    /// Whether the frame has finished all processing.
    pub fn is_terminal(self) -> bool {
        matches!(self, FrameState::Matched | FrameState::SkippedMatch)
    }
}

/// The stages that call out to a strategy provider.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    #[display(fmt = "detection")]
    Detection,
    #[display(fmt = "description")]
    Description,
    #[display(fmt = "matching")]
    Matching,
}

/// Everything known about one frame of the input stream.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// The index of the frame in the input stream
    pub index: usize,
    /// The grayscale image
    pub image: GrayImage,
    /// Keypoints in detection order, restricted by the filter stage once it ran
    pub keypoints: Vec<KeyPoint>,
    /// One row per keypoint, available once the frame is described
    pub descriptors: Option<Descriptors>,
    /// Matches against the previous frame, available once the frame is matched
    pub matches: Vec<FeatureMatch>,
    pub(crate) state: FrameState,
}

impl FrameRecord {
    pub fn new(index: usize, image: GrayImage) -> Self {
        Self {
            index,
            image,
            keypoints: vec![],
            descriptors: None,
            matches: vec![],
            state: FrameState::Loaded,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub(crate) fn advance(&mut self, state: FrameState) {
        debug_assert!(
            state > self.state && !self.state.is_terminal(),
            "frame {} cannot go from {} to {}",
            self.index,
            self.state,
            state
        );
        self.state = state;
    }
}
