use crate::{DescriptorType, DetectorType, Stage};
use thiserror::Error;

/// A boxed error raised by an external collaborator (frame source or strategy provider).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A problem with the requested configuration.
///
/// These are always raised before the first frame of a run is loaded.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unrecognized detector type `{0}`")]
    UnknownDetector(String),
    #[error("unrecognized descriptor type `{0}`")]
    UnknownDescriptor(String),
    #[error("unrecognized match selection `{0}`")]
    UnknownSelection(String),
    #[error("detector {detector} cannot be paired with descriptor {descriptor}")]
    IncompatibleStrategy {
        detector: DetectorType,
        descriptor: DescriptorType,
    },
    #[error("frame buffer capacity must be at least 1")]
    ZeroCapacity,
    #[error("frame range {first}..={last} is empty")]
    EmptyFrameRange { first: usize, last: usize },
    #[error("distance ratio {0} is outside of (0, 1]")]
    InvalidRatio(f32),
    #[error("region of interest must have a positive width and height")]
    InvalidRoi,
    #[error("no provider is available for {0}")]
    ProviderUnavailable(String),
}

/// A keypoint size statistic was requested over an empty keypoint set.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot compute the {metric} of an empty keypoint set")]
pub struct DegenerateStateError {
    pub metric: &'static str,
}

/// A fatal failure of a tracking run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to load frame {index}: {source}")]
    Input {
        index: usize,
        #[source]
        source: BoxError,
    },
    #[error("{stage} provider failed on frame {index}: {source}")]
    Provider {
        stage: Stage,
        index: usize,
        #[source]
        source: BoxError,
    },
    #[error("cannot process frame {index}, tracking already failed on frame {failed}")]
    Aborted { failed: usize, index: usize },
    #[error("frame {index} has {keypoints} keypoints but {rows} descriptor rows")]
    DescriptorMismatch {
        index: usize,
        keypoints: usize,
        rows: usize,
    },
}
