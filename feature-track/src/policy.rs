use crate::{ConfigError, DescriptorType};
use derive_more::Display;
use std::str::FromStr;
use track_core::DescriptorFamily;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The distance metric a matcher must use to compare two descriptors.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceNorm {
    /// Euclidean distance for floating point descriptors
    #[display(fmt = "L2")]
    L2,
    /// Bit difference count for binary descriptors
    #[display(fmt = "Hamming")]
    Hamming,
}

impl DistanceNorm {
    /// The norm that is meaningful for a given descriptor family.
    pub fn for_family(family: DescriptorFamily) -> Self {
        match family {
            DescriptorFamily::Float => DistanceNorm::L2,
            DescriptorFamily::Binary => DistanceNorm::Hamming,
        }
    }

    pub fn family(self) -> DescriptorFamily {
        match self {
            DistanceNorm::L2 => DescriptorFamily::Float,
            DistanceNorm::Hamming => DescriptorFamily::Binary,
        }
    }
}

/// How candidate matches are searched.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatcherBackend {
    /// Compare every descriptor of one frame against every descriptor of the other.
    #[default]
    #[display(fmt = "brute-force")]
    BruteForce,
}

/// How a match is chosen among the candidates of a descriptor.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Always accept the closest candidate.
    #[display(fmt = "nearest-neighbor")]
    NearestNeighbor,
    /// Find the two closest candidates and only accept the best one if its
    /// distance is below `ratio` times the distance of the second best one
    /// (Lowe's ratio test).
    #[display(fmt = "knn-ratio({})", ratio)]
    KnnRatio { ratio: f32 },
}

/// The kind of [`Selection`] named in configuration, without its parameters.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "kebab-case"))]
pub enum SelectionKind {
    #[display(fmt = "nearest-neighbor")]
    NearestNeighbor,
    #[default]
    #[display(fmt = "knn-ratio")]
    KnnRatio,
}

impl FromStr for SelectionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest-neighbor" | "nn" | "sel_nn" => Ok(SelectionKind::NearestNeighbor),
            "knn-ratio" | "knn" | "sel_knn" => Ok(SelectionKind::KnnRatio),
            _ => Err(ConfigError::UnknownSelection(s.to_owned())),
        }
    }
}

/// The matching parameters that come from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct MatchSettings {
    /// Which selection strategy to use
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub selection: SelectionKind,
    /// The distance ratio used by the k-nearest-neighbor ratio test
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_ratio"))]
    pub ratio: f32,
}

impl MatchSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ratio > 0.0 && self.ratio <= 1.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidRatio(self.ratio))
        }
    }
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            selection: SelectionKind::default(),
            ratio: default_ratio(),
        }
    }
}

fn default_ratio() -> f32 {
    0.8
}

/// A complete, compatible matcher configuration for one descriptor strategy.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
#[display(fmt = "{} {} {}", backend, norm, selection)]
pub struct MatchPolicy {
    pub norm: DistanceNorm,
    pub backend: MatcherBackend,
    pub selection: Selection,
}

impl MatchPolicy {
    /// Selects the matcher configuration for a descriptor strategy.
    ///
    /// This is a pure function of its inputs. Only SIFT produces floating point
    /// descriptors; every other supported descriptor is binary.
    pub fn for_descriptor(descriptor: DescriptorType, settings: &MatchSettings) -> Self {
        let selection = match settings.selection {
            SelectionKind::NearestNeighbor => Selection::NearestNeighbor,
            SelectionKind::KnnRatio => Selection::KnnRatio {
                ratio: settings.ratio,
            },
        };
        Self {
            norm: DistanceNorm::for_family(descriptor_family(descriptor)),
            backend: MatcherBackend::BruteForce,
            selection,
        }
    }

    /// Like [`MatchPolicy::for_descriptor`], but fails fast on an unrecognized name.
    pub fn for_descriptor_name(name: &str, settings: &MatchSettings) -> Result<Self, ConfigError> {
        Ok(Self::for_descriptor(name.parse()?, settings))
    }
}

/// The numeric family produced by a descriptor strategy.
pub fn descriptor_family(descriptor: DescriptorType) -> DescriptorFamily {
    match descriptor {
        DescriptorType::Sift => DescriptorFamily::Float,
        DescriptorType::Brisk
        | DescriptorType::Orb
        | DescriptorType::Brief
        | DescriptorType::Freak
        | DescriptorType::Akaze => DescriptorFamily::Binary,
    }
}
