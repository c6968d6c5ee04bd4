use crate::ConfigError;
use derive_more::Display;
use std::str::FromStr;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The keypoint detection strategies known to the pipeline.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "UPPERCASE"))]
pub enum DetectorType {
    #[display(fmt = "SHITOMASI")]
    ShiTomasi,
    #[display(fmt = "HARRIS")]
    Harris,
    #[display(fmt = "FAST")]
    Fast,
    #[display(fmt = "BRISK")]
    Brisk,
    #[display(fmt = "ORB")]
    Orb,
    #[display(fmt = "AKAZE")]
    Akaze,
    #[display(fmt = "SIFT")]
    Sift,
}

impl DetectorType {
    pub const ALL: [DetectorType; 7] = [
        DetectorType::ShiTomasi,
        DetectorType::Harris,
        DetectorType::Fast,
        DetectorType::Brisk,
        DetectorType::Orb,
        DetectorType::Akaze,
        DetectorType::Sift,
    ];

    /// Detectors that work with any general purpose descriptor, in evaluation order.
    pub const GENERAL_PURPOSE: [DetectorType; 5] = [
        DetectorType::ShiTomasi,
        DetectorType::Harris,
        DetectorType::Fast,
        DetectorType::Brisk,
        DetectorType::Orb,
    ];

    /// The descriptor this detector is exclusively bound to, if any.
    pub fn single_purpose_descriptor(self) -> Option<DescriptorType> {
        match self {
            DetectorType::Akaze => Some(DescriptorType::Akaze),
            DetectorType::Sift => Some(DescriptorType::Sift),
            _ => None,
        }
    }
}

impl FromStr for DetectorType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|detector| detector.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownDetector(s.to_owned()))
    }
}

/// The descriptor extraction strategies known to the pipeline.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "UPPERCASE"))]
pub enum DescriptorType {
    #[display(fmt = "BRISK")]
    Brisk,
    #[display(fmt = "ORB")]
    Orb,
    #[display(fmt = "BRIEF")]
    Brief,
    #[display(fmt = "FREAK")]
    Freak,
    #[display(fmt = "AKAZE")]
    Akaze,
    #[display(fmt = "SIFT")]
    Sift,
}

impl DescriptorType {
    pub const ALL: [DescriptorType; 6] = [
        DescriptorType::Brisk,
        DescriptorType::Orb,
        DescriptorType::Brief,
        DescriptorType::Freak,
        DescriptorType::Akaze,
        DescriptorType::Sift,
    ];

    /// Descriptors that work with any general purpose detector, in evaluation order.
    pub const GENERAL_PURPOSE: [DescriptorType; 4] = [
        DescriptorType::Brisk,
        DescriptorType::Orb,
        DescriptorType::Brief,
        DescriptorType::Freak,
    ];

    /// The detector this descriptor is exclusively bound to, if any.
    pub fn single_purpose_detector(self) -> Option<DetectorType> {
        match self {
            DescriptorType::Akaze => Some(DetectorType::Akaze),
            DescriptorType::Sift => Some(DetectorType::Sift),
            _ => None,
        }
    }
}

impl FromStr for DescriptorType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|descriptor| descriptor.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownDescriptor(s.to_owned()))
    }
}

/// A validated (detector, descriptor) pairing.
///
/// Single purpose strategies (AKAZE, SIFT) only work when the detector and the
/// descriptor are the same algorithm, so they may only be paired with each other.
/// The fields are private so that every `Strategy` in existence has passed
/// [`Strategy::new`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display(fmt = "{} + {}", detector, descriptor)]
pub struct Strategy {
    detector: DetectorType,
    descriptor: DescriptorType,
}

impl Strategy {
    pub fn new(detector: DetectorType, descriptor: DescriptorType) -> Result<Self, ConfigError> {
        let compatible = match (
            detector.single_purpose_descriptor(),
            descriptor.single_purpose_detector(),
        ) {
            (None, None) => true,
            (Some(bound), _) => bound == descriptor,
            (None, Some(_)) => false,
        };
        if compatible {
            Ok(Self {
                detector,
                descriptor,
            })
        } else {
            Err(ConfigError::IncompatibleStrategy {
                detector,
                descriptor,
            })
        }
    }

    /// Parses and validates a pairing from strategy names, e.g. `("FAST", "BRIEF")`.
    pub fn from_names(detector: &str, descriptor: &str) -> Result<Self, ConfigError> {
        Self::new(detector.parse()?, descriptor.parse()?)
    }

    pub fn detector(&self) -> DetectorType {
        self.detector
    }

    pub fn descriptor(&self) -> DescriptorType {
        self.descriptor
    }
}

/// The fixed sequence of runs used to compare strategies.
///
/// The two single purpose pairs come first (SIFT, then AKAZE), followed by the full
/// cross product of general purpose detectors and descriptors in detector-major order.
pub fn evaluation_plan() -> Vec<Strategy> {
    let single_purpose = [
        (DetectorType::Sift, DescriptorType::Sift),
        (DetectorType::Akaze, DescriptorType::Akaze),
    ];
    let cross_product = DetectorType::GENERAL_PURPOSE.into_iter().flat_map(|detector| {
        DescriptorType::GENERAL_PURPOSE
            .into_iter()
            .map(move |descriptor| (detector, descriptor))
    });
    single_purpose
        .into_iter()
        .chain(cross_product)
        .map(|(detector, descriptor)| Strategy {
            detector,
            descriptor,
        })
        .collect()
}
