use crate::describers::{AkazeDescriber, BriefDescriber, OrbDescriber};
use crate::detectors::{AkazeDetector, FastDetector, HarrisDetector, OrbDetector, ShiTomasiDetector};
use akaze::Akaze;
use feature_track::{ConfigError, DescriptorType, Describer, Detector, DetectorType, ProviderFactory};

/// The detectors and describers available in this crate.
///
/// BRISK, FREAK and SIFT have no implementation here and are reported as
/// unavailable, which fails their runs before any frame is loaded.
#[derive(Debug, Clone, Copy)]
pub struct DefaultProviders {
    /// The AKAZE configuration shared by the AKAZE detector and describer.
    pub akaze: Akaze,
}

impl DefaultProviders {
    pub fn new() -> Self {
        Self {
            akaze: Akaze::default(),
        }
    }

    pub fn with_akaze_threshold(threshold: f64) -> Self {
        Self {
            akaze: Akaze::new(threshold),
        }
    }
}

impl Default for DefaultProviders {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for DefaultProviders {
    fn detector(&mut self, detector: DetectorType) -> Result<Box<dyn Detector>, ConfigError> {
        Ok(match detector {
            DetectorType::ShiTomasi => Box::new(ShiTomasiDetector::default()),
            DetectorType::Harris => Box::new(HarrisDetector::default()),
            DetectorType::Fast => Box::new(FastDetector::default()),
            DetectorType::Orb => Box::new(OrbDetector::default()),
            DetectorType::Akaze => Box::new(AkazeDetector { akaze: self.akaze }),
            DetectorType::Brisk | DetectorType::Sift => {
                return Err(ConfigError::ProviderUnavailable(format!(
                    "the {} detector",
                    detector
                )))
            }
        })
    }

    fn describer(
        &mut self,
        descriptor: DescriptorType,
    ) -> Result<Box<dyn Describer>, ConfigError> {
        Ok(match descriptor {
            DescriptorType::Brief => Box::new(BriefDescriber::default()),
            DescriptorType::Orb => Box::new(OrbDescriber::default()),
            DescriptorType::Akaze => Box::new(AkazeDescriber { akaze: self.akaze }),
            DescriptorType::Brisk | DescriptorType::Freak | DescriptorType::Sift => {
                return Err(ConfigError::ProviderUnavailable(format!(
                    "the {} descriptor",
                    descriptor
                )))
            }
        })
    }
}
