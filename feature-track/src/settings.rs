use crate::{ConfigError, MatchSettings, Rect, ReportOptions, RoiFilter};
use std::ops::RangeInclusive;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings for a tracking run.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackerSettings {
    /// The number of frames held in memory at the same time
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_buffer_capacity")
    )]
    pub buffer_capacity: usize,
    /// The first frame index to load
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub first_frame: usize,
    /// The last frame index to load (inclusive)
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_last_frame"))]
    pub last_frame: usize,
    /// Only keep keypoints inside of `roi`
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_roi_enabled"))]
    pub roi_enabled: bool,
    /// The region of interest
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub roi: Rect,
    /// Keep at most this many keypoints (the strongest ones) per frame
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub keypoint_limit: Option<usize>,
    /// How descriptors are matched
    #[cfg_attr(feature = "serde-serialize", serde(default, rename = "match"))]
    pub matching: MatchSettings,
    /// Print the per-frame breakdown for the detector at the end of a run
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_print"))]
    pub print_per_frame_report: bool,
    /// Print the (detector, descriptor) summary line at the end of a run
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_print"))]
    pub print_summary_report: bool,
    /// Show keypoint and match overlays and wait for acknowledgement after each frame
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub visualize: bool,
}

impl TrackerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.first_frame > self.last_frame {
            return Err(ConfigError::EmptyFrameRange {
                first: self.first_frame,
                last: self.last_frame,
            });
        }
        if self.roi_enabled {
            self.roi.validate()?;
        }
        self.matching.validate()
    }

    pub fn frame_range(&self) -> RangeInclusive<usize> {
        self.first_frame..=self.last_frame
    }

    pub fn roi_filter(&self) -> RoiFilter {
        RoiFilter {
            enabled: self.roi_enabled,
            rect: self.roi,
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            per_frame: self.print_per_frame_report,
            summary: self.print_summary_report,
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            first_frame: 0,
            last_frame: default_last_frame(),
            roi_enabled: default_roi_enabled(),
            roi: Rect::default(),
            keypoint_limit: None,
            matching: MatchSettings::default(),
            print_per_frame_report: default_print(),
            print_summary_report: default_print(),
            visualize: false,
        }
    }
}

fn default_buffer_capacity() -> usize {
    2
}

fn default_last_frame() -> usize {
    9
}

fn default_roi_enabled() -> bool {
    true
}

fn default_print() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = TrackerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.frame_range().count(), 10);
        assert_eq!(settings.buffer_capacity, 2);
    }

    #[test]
    fn rejects_bad_values() {
        let settings = TrackerSettings {
            first_frame: 4,
            last_frame: 3,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::EmptyFrameRange { first: 4, last: 3 })
        );
        let settings = TrackerSettings {
            buffer_capacity: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::ZeroCapacity));
        let settings = TrackerSettings {
            roi: Rect::new(0.0, 0.0, -1.0, 5.0),
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::InvalidRoi));
        let settings = TrackerSettings {
            roi_enabled: false,
            ..settings
        };
        assert!(settings.validate().is_ok());
    }

    #[cfg(feature = "serde-serialize")]
    #[test]
    fn missing_fields_use_defaults() {
        let settings: TrackerSettings = serde_json::from_str(
            r#"{ "buffer_capacity": 3, "match": { "selection": "nearest-neighbor" } }"#,
        )
        .unwrap();
        assert_eq!(settings.buffer_capacity, 3);
        assert_eq!(settings.last_frame, 9);
        assert!(settings.roi_enabled);
        assert_eq!(settings.roi, Rect::default());
        assert_eq!(settings.matching.ratio, 0.8);
        assert_eq!(
            settings.matching.selection,
            crate::SelectionKind::NearestNeighbor
        );
    }
}
