use crate::DegenerateStateError;
use log::*;
use track_core::KeyPoint;

/// Size statistics of a non-empty keypoint set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeStatistics {
    pub count: usize,
    pub mean: f64,
    /// Population variance (divided by `count`, not `count - 1`)
    pub variance: f64,
}

/// Computes the mean keypoint size and its population variance.
///
/// An empty set has neither and produces a [`DegenerateStateError`].
pub fn size_statistics(keypoints: &[KeyPoint]) -> Result<SizeStatistics, DegenerateStateError> {
    if keypoints.is_empty() {
        return Err(DegenerateStateError {
            metric: "mean keypoint size",
        });
    }
    let count = keypoints.len();
    let mean = keypoints.iter().map(|kp| kp.size as f64).sum::<f64>() / count as f64;
    let variance = keypoints
        .iter()
        .map(|kp| (kp.size as f64 - mean).powi(2))
        .sum::<f64>()
        / count as f64;
    Ok(SizeStatistics {
        count,
        mean,
        variance,
    })
}

/// The arithmetic mean of `values`, or `None` for an empty sequence.
pub fn average(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count != 0).then(|| sum / count as f64)
}

/// Everything measured during one run of a strategy over a frame range.
///
/// Each sequence holds one value per frame that reached the corresponding stage,
/// in frame order. Frames whose filtered keypoint set is empty have no size
/// statistics and record `None` instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub keypoint_counts: Vec<usize>,
    pub detect_times: Vec<f64>,
    pub filtered_counts: Vec<usize>,
    pub mean_sizes: Vec<Option<f64>>,
    pub size_variances: Vec<Option<f64>>,
    pub describe_times: Vec<f64>,
    pub match_counts: Vec<usize>,
    pub match_times: Vec<f64>,
    /// Frames that went through every stage
    pub frames_processed: usize,
    /// Frames that were not matched because no previous frame existed
    pub skipped_matches: usize,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_detection(&mut self, count: usize, millis: f64) {
        self.keypoint_counts.push(count);
        self.detect_times.push(millis);
    }

    /// Records the filtered keypoint count and size statistics of a frame.
    ///
    /// Returns the error for an empty set after recording the missing values,
    /// so the caller can decide how to report it.
    pub fn record_filtering(
        &mut self,
        keypoints: &[KeyPoint],
    ) -> Result<SizeStatistics, DegenerateStateError> {
        self.filtered_counts.push(keypoints.len());
        let sizes = size_statistics(keypoints);
        self.mean_sizes.push(sizes.as_ref().ok().map(|s| s.mean));
        self.size_variances.push(sizes.as_ref().ok().map(|s| s.variance));
        sizes
    }

    pub fn record_description(&mut self, millis: f64) {
        self.describe_times.push(millis);
    }

    pub fn record_matching(&mut self, count: usize, millis: f64) {
        self.match_counts.push(count);
        self.match_times.push(millis);
    }

    pub fn record_skipped_match(&mut self) {
        self.skipped_matches += 1;
    }

    pub fn finish_frame(&mut self) {
        self.frames_processed += 1;
    }

    pub fn matched_frames(&self) -> usize {
        self.match_counts.len()
    }

    /// The per-frame rows of the detector breakdown, in report order.
    pub fn per_frame_rows(&self) -> Vec<MetricRow> {
        let counts = |values: &[usize]| -> Vec<Option<f64>> {
            values.iter().map(|&v| Some(v as f64)).collect()
        };
        let times = |values: &[f64]| -> Vec<Option<f64>> { values.iter().copied().map(Some).collect() };
        vec![
            self.frame_row(Metric::KeypointCount, counts(&self.keypoint_counts)),
            self.frame_row(Metric::DetectTime, times(&self.detect_times)),
            self.frame_row(Metric::FilteredCount, counts(&self.filtered_counts)),
            self.frame_row(Metric::MeanSize, self.mean_sizes.clone()),
            self.frame_row(Metric::SizeVariance, self.size_variances.clone()),
        ]
    }

    /// Builds a per-frame row whose aggregate is the sum over the frames that
    /// contributed a value, divided by the number of those frames.
    fn frame_row(&self, metric: Metric, values: Vec<Option<f64>>) -> MetricRow {
        let aggregate = average(values.iter().flatten().copied());
        if aggregate.is_none() && !values.is_empty() {
            warn!(
                "no frame out of {} has a defined {}, aggregate is unavailable",
                values.len(),
                metric
            );
        }
        MetricRow {
            metric,
            values,
            aggregate,
        }
    }

    /// Scalar averages across the run.
    pub fn summary(&self) -> Summary {
        let detect = average(self.detect_times.iter().copied());
        let describe = average(self.describe_times.iter().copied());
        let matching = average(self.match_times.iter().copied());
        let total = match (detect, describe, matching) {
            (Some(detect), Some(describe), Some(matching)) => Some(detect + describe + matching),
            _ => None,
        };
        Summary {
            matches: average(self.match_counts.iter().map(|&count| count as f64)),
            detect_time: detect,
            describe_time: describe,
            match_time: matching,
            total_time: total,
        }
    }
}

/// A measured quantity of the per-frame report.
#[derive(Debug, derive_more::Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    #[display(fmt = "# keypoints")]
    KeypointCount,
    #[display(fmt = "Time [ms]")]
    DetectTime,
    #[display(fmt = "# selected keypoints")]
    FilteredCount,
    #[display(fmt = "avg. keypoint size")]
    MeanSize,
    #[display(fmt = "keypoint size variance")]
    SizeVariance,
}

/// One metric over every frame of a run, plus its aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub metric: Metric,
    pub values: Vec<Option<f64>>,
    pub aggregate: Option<f64>,
}

/// The averages reported for a (detector, descriptor) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub matches: Option<f64>,
    pub detect_time: Option<f64>,
    pub describe_time: Option<f64>,
    pub match_time: Option<f64>,
    pub total_time: Option<f64>,
}
