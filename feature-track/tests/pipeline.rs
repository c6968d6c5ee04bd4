use feature_track::track_core::ndarray::Array2;
use feature_track::track_core::{Descriptors, KeyPoint};
use feature_track::{
    evaluate, run, write_reports, BoxError, ConfigError, DescriptorType, Describer, Detector,
    DetectorType, Error, FrameSource, FrameState, Metric, NoObserver, Observer, ProviderFactory,
    Rect, ReportOptions, SelectionKind, StageEvent, Strategy, Tracker, TrackerSettings,
};
use image::GrayImage;
use std::cell::Cell;
use std::rc::Rc;

/// Detected and in-region keypoint counts of the ten scripted frames.
const FRAMES: [(usize, usize); 10] = [
    (120, 40),
    (115, 38),
    (130, 45),
    (125, 41),
    (118, 39),
    (131, 44),
    (122, 40),
    (127, 42),
    (129, 43),
    (117, 37),
];

/// Emits `FRAMES[k]` keypoints on the `k`-th call, `inside` of them in the default region.
///
/// With `empty_odd_frames` every odd call places all of its keypoints outside of the region.
struct ScriptedDetector {
    frame: usize,
    empty_odd_frames: bool,
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _: &GrayImage) -> Vec<KeyPoint> {
        let (total, mut inside) = FRAMES[self.frame % FRAMES.len()];
        if self.empty_odd_frames && self.frame % 2 == 1 {
            inside = 0;
        }
        self.frame += 1;
        let roi = Rect::default();
        (0..total)
            .map(|ix| {
                if ix < inside {
                    let x = roi.x + (ix % 20) as f32 * 5.0;
                    let y = roi.y + (ix / 20) as f32 * 5.0;
                    KeyPoint::new(x, y, 4.0 + (ix % 3) as f32).with_response(ix as f32)
                } else {
                    KeyPoint::new(5.0, ix as f32, 2.0)
                }
            })
            .collect()
    }
}

/// Encodes the keypoint position into a 4 byte binary descriptor.
struct PositionDescriber {
    drop_last_row: bool,
}

impl Describer for PositionDescriber {
    fn describe(&mut self, _: &GrayImage, keypoints: &[KeyPoint]) -> Result<Descriptors, BoxError> {
        let rows = keypoints.len() - usize::from(self.drop_last_row && !keypoints.is_empty());
        let mut descriptors = Array2::zeros((rows, 4));
        for (mut row, keypoint) in descriptors.rows_mut().into_iter().zip(keypoints) {
            let (x, y) = (keypoint.x() as u16, keypoint.y() as u16);
            let bytes = [x.to_le_bytes(), y.to_le_bytes()].concat();
            for (dst, src) in row.iter_mut().zip(bytes) {
                *dst = src;
            }
        }
        Ok(Descriptors::Binary(descriptors))
    }
}

#[derive(Default)]
struct ScriptedProviders {
    drop_last_row: bool,
    empty_odd_frames: bool,
}

impl ProviderFactory for ScriptedProviders {
    fn detector(&mut self, detector: DetectorType) -> Result<Box<dyn Detector>, ConfigError> {
        match detector {
            DetectorType::Sift => Err(ConfigError::ProviderUnavailable(detector.to_string())),
            _ => Ok(Box::new(ScriptedDetector {
                frame: 0,
                empty_odd_frames: self.empty_odd_frames,
            })),
        }
    }

    fn describer(&mut self, descriptor: DescriptorType) -> Result<Box<dyn Describer>, ConfigError> {
        match descriptor {
            DescriptorType::Sift => Err(ConfigError::ProviderUnavailable(descriptor.to_string())),
            _ => Ok(Box::new(PositionDescriber {
                drop_last_row: self.drop_last_row,
            })),
        }
    }
}

/// Serves blank images and counts how many were requested.
struct BlankFrames {
    loads: Rc<Cell<usize>>,
    missing: Option<usize>,
}

impl BlankFrames {
    fn new() -> Self {
        Self {
            loads: Rc::new(Cell::new(0)),
            missing: None,
        }
    }
}

impl FrameSource for BlankFrames {
    fn load(&mut self, index: usize) -> Result<GrayImage, BoxError> {
        if Some(index) == self.missing {
            return Err(format!("frame {} does not exist", index).into());
        }
        self.loads.set(self.loads.get() + 1);
        Ok(GrayImage::new(8, 8))
    }
}

#[derive(Default)]
struct Recorder {
    matched_pairs: Vec<(usize, usize)>,
    described: Vec<(usize, usize)>,
}

impl Observer for Recorder {
    fn observe(&mut self, event: StageEvent<'_>) {
        match event {
            StageEvent::Described(frame) => self.described.push((
                frame.keypoints.len(),
                frame.descriptors.as_ref().map_or(0, Descriptors::len),
            )),
            StageEvent::Matched { previous, current } => {
                self.matched_pairs.push((previous.index, current.index))
            }
            _ => {}
        }
    }
}

fn fast_brief() -> Strategy {
    Strategy::from_names("FAST", "BRIEF").unwrap()
}

#[test]
fn ten_frame_run() {
    let _ = pretty_env_logger::try_init_timed();
    let settings = TrackerSettings::default();
    let mut tracker = Tracker::new(fast_brief(), &settings, &mut ScriptedProviders::default()).unwrap();
    let mut recorder = Recorder::default();
    let states: Vec<FrameState> = settings
        .frame_range()
        .map(|index| {
            tracker
                .process_frame(index, GrayImage::new(8, 8), &mut recorder)
                .unwrap()
        })
        .collect();

    assert_eq!(states[0], FrameState::SkippedMatch);
    assert!(states[1..].iter().all(|&state| state == FrameState::Matched));
    assert_eq!(recorder.matched_pairs, (1..10).map(|k| (k - 1, k)).collect::<Vec<_>>());
    assert!(recorder.described.iter().all(|&(keypoints, rows)| keypoints == rows));

    let buffer = tracker.buffer();
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.second_latest().map(|frame| frame.index), Some(8));
    assert_eq!(buffer.latest().map(|frame| frame.index), Some(9));
    assert_eq!(buffer.latest().map(|frame| frame.state()), Some(FrameState::Matched));

    let stats = tracker.into_statistics();
    assert_eq!(stats.frames_processed, 10);
    assert_eq!(stats.matched_frames(), 9);
    assert_eq!(stats.skipped_matches, 1);
    assert_eq!(stats.keypoint_counts, FRAMES.iter().map(|f| f.0).collect::<Vec<_>>());
    assert_eq!(stats.filtered_counts, FRAMES.iter().map(|f| f.1).collect::<Vec<_>>());

    let rows = stats.per_frame_rows();
    let metrics: Vec<Metric> = rows.iter().map(|row| row.metric).collect();
    assert_eq!(
        metrics,
        vec![
            Metric::KeypointCount,
            Metric::DetectTime,
            Metric::FilteredCount,
            Metric::MeanSize,
            Metric::SizeVariance
        ]
    );
    assert!(rows.iter().all(|row| row.values.len() == 10 && row.aggregate.is_some()));
    let expected_average = FRAMES.iter().map(|f| f.0 as f64).sum::<f64>() / 10.0;
    assert!((rows[0].aggregate.unwrap() - expected_average).abs() < 1e-9);
}

#[test]
fn nearest_neighbor_matches_every_previous_keypoint() {
    let mut settings = TrackerSettings::default();
    settings.matching.selection = SelectionKind::NearestNeighbor;
    let stats = run(
        fast_brief(),
        &settings,
        &mut ScriptedProviders::default(),
        &mut BlankFrames::new(),
        &mut NoObserver,
    )
    .unwrap();
    let expected: Vec<usize> = FRAMES[..9].iter().map(|f| f.1).collect();
    assert_eq!(stats.match_counts, expected);
}

#[test]
fn exact_matches_pass_the_ratio_test() {
    let stats = run(
        fast_brief(),
        &TrackerSettings::default(),
        &mut ScriptedProviders::default(),
        &mut BlankFrames::new(),
        &mut NoObserver,
    )
    .unwrap();
    for (k, &count) in stats.match_counts.iter().enumerate() {
        let shared = FRAMES[k].1.min(FRAMES[k + 1].1);
        assert!(count >= shared, "frame {} has {} matches", k + 1, count);
    }
}

#[test]
fn roi_disabled_keeps_every_keypoint() {
    let settings = TrackerSettings {
        roi_enabled: false,
        keypoint_limit: Some(100),
        ..Default::default()
    };
    let stats = run(
        fast_brief(),
        &settings,
        &mut ScriptedProviders::default(),
        &mut BlankFrames::new(),
        &mut NoObserver,
    )
    .unwrap();
    assert!(stats.filtered_counts.iter().all(|&count| count == 100));
}

#[test]
fn incompatible_strategy_is_rejected_before_loading() {
    assert_eq!(
        Strategy::from_names("SIFT", "BRISK"),
        Err(ConfigError::IncompatibleStrategy {
            detector: DetectorType::Sift,
            descriptor: DescriptorType::Brisk,
        })
    );
}

#[test]
fn unavailable_provider_is_a_configuration_error() {
    let mut source = BlankFrames::new();
    let loads = source.loads.clone();
    let result = run(
        Strategy::from_names("SIFT", "SIFT").unwrap(),
        &TrackerSettings::default(),
        &mut ScriptedProviders::default(),
        &mut source,
        &mut NoObserver,
    );
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ProviderUnavailable(_)))
    ));
    assert_eq!(loads.get(), 0);
}

#[test]
fn invalid_settings_are_rejected_before_loading() {
    let mut source = BlankFrames::new();
    let loads = source.loads.clone();
    let settings = TrackerSettings {
        buffer_capacity: 0,
        ..Default::default()
    };
    let result = run(
        fast_brief(),
        &settings,
        &mut ScriptedProviders::default(),
        &mut source,
        &mut NoObserver,
    );
    assert!(matches!(result, Err(Error::Config(ConfigError::ZeroCapacity))));
    assert_eq!(loads.get(), 0);
}

#[test]
fn missing_frame_aborts_the_run() {
    let mut source = BlankFrames {
        missing: Some(3),
        ..BlankFrames::new()
    };
    let result = run(
        fast_brief(),
        &TrackerSettings::default(),
        &mut ScriptedProviders::default(),
        &mut source,
        &mut NoObserver,
    );
    assert!(matches!(result, Err(Error::Input { index: 3, .. })));
    assert_eq!(source.loads.get(), 3);
}

#[test]
fn misaligned_descriptors_stop_the_tracker() {
    let mut providers = ScriptedProviders {
        drop_last_row: true,
        ..Default::default()
    };
    let mut tracker = Tracker::new(fast_brief(), &TrackerSettings::default(), &mut providers).unwrap();
    let result = tracker.process_frame(0, GrayImage::new(8, 8), &mut NoObserver);
    assert!(matches!(
        result,
        Err(Error::DescriptorMismatch {
            index: 0,
            keypoints: 40,
            rows: 39
        })
    ));
    let result = tracker.process_frame(1, GrayImage::new(8, 8), &mut NoObserver);
    assert!(matches!(result, Err(Error::Aborted { failed: 0, index: 1 })));
}

#[test]
fn evaluation_continues_after_a_failed_run() {
    let plan = [
        Strategy::from_names("SIFT", "SIFT").unwrap(),
        Strategy::from_names("ORB", "BRIEF").unwrap(),
    ];
    let settings = TrackerSettings {
        last_frame: 2,
        print_per_frame_report: false,
        ..Default::default()
    };
    let mut out = vec![];
    let outcomes = evaluate(
        &plan,
        &settings,
        &mut ScriptedProviders::default(),
        &mut BlankFrames::new(),
        &mut NoObserver,
        &mut out,
    )
    .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].result.is_err());
    assert_eq!(outcomes[1].result.as_ref().unwrap().frames_processed, 3);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("| ORB | BRIEF |"));
}

#[test]
fn single_frame_buffer_never_matches() {
    let settings = TrackerSettings {
        buffer_capacity: 1,
        ..Default::default()
    };
    let mut recorder = Recorder::default();
    let stats = run(
        fast_brief(),
        &settings,
        &mut ScriptedProviders::default(),
        &mut BlankFrames::new(),
        &mut recorder,
    )
    .unwrap();
    assert_eq!(stats.frames_processed, 10);
    assert_eq!(stats.matched_frames(), 0);
    assert_eq!(stats.skipped_matches, 10);
    assert!(stats.match_counts.is_empty());
    assert!(recorder.matched_pairs.is_empty());
}

#[test]
fn frames_emptied_by_the_region_are_reported_as_missing_values() {
    let settings = TrackerSettings {
        buffer_capacity: 3,
        ..Default::default()
    };
    let mut recorder = Recorder::default();
    let mut providers = ScriptedProviders {
        empty_odd_frames: true,
        ..Default::default()
    };
    let stats = run(
        fast_brief(),
        &settings,
        &mut providers,
        &mut BlankFrames::new(),
        &mut recorder,
    )
    .unwrap();
    assert_eq!(stats.frames_processed, 10);
    assert_eq!(stats.matched_frames(), 9);
    assert_eq!(stats.skipped_matches, 1);
    assert_eq!(recorder.matched_pairs, (1..10).map(|k| (k - 1, k)).collect::<Vec<_>>());
    assert!(recorder.described.iter().all(|&(keypoints, rows)| keypoints == rows));
    // Every match involves an empty frame.
    assert!(stats.match_counts.iter().all(|&count| count == 0));
    for (k, mean) in stats.mean_sizes.iter().enumerate() {
        assert_eq!(mean.is_none(), k % 2 == 1, "frame {}", k);
    }

    let rows = stats.per_frame_rows();
    let mean_row = rows.iter().find(|row| row.metric == Metric::MeanSize).unwrap();
    assert!(mean_row.aggregate.is_some());

    let mut out = vec![];
    let options = ReportOptions {
        per_frame: true,
        summary: false,
    };
    write_reports(&mut out, fast_brief(), &stats, options).unwrap();
    let text = String::from_utf8(out).unwrap();
    let mean_line = text
        .lines()
        .find(|line| line.contains("avg. keypoint size"))
        .unwrap();
    assert_eq!(mean_line.matches("n/a").count(), 5);
}
