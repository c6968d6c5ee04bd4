use crate::{
    retain_strongest, write_reports, ConfigError, Describer, Detector, Error, FrameBuffer,
    FrameRecord, FrameSource, FrameState, MatchPolicy, Matcher, Observer, ProviderFactory,
    Result, RoiFilter, RunStatistics, Stage, StageEvent, Strategy, TrackerSettings,
};
use image::GrayImage;
use log::*;
use std::io;
use std::time::Instant;

fn elapsed_millis(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Drives frames of one strategy run through detection, filtering, description and matching.
///
/// Every frame is pushed into a bounded [`FrameBuffer`] and matched against the
/// frame before it once two frames are resident.
pub struct Tracker {
    strategy: Strategy,
    policy: MatchPolicy,
    roi: RoiFilter,
    keypoint_limit: Option<usize>,
    buffer: FrameBuffer,
    stats: RunStatistics,
    detector: Box<dyn Detector>,
    describer: Box<dyn Describer>,
    matcher: Box<dyn Matcher>,
    failed_at: Option<usize>,
}

impl Tracker {
    /// Validates the configuration and acquires the providers.
    ///
    /// Every configuration problem surfaces here, before any frame is processed.
    pub fn new(
        strategy: Strategy,
        settings: &TrackerSettings,
        providers: &mut dyn ProviderFactory,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let policy = MatchPolicy::for_descriptor(strategy.descriptor(), &settings.matching);
        debug!("{} uses the {} matcher", strategy, policy);
        Ok(Self {
            strategy,
            policy,
            roi: settings.roi_filter(),
            keypoint_limit: settings.keypoint_limit,
            buffer: FrameBuffer::new(settings.buffer_capacity)?,
            stats: RunStatistics::new(),
            detector: providers.detector(strategy.detector())?,
            describer: providers.describer(strategy.descriptor())?,
            matcher: providers.matcher(policy.backend)?,
            failed_at: None,
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn into_statistics(self) -> RunStatistics {
        self.stats
    }

    /// Runs a newly loaded image through every stage and returns the terminal state.
    ///
    /// The tracker refuses to process further frames after a failure, since the
    /// failed frame may be resident without descriptors.
    pub fn process_frame(
        &mut self,
        index: usize,
        image: GrayImage,
        observer: &mut dyn Observer,
    ) -> Result<FrameState> {
        if let Some(failed) = self.failed_at {
            return Err(Error::Aborted { failed, index });
        }
        let result = self.track(index, image, observer);
        if result.is_err() {
            self.failed_at = Some(index);
        }
        result
    }

    fn track(
        &mut self,
        index: usize,
        image: GrayImage,
        observer: &mut dyn Observer,
    ) -> Result<FrameState> {
        let Self {
            policy,
            roi,
            keypoint_limit,
            buffer,
            stats,
            detector,
            describer,
            matcher,
            ..
        } = self;

        let (evicted, frame) = buffer.push_latest(FrameRecord::new(index, image));
        if let Some(evicted) = evicted {
            trace!("evicted frame {} from the buffer", evicted.index);
        }

        let start = Instant::now();
        let keypoints = detector.detect(&frame.image);
        let millis = elapsed_millis(start);
        debug!(
            "frame {}: detected {} keypoints in {:.3} ms",
            index,
            keypoints.len(),
            millis
        );
        stats.record_detection(keypoints.len(), millis);
        frame.keypoints = keypoints;
        frame.advance(FrameState::Detected);
        observer.observe(StageEvent::Detected(frame));

        let mut keypoints = roi.apply(std::mem::take(&mut frame.keypoints));
        if let Some(limit) = *keypoint_limit {
            retain_strongest(&mut keypoints, limit);
        }
        match stats.record_filtering(&keypoints) {
            Ok(sizes) => debug!(
                "frame {}: kept {} keypoints, size mean {:.3} variance {:.3}",
                index, sizes.count, sizes.mean, sizes.variance
            ),
            Err(e) => warn!("frame {}: {}, size statistics marked n/a", index, e),
        }
        frame.keypoints = keypoints;
        frame.advance(FrameState::Filtered);
        observer.observe(StageEvent::Filtered(frame));

        let start = Instant::now();
        let descriptors = describer
            .describe(&frame.image, &frame.keypoints)
            .map_err(|source| Error::Provider {
                stage: Stage::Description,
                index,
                source,
            })?;
        let millis = elapsed_millis(start);
        if descriptors.len() != frame.keypoints.len() {
            return Err(Error::DescriptorMismatch {
                index,
                keypoints: frame.keypoints.len(),
                rows: descriptors.len(),
            });
        }
        debug!(
            "frame {}: described {} keypoints in {:.3} ms",
            index,
            descriptors.len(),
            millis
        );
        stats.record_description(millis);
        frame.descriptors = Some(descriptors);
        frame.advance(FrameState::Described);
        observer.observe(StageEvent::Described(frame));

        let state = match buffer.latest_pair_mut() {
            Some((previous, current)) => {
                let (Some(previous_descriptors), Some(current_descriptors)) =
                    (&previous.descriptors, &current.descriptors)
                else {
                    unreachable!("resident frames of a healthy tracker are described");
                };
                let start = Instant::now();
                let matches = matcher
                    .match_descriptors(previous_descriptors, current_descriptors, policy)
                    .map_err(|source| Error::Provider {
                        stage: Stage::Matching,
                        index,
                        source,
                    })?;
                let millis = elapsed_millis(start);
                debug!(
                    "frame {}: {} matches against frame {} in {:.3} ms",
                    index,
                    matches.len(),
                    previous.index,
                    millis
                );
                stats.record_matching(matches.len(), millis);
                current.matches = matches;
                current.advance(FrameState::Matched);
                observer.observe(StageEvent::Matched {
                    previous,
                    current: &*current,
                });
                FrameState::Matched
            }
            None => {
                debug!("frame {}: no previous frame, matching skipped", index);
                stats.record_skipped_match();
                if let Some(frame) = buffer.latest_mut() {
                    frame.advance(FrameState::SkippedMatch);
                }
                FrameState::SkippedMatch
            }
        };
        stats.finish_frame();
        Ok(state)
    }
}

/// Runs one strategy over the configured frame range.
///
/// Configuration problems are reported before the first frame is loaded. A frame
/// that fails to load aborts the run.
pub fn run(
    strategy: Strategy,
    settings: &TrackerSettings,
    providers: &mut dyn ProviderFactory,
    source: &mut dyn FrameSource,
    observer: &mut dyn Observer,
) -> Result<RunStatistics> {
    let mut tracker = Tracker::new(strategy, settings, providers)?;
    info!(
        "tracking {} over frames {}..={}",
        strategy, settings.first_frame, settings.last_frame
    );
    for index in settings.frame_range() {
        let image = source
            .load(index)
            .map_err(|source| Error::Input { index, source })?;
        let state = tracker.process_frame(index, image, observer)?;
        trace!("frame {} finished as {}", index, state);
    }
    let stats = tracker.into_statistics();
    info!(
        "{}: {} frames, {} matched, {} skipped",
        strategy,
        stats.frames_processed,
        stats.matched_frames(),
        stats.skipped_matches
    );
    Ok(stats)
}

/// The result of one run of an evaluation plan.
#[derive(Debug)]
pub struct RunOutcome {
    pub strategy: Strategy,
    pub result: Result<RunStatistics>,
}

/// Runs every strategy of `plan` in order and writes the enabled reports to `out`.
///
/// A failed run is logged and does not stop the remaining runs. Only failing to
/// write to `out` ends the evaluation early.
pub fn evaluate(
    plan: &[Strategy],
    settings: &TrackerSettings,
    providers: &mut dyn ProviderFactory,
    source: &mut dyn FrameSource,
    observer: &mut dyn Observer,
    out: &mut impl io::Write,
) -> io::Result<Vec<RunOutcome>> {
    let options = settings.report_options();
    let mut outcomes = Vec::with_capacity(plan.len());
    for &strategy in plan {
        let result = run(strategy, settings, providers, source, observer);
        match &result {
            Ok(stats) => {
                write_reports(out, strategy, stats, options)?;
                if options.per_frame {
                    writeln!(out)?;
                }
            }
            Err(e) => error!("run {} failed: {}", strategy, e),
        }
        outcomes.push(RunOutcome { strategy, result });
    }
    Ok(outcomes)
}
