use crate::{BoxError, DistanceNorm, MatchPolicy, Matcher, Selection};
use float_ord::FloatOrd;
use thiserror::Error;
use track_core::{hamming_distance, l2_distance, DescriptorFamily, Descriptors, FeatureMatch};

/// The descriptors handed to the matcher cannot be compared.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("{norm} distance cannot compare {family} descriptors")]
    NormMismatch {
        norm: DistanceNorm,
        family: DescriptorFamily,
    },
    #[error("cannot compare descriptors of {previous} and {current} elements")]
    WidthMismatch { previous: usize, current: usize },
}

/// Exhaustive matcher that compares every previous descriptor with every current one.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

impl BruteForceMatcher {
    /// Matches the `previous` descriptors (queries) against the `current` descriptors.
    pub fn find_matches(
        previous: &Descriptors,
        current: &Descriptors,
        policy: &MatchPolicy,
    ) -> Result<Vec<FeatureMatch>, MatchError> {
        for family in [previous.family(), current.family()] {
            if policy.norm.family() != family {
                return Err(MatchError::NormMismatch {
                    norm: policy.norm,
                    family,
                });
            }
        }
        if previous.is_empty() || current.is_empty() {
            return Ok(vec![]);
        }
        if previous.width() != current.width() {
            return Err(MatchError::WidthMismatch {
                previous: previous.width(),
                current: current.width(),
            });
        }
        let neighbors: Vec<[Option<(usize, f32)>; 2]> = match (previous, current) {
            (Descriptors::Binary(previous), Descriptors::Binary(current)) => previous
                .rows()
                .into_iter()
                .map(|query| {
                    two_nearest(
                        current
                            .rows()
                            .into_iter()
                            .map(|train| hamming_distance(query, train) as f32),
                    )
                })
                .collect(),
            (Descriptors::Float(previous), Descriptors::Float(current)) => previous
                .rows()
                .into_iter()
                .map(|query| {
                    two_nearest(
                        current
                            .rows()
                            .into_iter()
                            .map(|train| l2_distance(query, train)),
                    )
                })
                .collect(),
            // Families were checked against the same norm above.
            _ => unreachable!(),
        };
        Ok(neighbors
            .into_iter()
            .enumerate()
            .filter_map(|(query, [best, second])| {
                let (train, distance) = best?;
                let accepted = match policy.selection {
                    Selection::NearestNeighbor => true,
                    // Without a runner-up the match cannot be shown to be unambiguous.
                    Selection::KnnRatio { ratio } => {
                        second.map_or(false, |(_, second)| distance < ratio * second)
                    }
                };
                accepted.then(|| FeatureMatch::new(query, train, distance))
            })
            .collect())
    }
}

impl Matcher for BruteForceMatcher {
    fn match_descriptors(
        &mut self,
        previous: &Descriptors,
        current: &Descriptors,
        policy: &MatchPolicy,
    ) -> Result<Vec<FeatureMatch>, BoxError> {
        Ok(Self::find_matches(previous, current, policy)?)
    }
}

/// Finds the best and second best `(index, distance)` pairs, the earliest index winning ties.
fn two_nearest(distances: impl Iterator<Item = f32>) -> [Option<(usize, f32)>; 2] {
    let mut best: [Option<(usize, f32)>; 2] = [None, None];
    for (ix, distance) in distances.enumerate() {
        let closer = |slot: Option<(usize, f32)>| {
            slot.map_or(true, |(_, d)| FloatOrd(distance) < FloatOrd(d))
        };
        if closer(best[0]) {
            best[1] = best[0];
            best[0] = Some((ix, distance));
        } else if closer(best[1]) {
            best[1] = Some((ix, distance));
        }
    }
    best
}
