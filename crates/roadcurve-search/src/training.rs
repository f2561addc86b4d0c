//! Labelled samples for an external learned scorer.
//!
//! Ground-truth radii come in world units. The labeler converts every
//! candidate radius (profile pixels) into world units with the projected
//! road width, picks the nearest candidate and emits fixed-length profile
//! features for it and for any requested negatives.

use crate::candidates::{RadiusCandidate, RadiusCandidates};
use crate::profile::{build_column_profile, ProfileError};
use crate::search::{SearchError, SearchParams};
use crate::shift::circular_shift;
use roadcurve_core::{CameraGeometry, RectifiedImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Ground truths farther out than this factor times the extreme candidate
/// radii are labelled `Straight`.
const STRAIGHT_FACTOR: f64 = 1.5;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TrainingError {
    #[error("projected road width must be finite and positive (got {0})")]
    NonPositiveRoadWidth(f64),
    #[error("ground-truth radius must be finite (got {0})")]
    InvalidGroundTruth(f64),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("labelled candidate {candidate} has no usable profile: {source}")]
    Profile {
        candidate: RadiusCandidate,
        source: ProfileError,
    },
}

/// One training example.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Index into the candidate set, `None` for `Straight`.
    pub index: Option<usize>,
    pub candidate: RadiusCandidate,
    /// Exactly `profile_width` column means starting at the shift anchor.
    pub features: Vec<f32>,
    /// `1.0` for the labelled candidate, `0.0` otherwise.
    pub score: f32,
}

/// Maps ground-truth radii onto the candidate set of one configuration.
#[derive(Clone, Debug)]
pub struct TrainingLabeler {
    candidates: RadiusCandidates,
    /// World units per profile pixel.
    world_per_pixel: f64,
    profile_width: usize,
    confidence_threshold: usize,
}

impl TrainingLabeler {
    pub fn new(geometry: &CameraGeometry, params: &SearchParams) -> Result<Self, TrainingError> {
        Self::with_candidates(geometry, params, params.build_candidates())
    }

    pub fn with_candidates(
        geometry: &CameraGeometry,
        params: &SearchParams,
        candidates: RadiusCandidates,
    ) -> Result<Self, TrainingError> {
        params.validate()?;
        let road_width = geometry.projected_road_width();
        if !(road_width.is_finite() && road_width > 0.0) {
            return Err(TrainingError::NonPositiveRoadWidth(road_width));
        }
        Ok(Self {
            candidates,
            world_per_pixel: road_width / params.profile_width as f64,
            profile_width: params.profile_width,
            confidence_threshold: params.confidence_threshold,
        })
    }

    #[inline]
    pub fn candidates(&self) -> &RadiusCandidates {
        &self.candidates
    }

    /// Signed candidate radius in world units, `None` for `Straight`.
    pub fn world_radius(&self, candidate: RadiusCandidate) -> Option<f64> {
        candidate
            .signed_radius()
            .map(|r| r as f64 * self.world_per_pixel)
    }

    /// Candidate closest to `ground_truth` (signed, world units).
    pub fn label(&self, ground_truth: f64) -> Result<(Option<usize>, RadiusCandidate), TrainingError> {
        if !ground_truth.is_finite() {
            return Err(TrainingError::InvalidGroundTruth(ground_truth));
        }
        let slice = self.candidates.as_slice();
        let (Some(&first), Some(&last)) = (slice.first(), slice.last()) else {
            return Ok((None, RadiusCandidate::Straight));
        };
        let upper = self.world_radius(first).unwrap_or(f64::INFINITY) * STRAIGHT_FACTOR;
        let lower = self.world_radius(last).unwrap_or(f64::NEG_INFINITY) * STRAIGHT_FACTOR;
        if ground_truth > upper || ground_truth < lower {
            return Ok((None, RadiusCandidate::Straight));
        }

        let mut best = (None, RadiusCandidate::Straight);
        let mut best_delta = f64::INFINITY;
        for (i, &candidate) in slice.iter().enumerate() {
            let Some(world) = self.world_radius(candidate) else {
                continue;
            };
            let delta = (world - ground_truth).abs();
            if delta < best_delta {
                best_delta = delta;
                best = (Some(i), candidate);
            }
        }
        Ok(best)
    }

    fn features(&self, rect: &RectifiedImage, candidate: RadiusCandidate) -> Result<Vec<f32>, ProfileError> {
        let shifted = circular_shift(rect, candidate);
        let profile = build_column_profile(&shifted.image, self.confidence_threshold)?;
        Ok(profile.feature_window(shifted.anchor, self.profile_width))
    }

    /// The positive sample for `ground_truth` followed by one negative per
    /// entry of `negatives`.
    ///
    /// Negatives equal to the labelled candidate, outside the candidate set
    /// or without a usable profile are skipped.
    pub fn samples(
        &self,
        rect: &RectifiedImage,
        ground_truth: f64,
        negatives: impl IntoIterator<Item = Option<usize>>,
    ) -> Result<Vec<TrainingSample>, TrainingError> {
        let (best_index, best) = self.label(ground_truth)?;
        let features = self
            .features(rect, best)
            .map_err(|source| TrainingError::Profile {
                candidate: best,
                source,
            })?;
        let mut out = vec![TrainingSample {
            index: best_index,
            candidate: best,
            features,
            score: 1.0,
        }];

        for index in negatives {
            if index == best_index {
                continue;
            }
            let candidate = match index {
                None => RadiusCandidate::Straight,
                Some(i) => match self.candidates.get(i) {
                    Some(c) => c,
                    None => continue,
                },
            };
            match self.features(rect, candidate) {
                Ok(features) => out.push(TrainingSample {
                    index,
                    candidate,
                    features,
                    score: 0.0,
                }),
                Err(err) => log::warn!("skipping negative {candidate}: {err}"),
            }
        }
        Ok(out)
    }
}

/// Ground-truth radius encoded in a dataset file name.
///
/// `"<signed millimetres>.png"` becomes the radius in metres.
pub fn parse_ground_truth_name(name: &str) -> Option<f64> {
    let stem = name.strip_suffix(".png")?;
    if stem.is_empty() {
        return None;
    }
    stem.parse::<i64>().ok().map(|mm| mm as f64 / 1000.0)
}

/// Every labelled image in `dir`, in lexical order.
pub fn ground_truth_files(dir: impl AsRef<Path>) -> std::io::Result<Vec<(PathBuf, f64)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let parsed = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_ground_truth_name);
        if let Some(radius) = parsed {
            files.push((path, radius));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
