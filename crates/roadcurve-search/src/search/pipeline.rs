use super::{
    CandidateOutcome, CandidateScore, CurvatureEstimate, FrameEstimate, SearchError, SearchParams,
};
use crate::candidates::{RadiusCandidate, RadiusCandidates};
use crate::profile::{build_column_profile, ColumnProfile, ProfileError};
use crate::score::score_profile;
use crate::shift::{circular_shift, ShiftedRect};
use crate::street_rect::extract_street_rect;
use roadcurve_core::{CameraGeometry, FrameView, RectifiedImage};
use std::time::Instant;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Position in the enumeration order, the candidate-set index and the
/// candidate itself.
type Slot = (usize, Option<usize>, RadiusCandidate);

/// A candidate that produced a score, with the buffers it owns.
struct Scored {
    position: usize,
    index: Option<usize>,
    candidate: RadiusCandidate,
    score: u8,
    shifted: ShiftedRect,
    profile: ColumnProfile,
}

impl Scored {
    /// Strictly greater score wins; ties go to the larger magnitude, then to
    /// the candidate enumerated first.
    fn beats(&self, other: &Scored) -> bool {
        let key = |s: &Scored| (s.score, s.candidate.magnitude(), std::cmp::Reverse(s.position));
        key(self) > key(other)
    }
}

struct Evaluation {
    position: usize,
    summary: CandidateScore,
    scored: Option<Scored>,
}

/// Running best plus the per-candidate summaries. Merging is associative
/// and order independent, so any reduction tree picks the same winner.
#[derive(Default)]
struct SearchFold {
    best: Option<Scored>,
    scores: Vec<(usize, CandidateScore)>,
}

impl SearchFold {
    fn offer(&mut self, candidate: Scored) {
        match &self.best {
            Some(best) if !candidate.beats(best) => {}
            _ => self.best = Some(candidate),
        }
    }

    fn push(mut self, eval: Evaluation) -> Self {
        self.scores.push((eval.position, eval.summary));
        if let Some(scored) = eval.scored {
            self.offer(scored);
        }
        self
    }

    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    fn merge(mut self, other: Self) -> Self {
        self.scores.extend(other.scores);
        if let Some(scored) = other.best {
            self.offer(scored);
        }
        self
    }
}

/// Curvature-candidate search over one camera setup.
///
/// The candidate set is built once, at construction, and shared read-only
/// by every frame.
pub struct CurvatureSearch {
    geometry: CameraGeometry,
    params: SearchParams,
    candidates: RadiusCandidates,
}

impl CurvatureSearch {
    /// Create a search with the candidate set described by `params`.
    pub fn new(geometry: CameraGeometry, params: SearchParams) -> Result<Self, SearchError> {
        let candidates = params.build_candidates();
        Self::with_candidates(geometry, params, candidates)
    }

    /// Create a search over an explicit candidate set.
    pub fn with_candidates(
        geometry: CameraGeometry,
        params: SearchParams,
        candidates: RadiusCandidates,
    ) -> Result<Self, SearchError> {
        params.validate()?;
        log::debug!(
            "curvature search: {} candidates + straight, profile width {}",
            candidates.len(),
            params.profile_width
        );
        Ok(Self {
            geometry,
            params,
            candidates,
        })
    }

    #[inline]
    pub fn geometry(&self) -> &CameraGeometry {
        &self.geometry
    }

    #[inline]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    #[inline]
    pub fn candidates(&self) -> &RadiusCandidates {
        &self.candidates
    }

    /// Rectify `frame` and search every candidate on it.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn process(&self, frame: &FrameView<'_>) -> Result<FrameEstimate, SearchError> {
        let started = Instant::now();
        let street = extract_street_rect(frame, &self.geometry, self.params.profile_width)?;
        let estimate = self.search_rectified(&street.rect)?;
        let elapsed = started.elapsed();

        log::info!(
            "frame {}x{}: best {} (score {}, {} excluded) in {:.1} ms",
            frame.width,
            frame.height,
            estimate.candidate,
            estimate.score,
            estimate.excluded(),
            elapsed.as_secs_f64() * 1e3
        );

        Ok(FrameEstimate {
            quad: street.quad,
            estimate,
            elapsed,
        })
    }

    /// Search every candidate on an already rectified image.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, rect), fields(width = rect.width, height = rect.height))
    )]
    pub fn search_rectified(&self, rect: &RectifiedImage) -> Result<CurvatureEstimate, SearchError> {
        let slots: Vec<Slot> = self
            .candidates
            .enumerate()
            .enumerate()
            .map(|(position, (index, candidate))| (position, index, candidate))
            .collect();

        let fold = self.fold_slots(rect, slots);

        let mut scores = fold.scores;
        scores.sort_unstable_by_key(|(position, _)| *position);
        let scores: Vec<CandidateScore> = scores.into_iter().map(|(_, s)| s).collect();

        let best = fold.best.ok_or(SearchError::NoScorableCandidate)?;
        Ok(CurvatureEstimate {
            index: best.index,
            candidate: best.candidate,
            score: best.score,
            shifted: best.shifted,
            profile: best.profile,
            scores,
        })
    }

    #[cfg(feature = "rayon")]
    fn fold_slots(&self, rect: &RectifiedImage, slots: Vec<Slot>) -> SearchFold {
        if self.params.parallel {
            slots
                .into_par_iter()
                .map(|slot| self.evaluate(rect, slot))
                .fold(SearchFold::default, SearchFold::push)
                .reduce(SearchFold::default, SearchFold::merge)
        } else {
            slots
                .into_iter()
                .map(|slot| self.evaluate(rect, slot))
                .fold(SearchFold::default(), SearchFold::push)
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn fold_slots(&self, rect: &RectifiedImage, slots: Vec<Slot>) -> SearchFold {
        slots
            .into_iter()
            .map(|slot| self.evaluate(rect, slot))
            .fold(SearchFold::default(), SearchFold::push)
    }

    fn evaluate(&self, rect: &RectifiedImage, (position, index, candidate): Slot) -> Evaluation {
        let shifted = circular_shift(rect, candidate);
        let (outcome, scored) =
            match build_column_profile(&shifted.image, self.params.confidence_threshold) {
                Err(ProfileError::EmptyColumn { column }) => {
                    log::warn!("candidate {candidate} excluded: column {column} has no data");
                    (CandidateOutcome::EmptyColumn { column }, None)
                }
                Ok(profile) => match score_profile(&profile, self.params.score_border) {
                    None => {
                        log::debug!(
                            "candidate {candidate} unscorable (profile width {})",
                            profile.len()
                        );
                        (CandidateOutcome::Unscorable, None)
                    }
                    Some(score) => {
                        log::debug!("candidate {candidate}: score {score}");
                        let scored = Scored {
                            position,
                            index,
                            candidate,
                            score,
                            shifted,
                            profile,
                        };
                        (CandidateOutcome::Scored { score }, Some(scored))
                    }
                },
            };

        Evaluation {
            position,
            summary: CandidateScore {
                index,
                candidate,
                outcome,
            },
            scored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(position: usize, candidate: RadiusCandidate, score: u8) -> Scored {
        Scored {
            position,
            index: position.checked_sub(1),
            candidate,
            score,
            shifted: ShiftedRect {
                image: RectifiedImage::invalid(0, 0),
                anchor: 0,
            },
            profile: ColumnProfile { values: vec![] },
        }
    }

    fn search(width: usize, count: usize, scale: f64) -> CurvatureSearch {
        let geometry =
            CameraGeometry::from_degrees(640, 480, 5.0, 60.0, 1.2, 0.32).expect("geometry");
        let params = SearchParams {
            profile_width: width,
            candidate_count: count,
            radius_scale: scale,
            parallel: false,
            ..SearchParams::default()
        };
        CurvatureSearch::new(geometry, params).expect("search")
    }

    #[test]
    fn ties_prefer_larger_magnitude_then_earlier_position() {
        let straight = scored(0, RadiusCandidate::Straight, 12);
        let big = scored(1, RadiusCandidate::from_signed(400), 12);
        let small = scored(2, RadiusCandidate::from_signed(100), 12);
        let mirrored = scored(5, RadiusCandidate::from_signed(-400), 12);
        let sharper = scored(3, RadiusCandidate::from_signed(50), 13);

        assert!(straight.beats(&big));
        assert!(big.beats(&small));
        assert!(!small.beats(&big));
        assert!(big.beats(&mirrored));
        assert!(!mirrored.beats(&big));
        assert!(sharper.beats(&straight));
    }

    #[test]
    fn fold_order_does_not_change_the_winner() {
        let make = || {
            vec![
                scored(2, RadiusCandidate::from_signed(100), 7),
                scored(1, RadiusCandidate::from_signed(400), 7),
                scored(4, RadiusCandidate::from_signed(-400), 7),
                scored(3, RadiusCandidate::from_signed(-100), 5),
            ]
        };

        let mut forward = SearchFold::default();
        make().into_iter().for_each(|s| forward.offer(s));

        let mut halves = (SearchFold::default(), SearchFold::default());
        for (i, s) in make().into_iter().rev().enumerate() {
            if i % 2 == 0 {
                halves.0.offer(s);
            } else {
                halves.1.offer(s);
            }
        }
        let merged = halves.1.merge(halves.0);

        let winner = |f: &SearchFold| f.best.as_ref().map(|b| b.position);
        assert_eq!(winner(&forward), Some(1));
        assert_eq!(winner(&merged), Some(1));
    }

    #[test]
    fn uniform_rect_selects_straight() {
        let search = search(40, 6, 10.0);
        let rect = RectifiedImage::filled(40, 30, [90, 90, 90]);
        let estimate = search.search_rectified(&rect).expect("estimate");
        assert_eq!(estimate.candidate, RadiusCandidate::Straight);
        assert_eq!(estimate.index, None);
        assert_eq!(estimate.score, 0);
        assert_eq!(estimate.scores.len(), 13);
        assert_eq!(estimate.scores[0].candidate, RadiusCandidate::Straight);
        assert!(estimate
            .scores
            .iter()
            .all(|s| s.outcome == CandidateOutcome::Scored { score: 0 }));
    }

    #[test]
    fn empty_interior_columns_exclude_the_candidate() {
        // A one-pixel-wide column bent with radius 30 lands its far rows
        // several columns apart, leaving gaps in the middle third.
        let search = search(20, 1, 1.5);
        let candidate = RadiusCandidate::from_signed(30);
        assert_eq!(search.candidates().get(0), Some(candidate));

        let rect = RectifiedImage::filled(1, 30, [10, 10, 10]);
        let eval = search.evaluate(&rect, (1, Some(0), candidate));
        assert!(eval.scored.is_none());
        assert!(matches!(
            eval.summary.outcome,
            CandidateOutcome::EmptyColumn { column } if (11..20).contains(&column)
        ));
    }

    #[test]
    fn nothing_scorable_is_an_error() {
        let search = search(20, 2, 10.0);
        let rect = RectifiedImage::filled(5, 4, [10, 10, 10]);
        assert!(matches!(
            search.search_rectified(&rect),
            Err(SearchError::NoScorableCandidate)
        ));
    }
}
