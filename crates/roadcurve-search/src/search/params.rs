use super::SearchError;
use crate::candidates::RadiusCandidates;
use crate::profile::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::score::DEFAULT_SCORE_BORDER;
use serde::{Deserialize, Serialize};

/// Configuration for the curvature search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Width of the rectified road profile, in pixels.
    pub profile_width: usize,
    /// Number of radii per turn direction. The search evaluates
    /// `2·candidate_count + 1` hypotheses including `Straight`.
    pub candidate_count: usize,
    /// Candidate radii are `round(radius_scale·profile_width·count/(i+1))`
    /// profile pixels.
    pub radius_scale: f64,
    /// Edge columns with at most this many valid channel samples take their
    /// inward neighbor's value.
    pub confidence_threshold: usize,
    /// Columns excluded from scoring on the left edge (one more on the right).
    pub score_border: usize,
    /// Evaluate candidates on the rayon thread pool when the `rayon`
    /// feature is enabled.
    pub parallel: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            profile_width: 50,
            candidate_count: 40,
            radius_scale: 10.0,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            score_border: DEFAULT_SCORE_BORDER,
            parallel: true,
        }
    }
}

impl SearchParams {
    /// Defaults for a given profile width.
    pub fn for_profile_width(profile_width: usize) -> Self {
        Self {
            profile_width,
            ..Self::default()
        }
    }

    /// Smallest profile width the scorer accepts for the unshifted image.
    #[inline]
    pub fn min_profile_width(&self) -> usize {
        2 * self.score_border + 2
    }

    /// Multiplier handed to [`RadiusCandidates::generate`].
    #[inline]
    pub fn radius_multiplier(&self) -> f64 {
        self.radius_scale * self.profile_width as f64
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.profile_width < self.min_profile_width() {
            return Err(SearchError::ProfileTooNarrow {
                width: self.profile_width,
                min: self.min_profile_width(),
            });
        }
        if !(self.radius_scale.is_finite() && self.radius_scale > 0.0) {
            return Err(SearchError::InvalidRadiusScale(self.radius_scale));
        }
        Ok(())
    }

    /// The candidate set these parameters describe.
    pub fn build_candidates(&self) -> RadiusCandidates {
        RadiusCandidates::generate(self.candidate_count, self.radius_multiplier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let params = SearchParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.radius_multiplier(), 500.0);
        let candidates = params.build_candidates();
        assert_eq!(candidates.len(), 80);
        assert_eq!(candidates.get(0).map(|c| c.magnitude()), Some(20_000));
        assert_eq!(candidates.get(39).map(|c| c.magnitude()), Some(500));
    }

    #[test]
    fn rejects_narrow_profiles_and_bad_scales() {
        let narrow = SearchParams::for_profile_width(17);
        assert_eq!(
            narrow.validate(),
            Err(SearchError::ProfileTooNarrow { width: 17, min: 18 })
        );
        let bad_scale = SearchParams {
            radius_scale: f64::NAN,
            ..SearchParams::default()
        };
        assert!(matches!(
            bad_scale.validate(),
            Err(SearchError::InvalidRadiusScale(_))
        ));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let params: SearchParams =
            serde_json::from_str(r#"{ "candidate_count": 12 }"#).expect("parse");
        assert_eq!(params.candidate_count, 12);
        assert_eq!(params.profile_width, 50);
    }
}
