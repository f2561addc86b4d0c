use crate::street_rect::StreetRectError;

/// Errors returned by the curvature search.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("profile width {width} is too narrow to score (need at least {min})")]
    ProfileTooNarrow { width: usize, min: usize },
    #[error("radius scale must be finite and positive (got {0})")]
    InvalidRadiusScale(f64),
    #[error(transparent)]
    StreetRect(#[from] StreetRectError),
    #[error("no candidate produced a scorable profile")]
    NoScorableCandidate,
}
