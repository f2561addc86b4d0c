//! Road curvature estimation by exhaustive candidate search.
//!
//! Per frame:
//! - rectify the road region ahead of the camera into a fixed-width profile,
//! - un-bend the profile for every radius hypothesis (plus straight),
//! - average each column and score the sharpest adjacent step,
//! - keep the hypothesis that makes the lane markings straightest.
//!
//! Camera geometry and pixel containers live in `roadcurve-core`.

mod candidates;
mod io;
mod profile;
mod score;
mod search;
mod shift;
mod street_rect;
mod training;

pub use candidates::{RadiusCandidate, RadiusCandidates, TurnSide, MAX_RADIUS, MIN_RADIUS};
pub use io::{ConfigError, CurvatureConfig, FrameReport, IoError, RunReport, SkippedFrame};
pub use profile::{build_column_profile, ColumnProfile, ProfileError, DEFAULT_CONFIDENCE_THRESHOLD};
pub use score::{score_profile, DEFAULT_SCORE_BORDER};
pub use search::{
    CandidateOutcome, CandidateScore, CurvatureEstimate, CurvatureSearch, FrameEstimate,
    SearchError, SearchParams,
};
pub use shift::{circular_shift, row_shift, ShiftedRect};
pub use street_rect::{
    extract_street_rect, street_quad, target_height, StreetQuad, StreetRect, StreetRectError,
};
pub use training::{
    ground_truth_files, parse_ground_truth_name, TrainingError, TrainingLabeler, TrainingSample,
};

pub use roadcurve_core::{CameraGeometry, Frame, FrameView, GeometryError, RectifiedImage, Rgb};
