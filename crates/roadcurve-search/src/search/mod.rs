//! Per-frame curvature search.
//!
//! This module wires together street rectification, the circular shift,
//! the column profile and the scorer over the whole candidate set, and
//! selects the best hypothesis.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::SearchError;
pub use params::SearchParams;
pub use pipeline::CurvatureSearch;
pub use result::{CandidateOutcome, CandidateScore, CurvatureEstimate, FrameEstimate};
