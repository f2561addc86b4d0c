use crate::candidates::RadiusCandidate;
use crate::profile::ColumnProfile;
use crate::shift::ShiftedRect;
use crate::street_rect::StreetQuad;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to one candidate during the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateOutcome {
    Scored { score: u8 },
    /// The shifted profile is narrower than the scoring window.
    Unscorable,
    /// A column kept no valid samples after edge stabilization.
    EmptyColumn { column: usize },
}

impl CandidateOutcome {
    #[inline]
    pub fn score(&self) -> Option<u8> {
        match self {
            CandidateOutcome::Scored { score } => Some(*score),
            _ => None,
        }
    }
}

/// Per-candidate diagnostics, in enumeration order (`Straight` first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Index into the candidate set, `None` for `Straight`.
    pub index: Option<usize>,
    pub candidate: RadiusCandidate,
    pub outcome: CandidateOutcome,
}

/// Winning hypothesis for one rectified image.
#[derive(Clone, Debug)]
pub struct CurvatureEstimate {
    /// Index into the candidate set, `None` for `Straight`.
    pub index: Option<usize>,
    pub candidate: RadiusCandidate,
    pub score: u8,
    /// The rectified image un-bent for `candidate`.
    pub shifted: ShiftedRect,
    pub profile: ColumnProfile,
    pub scores: Vec<CandidateScore>,
}

impl CurvatureEstimate {
    /// Number of candidates excluded from selection.
    pub fn excluded(&self) -> usize {
        self.scores
            .iter()
            .filter(|s| s.outcome.score().is_none())
            .count()
    }
}

/// Result of processing one frame.
#[derive(Clone, Debug)]
pub struct FrameEstimate {
    /// Region of interest in frame pixels.
    pub quad: StreetQuad,
    pub estimate: CurvatureEstimate,
    /// Wall time spent on the frame.
    pub elapsed: Duration,
}
