//! Discretized curvature hypotheses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest radius a candidate may carry (profile pixels).
pub const MIN_RADIUS: u32 = 2;
/// Largest finite radius a candidate may carry (`i32::MAX`).
pub const MAX_RADIUS: u32 = i32::MAX as u32;

/// Direction the road bends towards, seen from the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnSide {
    Left,
    Right,
}

/// One curvature hypothesis.
///
/// Radii are expressed in rectified-profile pixels. Positive signed radii
/// bend right, negative ones bend left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RadiusCandidate {
    /// Infinite radius.
    Straight,
    Signed { radius: u32, side: TurnSide },
}

impl RadiusCandidate {
    /// Candidate for a signed radius, magnitude clamped to
    /// `[MIN_RADIUS, MAX_RADIUS]`.
    pub fn from_signed(radius: i64) -> Self {
        let side = if radius < 0 {
            TurnSide::Left
        } else {
            TurnSide::Right
        };
        let magnitude = radius
            .unsigned_abs()
            .clamp(MIN_RADIUS as u64, MAX_RADIUS as u64) as u32;
        RadiusCandidate::Signed {
            radius: magnitude,
            side,
        }
    }

    /// Magnitude used for tie-breaking. `Straight` is larger than any finite
    /// radius.
    #[inline]
    pub fn magnitude(&self) -> u64 {
        match self {
            RadiusCandidate::Straight => u64::MAX,
            RadiusCandidate::Signed { radius, .. } => *radius as u64,
        }
    }

    /// Signed radius in profile pixels, `None` for `Straight`.
    pub fn signed_radius(&self) -> Option<i64> {
        match self {
            RadiusCandidate::Straight => None,
            RadiusCandidate::Signed {
                radius,
                side: TurnSide::Right,
            } => Some(*radius as i64),
            RadiusCandidate::Signed {
                radius,
                side: TurnSide::Left,
            } => Some(-(*radius as i64)),
        }
    }

    #[inline]
    pub fn is_straight(&self) -> bool {
        matches!(self, RadiusCandidate::Straight)
    }
}

impl fmt::Display for RadiusCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signed_radius() {
            None => f.write_str("straight"),
            Some(r) => write!(f, "{r:+}"),
        }
    }
}

fn clamp_radius(v: f64) -> u32 {
    if v.is_nan() {
        return MIN_RADIUS;
    }
    v.clamp(MIN_RADIUS as f64, MAX_RADIUS as f64) as u32
}

/// The fixed, ordered candidate set of one run configuration.
///
/// Layout for `count = n`: right turns from the largest to the smallest
/// radius, then left turns from the smallest to the largest, so index `i`
/// and `2n - 1 - i` share a magnitude. Indices are stable and are what
/// external label alignment refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiusCandidates {
    candidates: Vec<RadiusCandidate>,
}

impl RadiusCandidates {
    /// `2·count` candidates with magnitudes `round(multiplier·count/(i+1))`.
    pub fn generate(count: usize, multiplier: f64) -> Self {
        let magnitudes: Vec<u32> = (0..count)
            .map(|i| clamp_radius((multiplier * count as f64 / (i + 1) as f64).round()))
            .collect();

        let right = magnitudes.iter().map(|&radius| RadiusCandidate::Signed {
            radius,
            side: TurnSide::Right,
        });
        let left = magnitudes.iter().rev().map(|&radius| RadiusCandidate::Signed {
            radius,
            side: TurnSide::Left,
        });

        Self {
            candidates: right.chain(left).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<RadiusCandidate> {
        self.candidates.get(index).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[RadiusCandidate] {
        &self.candidates
    }

    /// Every candidate the search evaluates: `(None, Straight)` first, then
    /// `(Some(i), candidate_i)` in index order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Option<usize>, RadiusCandidate)> + '_ {
        std::iter::once((None, RadiusCandidate::Straight)).chain(
            self.candidates
                .iter()
                .enumerate()
                .map(|(i, &c)| (Some(i), c)),
        )
    }
}
