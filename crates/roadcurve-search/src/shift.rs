//! Circular "un-bend" of a rectified road image.
//!
//! Each row `h` (1-indexed from the bottom) of a road bending with radius `r`
//! is displaced sideways by `r - sqrt(r² - h²)`. Shifting every row back by
//! that amount makes a road of that curvature look straight.

use crate::candidates::{RadiusCandidate, TurnSide};
use roadcurve_core::RectifiedImage;

/// Sideways displacement of row `h` on a circle of radius `r`.
///
/// `None` when `h > r` (no defined displacement) or the inputs are not
/// finite and non-negative.
#[inline]
pub fn row_shift(r: f64, h: f64) -> Option<f64> {
    if !(r.is_finite() && h.is_finite()) || r < 0.0 || h < 0.0 || h > r {
        return None;
    }
    // h² / (r + sqrt(r² - h²)) == r - sqrt(r² - h²), without cancellation
    // for large radii.
    let d = h * h / (r + (r * r - h * h).sqrt());
    Some(if d.is_finite() { d } else { 0.0 })
}

/// A shifted image plus the column where the nearest row's first source
/// column landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShiftedRect {
    pub image: RectifiedImage,
    pub anchor: usize,
}

/// Un-bend `rect` for `candidate`.
///
/// Only `min(height, r)` rows have a defined displacement, so the output
/// keeps that many rows from the top of `rect` and drops the rest. The
/// output grows by `ceil(shift(newHeight))` columns so no source column is
/// lost, and cells not covered by a shifted row are invalid. `Straight` returns the input unchanged.
pub fn circular_shift(rect: &RectifiedImage, candidate: RadiusCandidate) -> ShiftedRect {
    let RadiusCandidate::Signed { radius, side } = candidate else {
        return ShiftedRect {
            image: rect.clone(),
            anchor: 0,
        };
    };

    let (width, height) = (rect.width, rect.height);
    let r = radius as f64;
    let new_height = height.min(radius as usize);
    if width == 0 || new_height == 0 {
        return ShiftedRect {
            image: RectifiedImage::invalid(width, new_height),
            anchor: 0,
        };
    }

    let max_shift = row_shift(r, new_height as f64)
        .map(|s| s.ceil() as usize)
        .unwrap_or(0);
    let new_width = width + max_shift;
    let mut out = RectifiedImage::invalid(new_width, new_height);

    for h in 1..=new_height {
        let shift = row_shift(r, h as f64)
            .map(|s| (s.floor() as usize).min(max_shift))
            .unwrap_or(0);
        let offset = match side {
            TurnSide::Right => max_shift - shift,
            TurnSide::Left => shift,
        };
        let src = rect.row(new_height - h);
        out.row_mut(new_height - h)[offset..offset + width].copy_from_slice(src);
    }

    let anchor = match side {
        TurnSide::Right => max_shift,
        TurnSide::Left => 0,
    };
    ShiftedRect { image: out, anchor }
}
