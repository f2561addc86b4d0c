//! Sharpness score of a column profile.

use crate::profile::ColumnProfile;

/// Columns excluded on the left edge of the scoring window. The right edge
/// excludes one more.
pub const DEFAULT_SCORE_BORDER: usize = 8;

/// Largest absolute step between adjacent columns inside
/// `[border, len - border - 1)`.
///
/// `None` when the profile is too narrow to contain a single pair
/// (`len <= 2·border + 1`).
pub fn score_profile(profile: &ColumnProfile, border: usize) -> Option<u8> {
    let values = profile.as_slice();
    let end = values.len().checked_sub(border + 1)?;
    if end <= border {
        return None;
    }
    (border..end)
        .map(|i| values[i].abs_diff(values[i + 1]))
        .max()
}
