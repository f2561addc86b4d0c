//! Per-column intensity profile of a (possibly shifted) rectified image.

use roadcurve_core::RectifiedImage;
use serde::{Deserialize, Serialize};

/// Columns with at most this many valid channel samples are considered
/// unreliable near the image edges.
pub const DEFAULT_CONFIDENCE_THRESHOLD: usize = 10;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    #[error("column {column} has no valid samples and no reliable neighbor")]
    EmptyColumn { column: usize },
}

/// One mean intensity per image column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub values: Vec<u8>,
}

impl ColumnProfile {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    /// Fixed-length numeric window starting at column `anchor`.
    ///
    /// Columns past either end repeat the nearest edge value, so the result
    /// always has exactly `len` entries.
    pub fn feature_window(&self, anchor: usize, len: usize) -> Vec<f32> {
        let Some(last) = self.values.len().checked_sub(1) else {
            return vec![0.0; len];
        };
        (anchor..anchor + len)
            .map(|i| self.values[i.min(last)] as f32)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ColumnStats {
    sum: u64,
    count: usize,
}

impl ColumnStats {
    fn mean(&self) -> u8 {
        if self.count == 0 {
            0
        } else {
            (self.sum / self.count as u64) as u8
        }
    }
}

fn column_stats(img: &RectifiedImage) -> Vec<ColumnStats> {
    let mut stats = vec![ColumnStats::default(); img.width];
    for y in 0..img.height {
        for (col, px) in stats.iter_mut().zip(img.row(y)) {
            if let Some(rgb) = px {
                col.sum += rgb.iter().map(|&c| c as u64).sum::<u64>();
                col.count += rgb.len();
            }
        }
    }
    stats
}

/// Average the valid samples of every column, then stabilize the edges.
///
/// Scanning outward from `2·width/3` to the right edge and from `width/3`
/// to the left edge, every column with at most `confidence_threshold` valid
/// samples takes the value of its already processed inward neighbor.
/// A column that still has no data afterwards is an error.
pub fn build_column_profile(
    img: &RectifiedImage,
    confidence_threshold: usize,
) -> Result<ColumnProfile, ProfileError> {
    let width = img.width;
    let stats = column_stats(img);
    let mut values: Vec<u8> = stats.iter().map(ColumnStats::mean).collect();
    let mut has_data: Vec<bool> = stats.iter().map(|s| s.count > 0).collect();

    for w in (2 * width / 3).max(1)..width {
        if stats[w].count <= confidence_threshold {
            values[w] = values[w - 1];
            has_data[w] = has_data[w - 1];
        }
    }
    for w in (0..=width / 3).rev() {
        if w + 1 < width && stats[w].count <= confidence_threshold {
            values[w] = values[w + 1];
            has_data[w] = has_data[w + 1];
        }
    }

    if let Some(column) = has_data.iter().position(|&ok| !ok) {
        return Err(ProfileError::EmptyColumn { column });
    }
    Ok(ColumnProfile { values })
}
