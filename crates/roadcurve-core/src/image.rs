/// One 3-channel, 8-bit color sample.
pub type Rgb = [u8; 3];

/// Borrowed, row-major, interleaved 3-channel frame (`len = w*h*3`).
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Owned counterpart of [`FrameView`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Frame {
    /// Uniformly colored frame.
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        let data = std::iter::repeat_n(color, width * height)
            .flatten()
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl FrameView<'_> {
    /// `true` when `data` holds exactly `width * height` RGB triplets.
    pub fn is_consistent(&self) -> bool {
        self.width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(3))
            .is_some_and(|n| n == self.data.len())
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Rgb {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Bilinear RGB sample at a sub-pixel position.
///
/// Coordinates are clamped to the frame, so positions up to one pixel past
/// the border replicate the edge. Returns `None` for positions further out
/// and for empty frames.
pub fn sample_bilinear_rgb(src: &FrameView<'_>, x: f64, y: f64) -> Option<Rgb> {
    if src.width == 0 || src.height == 0 || !x.is_finite() || !y.is_finite() {
        return None;
    }
    let max_x = (src.width - 1) as f64;
    let max_y = (src.height - 1) as f64;
    if x < -1.0 || y < -1.0 || x > max_x + 1.0 || y > max_y + 1.0 {
        return None;
    }
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(src.width - 1);
    let y1 = (y0 + 1).min(src.height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = src.pixel(x0, y0);
    let p10 = src.pixel(x1, y0);
    let p01 = src.pixel(x0, y1);
    let p11 = src.pixel(x1, y1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let a = p00[c] as f64 + fx * (p10[c] as f64 - p00[c] as f64);
        let b = p01[c] as f64 + fx * (p11[c] as f64 - p01[c] as f64);
        out[c] = (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

/// Rectified road image with explicit per-pixel validity.
///
/// `None` marks a cell with no source data (outside the warped quad, or
/// uncovered after a circular shift). Row 0 is the far end of the road,
/// the last row is closest to the camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RectifiedImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Option<Rgb>>,
}

impl RectifiedImage {
    /// Image with every cell invalid.
    pub fn invalid(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![None; width * height],
        }
    }

    /// Image with every cell set to `color`.
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            data: vec![Some(color); width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: Option<Rgb>) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[Option<Rgb>] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [Option<Rgb>] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|p| p.is_some()).count()
    }

    /// Interleaved RGB bytes, invalid cells replaced by `fill`.
    pub fn to_rgb_bytes(&self, fill: Rgb) -> Vec<u8> {
        self.data
            .iter()
            .flat_map(|p| p.unwrap_or(fill))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame() -> Frame {
        // 4x2 frame, red channel = 10*x, green = 100*y, blue constant.
        let mut data = Vec::new();
        for y in 0..2u8 {
            for x in 0..4u8 {
                data.extend_from_slice(&[10 * x, 100 * y, 7]);
            }
        }
        Frame {
            width: 4,
            height: 2,
            data,
        }
    }

    #[test]
    fn bilinear_interpolates_each_channel() {
        let frame = gradient_frame();
        let view = frame.view();
        assert_eq!(sample_bilinear_rgb(&view, 1.5, 0.5), Some([15, 50, 7]));
        assert_eq!(sample_bilinear_rgb(&view, 3.0, 1.0), Some([30, 100, 7]));
    }

    #[test]
    fn bilinear_replicates_edge_within_one_pixel() {
        let frame = gradient_frame();
        let view = frame.view();
        assert_eq!(sample_bilinear_rgb(&view, 4.0, 2.0), Some([30, 100, 7]));
        assert_eq!(sample_bilinear_rgb(&view, -1.0, 0.0), Some([0, 0, 7]));
        assert_eq!(sample_bilinear_rgb(&view, 4.5, 0.0), None);
        assert_eq!(sample_bilinear_rgb(&view, f64::NAN, 0.0), None);
    }

    #[test]
    fn frame_consistency_checks_buffer_length() {
        let frame = Frame::filled(3, 2, [1, 2, 3]);
        assert!(frame.view().is_consistent());
        let short = FrameView {
            width: 3,
            height: 2,
            data: &frame.data[..17],
        };
        assert!(!short.is_consistent());
    }

    #[test]
    fn rectified_image_tracks_validity() {
        let mut img = RectifiedImage::invalid(3, 2);
        assert_eq!(img.valid_count(), 0);
        img.set(1, 1, Some([9, 9, 9]));
        img.set(5, 5, Some([1, 1, 1]));
        assert_eq!(img.valid_count(), 1);
        assert_eq!(img.get(1, 1), Some([9, 9, 9]));
        assert_eq!(img.row(1), &[None, Some([9, 9, 9]), None]);
        assert_eq!(img.to_rgb_bytes([0, 0, 0])[12..15], [9, 9, 9]);
    }
}
