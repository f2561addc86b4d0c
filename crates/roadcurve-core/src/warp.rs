use crate::{homography_from_4pt, sample_bilinear_rgb, FrameView, RectifiedImage};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WarpError {
    #[error("target rectangle {width}x{height} is too small (need at least 2x2)")]
    TargetTooSmall { width: usize, height: usize },
    #[error("frame buffer does not match its dimensions ({width}x{height})")]
    InconsistentFrame { width: usize, height: usize },
    #[error("degenerate source quad, homography could not be computed")]
    DegenerateQuad,
}

/// Resample the quad `src_corners` (TL, TR, BR, BL in frame pixels) into a
/// `out_w × out_h` rectangle.
///
/// The quad corners land on the centers of the output corner pixels. Output
/// pixels whose source position falls more than one pixel outside the frame
/// are left invalid.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, src_corners), fields(src_w = src.width, src_h = src.height))
)]
pub fn warp_perspective_rgb(
    src: &FrameView<'_>,
    src_corners: &[Point2<f64>; 4],
    out_w: usize,
    out_h: usize,
) -> Result<RectifiedImage, WarpError> {
    if out_w < 2 || out_h < 2 {
        return Err(WarpError::TargetTooSmall {
            width: out_w,
            height: out_h,
        });
    }
    if !src.is_consistent() {
        return Err(WarpError::InconsistentFrame {
            width: src.width,
            height: src.height,
        });
    }

    let (w, h) = ((out_w - 1) as f64, (out_h - 1) as f64);
    let rect_corners = [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ];
    let h_img_from_rect =
        homography_from_4pt(&rect_corners, src_corners).ok_or(WarpError::DegenerateQuad)?;

    let mut out = RectifiedImage::invalid(out_w, out_h);
    for y in 0..out_h {
        let row = out.row_mut(y);
        for (x, cell) in row.iter_mut().enumerate() {
            let p = h_img_from_rect.apply(Point2::new(x as f64, y as f64));
            *cell = sample_bilinear_rgb(src, p.x, p.y);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frame;

    #[test]
    fn identity_quad_copies_frame() {
        let mut frame = Frame::filled(4, 3, [0, 0, 0]);
        for (i, px) in frame.data.chunks_mut(3).enumerate() {
            px[0] = i as u8 * 10;
        }
        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let out = warp_perspective_rgb(&frame.view(), &corners, 4, 3).expect("warp");
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(out.get(x, y), Some([(y * 4 + x) as u8 * 10, 0, 0]));
            }
        }
    }

    #[test]
    fn quad_outside_frame_yields_invalid_cells() {
        let frame = Frame::filled(10, 10, [50, 50, 50]);
        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(30.0, 0.0),
            Point2::new(30.0, 9.0),
            Point2::new(0.0, 9.0),
        ];
        let out = warp_perspective_rgb(&frame.view(), &corners, 31, 10).expect("warp");
        assert_eq!(out.get(0, 0), Some([50, 50, 50]));
        assert_eq!(out.get(30, 5), None);
        assert!(out.valid_count() < out.data.len());
    }

    #[test]
    fn rejects_tiny_targets() {
        let frame = Frame::filled(4, 4, [0, 0, 0]);
        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        assert_eq!(
            warp_perspective_rgb(&frame.view(), &corners, 1, 4),
            Err(WarpError::TargetTooSmall {
                width: 1,
                height: 4
            })
        );
    }
}
