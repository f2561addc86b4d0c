//! Perspective rectification of the road region ahead of the camera.

use nalgebra::Point2;
use roadcurve_core::{warp_perspective_rgb, CameraGeometry, FrameView, RectifiedImage, WarpError};
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StreetRectError {
    #[error("frame is {got_w}x{got_h}, camera geometry expects {expected_w}x{expected_h}")]
    FrameSizeMismatch {
        expected_w: usize,
        expected_h: usize,
        got_w: usize,
        got_h: usize,
    },
    #[error("rectified target {width}x{height} is too small")]
    TargetTooSmall { width: usize, height: usize },
    #[error("target height is not finite (degenerate camera angles)")]
    DegenerateAngles,
    #[error(transparent)]
    Warp(#[from] WarpError),
}

/// The trapezoid bounding the region of interest, in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StreetQuad {
    /// TL, TR, BR, BL.
    pub corners: [Point2<f64>; 4],
    /// Horizontal inset of the top edge, as a fraction of the frame width.
    pub x: f64,
    /// Height of the top edge above the bottom frame edge, as a fraction of
    /// the frame width.
    pub y: f64,
}

impl StreetQuad {
    /// Height of the top edge as a fraction of the frame height.
    #[inline]
    pub fn y_on_screen(&self, screen_ratio: f64) -> f64 {
        self.y * screen_ratio
    }
}

/// Output of [`extract_street_rect`].
#[derive(Clone, Debug)]
pub struct StreetRect {
    pub quad: StreetQuad,
    pub rect: RectifiedImage,
}

/// Trapezoid anchored at the bottom frame edge whose slanted sides follow
/// the screen-space line `y = tanLineAngle · x`.
///
/// When the line would leave the top of the frame at the configured upper
/// line height, the top edge is clamped to the frame top instead.
pub fn street_quad(geometry: &CameraGeometry) -> StreetQuad {
    let width = geometry.width() as f64;
    let height = geometry.height() as f64;
    let screen_ratio = geometry.screen_ratio();
    let tan_line_angle =
        (geometry.inclination_rad().tan() / geometry.tan_half_fovy() + 1.0) / screen_ratio;

    let y_max = 1.0 / screen_ratio;
    let x0 = geometry.upper_line_height();
    let (x, y) = if tan_line_angle * x0 > y_max {
        (y_max / tan_line_angle, y_max)
    } else {
        (x0, tan_line_angle * x0)
    };

    let top = height - y * width;
    StreetQuad {
        corners: [
            Point2::new(x * width, top),
            Point2::new(width - x * width, top),
            Point2::new(width, height),
            Point2::new(0.0, height),
        ],
        x,
        y,
    }
}

/// Output height giving the rectified image roughly uniform ground sampling
/// for the vertical angular extent `y_on_screen` (fraction of frame height).
pub fn target_height(target_width: usize, inclination: f64, fovy: f64, y_on_screen: f64) -> f64 {
    let alpha1 = FRAC_PI_2 - inclination;
    let alpha2 = FRAC_PI_2 - ((fovy / 2.0).tan() * (1.0 - 2.0 * y_on_screen)).atan();
    target_width as f64 * (alpha2.sin() / (PI - alpha1 - alpha2).sin() * y_on_screen)
}

/// Rectify the road region of `frame` into a `target_width`-wide top-down
/// profile.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, geometry), fields(width = frame.width, height = frame.height))
)]
pub fn extract_street_rect(
    frame: &FrameView<'_>,
    geometry: &CameraGeometry,
    target_width: usize,
) -> Result<StreetRect, StreetRectError> {
    if frame.width != geometry.width() || frame.height != geometry.height() {
        return Err(StreetRectError::FrameSizeMismatch {
            expected_w: geometry.width(),
            expected_h: geometry.height(),
            got_w: frame.width,
            got_h: frame.height,
        });
    }

    let quad = street_quad(geometry);
    let h = target_height(
        target_width,
        geometry.inclination_rad(),
        geometry.fovy_rad(),
        quad.y_on_screen(geometry.screen_ratio()),
    );
    if !h.is_finite() {
        return Err(StreetRectError::DegenerateAngles);
    }
    let target_h = h.max(0.0).floor() as usize;
    if target_width < 2 || target_h < 2 {
        return Err(StreetRectError::TargetTooSmall {
            width: target_width,
            height: target_h,
        });
    }

    let rect = warp_perspective_rgb(frame, &quad.corners, target_width, target_h)?;
    log::debug!(
        "street rect {}x{} from quad top at y={:.1}",
        target_width,
        target_h,
        quad.corners[0].y
    );
    Ok(StreetRect { quad, rect })
}
