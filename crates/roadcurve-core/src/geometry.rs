//! Camera geometry for a forward-facing, downward-tilted road camera.

use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

const MIN_TRIG_RATIO: f64 = 1e-9;

/// Invalid camera parameters. Raised once, when the geometry is built.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
    #[error("camera inclination {0} rad is outside (0, pi/2)")]
    InvalidInclination(f64),
    #[error("vertical field of view {0} rad is outside (0, pi)")]
    InvalidFieldOfView(f64),
    #[error("camera height above ground must be finite and positive (got {0})")]
    InvalidCameraHeight(f64),
    #[error("upper rect line height {0} is outside (0, 1)")]
    InvalidUpperLineHeight(f64),
    #[error("derived trigonometric ratio `{0}` is not finite")]
    DegenerateRatio(&'static str),
}

/// Immutable camera model: frame size, tilt, vertical field of view, mount
/// height and the fraction of the profile where the region of interest starts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CameraGeometry {
    width: usize,
    height: usize,
    inclination_rad: f64,
    fovy_rad: f64,
    height_above_ground: f64,
    upper_line_height: f64,
}

impl CameraGeometry {
    /// Build and validate a geometry from radians.
    pub fn new(
        width: usize,
        height: usize,
        inclination_rad: f64,
        fovy_rad: f64,
        height_above_ground: f64,
        upper_line_height: f64,
    ) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidDimensions { width, height });
        }
        if !(inclination_rad.is_finite() && inclination_rad > 0.0 && inclination_rad < FRAC_PI_2)
        {
            return Err(GeometryError::InvalidInclination(inclination_rad));
        }
        if !(fovy_rad.is_finite() && fovy_rad > 0.0 && fovy_rad < std::f64::consts::PI) {
            return Err(GeometryError::InvalidFieldOfView(fovy_rad));
        }
        if !(height_above_ground.is_finite() && height_above_ground > 0.0) {
            return Err(GeometryError::InvalidCameraHeight(height_above_ground));
        }
        if !(upper_line_height.is_finite() && upper_line_height > 0.0 && upper_line_height < 1.0)
        {
            return Err(GeometryError::InvalidUpperLineHeight(upper_line_height));
        }

        let geometry = Self {
            width,
            height,
            inclination_rad,
            fovy_rad,
            height_above_ground,
            upper_line_height,
        };
        geometry.check_ratios()?;
        Ok(geometry)
    }

    /// Build a geometry from the degree-based configuration record.
    ///
    /// The vertical field of view is derived from the horizontal one and the
    /// frame aspect ratio.
    pub fn from_degrees(
        width: usize,
        height: usize,
        inclination_deg: f64,
        fovx_deg: f64,
        height_above_ground: f64,
        upper_line_height: f64,
    ) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidDimensions { width, height });
        }
        let fovx = fovx_deg.to_radians();
        if !(fovx.is_finite() && fovx > 0.0 && fovx < std::f64::consts::PI) {
            return Err(GeometryError::InvalidFieldOfView(fovx));
        }
        let fovy = Self::fovy_from_fovx(fovx, width, height);
        Self::new(
            width,
            height,
            inclination_deg.to_radians(),
            fovy,
            height_above_ground,
            upper_line_height,
        )
    }

    /// `fovy = 2·atan(tan(fovx/2) / width · height)`.
    pub fn fovy_from_fovx(fovx_rad: f64, width: usize, height: usize) -> f64 {
        2.0 * ((fovx_rad / 2.0).tan() / width as f64 * height as f64).atan()
    }

    fn check_ratios(&self) -> Result<(), GeometryError> {
        let tan_half_fovy = self.tan_half_fovy();
        if !tan_half_fovy.is_finite() || tan_half_fovy.abs() < MIN_TRIG_RATIO {
            return Err(GeometryError::DegenerateRatio("tan(fovy/2)"));
        }
        if !self.inclination_rad.tan().is_finite() {
            return Err(GeometryError::DegenerateRatio("tan(inclination)"));
        }
        if self.inclination_rad.cos().abs() < MIN_TRIG_RATIO {
            return Err(GeometryError::DegenerateRatio("cos(inclination)"));
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn inclination_rad(&self) -> f64 {
        self.inclination_rad
    }

    #[inline]
    pub fn fovy_rad(&self) -> f64 {
        self.fovy_rad
    }

    #[inline]
    pub fn height_above_ground(&self) -> f64 {
        self.height_above_ground
    }

    #[inline]
    pub fn upper_line_height(&self) -> f64 {
        self.upper_line_height
    }

    /// `width / height`.
    #[inline]
    pub fn screen_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    #[inline]
    pub fn tan_half_fovy(&self) -> f64 {
        (self.fovy_rad / 2.0).tan()
    }

    /// Road width, in world units, covered by the full width of the rectified
    /// profile at the bottom frame edge.
    ///
    /// Used to convert candidate radii (profile pixels) into world radii.
    /// Non-positive when the upper half of the field of view reaches the
    /// horizon.
    pub fn projected_road_width(&self) -> f64 {
        let half_fovy = self.fovy_rad / 2.0;
        2.0 * self.height_above_ground
            * self.screen_ratio()
            * (FRAC_PI_2 - self.inclination_rad - half_fovy).tan()
            * half_fovy.tan()
            / self.inclination_rad.cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference() -> CameraGeometry {
        CameraGeometry::from_degrees(640, 480, 5.0, 60.0, 1.2, 0.32).expect("valid geometry")
    }

    #[test]
    fn fovy_follows_aspect_ratio() {
        let g = reference();
        let expected = 2.0 * ((30.0_f64.to_radians()).tan() * 480.0 / 640.0).atan();
        assert_relative_eq!(g.fovy_rad(), expected, epsilon = 1e-12);
        assert!(g.fovy_rad() < 60.0_f64.to_radians());
    }

    #[test]
    fn square_frames_keep_horizontal_fov() {
        let g = CameraGeometry::from_degrees(100, 100, 10.0, 50.0, 1.0, 0.3).expect("valid");
        assert_relative_eq!(g.fovy_rad(), 50.0_f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert_eq!(
            CameraGeometry::from_degrees(0, 480, 5.0, 60.0, 1.0, 0.3),
            Err(GeometryError::InvalidDimensions {
                width: 0,
                height: 480
            })
        );
        assert!(matches!(
            CameraGeometry::from_degrees(640, 480, 90.0, 60.0, 1.0, 0.3),
            Err(GeometryError::InvalidInclination(_))
        ));
        assert!(matches!(
            CameraGeometry::from_degrees(640, 480, 0.0, 60.0, 1.0, 0.3),
            Err(GeometryError::InvalidInclination(_))
        ));
        assert!(matches!(
            CameraGeometry::from_degrees(640, 480, 5.0, 180.0, 1.0, 0.3),
            Err(GeometryError::InvalidFieldOfView(_))
        ));
        assert!(matches!(
            CameraGeometry::from_degrees(640, 480, 5.0, 60.0, f64::NAN, 0.3),
            Err(GeometryError::InvalidCameraHeight(_))
        ));
        assert!(matches!(
            CameraGeometry::from_degrees(640, 480, 5.0, 60.0, 1.0, 1.0),
            Err(GeometryError::InvalidUpperLineHeight(_))
        ));
    }

    #[test]
    fn projected_road_width_is_positive_below_horizon() {
        let g = CameraGeometry::from_degrees(640, 480, 30.0, 60.0, 1.5, 0.3).expect("valid");
        assert!(g.projected_road_width() > 0.0);

        let doubled = CameraGeometry::from_degrees(640, 480, 30.0, 60.0, 3.0, 0.3).expect("valid");
        assert_relative_eq!(
            doubled.projected_road_width(),
            2.0 * g.projected_road_width(),
            max_relative = 1e-12
        );
    }
}
