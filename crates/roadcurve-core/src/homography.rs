use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Planar projective transform acting on `f64` pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    /// Map a point. Points on the line at infinity map to non-finite values.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0] / v[2], v[1] / v[2])
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

fn normalize_points4(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    // Hartley normalization: centroid to origin, mean distance sqrt(2).
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;

    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    });
    (out, t)
}

/// Compute H such that `dst ~ H * src` from 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// for degenerate configurations (three collinear points, repeated points).
pub fn homography_from_4pt(src: &[Point2<f64>; 4], dst: &[Point2<f64>; 4]) -> Option<Homography> {
    // Unknowns [h11 h12 h13 h21 h22 h23 h31 h32], h33 = 1:
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = r0 + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h = t_dst.try_inverse()? * hn * t_src;
    let s = h[(2, 2)];
    if !s.is_finite() || s.abs() < 1e-12 {
        return None;
    }
    let h = h / s;
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Homography::new(h))
}
