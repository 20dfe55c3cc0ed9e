use imageproc::point::Point;
use nalgebra::{Matrix3, Point2, Vector3};

use crate::config::Calibration;

/// Fixed geometric facts about the analysed image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    /// Image center, truncated to whole pixels
    pub origin: (u32, u32),
    /// Stroke scaling for annotations, 1.0 at `max_pix` wide
    pub display_scale: f64,
}

impl ImageGeometry {
    pub fn new(width: u32, height: u32, max_pix: u32) -> Self {
        Self {
            width,
            height,
            origin: (width / 2, height / 2),
            display_scale: width as f64 / max_pix as f64,
        }
    }

    pub fn origin_point(&self) -> Point2<f64> {
        Point2::new(self.origin.0 as f64, self.origin.1 as f64)
    }

    /// Image area in square pixels
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Distance from the origin to the image corner, the farthest a
    /// centroid inside the image can be
    pub fn corner_distance(&self) -> f64 {
        let (ox, oy) = self.origin;
        ((ox as f64).powi(2) + (oy as f64).powi(2)).sqrt()
    }

    /// Stroke size in pixels for a nominal size at `max_pix` width, never below 1
    pub fn stroke(&self, nominal: f64) -> i32 {
        ((nominal * self.display_scale) as i32).max(1)
    }
}

/// Zeroth and first order moments of a closed polygon
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Green's theorem moments of the polygon through `points`.
    /// Orientation is normalized so `m00` is never negative.
    pub fn of_polygon(points: &[Point<i32>]) -> Self {
        if points.len() < 3 {
            return Self::default();
        }

        let mut a00 = 0.0;
        let mut a10 = 0.0;
        let mut a01 = 0.0;

        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            let (xi, yi) = (p.x as f64, p.y as f64);
            let (xj, yj) = (q.x as f64, q.y as f64);
            let cross = xi * yj - xj * yi;
            a00 += cross;
            a10 += cross * (xi + xj);
            a01 += cross * (yi + yj);
        }

        let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
        Self {
            m00: sign * a00 / 2.0,
            m10: sign * a10 / 6.0,
            m01: sign * a01 / 6.0,
        }
    }

    /// `None` for degenerate (zero area) polygons
    pub fn centroid(&self) -> Option<Point2<f64>> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Point2::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// Drop every vertex lying in the middle of a straight run, keeping only
/// the corners of a closed contour. Reversals (spikes) are kept.
pub fn simplify_collinear(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let (ax, ay) = (cur.x - prev.x, cur.y - prev.y);
            let (bx, by) = (next.x - cur.x, next.y - cur.y);
            let cross = ax as i64 * by as i64 - ay as i64 * bx as i64;
            let dot = ax as i64 * bx as i64 + ay as i64 * by as i64;
            !(cross == 0 && dot > 0)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() {
        points[..1].to_vec()
    } else {
        kept
    }
}

/// Offset of the hole from the image center, in millimeters.
/// Positive x is right, positive y is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleOffset {
    pub rel_x: f64,
    pub rel_y: f64,
}

/// Affine map from pixel coordinates to millimeters relative to the origin.
///
/// Image rows grow downward, so the y scale is negated to make "up" positive.
pub fn pixel_to_mm_matrix(geometry: &ImageGeometry, calibration: &Calibration) -> Matrix3<f64> {
    let (sx, sy) = calibration.mm_per_pixel(geometry.width, geometry.height);
    let origin = geometry.origin_point();

    #[rustfmt::skip]
    let translate_to_origin = Matrix3::new(
        1.0, 0.0, -origin.x,
        0.0, 1.0, -origin.y,
        0.0, 0.0, 1.0,
    );

    #[rustfmt::skip]
    let scale = Matrix3::new(
        sx, 0.0, 0.0,
        0.0, -sy, 0.0,
        0.0, 0.0, 1.0,
    );

    scale * translate_to_origin
}

/// Transform a point using the affine matrix
pub fn transform_point(matrix: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let p = Vector3::new(x, y, 1.0);
    let result = matrix * p;
    (result.x / result.z, result.y / result.z)
}

/// Convert a pixel centroid into the millimeter offset from the image center
pub fn to_millimeters(
    centroid: Point2<f64>,
    geometry: &ImageGeometry,
    calibration: &Calibration,
) -> HoleOffset {
    let matrix = pixel_to_mm_matrix(geometry, calibration);
    let (rel_x, rel_y) = transform_point(&matrix, centroid.x, centroid.y);
    HoleOffset { rel_x, rel_y }
}
