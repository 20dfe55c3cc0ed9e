use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use nalgebra::Point2;
use tracing::debug;

use crate::config::LocatorConfig;
use crate::geometry::{simplify_collinear, ImageGeometry, Moments};

/// A contour that passed the area filter, with its derived attributes
#[derive(Debug, Clone)]
pub struct Candidate {
    pub contour: Vec<Point<i32>>,
    /// Enclosed area in square pixels
    pub area: f64,
    pub centroid: Point2<f64>,
    /// Euclidean distance from the centroid to the image origin, in pixels
    pub distance: f64,
}

/// Outermost contours of the non-zero regions, reduced to their corners
pub fn external_contours(edges: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .map(|c| simplify_collinear(&c.points))
        .collect()
}

/// Area bounds are exclusive on both ends
pub fn area_is_acceptable(area: f64, geometry: &ImageGeometry, config: &LocatorConfig) -> bool {
    let im_area = geometry.area();
    area > config.min_area_fraction * im_area && area < config.max_area_fraction * im_area
}

/// Sort contours by area (largest first), keep those of plausible size and
/// attach their centroid and distance to the origin
pub fn score_contours(
    contours: Vec<Vec<Point<i32>>>,
    geometry: &ImageGeometry,
    config: &LocatorConfig,
) -> Vec<Candidate> {
    let mut measured: Vec<(Vec<Point<i32>>, Moments)> = contours
        .into_iter()
        .map(|c| {
            let moments = Moments::of_polygon(&c);
            (c, moments)
        })
        .collect();
    measured.sort_by(|a, b| {
        b.1.m00
            .partial_cmp(&a.1.m00)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let origin = geometry.origin_point();
    let total = measured.len();

    let candidates: Vec<Candidate> = measured
        .into_iter()
        .filter(|(_, m)| area_is_acceptable(m.m00, geometry, config))
        .filter_map(|(contour, moments)| {
            // Zero-area polygons have no centroid
            let centroid = moments.centroid()?;
            Some(Candidate {
                contour,
                area: moments.m00,
                centroid,
                distance: nalgebra::distance(&centroid, &origin),
            })
        })
        .collect();

    debug!(
        "{} of {} external contours have an acceptable area",
        candidates.len(),
        total
    );

    candidates
}

/// Indices of the candidates that improved the running minimum distance,
/// in discovery order. The last entry is the winner.
///
/// The comparison is strict, so on equal distance the earlier (larger)
/// candidate is kept.
pub fn running_best(candidates: &[Candidate], initial_distance: f64) -> Vec<usize> {
    let mut closest = initial_distance;
    let mut improvements = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        if candidate.distance < closest {
            closest = candidate.distance;
            improvements.push(i);
        }
    }

    improvements
}

/// Index of the candidate nearest to the origin, or `None` when no
/// candidate beats `initial_distance`
pub fn select_nearest(candidates: &[Candidate], initial_distance: f64) -> Option<usize> {
    running_best(candidates, initial_distance).last().copied()
}

/// Contour extraction, scoring and filtering on an edge map
pub fn find_candidates(
    edges: &GrayImage,
    geometry: &ImageGeometry,
    config: &LocatorConfig,
) -> Vec<Candidate> {
    score_contours(external_contours(edges), geometry, config)
}
