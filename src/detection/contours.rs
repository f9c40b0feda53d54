use image::{GrayImage, RgbImage};
use imageproc::contours::find_contours;
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::point::Point;
use tracing::debug;

use crate::config::EdgeConfig;
use crate::detection::preprocessing;
use crate::models::Contour;

/// Quadrilaterals found on a photo together with the edge map they came from
#[derive(Debug, Clone)]
pub struct EdgeScan {
    /// Dilated edge map at working resolution
    pub edges: GrayImage,
    /// Candidate quadrilaterals in original image coordinates
    pub quadrilaterals: Vec<Contour>,
}

/// Find every quadrilateral outline in a photo
pub fn scan_quadrilaterals(img: &RgbImage, config: &EdgeConfig) -> EdgeScan {
    let gray = preprocessing::to_grayscale(img);
    let (resized, ratio) = preprocessing::resize_to_height(&gray, config.working_height);
    let blurred = preprocessing::apply_blur(&resized, config.blur_sigma);

    let median = preprocessing::median_intensity(&blurred);
    let (lower, upper) = preprocessing::edge_thresholds(median, config.threshold_spread);
    let edges = preprocessing::detect_edges(&blurred, lower, upper);
    let edges = preprocessing::dilate_edges(&edges, config.dilate_iterations);

    let (total, quadrilaterals) = find_quadrilaterals(&edges, config.approx_tolerance);
    debug!(
        total,
        rectangular = quadrilaterals.len(),
        lower,
        upper,
        "Scanned edge map for contours"
    );

    let quadrilaterals = quadrilaterals
        .into_iter()
        .map(|c| c.unscaled(ratio))
        .collect();

    EdgeScan {
        edges,
        quadrilaterals,
    }
}

/// Find contours in a binary edge image and keep those that approximate a
/// quadrilateral. Returns the number of contours examined alongside the
/// quadrilaterals.
pub fn find_quadrilaterals(edges: &GrayImage, tolerance: f64) -> (usize, Vec<Contour>) {
    let contours = find_contours::<i32>(edges);
    let quadrilaterals = contours
        .iter()
        .filter_map(|c| approximate_quadrilateral(&c.points, tolerance))
        .collect();
    (contours.len(), quadrilaterals)
}

/// Approximate a closed curve by a polygon and accept it if its convex hull
/// has exactly four vertices
pub fn approximate_quadrilateral(curve: &[Point<i32>], tolerance: f64) -> Option<Contour> {
    if curve.len() < 4 {
        return None;
    }

    let perimeter = arc_length(curve, true);
    let epsilon = tolerance * perimeter;
    if epsilon <= 0.0 {
        return None;
    }

    let approx = approximate_closed_curve(curve, epsilon);
    if approx.len() < 4 {
        return None;
    }

    let hull = convex_hull(approx.as_slice());
    Contour::from_points(&hull)
}

/// Douglas-Peucker on a closed curve.
///
/// The curve is split at two mutually distant points, both of which are
/// true extreme vertices, and each half is simplified as an open chain. This
/// keeps the arbitrary starting pixel of the contour from surviving as an
/// extra vertex.
fn approximate_closed_curve(curve: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let farthest_from = |origin: Point<i32>| -> usize {
        let mut best = 0;
        let mut best_distance = -1i64;
        for (i, p) in curve.iter().enumerate() {
            let dx = (p.x - origin.x) as i64;
            let dy = (p.y - origin.y) as i64;
            let d = dx * dx + dy * dy;
            if d > best_distance {
                best = i;
                best_distance = d;
            }
        }
        best
    };

    let a = farthest_from(curve[0]);
    let b = farthest_from(curve[a]);
    let (first, second) = if a < b { (a, b) } else { (b, a) };
    if first == second {
        return vec![curve[first]];
    }

    let wrapped: Vec<Point<i32>> = curve[second..]
        .iter()
        .chain(curve[..=first].iter())
        .copied()
        .collect();

    // Each chain ends where the other begins
    let mut polygon = approximate_polygon_dp(&curve[first..=second], epsilon, false);
    polygon.pop();
    let mut rest = approximate_polygon_dp(&wrapped, epsilon, false);
    rest.pop();
    polygon.append(&mut rest);
    polygon
}
