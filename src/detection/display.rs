use tracing::debug;

use crate::config::DisplayConfig;
use crate::error::ReaderError;
use crate::geometry::{RotatedRect, distance, nearest};
use crate::models::{Contour, DisplayCandidate, NormalizedContour};

/// Reorder contour vertices deterministically and measure the quadrilateral.
///
/// Each vertex is matched to the nearest corner of the minimum-area rectangle.
/// Which rectangle corner lands where depends on the rectangle angle, so the
/// order is picked per angle to always yield
/// `[bottom-right, bottom-left, top-left, top-right]` for an upright display.
pub fn normalize_contour(contour: &Contour) -> NormalizedContour {
    let points = contour.points();
    let rect = RotatedRect::min_area(&contour.vertices);

    let vertices = match rect {
        Some(rect) => {
            let corners = rect.corners();
            let order = if rect.angle >= 45.0 {
                [2, 3, 0, 1]
            } else {
                [3, 0, 1, 2]
            };
            order.map(|i| nearest(&points, corners[i]).unwrap_or(points[0]))
        }
        None => points,
    };

    let width_1 = distance(vertices[0], vertices[1]);
    let width_2 = distance(vertices[3], vertices[2]);
    let height_1 = distance(vertices[0], vertices[3]);
    let height_2 = distance(vertices[1], vertices[2]);
    let width_candidate = width_1.max(width_2) as u32;
    let height_candidate = height_1.max(height_2) as u32;

    // The display is always wider than tall
    NormalizedContour {
        vertices,
        width: width_candidate.max(height_candidate),
        height: width_candidate.min(height_candidate),
    }
}

/// Distance of the measured aspect ratio from the bezel's
pub fn aspect_score(contour: &NormalizedContour, config: &DisplayConfig) -> f64 {
    match contour.aspect_ratio() {
        Some(ratio) => (config.aspect_ratio - ratio).abs(),
        None => config.degenerate_penalty,
    }
}

/// Score every contour, best match first. Equal scores keep contour order.
pub fn rank_candidates(contours: &[Contour], config: &DisplayConfig) -> Vec<DisplayCandidate> {
    let mut candidates: Vec<DisplayCandidate> = contours
        .iter()
        .map(|c| {
            let contour = normalize_contour(c);
            let score = aspect_score(&contour, config);
            DisplayCandidate { contour, score }
        })
        .collect();

    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
    candidates
}

/// Pick the contour most likely to be the display bezel
pub fn locate_display(
    contours: &[Contour],
    config: &DisplayConfig,
) -> Result<DisplayCandidate, ReaderError> {
    let candidate = rank_candidates(contours, config)
        .into_iter()
        .next()
        .ok_or_else(|| ReaderError::no_display("no rectangular contours in image"))?;

    debug!(
        width = candidate.contour.width,
        height = candidate.contour.height,
        score = candidate.score,
        vertices = ?candidate.contour.vertices,
        "Located display contour"
    );

    Ok(candidate)
}
