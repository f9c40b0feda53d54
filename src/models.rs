use imageproc::point::Point as PixelPoint;
use serde::Serialize;

use crate::geometry::Point;

/// A quadrilateral found on the edge map, in original image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub vertices: [PixelPoint<i32>; 4],
}

impl Contour {
    /// Only polygons with exactly four vertices are contours
    pub fn from_points(points: &[PixelPoint<i32>]) -> Option<Self> {
        let vertices: [PixelPoint<i32>; 4] = points.try_into().ok()?;
        Some(Self { vertices })
    }

    /// Map working-resolution coordinates back to the original image
    pub fn unscaled(&self, ratio: f64) -> Self {
        let vertices = self.vertices.map(|p| {
            PixelPoint::new(
                (p.x as f64 / ratio).floor() as i32,
                (p.y as f64 / ratio).floor() as i32,
            )
        });
        Self { vertices }
    }

    pub fn points(&self) -> [Point; 4] {
        self.vertices.map(Point::from)
    }
}

/// Contour vertices in canonical order with measured size
///
/// The vertices are ordered so that warping them onto
/// `(w, h), (0, h), (0, 0), (w, 0)` yields an upright display.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedContour {
    pub vertices: [Point; 4],
    pub width: u32,
    pub height: u32,
}

impl NormalizedContour {
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }
}

/// A normalized contour with its distance from the bezel aspect ratio
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayCandidate {
    pub contour: NormalizedContour,
    pub score: f64,
}

/// A validated meter reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Digits as recognized on the display
    pub raw: String,
    /// Digits scaled into the meter's reporting unit
    pub value: f64,
}
