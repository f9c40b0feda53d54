use imageproc::geometry::convex_hull;
use imageproc::point::Point as PixelPoint;

/// A point in image space (x to the right, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<PixelPoint<i32>> for Point {
    fn from(p: PixelPoint<i32>) -> Self {
        Self::new(p.x as f64, p.y as f64)
    }
}

/// Euclidean distance between two points
pub fn distance(p1: Point, p2: Point) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    (dx * dx + dy * dy).sqrt()
}

/// Distance to a fixed point, usable as a sort or min key
pub fn distance_from(origin: Point) -> impl Fn(&Point) -> f64 {
    move |p| distance(origin, *p)
}

/// The point closest to `target`; ties go to the earliest point
pub fn nearest(points: &[Point], target: Point) -> Option<Point> {
    let key = distance_from(target);
    points
        .iter()
        .copied()
        .min_by(|a, b| key(a).total_cmp(&key(b)))
}

/// A rotated rectangle
///
/// `angle` is in degrees within `(0, 90]`. The `width` side runs along
/// `(cos angle, sin angle)` and the `height` side is perpendicular to it.
/// Every rectangle has exactly one such representation, which keeps corner
/// indexing stable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl RotatedRect {
    /// Minimum-area bounding rectangle of a point set (rotating calipers)
    pub fn min_area(points: &[PixelPoint<i32>]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        if points.len() < 3 || all_collinear(points) {
            return Some(Self::bounding(points));
        }

        let hull: Vec<Point> = convex_hull(points)
            .into_iter()
            .map(Point::from)
            .collect();
        let n = hull.len();

        let mut best: Option<(f64, Self)> = None;

        // Try each edge of the hull as one side of the rectangle
        for i in 0..n {
            let p1 = hull[i];
            let p2 = hull[(i + 1) % n];
            let edge_len = distance(p1, p2);
            if edge_len < 1e-10 {
                continue;
            }

            let (ux, uy) = ((p2.x - p1.x) / edge_len, (p2.y - p1.y) / edge_len);
            let (vx, vy) = (-uy, ux);

            let mut min_u = f64::MAX;
            let mut max_u = f64::MIN;
            let mut min_v = f64::MAX;
            let mut max_v = f64::MIN;

            for p in &hull {
                let dx = p.x - p1.x;
                let dy = p.y - p1.y;
                let u = dx * ux + dy * uy;
                let v = dx * vx + dy * vy;
                min_u = min_u.min(u);
                max_u = max_u.max(u);
                min_v = min_v.min(v);
                max_v = max_v.max(v);
            }

            let along = max_u - min_u;
            let across = max_v - min_v;
            let area = along * across;

            if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
                let cu = (min_u + max_u) / 2.0;
                let cv = (min_v + max_v) / 2.0;
                let center = Point::new(p1.x + cu * ux + cv * vx, p1.y + cu * uy + cv * vy);
                let direction = uy.atan2(ux).to_degrees();
                best = Some((area, Self::from_side(center, direction, along, across)));
            }
        }

        best.map(|(_, rect)| rect)
    }

    /// Build the canonical representation from one side direction (degrees)
    /// and the extents along and across it.
    fn from_side(center: Point, direction: f64, along: f64, across: f64) -> Self {
        let phi = direction.rem_euclid(180.0);
        if phi > 0.0 && phi <= 90.0 {
            Self {
                center,
                width: along,
                height: across,
                angle: phi,
            }
        } else {
            // The perpendicular side lies in (0, 90]
            let angle = if phi > 90.0 { phi - 90.0 } else { 90.0 };
            Self {
                center,
                width: across,
                height: along,
                angle,
            }
        }
    }

    /// Axis-aligned bounds, used when the points do not span an area
    fn bounding(points: &[PixelPoint<i32>]) -> Self {
        let min_x = points.iter().map(|p| p.x).min().unwrap_or(0) as f64;
        let max_x = points.iter().map(|p| p.x).max().unwrap_or(0) as f64;
        let min_y = points.iter().map(|p| p.y).min().unwrap_or(0) as f64;
        let max_y = points.iter().map(|p| p.y).max().unwrap_or(0) as f64;
        let center = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        Self::from_side(center, 0.0, max_x - min_x, max_y - min_y)
    }

    /// The four corners in a fixed order: 0 and 2 are opposite, as are 1 and 3.
    pub fn corners(&self) -> [Point; 4] {
        let theta = self.angle.to_radians();
        let a = theta.sin() * 0.5;
        let b = theta.cos() * 0.5;
        let (cx, cy) = (self.center.x, self.center.y);
        let (w, h) = (self.width, self.height);

        let p0 = Point::new(cx - a * h - b * w, cy + b * h - a * w);
        let p1 = Point::new(cx + a * h - b * w, cy - b * h - a * w);
        let p2 = Point::new(2.0 * cx - p0.x, 2.0 * cy - p0.y);
        let p3 = Point::new(2.0 * cx - p1.x, 2.0 * cy - p1.y);

        [p0, p1, p2, p3]
    }
}

fn all_collinear(points: &[PixelPoint<i32>]) -> bool {
    let o = points[0];
    let Some(a) = points.iter().find(|p| **p != o) else {
        return true;
    };
    points.iter().all(|p| {
        let cross = (a.x - o.x) as i64 * (p.y - o.y) as i64 - (a.y - o.y) as i64 * (p.x - o.x) as i64;
        cross == 0
    })
}
