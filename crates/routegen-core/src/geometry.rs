//! Polygon primitives consumed by the hazard and reroute logic.
//!
//! Vertices are stored as (lon, lat) pairs so that x maps to longitude and
//! y to latitude. Polygons are treated as closed rings; the closing edge
//! from the last vertex back to the first is implicit.

use serde::{Deserialize, Serialize};

/// A closed polygon in longitude/latitude space.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertex longitudes (x data).
    pub xs: Vec<f64>,
    /// Vertex latitudes (y data).
    pub ys: Vec<f64>,
}

impl Polygon {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        debug_assert_eq!(xs.len(), ys.len());
        Self { xs, ys }
    }

    /// Build from (lon, lat) vertex pairs.
    pub fn from_vertices(vertices: &[(f64, f64)]) -> Self {
        Self {
            xs: vertices.iter().map(|v| v.0).collect(),
            ys: vertices.iter().map(|v| v.1).collect(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.xs.len()
    }

    /// Check whether a point lies inside the polygon using ray casting.
    /// Points exactly on an edge may land on either side.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.xs.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let xi = self.xs[i];
            let yi = self.ys[i];
            let xj = self.xs[j];
            let yj = self.ys[j];

            if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    /// Check whether the segment from (x1,y1) to (x2,y2) crosses any polygon
    /// edge or has an endpoint inside the polygon.
    pub fn intersects_segment(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
        if self.contains(x1, y1) || self.contains(x2, y2) {
            return true;
        }

        let n = self.xs.len();
        if n < 2 {
            return false;
        }
        let mut j = n - 1;
        for i in 0..n {
            if segments_intersect(
                (x1, y1),
                (x2, y2),
                (self.xs[j], self.ys[j]),
                (self.xs[i], self.ys[i]),
            ) {
                return true;
            }
            j = i;
        }
        false
    }

    /// Centroid of the vertex set.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.xs.len();
        if n == 0 {
            return (0.0, 0.0);
        }
        let cx = self.xs.iter().sum::<f64>() / n as f64;
        let cy = self.ys.iter().sum::<f64>() / n as f64;
        (cx, cy)
    }

    /// Scale the polygon about its own centroid.
    pub fn scale(&self, factor: f64) -> Polygon {
        let (cx, cy) = self.centroid();
        Polygon {
            xs: self.xs.iter().map(|x| cx + (x - cx) * factor).collect(),
            ys: self.ys.iter().map(|y| cy + (y - cy) * factor).collect(),
        }
    }

    /// Convex hull of this polygon's vertices.
    pub fn convex_hull(&self) -> Polygon {
        let points: Vec<(f64, f64)> = self
            .xs
            .iter()
            .zip(self.ys.iter())
            .map(|(&x, &y)| (x, y))
            .collect();
        convex_hull(&points)
    }
}

/// Orientation-based segment intersection test, including collinear touches.
fn segments_intersect(a1: (f64, f64), a2: (f64, f64), b1: (f64, f64), b2: (f64, f64)) -> bool {
    const EPS: f64 = 1e-12;

    fn orient(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> f64 {
        (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
    }

    fn within(a: f64, b: f64, value: f64) -> bool {
        let min = a.min(b) - EPS;
        let max = a.max(b) + EPS;
        value >= min && value <= max
    }

    fn on_segment(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> bool {
        within(p.0, q.0, r.0) && within(p.1, q.1, r.1)
    }

    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if o1.abs() <= EPS && on_segment(a1, a2, b1) {
        return true;
    }
    if o2.abs() <= EPS && on_segment(a1, a2, b2) {
        return true;
    }
    if o3.abs() <= EPS && on_segment(b1, b2, a1) {
        return true;
    }
    if o4.abs() <= EPS && on_segment(b1, b2, a2) {
        return true;
    }

    let a_crosses = (o1 > EPS && o2 < -EPS) || (o1 < -EPS && o2 > EPS);
    let b_crosses = (o3 > EPS && o4 < -EPS) || (o3 < -EPS && o4 > EPS);
    a_crosses && b_crosses
}

/// Convex hull of a point set using the monotone chain scan.
/// Returns the hull in counter-clockwise order without a repeated endpoint.
pub fn convex_hull(points: &[(f64, f64)]) -> Polygon {
    let mut pts: Vec<(f64, f64)> = points.to_vec();
    pts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    pts.dedup();

    if pts.len() < 3 {
        return Polygon {
            xs: pts.iter().map(|p| p.0).collect(),
            ys: pts.iter().map(|p| p.1).collect(),
        };
    }

    fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    }

    let mut lower: Vec<(f64, f64)> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f64, f64)> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);

    Polygon {
        xs: lower.iter().map(|p| p.0).collect(),
        ys: lower.iter().map(|p| p.1).collect(),
    }
}

/// Convex hull of the union of the given polygons' vertices.
pub fn union_convex_hull(polygons: &[Polygon]) -> Polygon {
    let mut points = Vec::new();
    for poly in polygons {
        for i in 0..poly.num_vertices() {
            points.push((poly.xs[i], poly.ys[i]));
        }
    }
    convex_hull(&points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::from_vertices(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
    }

    #[test]
    fn contains_interior_point() {
        let poly = unit_square();
        assert!(poly.contains(0.5, 0.5));
        assert!(!poly.contains(1.5, 0.5));
        assert!(!poly.contains(-0.1, 0.5));
    }

    #[test]
    fn segment_crossing_detected() {
        let poly = unit_square();
        // crosses the square without either endpoint inside
        assert!(poly.intersects_segment(-0.5, 0.5, 1.5, 0.5));
        // endpoint inside
        assert!(poly.intersects_segment(0.5, 0.5, 2.0, 2.0));
        // entirely outside
        assert!(!poly.intersects_segment(2.0, 2.0, 3.0, 3.0));
    }

    #[test]
    fn scale_about_centroid() {
        let poly = unit_square().scale(2.0);
        assert!(poly.contains(-0.4, 0.5));
        assert!(poly.contains(1.4, 0.5));
        assert!(!poly.contains(1.6, 0.5));
        // centroid unchanged
        let (cx, cy) = poly.centroid();
        assert!((cx - 0.5).abs() < 1e-9 && (cy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn hull_drops_interior_points() {
        let points = vec![
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
            (1.0, 1.0), // interior
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.num_vertices(), 4);
        assert!(hull.contains(1.0, 1.0));
    }

    #[test]
    fn union_hull_covers_both_polygons() {
        let a = unit_square();
        let b = Polygon::from_vertices(&[(3.0, 0.0), (4.0, 0.0), (4.0, 1.0), (3.0, 1.0)]);
        let hull = union_convex_hull(&[a, b]);
        assert!(hull.contains(2.0, 0.5));
    }
}
