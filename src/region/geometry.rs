//! Planar and near-planar geometry on latitude/longitude rings.
//!
//! Polygons are small (a few degrees), so containment runs directly in the
//! (lon, lat) plane. Metric distances use a local equirectangular projection
//! centred on the query point.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0088;
pub const KM_PER_DEGREE_LAT: f64 = 111.195;

// Collinearity slack in squared degrees. Vertices are given to ~1e-4 deg.
const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
/// A WGS84 position, written `[lat, lon]` in fixtures.
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        LatLon { lat, lon }
    }

    fn xy(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<[f64; 2]> for LatLon {
    fn from([lat, lon]: [f64; 2]) -> Self {
        LatLon { lat, lon }
    }
}

impl From<LatLon> for [f64; 2] {
    fn from(p: LatLon) -> Self {
        [p.lat, p.lon]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: LatLon,
    pub max: LatLon,
}

impl BoundingBox {
    pub fn around(points: &[LatLon]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            bbox.min.lat = bbox.min.lat.min(p.lat);
            bbox.min.lon = bbox.min.lon.min(p.lon);
            bbox.max.lat = bbox.max.lat.max(p.lat);
            bbox.max.lon = bbox.max.lon.max(p.lon);
        }
        Some(bbox)
    }

    pub fn expand(&self, lat_deg: f64, lon_deg: f64) -> Self {
        BoundingBox {
            min: LatLon::new(self.min.lat - lat_deg, self.min.lon - lon_deg),
            max: LatLon::new(self.max.lat + lat_deg, self.max.lon + lon_deg),
        }
    }

    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.min.lat && p.lat <= self.max.lat && p.lon >= self.min.lon && p.lon <= self.max.lon
    }
}

/// Edges of a closed ring, last vertex joined back to the first.
pub fn edges(ring: &[LatLon]) -> impl Iterator<Item = (LatLon, LatLon)> + '_ {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn within_box(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

pub fn on_segment(p: LatLon, a: LatLon, b: LatLon) -> bool {
    let (p, a, b) = (p.xy(), a.xy(), b.xy());
    cross(a, b, p).abs() <= EPSILON && within_box(p, a, b)
}

/// Point-in-polygon by ray casting. Points on an edge count as inside.
pub fn contains(ring: &[LatLon], p: LatLon) -> bool {
    if edges(ring).any(|(a, b)| on_segment(p, a, b)) {
        return true;
    }

    let (x, y) = p.xy();
    let mut inside = false;
    for (a, b) in edges(ring) {
        let ((xi, yi), (xj, yj)) = (a.xy(), b.xy());
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
    }

    inside
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);

    (p.0 - cx).hypot(p.1 - cy)
}

/// Distance to the nearest edge in raw degrees, treating lon and lat alike.
pub fn boundary_distance_deg(ring: &[LatLon], p: LatLon) -> f64 {
    edges(ring)
        .map(|(a, b)| segment_distance(p.xy(), a.xy(), b.xy()))
        .fold(f64::INFINITY, f64::min)
}

/// Distance to the nearest edge in kilometres.
pub fn boundary_distance_km(ring: &[LatLon], p: LatLon) -> f64 {
    let cos_lat = p.lat.to_radians().cos();
    let project = |q: LatLon| {
        (
            (q.lon - p.lon).to_radians() * cos_lat * EARTH_RADIUS_KM,
            (q.lat - p.lat).to_radians() * EARTH_RADIUS_KM,
        )
    };

    edges(ring)
        .map(|(a, b)| segment_distance((0.0, 0.0), project(a), project(b)))
        .fold(f64::INFINITY, f64::min)
}

/// Shoelace area in square degrees; positive when counter-clockwise in (lon, lat).
pub fn signed_area(ring: &[LatLon]) -> f64 {
    edges(ring)
        .map(|(a, b)| a.lon * b.lat - b.lon * a.lat)
        .sum::<f64>()
        / 2.0
}

fn segments_intersect(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
    {
        return true;
    }

    (d1.abs() <= EPSILON && within_box(a, c, d))
        || (d2.abs() <= EPSILON && within_box(b, c, d))
        || (d3.abs() <= EPSILON && within_box(c, a, b))
        || (d4.abs() <= EPSILON && within_box(d, a, b))
}

/// First pair of non-adjacent edges that cross or touch, by edge index.
pub fn self_intersection(ring: &[LatLon]) -> Option<(usize, usize)> {
    let n = ring.len();
    let edge = |i: usize| (ring[i].xy(), ring[(i + 1) % n].xy());

    for i in 0..n {
        for j in (i + 2)..n {
            // Edge n-1 shares vertex 0 with edge 0
            if i == 0 && j == n - 1 {
                continue;
            }
            let ((a, b), (c, d)) = (edge(i), edge(j));
            if segments_intersect(a, b, c, d) {
                return Some((i, j));
            }
        }
    }

    None
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn square() -> Vec<LatLon> {
        vec![
            LatLon::new(41.2, -111.9),
            LatLon::new(42.0, -111.9),
            LatLon::new(42.0, -111.1),
            LatLon::new(41.2, -111.1),
        ]
    }

    #[test]
    fn should_contain_interior_point() {
        assert!(contains(&square(), LatLon::new(41.6, -111.5)));
        assert!(!contains(&square(), LatLon::new(42.1, -111.5)));
    }

    #[test]
    fn should_count_edges_and_vertices_as_inside() {
        let ring = square();
        assert!(contains(&ring, LatLon::new(41.6, -111.1)));
        assert!(contains(&ring, LatLon::new(42.0, -111.5)));
        assert!(contains(&ring, LatLon::new(41.2, -111.9)));
    }

    #[test]
    fn should_measure_boundary_distance() {
        let p = LatLon::new(42.2, -111.5);
        let deg = boundary_distance_deg(&square(), p);
        let km = boundary_distance_km(&square(), p);

        assert!((deg - 0.2).abs() < 1e-9);
        assert!((km - 0.2 * KM_PER_DEGREE_LAT).abs() < 0.1);
    }

    #[test]
    fn should_shrink_longitude_in_kilometres() {
        // 0.2 deg east of the square at 41.6N is ~16.6 km, not ~22 km
        let p = LatLon::new(41.6, -110.9);
        let km = boundary_distance_km(&square(), p);
        let expected = 0.2 * KM_PER_DEGREE_LAT * 41.6_f64.to_radians().cos();

        assert!((km - expected).abs() < 0.1);
        assert!(km < 0.2 * KM_PER_DEGREE_LAT);
    }

    #[test]
    fn should_find_bow_tie_intersection() {
        let bow_tie = vec![
            LatLon::new(0.0, 0.0),
            LatLon::new(1.0, 1.0),
            LatLon::new(1.0, 0.0),
            LatLon::new(0.0, 1.0),
        ];
        assert_eq!(self_intersection(&bow_tie), Some((0, 2)));
        assert_eq!(self_intersection(&square()), None);
    }

    #[test]
    fn should_compute_area() {
        assert!((signed_area(&square()).abs() - 0.64).abs() < 1e-9);
        let line = vec![
            LatLon::new(0.0, 0.0),
            LatLon::new(1.0, 1.0),
            LatLon::new(2.0, 2.0),
        ];
        assert_eq!(signed_area(&line), 0.0);
    }

    #[test]
    fn should_expand_bbox() {
        let bbox = BoundingBox::around(&square()).unwrap().expand(0.1, 0.2);
        assert!(bbox.contains(LatLon::new(42.05, -112.05)));
        assert!(!bbox.contains(LatLon::new(42.15, -111.5)));
    }
}
