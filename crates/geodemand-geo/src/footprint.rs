//! Zone footprints and planar distance in degree space.
//!
//! Distances here are Euclidean over raw (lat, lng) degrees. One degree of
//! longitude is shorter than one degree of latitude away from the equator,
//! so a radius is not a fixed number of meters.

use geo::algorithm::centroid::Centroid;
use geo::{Distance, Euclidean, MultiPoint, Point};
use geodemand_core::models::Coordinate;

/// Half-width of a zone footprint square, in degrees
pub const ZONE_HALF_WIDTH_DEG: f64 = 0.0025;

/// Radius around a zone centroid within which an event belongs to the zone
pub const ZONE_RADIUS_DEG: f64 = 0.005;

fn to_point(coordinate: &Coordinate) -> Point<f64> {
    Point::new(coordinate.lng, coordinate.lat)
}

/// Closed square ring around `center`.
///
/// Vertices run counter-clockwise from the south-west corner and the first
/// vertex is repeated last, giving five points.
pub fn square_ring(center: &Coordinate, half_width: f64) -> Vec<Coordinate> {
    let south = center.lat - half_width;
    let north = center.lat + half_width;
    let west = center.lng - half_width;
    let east = center.lng + half_width;

    vec![
        Coordinate::new(south, west),
        Coordinate::new(south, east),
        Coordinate::new(north, east),
        Coordinate::new(north, west),
        Coordinate::new(south, west),
    ]
}

/// Mean of the distinct vertices of a ring.
///
/// A trailing vertex equal to the first is treated as the closing point and
/// excluded. Returns `None` for an empty ring.
pub fn centroid(ring: &[Coordinate]) -> Option<Coordinate> {
    let vertices = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };

    let points: MultiPoint<f64> = vertices.iter().map(to_point).collect();
    points.centroid().map(|p| Coordinate::new(p.y(), p.x()))
}

/// Euclidean distance between two coordinates in degrees
pub fn degree_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    Euclidean.distance(to_point(a), to_point(b))
}

/// Whether `point` lies within `radius` degrees of `center` (inclusive)
pub fn within_radius(center: &Coordinate, point: &Coordinate, radius: f64) -> bool {
    degree_distance(center, point) <= radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_ring_is_closed() {
        let ring = square_ring(&Coordinate::new(37.5, 127.0), ZONE_HALF_WIDTH_DEG);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert!((ring[0].lat - 37.4975).abs() < 1e-12);
        assert!((ring[2].lng - 127.0025).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_excludes_closing_vertex() {
        let center = Coordinate::new(37.5, 127.035);
        let ring = square_ring(&center, ZONE_HALF_WIDTH_DEG);
        let c = centroid(&ring).unwrap();
        assert!((c.lat - center.lat).abs() < 1e-12);
        assert!((c.lng - center.lng).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_open_ring_and_empty() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 3.0),
            Coordinate::new(3.0, 0.0),
        ];
        let c = centroid(&ring).unwrap();
        assert!((c.lat - 1.0).abs() < 1e-12);
        assert!((c.lng - 1.0).abs() < 1e-12);

        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_degree_distance() {
        let a = Coordinate::new(37.5, 127.0);
        let b = Coordinate::new(37.503, 127.004);
        assert!((degree_distance(&a, &b) - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_within_radius_is_inclusive() {
        let center = Coordinate::new(37.5, 127.0);
        assert!(within_radius(&center, &Coordinate::new(37.503, 127.004), ZONE_RADIUS_DEG + 1e-12));
        assert!(within_radius(&center, &Coordinate::new(37.5, 127.0049), ZONE_RADIUS_DEG));
        assert!(!within_radius(&center, &Coordinate::new(37.5, 127.0051), ZONE_RADIUS_DEG));
    }
}
