use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Axis-aligned latitude/longitude rectangle.
///
/// Flat comparison only: no antimeridian or curvature handling, which is fine
/// at the scale of a single park.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Inclusive on all four edges.
    pub fn contains(&self, point: Coordinates) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }
}

/// Approximate extent of Central Park.
pub const CENTRAL_PARK_BOUNDS: BoundingBox = BoundingBox {
    north: 40.8005,
    south: 40.7647,
    east: -73.9494,
    west: -73.9818,
};

/// Used when an event has no location record of its own.
pub const CENTRAL_PARK_CENTROID: Coordinates = Coordinates::new(40.7812, -73.9665);

pub fn is_within_central_park(point: Coordinates) -> bool {
    CENTRAL_PARK_BOUNDS.contains(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_is_inside_the_park() {
        assert!(is_within_central_park(CENTRAL_PARK_CENTROID));
    }

    #[test]
    fn null_island_is_outside_the_park() {
        assert!(!is_within_central_park(Coordinates::new(0.0, 0.0)));
    }

    #[test]
    fn edges_are_inclusive() {
        let b = CENTRAL_PARK_BOUNDS;
        assert!(b.contains(Coordinates::new(b.north, b.west)));
        assert!(b.contains(Coordinates::new(b.south, b.east)));
    }

    #[test]
    fn points_just_outside_each_edge_are_rejected() {
        let b = CENTRAL_PARK_BOUNDS;
        let c = CENTRAL_PARK_CENTROID;
        assert!(!b.contains(Coordinates::new(b.north + 0.001, c.lng)));
        assert!(!b.contains(Coordinates::new(b.south - 0.001, c.lng)));
        assert!(!b.contains(Coordinates::new(c.lat, b.east + 0.001)));
        assert!(!b.contains(Coordinates::new(c.lat, b.west - 0.001)));
    }

    #[test]
    fn times_square_is_not_central_park() {
        assert!(!is_within_central_park(Coordinates::new(40.7580, -73.9855)));
    }
}
