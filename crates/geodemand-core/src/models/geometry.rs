use serde::{Deserialize, Serialize};

/// A WGS 84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned bounding box in decimal degrees.
///
/// Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self { min_lat, min_lng, max_lat, max_lng }
    }

    /// Serviced metropolitan area used when no other area is configured
    pub fn seoul_metro() -> Self {
        Self::new(37.40, 126.75, 37.72, 127.20)
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    /// Check that the box is non-empty and within WGS 84 limits
    pub fn validate(&self) -> std::result::Result<(), String> {
        let finite = [self.min_lat, self.min_lng, self.max_lat, self.max_lng]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err("bounds must be finite numbers".to_string());
        }
        if self.min_lat >= self.max_lat {
            return Err(format!("min_lat ({}) must be below max_lat ({})", self.min_lat, self.max_lat));
        }
        if self.min_lng >= self.max_lng {
            return Err(format!("min_lng ({}) must be below max_lng ({})", self.min_lng, self.max_lng));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err("latitude must be within [-90, 90]".to_string());
        }
        if self.min_lng < -180.0 || self.max_lng > 180.0 {
            return Err("longitude must be within [-180, 180]".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_contains_edges() {
        let bbox = BoundingBox::new(37.0, 127.0, 38.0, 128.0);
        assert!(bbox.contains(&Coordinate::new(37.0, 127.0)));
        assert!(bbox.contains(&Coordinate::new(38.0, 128.0)));
        assert!(bbox.contains(&Coordinate::new(37.5, 127.5)));
        assert!(!bbox.contains(&Coordinate::new(36.99, 127.5)));
        assert!(!bbox.contains(&Coordinate::new(37.5, 128.01)));
    }

    #[test]
    fn test_bbox_validate() {
        assert!(BoundingBox::seoul_metro().validate().is_ok());
        assert!(BoundingBox::new(38.0, 127.0, 37.0, 128.0).validate().is_err());
        assert!(BoundingBox::new(37.0, 128.0, 38.0, 127.0).validate().is_err());
        assert!(BoundingBox::new(37.0, f64::NAN, 38.0, 128.0).validate().is_err());
    }
}
