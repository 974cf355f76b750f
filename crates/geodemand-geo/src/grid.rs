//! Fixed-resolution grid binning.
//!
//! Each axis is rounded independently to the nearest multiple of the
//! resolution. Cells are identified by integer indices so equality and
//! hashing are exact; the snapped coordinate and the textual key are
//! derived from the indices.

use geodemand_core::models::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid step, stored in millionths of a degree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    micro_degrees: u32,
}

impl Resolution {
    /// 0.005° grid used for zone discovery
    pub const COARSE: Resolution = Resolution { micro_degrees: 5_000 };

    /// 0.002° grid used for the heatmap
    pub const FINE: Resolution = Resolution { micro_degrees: 2_000 };

    /// Build a resolution from decimal degrees, rejecting non-positive
    /// steps and steps finer than a millionth of a degree
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() || degrees <= 0.0 {
            return None;
        }
        let micro = (degrees * 1_000_000.0).round();
        if micro < 1.0 || micro > f64::from(u32::MAX) {
            return None;
        }
        Some(Self { micro_degrees: micro as u32 })
    }

    pub fn degrees(&self) -> f64 {
        f64::from(self.micro_degrees) / 1_000_000.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// One cell of a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub lat_index: i64,
    pub lng_index: i64,
    pub resolution: Resolution,
}

impl GridCell {
    /// Snapped coordinate of the cell
    pub fn center(&self) -> Coordinate {
        let step = self.resolution.degrees();
        Coordinate::new(self.lat_index as f64 * step, self.lng_index as f64 * step)
    }

    /// Stable textual identity, e.g. `"37.5000:127.0350"`
    pub fn key(&self) -> String {
        let center = self.center();
        format!("{:.4}:{:.4}", center.lat, center.lng)
    }

    /// The cell `steps` grid steps away along each axis
    pub fn offset(&self, lat_steps: i64, lng_steps: i64) -> Self {
        Self {
            lat_index: self.lat_index + lat_steps,
            lng_index: self.lng_index + lng_steps,
            resolution: self.resolution,
        }
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Snap a coordinate onto the grid of the given resolution
pub fn snap(coordinate: &Coordinate, resolution: Resolution) -> GridCell {
    let step = resolution.degrees();
    GridCell {
        lat_index: (coordinate.lat / step).round() as i64,
        lng_index: (coordinate.lng / step).round() as i64,
        resolution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_snap_to_nearest_multiple() {
        let cell = snap(&Coordinate::new(37.5012, 127.0338), Resolution::COARSE);
        assert_eq!(cell.key(), "37.5000:127.0350");

        let center = cell.center();
        assert!((center.lat - 37.5).abs() < 1e-9);
        assert!((center.lng - 127.035).abs() < 1e-9);
    }

    #[test]
    fn test_same_cell_same_key() {
        let a = snap(&Coordinate::new(37.5001, 127.0001), Resolution::COARSE);
        let b = snap(&Coordinate::new(37.4999, 126.9999), Resolution::COARSE);
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_one_step_apart_differs() {
        let a = snap(&Coordinate::new(37.5, 127.0), Resolution::COARSE);
        let b = snap(&Coordinate::new(37.505, 127.0), Resolution::COARSE);
        assert_ne!(a.key(), b.key());
        assert_eq!(b, a.offset(1, 0));
    }

    #[test]
    fn test_fine_grid() {
        let cell = snap(&Coordinate::new(37.5031, 127.0009), Resolution::FINE);
        assert_eq!(cell.key(), "37.5040:127.0000");
    }

    #[test]
    fn test_negative_coordinates() {
        let cell = snap(&Coordinate::new(-33.8688, 151.2093), Resolution::COARSE);
        assert_eq!(cell.key(), "-33.8700:151.2100");
    }

    #[test]
    fn test_resolution_from_degrees() {
        assert_eq!(Resolution::from_degrees(0.005), Some(Resolution::COARSE));
        assert_eq!(Resolution::from_degrees(0.002), Some(Resolution::FINE));
        assert!(Resolution::from_degrees(0.0).is_none());
        assert!(Resolution::from_degrees(-0.5).is_none());
        assert!(Resolution::from_degrees(f64::NAN).is_none());
    }

    proptest! {
        #[test]
        fn prop_snapped_center_is_within_half_step(
            lat in -90.0f64..90.0,
            lng in -180.0f64..180.0,
        ) {
            let cell = snap(&Coordinate::new(lat, lng), Resolution::COARSE);
            let center = cell.center();
            let half = Resolution::COARSE.degrees() / 2.0 + 1e-9;
            prop_assert!((center.lat - lat).abs() <= half);
            prop_assert!((center.lng - lng).abs() <= half);
        }

        #[test]
        fn prop_snap_is_idempotent(
            lat in -90.0f64..90.0,
            lng in -180.0f64..180.0,
        ) {
            let cell = snap(&Coordinate::new(lat, lng), Resolution::FINE);
            prop_assert_eq!(snap(&cell.center(), Resolution::FINE), cell);
        }

        #[test]
        fn prop_adjacent_cells_have_distinct_keys(
            lat in -89.0f64..89.0,
            lng in -179.0f64..179.0,
        ) {
            let cell = snap(&Coordinate::new(lat, lng), Resolution::COARSE);
            prop_assert_ne!(cell.key(), cell.offset(1, 0).key());
            prop_assert_ne!(cell.key(), cell.offset(0, 1).key());
        }
    }
}
