//! geodemand Geo - Grid binning and degree-space geometry
//!
//! This crate snaps coordinates onto fixed-resolution grids, builds zone
//! footprints, measures planar distances in degree space, and converts
//! pipeline outputs to GeoJSON.

pub mod features;
pub mod footprint;
pub mod grid;

pub use footprint::{centroid, degree_distance, square_ring, within_radius};
pub use grid::{snap, GridCell, Resolution};
