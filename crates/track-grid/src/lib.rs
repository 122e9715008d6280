//! Track Occupancy Grid
//!
//! Turns a decoded raster track image into a read-only grid of surface cells:
//! - 2D vector algebra shared by every crate in the workspace
//! - Colour classification (tarmac, gravel, wall, start and direction markers)
//! - Bounds-safe cell lookup (anything outside the image is a wall)
//! - Marker centroids and seed point search for mesh generation
//! - Synthetic track images for tests and tooling

pub mod cell;
pub mod geometry;
pub mod grid;
pub mod synthetic;

pub use cell::{classify_color, Cell, CellKind};
pub use geometry::Vec2;
pub use grid::OccupancyGrid;

use thiserror::Error;

/// Grid construction errors
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Grid contains no start marker and no drivable tarmac")]
    NoDrivableCell,
}
