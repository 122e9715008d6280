//! Track Mesh
//!
//! Curvilinear frame for a closed race track:
//! - Waypoint centerline generation from an occupancy grid (seed, walk, center, smooth)
//! - Closest-waypoint and world-to-Frenet queries
//! - Closure and overlap validation before the mesh is trusted for training

pub mod config;
pub mod generator;
pub mod mesh;
mod visited;

pub use config::MeshConfig;
pub use generator::MeshGenerator;
pub use mesh::{FrenetPoint, TrackMesh, WalkTermination, Waypoint};

use thiserror::Error;
use track_grid::GridError;

/// Mesh errors
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Invalid mesh configuration: {0}")]
    InvalidConfig(String),

    #[error("Mesh did not close: walk ended with {termination:?} after {waypoints} waypoints")]
    NotClosed {
        termination: WalkTermination,
        waypoints: usize,
    },

    #[error("Mesh has {count} waypoints, at least {min} required")]
    TooFewWaypoints { count: usize, min: usize },

    #[error("Waypoints {index} and {other} overlap; the walk traced part of the track twice")]
    Overlapping { index: usize, other: usize },
}
