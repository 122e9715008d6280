//! Car Physics
//!
//! Arcade dynamics behind the learner's physics boundary:
//! - Throttle, braking and rolling friction on a scalar speed
//! - Steering that only bites while the car is moving
//! - Grip-blended velocity that lets the car drift
//! - Four-corner collision against the occupancy grid (walls crash, gravel drags)

pub mod car;
pub mod config;

pub use car::Car;
pub use config::PhysicsConfig;
