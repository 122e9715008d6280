//! Physics configuration

use serde::{Deserialize, Serialize};

/// Vehicle dynamics constants. Distances are grid cells, times are ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Speed clamp (cells per tick), applied in both directions
    pub max_speed: f64,

    /// Speed gained per tick at full throttle
    pub acceleration: f64,

    /// Speed lost per tick at full brake
    pub braking: f64,

    /// Rolling resistance pulling speed toward zero every tick
    pub friction: f64,

    /// Heading change per tick at full lock (radians)
    pub turn_speed: f64,

    /// Minimum |speed| for steering to take effect
    pub min_steer_speed: f64,

    /// Fraction of speed lost per tick with any wheel on gravel
    pub off_track_drag: f64,

    /// Velocity blend toward the heading on tarmac (1.0 = no drift)
    pub grip: f64,

    /// Velocity blend toward the heading with a wheel on gravel
    pub gravel_grip: f64,

    /// Car footprint (cells)
    pub car_width: f64,
    pub car_length: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_speed: 10.0,
            acceleration: 0.2,
            braking: 0.4,
            friction: 0.05,
            turn_speed: 0.05,
            min_steer_speed: 0.1,
            off_track_drag: 0.2,
            grip: 0.9,
            gravel_grip: 0.5,
            car_width: 10.0,
            car_length: 22.5,
        }
    }
}

impl PhysicsConfig {
    /// Point-sized car for tests on narrow synthetic tracks
    pub fn point_mass() -> Self {
        Self {
            car_width: 0.0,
            car_length: 0.0,
            ..Default::default()
        }
    }
}
