//! Mesh generation configuration

use crate::MeshError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use track_grid::Vec2;

/// Mesh generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Distance the walker advances per step (also the nominal waypoint spacing)
    pub step_size: f64,

    /// Hard cap on walker steps
    pub max_iterations: usize,

    /// Travel direction when the grid has no direction marker
    pub default_direction: Vec2,

    /// Search radius for the seed width scan
    pub width_search_radius: f64,

    /// Seed widths below this are treated as "no wall found"
    pub min_width: f64,

    /// Width used when the seed scan finds no walls
    pub default_width: f64,

    /// Half-angle of the candidate fan around the travel direction (radians)
    pub fan_half_angle: f64,

    /// Angular spacing of fan candidates (radians)
    pub fan_step: f64,

    /// Ray march increment
    pub ray_step: f64,

    /// Maximum ray depth
    pub lookahead: f64,

    /// Score multiplier for a straight-ahead ray; falls off by |angle|/π
    pub straight_bias: f64,

    /// Score multiplier for rays crossing already traced track
    pub visited_penalty: f64,

    /// Half-size of the square marked visited around each waypoint (cells)
    pub visited_radius: i64,

    /// Cells marked within this many steps do not count as visited
    pub trail_grace_steps: usize,

    /// Weight of the newly chosen heading when blending the travel direction
    pub direction_blend: f64,

    /// Steps before loop closure is considered
    pub min_closure_steps: usize,

    /// Closure distance to the start center, in step lengths
    pub closure_radius_steps: f64,

    /// Distance from the start center, in step lengths, that counts as having left it
    pub departure_steps: f64,

    /// Elastic-band relaxation passes
    pub centering_passes: usize,

    /// Wall search radius during centering
    pub centering_radius: f64,

    /// Fraction of the centering correction applied per pass
    pub centering_damping: f64,

    /// Largest move of a single waypoint in one centering pass
    pub max_centering_shift: f64,

    /// Resample a closed loop at uniform `step_size` spacing after centering
    pub resample_closed: bool,

    /// Moving-average window for positions (odd)
    pub position_window: usize,

    pub position_passes: usize,

    /// Moving-average window for normals (odd)
    pub normal_window: usize,

    pub normal_passes: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            step_size: 6.0,
            max_iterations: 6000,
            default_direction: Vec2::new(1.0, 0.0),
            width_search_radius: 100.0,
            min_width: 2.0,
            default_width: 20.0,
            fan_half_angle: PI / 1.5,
            fan_step: PI / 64.0,
            ray_step: 2.0,
            lookahead: 100.0,
            straight_bias: 1.1,
            visited_penalty: 0.1,
            visited_radius: 2,
            trail_grace_steps: 3,
            direction_blend: 0.6,
            min_closure_steps: 10,
            closure_radius_steps: 2.0,
            departure_steps: 5.0,
            centering_passes: 10,
            centering_radius: 80.0,
            centering_damping: 0.5,
            max_centering_shift: 3.0,
            resample_closed: true,
            position_window: 3,
            position_passes: 2,
            normal_window: 5,
            normal_passes: 2,
        }
    }
}

impl MeshConfig {
    /// Denser sampling for narrow or twisty tracks
    pub fn fine() -> Self {
        Self {
            step_size: 4.0,
            fan_step: PI / 96.0,
            ray_step: 1.0,
            centering_passes: 15,
            ..Default::default()
        }
    }

    /// Distance within which the walk counts as back at the start
    pub fn closure_distance(&self) -> f64 {
        self.step_size * self.closure_radius_steps
    }

    /// Distance from the start the walker must reach before it may close
    pub fn departure_distance(&self) -> f64 {
        self.step_size * self.departure_steps
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        let positive = [
            ("step_size", self.step_size),
            ("fan_half_angle", self.fan_half_angle),
            ("fan_step", self.fan_step),
            ("ray_step", self.ray_step),
            ("lookahead", self.lookahead),
            ("default_width", self.default_width),
            ("max_centering_shift", self.max_centering_shift),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(MeshError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.direction_blend.is_nan()
            || self.direction_blend <= 0.0
            || self.direction_blend > 1.0
        {
            return Err(MeshError::InvalidConfig(format!(
                "direction_blend must be in (0, 1], got {}",
                self.direction_blend
            )));
        }

        for (name, window) in [
            ("position_window", self.position_window),
            ("normal_window", self.normal_window),
        ] {
            if window % 2 == 0 {
                return Err(MeshError::InvalidConfig(format!(
                    "{} must be odd, got {}",
                    name, window
                )));
            }
        }

        if self.default_direction.length() == 0.0 {
            return Err(MeshError::InvalidConfig(
                "default_direction must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
