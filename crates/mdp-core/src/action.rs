//! Actions, control signals and the observed car pose

use serde::{Deserialize, Serialize};
use track_grid::Vec2;

pub const ACTION_COUNT: usize = 5;

/// Discrete driving action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Coast,
    Throttle,
    Brake,
    SteerLeft,
    SteerRight,
}

impl Action {
    /// All actions in value-table column order
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::Coast,
        Action::Throttle,
        Action::Brake,
        Action::SteerLeft,
        Action::SteerRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    /// Full-scale controls for this action; everything else stays at rest
    pub fn to_controls(self) -> ControlSignals {
        let mut controls = ControlSignals::default();
        match self {
            Action::Coast => {}
            Action::Throttle => controls.throttle = 1.0,
            Action::Brake => controls.brake = 1.0,
            Action::SteerLeft => controls.steering = -1.0,
            Action::SteerRight => controls.steering = 1.0,
        }
        controls
    }
}

/// Inputs handed to the physics model each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSignals {
    /// 0.0 to 1.0
    pub throttle: f64,
    /// 0.0 to 1.0
    pub brake: f64,
    /// -1.0 (left) to 1.0 (right)
    pub steering: f64,
}

impl ControlSignals {
    /// Clamp every channel into its valid range
    pub fn clamped(self) -> Self {
        Self {
            throttle: self.throttle.clamp(0.0, 1.0),
            brake: self.brake.clamp(0.0, 1.0),
            steering: self.steering.clamp(-1.0, 1.0),
        }
    }
}

/// Snapshot of the car as observed by the learner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CarPose {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians, image coordinates (positive turns clockwise on screen)
    pub heading: f64,
    /// Signed scalar speed along the heading
    pub speed: f64,
    pub crashed: bool,
}
