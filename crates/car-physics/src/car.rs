//! Arcade car model

use crate::PhysicsConfig;
use mdp_core::{CarPose, ControlSignals};
use serde::{Deserialize, Serialize};
use tracing::debug;
use track_grid::{CellKind, OccupancyGrid, Vec2};

/// Car state integrated one tick at a time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians, image coordinates
    pub heading: f64,
    /// Signed scalar speed along the heading
    pub speed: f64,
    pub crashed: bool,
    config: PhysicsConfig,
}

/// What the corners of the car touched this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    Clear,
    Gravel,
    Wall,
}

impl Car {
    pub fn new(position: Vec2, heading: f64, config: PhysicsConfig) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            heading,
            speed: 0.0,
            crashed: false,
            config,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Snapshot read by the learner
    pub fn pose(&self) -> CarPose {
        CarPose {
            position: self.position,
            velocity: self.velocity,
            heading: self.heading,
            speed: self.speed,
            crashed: self.crashed,
        }
    }

    /// Put the car back on track at rest
    pub fn respawn(&mut self, position: Vec2, heading: f64) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.heading = heading;
        self.speed = 0.0;
        self.crashed = false;
    }

    /// Advance one tick. A crashed car stays put until respawned.
    ///
    /// The car moves by the velocity it carried into the tick; the new
    /// velocity is then blended toward the heading by the surface grip.
    /// Touching a wall with any corner crashes the car where it stood.
    pub fn apply(&mut self, grid: &OccupancyGrid, controls: ControlSignals) {
        if self.crashed {
            return;
        }
        let cfg = &self.config;
        let controls = controls.clamped();

        self.speed += controls.throttle * cfg.acceleration;
        self.speed -= controls.brake * cfg.braking;

        if self.speed > 0.0 {
            self.speed = (self.speed - cfg.friction).max(0.0);
        } else if self.speed < 0.0 {
            self.speed = (self.speed + cfg.friction).min(0.0);
        }

        if self.speed.abs() > cfg.min_steer_speed {
            self.heading += controls.steering * cfg.turn_speed;
        }

        let target = Vec2::from_angle(self.heading) * self.speed;
        let next_position = self.position + self.velocity;

        let mut grip = cfg.grip;
        match self.contact(grid, next_position) {
            Contact::Wall => {
                debug!(
                    "Crashed at ({:.1}, {:.1}) moving {:.2}",
                    next_position.x, next_position.y, self.speed
                );
                self.crashed = true;
                self.speed = 0.0;
                self.velocity = Vec2::ZERO;
                return;
            }
            Contact::Gravel => {
                grip = cfg.gravel_grip;
                self.speed *= 1.0 - cfg.off_track_drag;
            }
            Contact::Clear => {}
        }

        self.position = next_position;
        self.velocity = self.velocity * (1.0 - grip) + target * grip;
        self.speed = self.speed.clamp(-cfg.max_speed, cfg.max_speed);
    }

    /// Worst surface under the four corners at `center`
    fn contact(&self, grid: &OccupancyGrid, center: Vec2) -> Contact {
        let forward = Vec2::from_angle(self.heading);
        let side = forward.perp();
        let half_length = self.config.car_length / 2.0;
        let half_width = self.config.car_width / 2.0;

        let mut contact = Contact::Clear;
        for (along, across) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
            let corner =
                center + forward * (along * half_length) + side * (across * half_width);
            match grid.cell_at(corner).kind {
                CellKind::Wall => return Contact::Wall,
                CellKind::Gravel => contact = Contact::Gravel,
                _ => {}
            }
        }
        contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn open_tarmac() -> OccupancyGrid {
        OccupancyGrid::from_fn(400, 200, |x, y| {
            if x < 5 || y < 5 || x >= 395 || y >= 195 {
                CellKind::Wall
            } else {
                CellKind::Tarmac
            }
        })
    }

    fn throttle() -> ControlSignals {
        ControlSignals {
            throttle: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_throttle_accelerates_with_friction() {
        let grid = open_tarmac();
        let mut car = Car::new(Vec2::new(100.0, 100.0), 0.0, PhysicsConfig::default());

        car.apply(&grid, throttle());
        assert!((car.speed - 0.15).abs() < 1e-12);
        // Moves by the velocity carried in, which was zero
        assert_eq!(car.position, Vec2::new(100.0, 100.0));
        assert!((car.velocity.x - 0.135).abs() < 1e-12);

        car.apply(&grid, throttle());
        assert!((car.position.x - 100.135).abs() < 1e-12);
        assert!((car.speed - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_friction_never_reverses() {
        let grid = open_tarmac();
        let mut car = Car::new(Vec2::new(100.0, 100.0), 0.0, PhysicsConfig::default());
        car.speed = 0.03;
        car.apply(&grid, ControlSignals::default());
        assert_eq!(car.speed, 0.0);

        car.speed = -0.03;
        car.apply(&grid, ControlSignals::default());
        assert_eq!(car.speed, 0.0);
    }

    #[test]
    fn test_brake_reverses_from_rest() {
        let grid = open_tarmac();
        let mut car = Car::new(Vec2::new(100.0, 100.0), 0.0, PhysicsConfig::default());
        car.apply(
            &grid,
            ControlSignals {
                brake: 1.0,
                ..Default::default()
            },
        );
        assert!((car.speed + 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_steering_needs_speed() {
        let grid = open_tarmac();
        let right = ControlSignals {
            steering: 1.0,
            ..Default::default()
        };

        let mut parked = Car::new(Vec2::new(100.0, 100.0), 0.0, PhysicsConfig::default());
        parked.apply(&grid, right);
        assert_eq!(parked.heading, 0.0);

        let mut moving = Car::new(Vec2::new(100.0, 100.0), 0.0, PhysicsConfig::default());
        moving.speed = 3.0;
        moving.apply(&grid, right);
        assert!((moving.heading - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_speed_clamped() {
        let grid = open_tarmac();
        let mut car = Car::new(Vec2::new(100.0, 100.0), 0.0, PhysicsConfig::point_mass());
        car.speed = 9.9;
        car.apply(&grid, throttle());
        assert_eq!(car.speed, 10.0);
    }

    #[test]
    fn test_wall_contact_crashes_in_place() {
        let grid = open_tarmac();
        let mut car = Car::new(Vec2::new(375.0, 100.0), 0.0, PhysicsConfig::default());
        car.velocity = Vec2::new(10.0, 0.0);
        car.speed = 10.0;

        // Front corners at 375 + 10 + 11.25 reach the wall at x >= 395
        car.apply(&grid, throttle());
        assert!(car.crashed);
        assert_eq!(car.speed, 0.0);
        assert_eq!(car.position, Vec2::new(375.0, 100.0));

        // Crashed cars ignore input
        car.apply(&grid, throttle());
        assert_eq!(car.speed, 0.0);
        assert!(car.pose().crashed);

        car.respawn(Vec2::new(100.0, 100.0), 1.0);
        assert!(!car.crashed);
        assert_eq!(car.heading, 1.0);
        assert_eq!(car.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_gravel_drags() {
        let grid = OccupancyGrid::from_fn(400, 200, |x, _| {
            if x >= 200 {
                CellKind::Gravel
            } else {
                CellKind::Tarmac
            }
        });
        let config = PhysicsConfig::point_mass();

        let mut on_tarmac = Car::new(Vec2::new(100.0, 100.0), 0.0, config.clone());
        on_tarmac.speed = 5.0;
        on_tarmac.apply(&grid, ControlSignals::default());

        let mut on_gravel = Car::new(Vec2::new(300.0, 100.0), 0.0, config);
        on_gravel.speed = 5.0;
        on_gravel.apply(&grid, ControlSignals::default());

        assert!((on_tarmac.speed - 4.95).abs() < 1e-12);
        assert!((on_gravel.speed - 4.95 * 0.8).abs() < 1e-12);
        assert!(on_gravel.velocity.x < on_tarmac.velocity.x);
    }

    #[test]
    fn test_out_of_bounds_is_wall() {
        let grid = open_tarmac();
        let mut car = Car::new(Vec2::new(-50.0, 100.0), 0.0, PhysicsConfig::point_mass());
        car.apply(&grid, ControlSignals::default());
        assert!(car.crashed);
    }

    proptest! {
        #[test]
        fn prop_speed_stays_bounded(
            inputs in proptest::collection::vec((0.0f64..1.0, 0.0f64..1.0, -1.0f64..1.0), 1..200)
        ) {
            let grid = OccupancyGrid::from_fn(64, 64, |_, _| CellKind::Tarmac);
            let mut car = Car::new(Vec2::new(32.0, 32.0), 0.0, PhysicsConfig::point_mass());
            for (throttle, brake, steering) in inputs {
                car.apply(&grid, ControlSignals { throttle, brake, steering });
                prop_assert!(car.speed.abs() <= car.config().max_speed);
                if car.crashed {
                    prop_assert_eq!(car.speed, 0.0);
                    break;
                }
            }
        }
    }
}
