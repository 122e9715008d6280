//! State discretization in the track frame

use crate::{CarPose, MdpError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use track_grid::geometry::normalize_angle;
use track_mesh::TrackMesh;

/// Value-table key. Two poses with the same tuple are the same state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscreteState {
    /// Closest waypoint index divided by the segment divisor
    pub segment: usize,
    /// -2 (far left) ..= 2 (far right), positive along the waypoint normal
    pub lane: i8,
    /// 0 (stopped) ..= 3 (fast)
    pub speed_level: u8,
    /// -1 (pointing left of the track), 0 (aligned), 1 (pointing right).
    /// Headings grow clockwise in image coordinates.
    pub heading: i8,
}

/// Bucket thresholds.
///
/// Every bucket is half-open: a value exactly on a lane boundary falls into
/// the lane above it, a speed exactly on a level boundary stays in the level
/// below, and a relative heading of exactly ±`heading_threshold` counts as
/// aligned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscretizerConfig {
    /// Lateral offset separating the center lane from the inner side lanes
    pub lane_inner: f64,
    /// Lateral offset separating the inner side lanes from the outer ones
    pub lane_outer: f64,
    /// Ascending speed thresholds for levels 1, 2 and 3
    pub speed_levels: [f64; 3],
    /// Relative heading beyond which the car counts as turned (radians)
    pub heading_threshold: f64,
    /// Waypoints per segment
    pub segment_divisor: usize,
}

impl Default for DiscretizerConfig {
    fn default() -> Self {
        Self {
            lane_inner: 5.0,
            lane_outer: 15.0,
            speed_levels: [0.5, 4.0, 8.0],
            heading_threshold: PI / 6.0,
            segment_divisor: 5,
        }
    }
}

impl DiscretizerConfig {
    pub fn validate(&self) -> Result<(), MdpError> {
        if !(self.lane_inner > 0.0 && self.lane_outer > self.lane_inner) {
            return Err(MdpError::InvalidConfig(format!(
                "lane thresholds must satisfy 0 < inner < outer, got {} and {}",
                self.lane_inner, self.lane_outer
            )));
        }
        let [s0, s1, s2] = self.speed_levels;
        if !(s0 < s1 && s1 < s2) {
            return Err(MdpError::InvalidConfig(format!(
                "speed levels must be strictly ascending, got {:?}",
                self.speed_levels
            )));
        }
        if !(self.heading_threshold > 0.0 && self.heading_threshold < PI) {
            return Err(MdpError::InvalidConfig(format!(
                "heading threshold must be in (0, π), got {}",
                self.heading_threshold
            )));
        }
        if self.segment_divisor == 0 {
            return Err(MdpError::InvalidConfig(
                "segment divisor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Maps a car pose and mesh to a [`DiscreteState`]. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct StateDiscretizer {
    config: DiscretizerConfig,
}

impl StateDiscretizer {
    pub fn new(config: DiscretizerConfig) -> Result<Self, MdpError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DiscretizerConfig {
        &self.config
    }

    pub fn discretize(&self, pose: &CarPose, mesh: &TrackMesh) -> Result<DiscreteState, MdpError> {
        let (index, wp) = mesh
            .closest_waypoint(pose.position)
            .ok_or(MdpError::EmptyMesh)?;

        let lateral = (pose.position - wp.position).dot(wp.normal);
        let relative = normalize_angle(pose.heading - wp.heading());

        Ok(DiscreteState {
            segment: index / self.config.segment_divisor,
            lane: self.lane_bucket(lateral),
            speed_level: self.speed_bucket(pose.speed),
            heading: self.heading_bucket(relative),
        })
    }

    /// Lane for a signed lateral offset, `[lo, hi)` buckets
    pub fn lane_bucket(&self, lateral: f64) -> i8 {
        let inner = self.config.lane_inner;
        let outer = self.config.lane_outer;
        if lateral < -outer {
            -2
        } else if lateral < -inner {
            -1
        } else if lateral < inner {
            0
        } else if lateral < outer {
            1
        } else {
            2
        }
    }

    /// Speed level; a threshold must be exceeded to reach the next level
    pub fn speed_bucket(&self, speed: f64) -> u8 {
        let [slow, medium, fast] = self.config.speed_levels;
        if speed > fast {
            3
        } else if speed > medium {
            2
        } else if speed > slow {
            1
        } else {
            0
        }
    }

    /// Relative heading bucket for an angle already wrapped into `(-π, π]`
    pub fn heading_bucket(&self, relative: f64) -> i8 {
        let threshold = self.config.heading_threshold;
        if relative < -threshold {
            -1
        } else if relative > threshold {
            1
        } else {
            0
        }
    }
}
