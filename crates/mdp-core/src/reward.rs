//! Shaped reward with checkpoint and lap bookkeeping
//!
//! Terms are evaluated in a fixed order. A crash short-circuits everything
//! else; all other terms add up. Checkpoint progress only counts when the
//! closest waypoint moves forward by less than the skip bound, so cutting
//! across the infield never pays.

use crate::{CarPose, MdpError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use track_grid::{CellKind, OccupancyGrid};
use track_mesh::TrackMesh;

/// Reward weights and penalties. Penalties are positive magnitudes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Returned (negated) when the car has crashed
    pub crash_penalty: f64,
    /// Multiplier on velocity projected onto the track tangent
    pub progress_weight: f64,
    /// Lateral offset beyond which the edge penalty applies
    pub edge_threshold: f64,
    pub edge_penalty: f64,
    pub gravel_penalty: f64,
    /// Paid every tick
    pub tick_penalty: f64,
    /// Speeds below this count as idling
    pub idle_speed: f64,
    pub idle_penalty: f64,
    /// Backward speed along the track that triggers the wrong-way penalty
    pub wrong_way_speed: f64,
    pub wrong_way_penalty: f64,
    /// Largest forward waypoint jump still accepted as progress. Capped at
    /// half the mesh so a jump can never be read both ways.
    pub checkpoint_skip_bound: usize,
    pub milestone_bonus: f64,
    pub lap_bonus: f64,
    /// Bonus per tick the completed lap beat the best lap by
    pub improvement_per_tick: f64,
    pub personal_best_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            crash_penalty: 100.0,
            progress_weight: 2.0,
            edge_threshold: 20.0,
            edge_penalty: 2.0,
            gravel_penalty: 5.0,
            tick_penalty: 0.1,
            idle_speed: 0.1,
            idle_penalty: 1.0,
            wrong_way_speed: 0.5,
            wrong_way_penalty: 10.0,
            checkpoint_skip_bound: 10,
            milestone_bonus: 1.0,
            lap_bonus: 100.0,
            improvement_per_tick: 1.0,
            personal_best_bonus: 50.0,
        }
    }
}

impl RewardConfig {
    /// Pure speed reward: progress, crash and gravel only
    pub fn progress_only() -> Self {
        Self {
            edge_penalty: 0.0,
            tick_penalty: 0.0,
            idle_penalty: 0.0,
            wrong_way_penalty: 0.0,
            milestone_bonus: 0.0,
            lap_bonus: 0.0,
            improvement_per_tick: 0.0,
            personal_best_bonus: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), MdpError> {
        let magnitudes = [
            ("crash_penalty", self.crash_penalty),
            ("edge_threshold", self.edge_threshold),
            ("edge_penalty", self.edge_penalty),
            ("gravel_penalty", self.gravel_penalty),
            ("tick_penalty", self.tick_penalty),
            ("idle_speed", self.idle_speed),
            ("idle_penalty", self.idle_penalty),
            ("wrong_way_speed", self.wrong_way_speed),
            ("wrong_way_penalty", self.wrong_way_penalty),
            ("milestone_bonus", self.milestone_bonus),
            ("lap_bonus", self.lap_bonus),
            ("improvement_per_tick", self.improvement_per_tick),
            ("personal_best_bonus", self.personal_best_bonus),
        ];
        for (name, value) in magnitudes {
            if value.is_nan() || value < 0.0 {
                return Err(MdpError::InvalidConfig(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if !self.progress_weight.is_finite() {
            return Err(MdpError::InvalidConfig(format!(
                "progress_weight must be finite, got {}",
                self.progress_weight
            )));
        }
        if self.checkpoint_skip_bound == 0 {
            return Err(MdpError::InvalidConfig(
                "checkpoint_skip_bound must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Checkpoint and lap state carried between ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapProgress {
    /// Last waypoint accepted as valid progress; `None` before the first one
    pub checkpoint: Option<usize>,
    /// Laps completed since the last respawn
    pub laps: u32,
    /// Ticks spent on the current lap
    pub current_lap_ticks: u64,
}

impl LapProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Signed contribution of every reward term for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    pub progress: f64,
    pub edge: f64,
    pub gravel: f64,
    pub tick: f64,
    pub idle: f64,
    pub wrong_way: f64,
    pub milestone: f64,
    pub lap_bonus: f64,
    pub improvement: f64,
    pub crash: f64,
}

impl RewardComponents {
    pub fn total(&self) -> f64 {
        self.progress
            + self.edge
            + self.gravel
            + self.tick
            + self.idle
            + self.wrong_way
            + self.milestone
            + self.lap_bonus
            + self.improvement
            + self.crash
    }
}

/// Result of scoring one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardOutcome {
    pub value: f64,
    /// Lap state to carry into the next tick
    pub progress: LapProgress,
    pub components: RewardComponents,
    /// Tick count of the lap completed on this tick, if any
    pub lap_completed: Option<u64>,
}

/// How a checkpoint move was judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckpointMove {
    Advance,
    Lap,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct RewardFunction {
    config: RewardConfig,
}

impl RewardFunction {
    pub fn new(config: RewardConfig) -> Result<Self, MdpError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Score one tick. `best_lap` is the best completed lap in ticks so far.
    pub fn evaluate(
        &self,
        pose: &CarPose,
        grid: &OccupancyGrid,
        mesh: &TrackMesh,
        best_lap: Option<u64>,
        progress: &LapProgress,
    ) -> Result<RewardOutcome, MdpError> {
        let cfg = &self.config;
        let mut components = RewardComponents::default();
        let mut next = *progress;

        if pose.crashed {
            components.crash = -cfg.crash_penalty;
            return Ok(RewardOutcome {
                value: components.total(),
                progress: next,
                components,
                lap_completed: None,
            });
        }

        let (index, wp) = mesh
            .closest_waypoint(pose.position)
            .ok_or(MdpError::EmptyMesh)?;

        let speed_along = pose.velocity.dot(wp.tangent());
        components.progress = speed_along * cfg.progress_weight;

        let lateral = (pose.position - wp.position).dot(wp.normal);
        if lateral.abs() > cfg.edge_threshold {
            components.edge = -cfg.edge_penalty;
        }

        if grid.cell_at(pose.position).kind == CellKind::Gravel {
            components.gravel = -cfg.gravel_penalty;
        }

        components.tick = -cfg.tick_penalty;
        if pose.speed.abs() < cfg.idle_speed {
            components.idle = -cfg.idle_penalty;
        }

        if speed_along < -cfg.wrong_way_speed {
            components.wrong_way = -cfg.wrong_way_penalty;
        }

        let mut lap_completed = None;
        match self.judge_checkpoint(progress.checkpoint, index, mesh.len()) {
            CheckpointMove::Rejected => {}
            movement => {
                if movement == CheckpointMove::Lap {
                    let ticks = progress.current_lap_ticks;
                    next.laps += 1;
                    next.current_lap_ticks = 0;
                    components.lap_bonus = cfg.lap_bonus;
                    components.improvement = self.improvement_bonus(ticks, best_lap);
                    lap_completed = Some(ticks);
                    info!(
                        "Lap {} completed in {} ticks (best: {:?})",
                        next.laps, ticks, best_lap
                    );
                }
                next.checkpoint = Some(index);
                components.milestone = cfg.milestone_bonus;
            }
        }

        Ok(RewardOutcome {
            value: components.total(),
            progress: next,
            components,
            lap_completed,
        })
    }

    fn judge_checkpoint(
        &self,
        previous: Option<usize>,
        index: usize,
        len: usize,
    ) -> CheckpointMove {
        let Some(previous) = previous else {
            return CheckpointMove::Advance;
        };
        if len == 0 {
            return CheckpointMove::Rejected;
        }

        let bound = self.config.checkpoint_skip_bound.min(len / 2).max(1);
        let forward = (index + len - previous) % len;

        if forward == 0 || forward >= bound {
            if forward != 0 {
                debug!(
                    "Rejected checkpoint jump {} -> {} ({} ahead, bound {})",
                    previous, index, forward, bound
                );
            }
            CheckpointMove::Rejected
        } else if index < previous {
            CheckpointMove::Lap
        } else {
            CheckpointMove::Advance
        }
    }

    fn improvement_bonus(&self, ticks: u64, best_lap: Option<u64>) -> f64 {
        match best_lap {
            Some(best) if ticks < best => {
                (best - ticks) as f64 * self.config.improvement_per_tick
                    + self.config.personal_best_bonus
            }
            Some(_) => 0.0,
            None => self.config.personal_best_bonus,
        }
    }
}
