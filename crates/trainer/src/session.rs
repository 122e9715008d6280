//! Training session tick loop
//!
//! One tick: discretize the current pose, pick an action, integrate the
//! physics, score the move and learn from it. A crashed car is scored once
//! more as terminal, learned from, and respawned on the next tick.

use crate::TrainerSettings;
use car_physics::Car;
use mdp_core::{
    Action, LapProgress, MdpError, QLearningAgent, RewardFunction, RewardOutcome, StateDiscretizer,
};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use track_grid::{OccupancyGrid, Vec2};
use track_mesh::TrackMesh;

/// Crashes this soon after a respawn count toward a crash streak
const QUICK_CRASH_TICKS: u64 = 10;

/// Consecutive quick crashes that get reported
const CRASH_STREAK_WARN: u32 = 10;

/// Running counters for the whole session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub ticks: u64,
    pub crashes: u64,
    pub laps_completed: u64,
    /// Fastest completed lap (ticks)
    pub best_lap: Option<u64>,
    /// Most recent completed lap (ticks)
    pub last_lap: Option<u64>,
    pub total_reward: f64,
}

/// End-of-run report printed by the binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub stats: SessionStats,
    pub q_table_states: usize,
    pub epsilon: f64,
    pub waypoints: usize,
    pub track_length: f64,
    /// Trace of the best lap, if one was completed
    pub best_lap_trace: Vec<Vec2>,
}

/// A completed lap and the line driven
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub ticks: u64,
    pub trace: Vec<Vec2>,
}

/// What happened on one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub action: Action,
    pub reward: f64,
    /// The car was respawned after a crash on this tick
    pub respawned: bool,
    pub lap_completed: Option<u64>,
}

pub struct TrainingSession {
    grid: OccupancyGrid,
    mesh: TrackMesh,
    car: Car,
    agent: QLearningAgent,
    discretizer: StateDiscretizer,
    reward: RewardFunction,
    progress: LapProgress,
    spawn: (Vec2, f64),
    trace: Vec<Vec2>,
    best_trace: Vec<Vec2>,
    history: VecDeque<LapRecord>,
    stats: SessionStats,
    trace_interval: u64,
    history_len: usize,
    report_interval: u64,
    ticks_since_respawn: u64,
    crash_streak: u32,
}

impl TrainingSession {
    pub fn new(
        grid: OccupancyGrid,
        mesh: TrackMesh,
        settings: &TrainerSettings,
    ) -> Result<Self, MdpError> {
        let spawn = spawn_pose(&mesh, settings.spawn_waypoint)?;
        let car = Car::new(spawn.0, spawn.1, settings.physics.clone());

        info!(
            "Session ready: spawn at ({:.1}, {:.1}) heading {:.2} rad, {} waypoints",
            spawn.0.x,
            spawn.0.y,
            spawn.1,
            mesh.len()
        );

        Ok(Self {
            agent: QLearningAgent::new(settings.agent.clone())?,
            discretizer: StateDiscretizer::new(settings.discretizer.clone())?,
            reward: RewardFunction::new(settings.reward.clone())?,
            grid,
            mesh,
            car,
            progress: LapProgress::new(),
            spawn,
            trace: Vec::new(),
            best_trace: Vec::new(),
            history: VecDeque::with_capacity(settings.lap_history),
            stats: SessionStats::default(),
            trace_interval: settings.trace_interval.max(1),
            history_len: settings.lap_history.max(1),
            report_interval: settings.report_interval.max(1),
            ticks_since_respawn: 0,
            crash_streak: 0,
        })
    }

    /// Run one tick of the learning loop
    pub fn tick(&mut self) -> Result<TickReport, MdpError> {
        self.stats.ticks += 1;
        self.ticks_since_respawn += 1;
        self.progress.current_lap_ticks += 1;

        if self.stats.ticks % self.trace_interval == 0 {
            self.trace.push(self.car.position);
        }

        let state = self.discretizer.discretize(&self.car.pose(), &self.mesh)?;
        let action = self.agent.select_action(&state);

        if self.car.crashed {
            let outcome = self.evaluate()?;
            self.agent.learn(state, action, outcome.value, state);
            self.stats.total_reward += outcome.value;
            self.respawn();
            return Ok(TickReport {
                action,
                reward: outcome.value,
                respawned: true,
                lap_completed: None,
            });
        }

        self.car.apply(&self.grid, action.to_controls());

        let outcome = self.evaluate()?;
        self.progress = outcome.progress;
        if let Some(ticks) = outcome.lap_completed {
            self.record_lap(ticks);
        }

        let next_state = self.discretizer.discretize(&self.car.pose(), &self.mesh)?;
        self.agent.learn(state, action, outcome.value, next_state);
        self.stats.total_reward += outcome.value;

        Ok(TickReport {
            action,
            reward: outcome.value,
            respawned: false,
            lap_completed: outcome.lap_completed,
        })
    }

    /// Train for `ticks` ticks and summarize
    pub fn run(&mut self, ticks: u64) -> Result<SessionSummary, MdpError> {
        info!("Training for {} ticks", ticks);

        for _ in 0..ticks {
            self.tick()?;

            if self.stats.ticks % self.report_interval == 0 {
                gauge!("q_table_states").set(self.agent.table_len() as f64);
                gauge!("epsilon").set(self.agent.epsilon());
                info!(
                    "tick {}: {} laps, {} crashes, best lap {:?}, {} states, epsilon {:.4}",
                    self.stats.ticks,
                    self.stats.laps_completed,
                    self.stats.crashes,
                    self.stats.best_lap,
                    self.agent.table_len(),
                    self.agent.epsilon()
                );
            }
        }

        Ok(self.summary())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            stats: self.stats.clone(),
            q_table_states: self.agent.table_len(),
            epsilon: self.agent.epsilon(),
            waypoints: self.mesh.len(),
            track_length: self.mesh.total_length(),
            best_lap_trace: self.best_trace.clone(),
        }
    }

    fn evaluate(&self) -> Result<RewardOutcome, MdpError> {
        self.reward.evaluate(
            &self.car.pose(),
            &self.grid,
            &self.mesh,
            self.stats.best_lap,
            &self.progress,
        )
    }

    fn respawn(&mut self) {
        self.stats.crashes += 1;
        counter!("crashes").increment(1);

        if self.ticks_since_respawn <= QUICK_CRASH_TICKS {
            self.crash_streak += 1;
            if self.crash_streak == CRASH_STREAK_WARN {
                warn!(
                    "{} crashes in a row within {} ticks of respawning",
                    self.crash_streak, QUICK_CRASH_TICKS
                );
                self.crash_streak = 0;
            }
        } else {
            self.crash_streak = 0;
        }

        debug!("Respawning after {} ticks", self.ticks_since_respawn);
        let (position, heading) = self.spawn;
        self.car.respawn(position, heading);
        self.progress = LapProgress::new();
        self.trace.clear();
        self.ticks_since_respawn = 0;
    }

    fn record_lap(&mut self, ticks: u64) {
        let trace = std::mem::take(&mut self.trace);

        if self.stats.best_lap.map_or(true, |best| ticks < best) {
            info!("New best lap: {} ticks", ticks);
            self.stats.best_lap = Some(ticks);
            self.best_trace = trace.clone();
        }
        self.stats.last_lap = Some(ticks);
        self.stats.laps_completed += 1;
        counter!("laps_completed").increment(1);

        self.history.push_front(LapRecord { ticks, trace });
        self.history.truncate(self.history_len);
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn car(&self) -> &Car {
        &self.car
    }

    pub fn mesh(&self) -> &TrackMesh {
        &self.mesh
    }

    pub fn progress(&self) -> &LapProgress {
        &self.progress
    }

    /// Completed laps, newest first
    pub fn lap_history(&self) -> impl Iterator<Item = &LapRecord> {
        self.history.iter()
    }

    /// Points recorded on the lap in progress
    pub fn current_trace(&self) -> &[Vec2] {
        &self.trace
    }
}

/// Spawn position and heading: the chosen waypoint (0 when out of range),
/// facing the next waypoint
fn spawn_pose(mesh: &TrackMesh, index: usize) -> Result<(Vec2, f64), MdpError> {
    let waypoints = mesh.waypoints();
    if waypoints.is_empty() {
        return Err(MdpError::EmptyMesh);
    }

    let index = if index < waypoints.len() {
        index
    } else {
        warn!(
            "Spawn waypoint {} out of range for {} waypoints, using 0",
            index,
            waypoints.len()
        );
        0
    };
    let here = waypoints[index].position;
    let next = waypoints[(index + 1) % waypoints.len()].position;

    Ok((here, (next - here).angle()))
}
