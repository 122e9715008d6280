//! MDP Core
//!
//! Turns continuous car state into a learning problem:
//! - Discrete actions and the control signals they map to
//! - State discretization in the track's Frenet frame
//! - Shaped reward with checkpoint and lap bookkeeping
//! - Epsilon-greedy tabular Q-learning agent

pub mod action;
pub mod agent;
pub mod discretizer;
pub mod reward;

pub use action::{Action, CarPose, ControlSignals, ACTION_COUNT};
pub use agent::{AgentConfig, QLearningAgent, QTable};
pub use discretizer::{DiscreteState, DiscretizerConfig, StateDiscretizer};
pub use reward::{LapProgress, RewardComponents, RewardConfig, RewardFunction, RewardOutcome};

use thiserror::Error;

/// MDP errors
#[derive(Error, Debug)]
pub enum MdpError {
    #[error("Track mesh has no waypoints")]
    EmptyMesh,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
