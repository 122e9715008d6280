//! Epsilon-greedy tabular Q-learning

use crate::{Action, DiscreteState, MdpError, ACTION_COUNT};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Per-state action values. A state that was never written reads as all zeros.
#[derive(Debug, Clone, Default)]
pub struct QTable {
    rows: HashMap<DiscreteState, [f64; ACTION_COUNT]>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states written so far
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stored row, `None` if the state was never learned
    pub fn get(&self, state: &DiscreteState) -> Option<&[f64; ACTION_COUNT]> {
        self.rows.get(state)
    }

    /// Stored row or the implicit zero row
    pub fn row_or_default(&self, state: &DiscreteState) -> [f64; ACTION_COUNT] {
        self.rows
            .get(state)
            .copied()
            .unwrap_or([0.0; ACTION_COUNT])
    }

    pub fn value(&self, state: &DiscreteState, action: Action) -> f64 {
        self.row_or_default(state)[action.index()]
    }

    pub fn set(&mut self, state: DiscreteState, action: Action, value: f64) {
        let row = self.rows.entry(state).or_insert([0.0; ACTION_COUNT]);
        row[action.index()] = value;
    }

    /// Best value in a state's row, 0 for unseen states
    pub fn max_value(&self, state: &DiscreteState) -> f64 {
        match self.rows.get(state) {
            Some(row) => row.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            None => 0.0,
        }
    }
}

/// Learning rate, discount and exploration schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Alpha
    pub learning_rate: f64,
    /// Gamma
    pub discount: f64,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    /// Multiplier applied to epsilon on every action selection
    pub epsilon_decay: f64,
    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            discount: 0.9998,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.9995,
            seed: None,
        }
    }
}

impl AgentConfig {
    /// Default schedule with a fixed seed for reproducible runs
    pub fn deterministic(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), MdpError> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(MdpError::InvalidConfig(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(MdpError::InvalidConfig(format!(
                "discount must be in [0, 1], got {}",
                self.discount
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon_min)
            || !(self.epsilon_min..=1.0).contains(&self.epsilon_start)
        {
            return Err(MdpError::InvalidConfig(format!(
                "epsilon must satisfy 0 <= min <= start <= 1, got min {} start {}",
                self.epsilon_min, self.epsilon_start
            )));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(MdpError::InvalidConfig(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            )));
        }
        Ok(())
    }
}

/// Tabular agent owning its value table, exploration rate and RNG
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    table: QTable,
    config: AgentConfig,
    epsilon: f64,
    rng: ChaCha8Rng,
}

impl QLearningAgent {
    pub fn new(config: AgentConfig) -> Result<Self, MdpError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            table: QTable::new(),
            epsilon: config.epsilon_start,
            config,
            rng,
        })
    }

    /// Decay epsilon, then explore with probability epsilon or exploit the
    /// learned row. Unseen states are always explored. Ties among the best
    /// actions are broken by scanning from a random offset.
    pub fn select_action(&mut self, state: &DiscreteState) -> Action {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);

        if self.rng.gen::<f64>() < self.epsilon {
            return self.random_action();
        }

        let Some(row) = self.table.get(state).copied() else {
            return self.random_action();
        };

        let offset = self.rng.gen_range(0..ACTION_COUNT);
        let mut best = Action::ALL[offset];
        let mut best_value = f64::NEG_INFINITY;
        for i in 0..ACTION_COUNT {
            let index = (offset + i) % ACTION_COUNT;
            if row[index] > best_value {
                best_value = row[index];
                best = Action::ALL[index];
            }
        }
        best
    }

    /// Greedy action without exploration; first maximum wins. `None` for
    /// unseen states.
    pub fn best_action(&self, state: &DiscreteState) -> Option<Action> {
        let row = self.table.get(state)?;
        let mut best = 0;
        for index in 1..ACTION_COUNT {
            if row[index] > row[best] {
                best = index;
            }
        }
        Action::from_index(best)
    }

    /// One-step Bellman update
    pub fn learn(
        &mut self,
        state: DiscreteState,
        action: Action,
        reward: f64,
        next_state: DiscreteState,
    ) {
        let current = self.table.value(&state, action);
        let next_max = self.table.max_value(&next_state);
        let target = reward + self.config.discount * next_max;
        let updated = current + self.config.learning_rate * (target - current);

        self.table.set(state, action, updated);
    }

    fn random_action(&mut self) -> Action {
        Action::ALL[self.rng.gen_range(0..ACTION_COUNT)]
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Forget everything learned and restart exploration
    pub fn reset(&mut self) {
        debug!("Resetting agent, dropping {} states", self.table.len());
        self.table = QTable::new();
        self.epsilon = self.config.epsilon_start;
    }

    pub fn debug_info(&self) -> String {
        format!(
            "Agent Type: Q-Table\nQ-Table Size: {}\nEpsilon: {:.4}",
            self.table.len(),
            self.epsilon
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(segment: usize) -> DiscreteState {
        DiscreteState {
            segment,
            lane: 0,
            speed_level: 1,
            heading: 0,
        }
    }

    fn greedy_config(seed: u64) -> AgentConfig {
        AgentConfig {
            epsilon_start: 0.0,
            epsilon_min: 0.0,
            seed: Some(seed),
            ..AgentConfig::default()
        }
    }

    #[test]
    fn test_unseen_state_reads_zero() {
        let table = QTable::new();
        let s = state(3);
        assert_eq!(table.row_or_default(&s), [0.0; ACTION_COUNT]);
        assert_eq!(table.max_value(&s), 0.0);
        assert!(table.get(&s).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_single_update() {
        let mut agent = QLearningAgent::new(AgentConfig::deterministic(1)).unwrap();
        agent.learn(state(0), Action::Throttle, 10.0, state(1));

        let q = agent.table().value(&state(0), Action::Throttle);
        assert!((q - 0.1).abs() < 1e-12);
        assert_eq!(agent.table_len(), 1);
        // Next state is only read, never inserted
        assert!(agent.table().get(&state(1)).is_none());
    }

    #[test]
    fn test_toy_mdp_converges() {
        let config = AgentConfig {
            learning_rate: 0.1,
            discount: 0.9,
            ..AgentConfig::deterministic(7)
        };
        let mut agent = QLearningAgent::new(config).unwrap();
        let (s0, s1) = (state(0), state(1));

        for _ in 0..2000 {
            agent.learn(s0, Action::Throttle, 1.0, s1);
            agent.learn(s0, Action::Brake, 0.0, s0);
            agent.learn(s1, Action::Brake, 2.0, s0);
            agent.learn(s1, Action::Throttle, -1.0, s1);
        }

        assert_eq!(agent.best_action(&s0), Some(Action::Throttle));
        assert_eq!(agent.best_action(&s1), Some(Action::Brake));

        // V0 = 1 + 0.9 V1, V1 = 2 + 0.9 V0
        let v0 = agent.table().max_value(&s0);
        let v1 = agent.table().max_value(&s1);
        assert!((v0 - 2.8 / 0.19).abs() < 0.05, "v0 = {}", v0);
        assert!((v1 - (2.0 + 0.9 * 2.8 / 0.19)).abs() < 0.05, "v1 = {}", v1);
    }

    #[test]
    fn test_epsilon_decays_to_floor() {
        let config = AgentConfig {
            epsilon_start: 1.0,
            epsilon_min: 0.1,
            epsilon_decay: 0.5,
            seed: Some(3),
            ..AgentConfig::default()
        };
        let mut agent = QLearningAgent::new(config).unwrap();
        assert_eq!(agent.epsilon(), 1.0);

        agent.select_action(&state(0));
        assert!((agent.epsilon() - 0.5).abs() < 1e-12);

        for _ in 0..9 {
            agent.select_action(&state(0));
        }
        assert!((agent.epsilon() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_greedy_ties_are_randomized() {
        let mut agent = QLearningAgent::new(greedy_config(42)).unwrap();
        let s = state(0);
        agent.table.set(s, Action::Throttle, 5.0);
        agent.table.set(s, Action::Brake, 5.0);

        let mut seen_throttle = false;
        let mut seen_brake = false;
        for _ in 0..200 {
            match agent.select_action(&s) {
                Action::Throttle => seen_throttle = true,
                Action::Brake => seen_brake = true,
                other => panic!("picked non-maximal action {:?}", other),
            }
        }
        assert!(seen_throttle && seen_brake);
        assert_eq!(agent.best_action(&s), Some(Action::Throttle));
    }

    #[test]
    fn test_unseen_state_explores() {
        let mut agent = QLearningAgent::new(greedy_config(5)).unwrap();
        let action = agent.select_action(&state(9));
        assert!(Action::ALL.contains(&action));
        assert_eq!(agent.best_action(&state(9)), None);
    }

    #[test]
    fn test_seeded_agents_agree() {
        let mut a = QLearningAgent::new(AgentConfig::deterministic(11)).unwrap();
        let mut b = QLearningAgent::new(AgentConfig::deterministic(11)).unwrap();
        for i in 0..50 {
            assert_eq!(a.select_action(&state(i % 4)), b.select_action(&state(i % 4)));
        }
    }

    #[test]
    fn test_reset_and_debug_info() {
        let mut agent = QLearningAgent::new(AgentConfig::deterministic(2)).unwrap();
        agent.learn(state(0), Action::Coast, 1.0, state(0));
        agent.learn(state(1), Action::Coast, 1.0, state(0));
        assert!(agent.debug_info().contains("Q-Table Size: 2"));

        agent.reset();
        assert_eq!(agent.table_len(), 0);
        assert_eq!(agent.epsilon(), 1.0);
        assert!(agent.debug_info().starts_with("Agent Type: Q-Table"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad_alpha = AgentConfig {
            learning_rate: 0.0,
            ..AgentConfig::default()
        };
        assert!(QLearningAgent::new(bad_alpha).is_err());

        let bad_epsilon = AgentConfig {
            epsilon_start: 0.001,
            epsilon_min: 0.01,
            ..AgentConfig::default()
        };
        assert!(QLearningAgent::new(bad_epsilon).is_err());
    }
}
