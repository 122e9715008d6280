//! Trainer settings

use anyhow::{ensure, Context, Result};
use car_physics::PhysicsConfig;
use config::{Config, Environment, File};
use mdp_core::{AgentConfig, DiscretizerConfig, RewardConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use track_mesh::MeshConfig;

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "RACING_LINE_CONFIG";

/// Settings file read when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "racing-line.toml";

/// Everything the trainer binary needs.
///
/// Sources are layered: built-in defaults, then the optional settings file,
/// then `RACING_LINE_*` environment variables with `__` between nested keys
/// (`RACING_LINE_TICKS=5000`, `RACING_LINE_AGENT__SEED=7`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerSettings {
    /// Preprocessed track image
    pub track_path: PathBuf,
    /// Tried when `track_path` cannot be opened
    pub fallback_track_path: Option<PathBuf>,

    /// Ticks to train for
    pub ticks: u64,
    /// Ticks between progress log lines
    pub report_interval: u64,

    /// Waypoint the car spawns and respawns at (0 if out of range)
    pub spawn_waypoint: usize,
    /// Ticks between recorded trace points
    pub trace_interval: u64,
    /// Completed lap traces kept, newest first
    pub lap_history: usize,
    /// Meshes with fewer waypoints are rejected
    pub min_waypoints: usize,

    pub log_level: String,
    pub log_json: bool,

    pub mesh: MeshConfig,
    pub discretizer: DiscretizerConfig,
    pub reward: RewardConfig,
    pub agent: AgentConfig,
    pub physics: PhysicsConfig,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            track_path: PathBuf::from("processed_tracks/monza_10m.jpg"),
            fallback_track_path: Some(PathBuf::from("assets/track.png")),
            ticks: 200_000,
            report_interval: 10_000,
            spawn_waypoint: 5,
            trace_interval: 5,
            lap_history: 4,
            min_waypoints: 20,
            log_level: "info".to_string(),
            log_json: false,
            mesh: MeshConfig::default(),
            discretizer: DiscretizerConfig::default(),
            reward: RewardConfig::default(),
            agent: AgentConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl TrainerSettings {
    /// Load from the file named by `RACING_LINE_CONFIG` (or
    /// `racing-line.toml`) and the environment
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load with an explicit settings file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .context("Failed to serialize default settings")?;

        let settings: Self = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("RACING_LINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings from {}", path.display()))?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.trace_interval > 0, "trace_interval must be at least 1");
        ensure!(self.lap_history > 0, "lap_history must be at least 1");
        ensure!(self.report_interval > 0, "report_interval must be at least 1");
        ensure!(self.min_waypoints >= 3, "min_waypoints must be at least 3");
        self.mesh.validate()?;
        self.discretizer.validate()?;
        self.reward.validate()?;
        self.agent.validate()?;
        Ok(())
    }
}
