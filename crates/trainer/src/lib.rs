//! Racing Line Trainer
//!
//! Wires the track, physics and learning crates into a runnable trainer:
//! - Layered settings (defaults, TOML file, environment)
//! - Track image loading with a fallback path and mesh validation
//! - Tick loop with crash respawn, lap timing and driven-line traces

pub mod loader;
pub mod session;
pub mod settings;

pub use loader::{build_track, load_track, Track};
pub use session::{LapRecord, SessionStats, SessionSummary, TickReport, TrainingSession};
pub use settings::TrainerSettings;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging. Unknown levels fall back to INFO.
pub fn init_logging(level: &str, json: bool) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.expect("Failed to set tracing subscriber");
}
