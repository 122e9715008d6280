//! Racing Line Mapper - Main Entry Point

use anyhow::Result;
use tracing::info;
use trainer::{init_logging, load_track, TrainerSettings, TrainingSession};

fn main() -> Result<()> {
    let settings = TrainerSettings::load()?;
    init_logging(&settings.log_level, settings.log_json);

    info!("=== Racing Line Mapper v{} ===", env!("CARGO_PKG_VERSION"));

    let track = load_track(&settings)?;
    let mut session = TrainingSession::new(track.grid, track.mesh, &settings)?;
    let summary = session.run(settings.ticks)?;

    info!("{}", session.agent().debug_info());
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
