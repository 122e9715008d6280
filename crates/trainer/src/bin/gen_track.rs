//! Writes a synthetic elliptical test track.
//!
//! Usage: gen-track [OUTPUT] [WIDTH HEIGHT]

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use track_grid::synthetic;
use trainer::init_logging;

const DEFAULT_OUTPUT: &str = "assets/track.png";

fn main() -> Result<()> {
    init_logging("info", false);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = PathBuf::from(args.first().map(String::as_str).unwrap_or(DEFAULT_OUTPUT));
    let (width, height) = match (args.get(1), args.get(2)) {
        (Some(w), Some(h)) => (
            w.parse::<u32>().with_context(|| format!("Invalid width {}", w))?,
            h.parse::<u32>().with_context(|| format!("Invalid height {}", h))?,
        ),
        _ => (800, 600),
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    synthetic::elliptical_track(width, height)
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote {}x{} track to {}", width, height, output.display());
    Ok(())
}
