//! Track image loading

use crate::TrainerSettings;
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;
use tracing::{info, warn};
use track_grid::{classify_color, OccupancyGrid};
use track_mesh::{MeshConfig, MeshGenerator, TrackMesh};

/// Grid and validated mesh for one circuit
#[derive(Debug, Clone)]
pub struct Track {
    pub grid: OccupancyGrid,
    pub mesh: TrackMesh,
}

/// Open the configured track image (or its fallback) and build the track
pub fn load_track(settings: &TrainerSettings) -> Result<Track> {
    let image = open_image(&settings.track_path, settings.fallback_track_path.as_deref())?;
    build_track(&image, &settings.mesh, settings.min_waypoints)
}

/// Classify an already decoded image, generate the mesh and reject it unless
/// the walk closed with enough waypoints
pub fn build_track(
    image: &RgbImage,
    mesh_config: &MeshConfig,
    min_waypoints: usize,
) -> Result<Track> {
    let grid = OccupancyGrid::from_image(image, classify_color)
        .context("Failed to build occupancy grid")?;

    let generator = MeshGenerator::new(mesh_config.clone())?;
    let mesh = generator.generate(&grid).context("Failed to generate track mesh")?;
    mesh.validate(min_waypoints).context("Generated mesh is not usable")?;

    info!(
        "Track ready: {} waypoints, {:.0} units around",
        mesh.len(),
        mesh.total_length()
    );

    Ok(Track { grid, mesh })
}

fn open_image(primary: &Path, fallback: Option<&Path>) -> Result<RgbImage> {
    match image::open(primary) {
        Ok(img) => {
            info!("Loaded track image {}", primary.display());
            Ok(img.to_rgb8())
        }
        Err(primary_err) => {
            let Some(fallback) = fallback else {
                return Err(primary_err)
                    .with_context(|| format!("Failed to open track image {}", primary.display()));
            };
            warn!(
                "Could not open {} ({}), falling back to {}",
                primary.display(),
                primary_err,
                fallback.display()
            );
            let img = image::open(fallback).with_context(|| {
                format!("Failed to open fallback track image {}", fallback.display())
            })?;
            Ok(img.to_rgb8())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use track_grid::synthetic;

    #[test]
    fn test_build_track_from_synthetic_image() {
        let image = synthetic::elliptical_track(400, 300);
        let track = build_track(&image, &MeshConfig::default(), 20).unwrap();

        assert!(track.mesh.is_closed());
        assert!(track.mesh.len() >= 20);
        assert_eq!(track.grid.width(), 400);
        assert_eq!(track.grid.height(), 300);
    }

    #[test]
    fn test_build_track_rejects_too_coarse_mesh() {
        let image = synthetic::elliptical_track(400, 300);
        let err = build_track(&image, &MeshConfig::default(), 100_000).unwrap_err();
        assert!(format!("{:#}", err).contains("not usable"));
    }

    #[test]
    fn test_missing_image_without_fallback() {
        let path = PathBuf::from("/nonexistent/track.png");
        let err = open_image(&path, None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/track.png"));
    }

    #[test]
    fn test_fallback_image_used() {
        let dir = std::env::temp_dir().join(format!("racing-line-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let fallback = dir.join("fallback.png");
        synthetic::elliptical_track(40, 30).save(&fallback).unwrap();

        let image = open_image(Path::new("/nonexistent/track.png"), Some(&fallback)).unwrap();
        assert_eq!(image.dimensions(), (40, 30));

        let err = open_image(Path::new("/nonexistent/a.png"), Some(Path::new("/nonexistent/b.png")))
            .unwrap_err();
        assert!(err.to_string().contains("fallback"));
    }
}
