//! Occupancy grid built once from a classified track image

use crate::cell::{Cell, CellKind};
use crate::geometry::Vec2;
use crate::GridError;
use image::RgbImage;
use ndarray::Array2;
use tracing::{debug, info};

/// Read-only grid of surface cells, indexed `[[x, y]]`.
///
/// Any lookup outside `0..width` × `0..height` yields [`Cell::WALL`], so ray
/// marches and collision checks near the image border behave as if the track
/// were enclosed by a wall.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cells: Array2<Cell>,
    width: usize,
    height: usize,
}

impl OccupancyGrid {
    /// Build a grid by evaluating `kind_at(x, y)` for every cell
    pub fn from_fn<F>(width: usize, height: usize, kind_at: F) -> Self
    where
        F: Fn(usize, usize) -> CellKind,
    {
        let cells = Array2::from_shape_fn((width, height), |(x, y)| Cell::new(kind_at(x, y)));
        Self {
            cells,
            width,
            height,
        }
    }

    /// Classify every pixel of a decoded RGB image
    pub fn from_image<F>(image: &RgbImage, classify: F) -> Result<Self, GridError>
    where
        F: Fn([u8; 3]) -> CellKind,
    {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(GridError::EmptyImage { width, height });
        }

        let grid = Self::from_fn(width as usize, height as usize, |x, y| {
            classify(image.get_pixel(x as u32, y as u32).0)
        });

        info!(
            "Built {}x{} grid: {} tarmac, {} gravel, {} wall cells",
            width,
            height,
            grid.count(CellKind::Tarmac),
            grid.count(CellKind::Gravel),
            grid.count(CellKind::Wall)
        );

        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether `(x, y)` addresses a real cell
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Cell at integer coordinates; out of range is a wall
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Cell {
        if !self.contains(x, y) {
            return Cell::WALL;
        }
        self.cells[[x as usize, y as usize]]
    }

    #[inline]
    pub fn kind(&self, x: i64, y: i64) -> CellKind {
        self.get(x, y).kind
    }

    /// Cell containing a world point (coordinates are floored)
    #[inline]
    pub fn cell_at(&self, point: Vec2) -> Cell {
        self.get(point.x.floor() as i64, point.y.floor() as i64)
    }

    #[inline]
    pub fn is_wall_at(&self, point: Vec2) -> bool {
        self.cell_at(point).kind == CellKind::Wall
    }

    /// Number of cells of a kind
    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|c| c.kind == kind).count()
    }

    /// Mean position of all cells of a kind
    pub fn centroid(&self, kind: CellKind) -> Option<Vec2> {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut count = 0usize;

        for ((x, y), cell) in self.cells.indexed_iter() {
            if cell.kind == kind {
                sum_x += x as f64;
                sum_y += y as f64;
                count += 1;
            }
        }

        if count == 0 {
            return None;
        }
        Some(Vec2::new(sum_x / count as f64, sum_y / count as f64))
    }

    /// First cell of a kind, scanning columns left to right and each column
    /// top to bottom
    pub fn first_of(&self, kind: CellKind) -> Option<(usize, usize)> {
        (0..self.width)
            .flat_map(|x| (0..self.height).map(move |y| (x, y)))
            .find(|&(x, y)| self.cells[[x, y]].kind == kind)
    }

    /// Point the mesh walker starts from: the start marker centroid, or the
    /// first tarmac cell when the image has no start marker
    pub fn seed_point(&self) -> Result<Vec2, GridError> {
        if let Some(start) = self.centroid(CellKind::Start) {
            debug!("Seed from start marker at ({:.1}, {:.1})", start.x, start.y);
            return Ok(start);
        }

        let (x, y) = self
            .first_of(CellKind::Tarmac)
            .ok_or(GridError::NoDrivableCell)?;
        debug!("No start marker, seeding from first tarmac cell ({}, {})", x, y);
        Ok(Vec2::new(x as f64, y as f64))
    }
}
