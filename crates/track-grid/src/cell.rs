//! Surface cell types and colour classification

use serde::{Deserialize, Serialize};

/// Surface classification of a grid cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Impassable; touching it crashes the car
    #[default]
    Wall,
    /// Drivable track surface
    Tarmac,
    /// Off-track run-off area, drivable with low grip
    Gravel,
    /// Start/finish line marker
    Start,
    /// Travel direction hint placed just ahead of the start line
    Direction,
}

impl CellKind {
    /// Grip scalar for this surface (1.0 = full grip)
    pub fn friction(self) -> f64 {
        match self {
            CellKind::Wall => 0.0,
            CellKind::Gravel => 0.4,
            CellKind::Tarmac | CellKind::Start | CellKind::Direction => 1.0,
        }
    }

    /// Whether a car can occupy this cell
    pub fn is_drivable(self) -> bool {
        self != CellKind::Wall
    }
}

/// Single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub friction: f64,
}

impl Cell {
    /// Synthetic cell returned for out-of-range lookups
    pub const WALL: Cell = Cell {
        kind: CellKind::Wall,
        friction: 0.0,
    };

    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            friction: kind.friction(),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::WALL
    }
}

/// Map an 8-bit RGB pixel to a surface kind.
///
/// Checks run in order; the first match wins. Bright pixels that match no
/// rule are anti-aliased marker or track edges and count as tarmac.
pub fn classify_color(rgb: [u8; 3]) -> CellKind {
    let [r, g, b] = rgb.map(u16::from);

    if r > 200 && g > 200 && b > 200 {
        return CellKind::Tarmac;
    }
    if r > 200 && g < 100 && b < 100 {
        return CellKind::Start;
    }
    if r > 200 && g > 200 && b < 100 {
        return CellKind::Direction;
    }
    if g > r + 50 && g > b + 50 {
        return CellKind::Gravel;
    }
    if r < 50 && g < 50 && b < 50 {
        return CellKind::Wall;
    }

    CellKind::Tarmac
}
