//! Visited-cell bookkeeping for the centerline walker

use ndarray::Array2;
use track_grid::Vec2;

/// Step index at which each grid cell was first traced, indexed `[[x, y]]`
/// like the occupancy grid
pub struct VisitedMap {
    stamps: Array2<Option<usize>>,
}

impl VisitedMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            stamps: Array2::from_elem((width, height), None),
        }
    }

    fn cell(x: i64, y: i64) -> Option<[usize; 2]> {
        if x < 0 || y < 0 {
            return None;
        }
        Some([x as usize, y as usize])
    }

    pub fn stamp_at(&self, p: Vec2) -> Option<usize> {
        Self::cell(p.x.floor() as i64, p.y.floor() as i64)
            .and_then(|idx| self.stamps.get(idx).copied().flatten())
    }

    /// Stamp the square of half-size `radius` around `p`; earlier stamps win
    pub fn mark(&mut self, p: Vec2, radius: i64, step: usize) {
        let cx = p.x.floor() as i64;
        let cy = p.y.floor() as i64;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let cell = Self::cell(cx + dx, cy + dy);
                if let Some(stamp) = cell.and_then(|idx| self.stamps.get_mut(idx)) {
                    stamp.get_or_insert(step);
                }
            }
        }
    }
}
