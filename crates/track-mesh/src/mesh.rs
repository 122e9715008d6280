//! Waypoint mesh and Frenet frame queries

use crate::MeshError;
use serde::{Deserialize, Serialize};
use track_grid::Vec2;

/// Waypoints this close in loop order may sit near each other on a hairpin
const OVERLAP_WINDOW: usize = 3;

/// One centerline sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Sequence index in walk order
    pub id: usize,

    pub position: Vec2,

    /// Unit vector pointing to the right of travel in image coordinates
    /// (`tangent.perp()`, y down)
    pub normal: Vec2,

    /// Local wall-to-wall track width
    pub width: f64,

    /// Cumulative distance from the first waypoint
    pub arc_length: f64,
}

impl Waypoint {
    /// Direction of travel, the normal rotated by -90°
    pub fn tangent(&self) -> Vec2 {
        self.normal.perp_neg()
    }

    /// Heading of the tangent in radians
    pub fn heading(&self) -> f64 {
        self.tangent().angle()
    }
}

/// How the centerline walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkTermination {
    /// Walker came back to the start center or onto its first steps
    LoopClosed,
    /// Walker ran out of steps without closing
    IterationCap,
    /// Every candidate ray hit a wall immediately
    DeadEnd,
}

/// World point expressed in the track frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrenetPoint {
    /// Arc length of the matched waypoint
    pub s: f64,
    /// Signed lateral offset along the waypoint normal (positive = right of
    /// travel)
    pub d: f64,
    /// Index of the matched waypoint
    pub index: usize,
}

/// Closed loop of waypoints in travel order; the last waypoint precedes the first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMesh {
    waypoints: Vec<Waypoint>,
    total_length: f64,
    termination: WalkTermination,
}

impl TrackMesh {
    pub fn new(waypoints: Vec<Waypoint>, total_length: f64, termination: WalkTermination) -> Self {
        Self {
            waypoints,
            total_length,
            termination,
        }
    }

    /// Closed mesh through the given points, with neighbour-difference
    /// normals, chord arc lengths and the loop perimeter as total length
    pub fn from_centerline(points: &[Vec2], width: f64) -> Self {
        let n = points.len();
        let mut waypoints = Vec::with_capacity(n);
        let mut arc_length = 0.0;

        for (i, &position) in points.iter().enumerate() {
            if i > 0 {
                arc_length += position.distance(points[i - 1]);
            }
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            waypoints.push(Waypoint {
                id: i,
                position,
                normal: (next - prev).perp().normalize(),
                width,
                arc_length,
            });
        }

        let closing = match (points.first(), points.last()) {
            (Some(&first), Some(&last)) => last.distance(first),
            _ => 0.0,
        };

        Self::new(waypoints, arc_length + closing, WalkTermination::LoopClosed)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    pub fn termination(&self) -> WalkTermination {
        self.termination
    }

    pub fn is_closed(&self) -> bool {
        self.termination == WalkTermination::LoopClosed
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Nearest waypoint by Euclidean distance; the first one wins a tie
    pub fn closest_waypoint(&self, point: Vec2) -> Option<(usize, &Waypoint)> {
        let mut best: Option<(usize, &Waypoint, f64)> = None;

        for (i, wp) in self.waypoints.iter().enumerate() {
            let dist = wp.position.distance_squared(point);
            match best {
                Some((_, _, best_dist)) if dist >= best_dist => {}
                _ => best = Some((i, wp, dist)),
            }
        }

        best.map(|(i, wp, _)| (i, wp))
    }

    /// Project a world point onto the track frame. `s` is the matched
    /// waypoint's arc length, not interpolated along the tangent.
    pub fn world_to_frenet(&self, point: Vec2) -> Option<FrenetPoint> {
        self.closest_waypoint(point).map(|(index, wp)| FrenetPoint {
            s: wp.arc_length,
            d: (point - wp.position).dot(wp.normal),
            index,
        })
    }

    /// Reject meshes whose walk did not close, that are too coarse to train on
    /// or that trace part of the circuit twice
    pub fn validate(&self, min_waypoints: usize) -> Result<(), MeshError> {
        if !self.is_closed() {
            return Err(MeshError::NotClosed {
                termination: self.termination,
                waypoints: self.len(),
            });
        }
        if self.len() < min_waypoints {
            return Err(MeshError::TooFewWaypoints {
                count: self.len(),
                min: min_waypoints,
            });
        }
        if let Some((index, other)) = self.find_overlap() {
            return Err(MeshError::Overlapping { index, other });
        }
        Ok(())
    }

    /// First pair of waypoints far apart in loop order but closer than half
    /// the mean spacing
    fn find_overlap(&self) -> Option<(usize, usize)> {
        let n = self.len();
        if n <= 2 * OVERLAP_WINDOW + 1 {
            return None;
        }
        let perimeter: f64 = (0..n)
            .map(|i| self.waypoints[i].position.distance(self.waypoints[(i + 1) % n].position))
            .sum();
        let limit = perimeter / n as f64 / 2.0;

        for i in 0..n {
            for j in i + OVERLAP_WINDOW + 1..n {
                if n - (j - i) <= OVERLAP_WINDOW {
                    break;
                }
                let dist = self.waypoints[i].position.distance(self.waypoints[j].position);
                if dist < limit {
                    return Some((i, j));
                }
            }
        }
        None
    }
}
