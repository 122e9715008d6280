//! Centerline mesh generation
//!
//! Four passes over a read-only grid:
//! 1. Seed: travel direction from the direction marker, width and true center
//!    from perpendicular wall scans
//! 2. Walk: ray-fan walker that follows the deepest open direction until it
//!    returns to the start
//! 3. Center: elastic-band relaxation toward the midpoint between walls, then
//!    uniform resampling of a closed loop
//! 4. Smooth: moving averages over positions, then over recomputed normals

use crate::mesh::{TrackMesh, WalkTermination, Waypoint};
use crate::visited::VisitedMap;
use crate::{MeshConfig, MeshError};
use std::f64::consts::PI;
use tracing::{debug, info, warn};
use track_grid::{CellKind, OccupancyGrid, Vec2};

/// Where and how the walk starts
#[derive(Debug, Clone, Copy, PartialEq)]
struct StartPose {
    center: Vec2,
    direction: Vec2,
    width: f64,
}

struct Walk {
    waypoints: Vec<Waypoint>,
    termination: WalkTermination,
}

/// Result of marching one candidate ray
struct RayHit {
    depth: f64,
    crossed_trail: bool,
}

/// Mesh generator
pub struct MeshGenerator {
    config: MeshConfig,
}

impl MeshGenerator {
    pub fn new(config: MeshConfig) -> Result<Self, MeshError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Generate from the grid's own seed point (start marker or first tarmac)
    pub fn generate(&self, grid: &OccupancyGrid) -> Result<TrackMesh, MeshError> {
        let seed = grid.seed_point()?;
        Ok(self.generate_from_seed(grid, seed))
    }

    /// Generate from an explicit seed. A walk that never closes still yields
    /// the partial mesh; check [`TrackMesh::validate`] before using it.
    pub fn generate_from_seed(&self, grid: &OccupancyGrid, seed: Vec2) -> TrackMesh {
        let start = self.seed_pose(grid, seed);
        debug!(
            "Seed center ({:.1}, {:.1}), direction ({:.2}, {:.2}), width {:.1}",
            start.center.x, start.center.y, start.direction.x, start.direction.y, start.width
        );

        let Walk {
            mut waypoints,
            termination,
        } = self.walk(grid, &start);

        self.center(grid, &mut waypoints);
        if termination == WalkTermination::LoopClosed && self.config.resample_closed {
            waypoints = resample_closed(&waypoints, self.config.step_size);
        }
        self.smooth(&mut waypoints);
        assign_arc_lengths(&mut waypoints);

        let total_length = waypoints.len() as f64 * self.config.step_size;
        info!(
            "Generated mesh: {} waypoints, length {:.1}, walk ended {:?}",
            waypoints.len(),
            total_length,
            termination
        );

        TrackMesh::new(waypoints, total_length, termination)
    }

    fn seed_pose(&self, grid: &OccupancyGrid, seed: Vec2) -> StartPose {
        let fallback = self.config.default_direction.normalize();
        let direction = match grid.centroid(CellKind::Direction) {
            Some(marker) => {
                let toward = (marker - seed).normalize();
                if toward == Vec2::ZERO {
                    fallback
                } else {
                    toward
                }
            }
            None => fallback,
        };

        let normal = direction.perp();
        let radius = self.config.width_search_radius;
        let right = wall_distance(grid, seed, normal, 0.0, radius).unwrap_or(0.0);
        let left = wall_distance(grid, seed, -normal, 0.0, radius).unwrap_or(0.0);

        let mut width = left + right;
        if width < self.config.min_width {
            warn!(
                "No walls found around seed ({:.1}, {:.1}), using default width {:.1}",
                seed.x, seed.y, self.config.default_width
            );
            width = self.config.default_width;
        }

        StartPose {
            center: seed + normal * ((right - left) / 2.0),
            direction,
            width,
        }
    }

    /// Candidate heading offsets, symmetric around straight ahead, most
    /// negative first
    fn fan_offsets(&self) -> Vec<f64> {
        let step = self.config.fan_step;
        let m = (self.config.fan_half_angle / step + 1e-9).floor() as i64;
        (-m..=m).map(|k| k as f64 * step).collect()
    }

    fn walk(&self, grid: &OccupancyGrid, start: &StartPose) -> Walk {
        let cfg = &self.config;
        let fan = self.fan_offsets();
        let mut visited = VisitedMap::new(grid.width(), grid.height());

        // Cells traced while still inside one lookahead of the start stay
        // passable once the walker has left, so it can drive back over them
        let home_steps = (cfg.lookahead / cfg.step_size).ceil() as usize;
        let trail = TrailRule {
            grace: cfg.trail_grace_steps,
            home_steps,
        };

        let gate = StartGate {
            center: start.center,
            direction: start.direction,
            half_span: start.width / 2.0 + cfg.step_size,
        };

        let mut position = start.center;
        let mut direction = start.direction;
        let mut travelled = 0.0;
        let mut departed = false;
        let mut waypoints = Vec::new();
        let mut termination = WalkTermination::IterationCap;

        for step in 0..cfg.max_iterations {
            let base = direction.angle();
            let mut best_score = f64::NEG_INFINITY;
            let mut best_heading = direction;
            let mut deepest = 0.0f64;

            for &offset in &fan {
                let heading = Vec2::from_angle(base + offset);
                let hit = self.cast(grid, &visited, &trail, position, heading, step, departed);
                deepest = deepest.max(hit.depth);

                let mut score = hit.depth * (cfg.straight_bias - offset.abs() / PI);
                if hit.crossed_trail {
                    score *= cfg.visited_penalty;
                }
                if score > best_score {
                    best_score = score;
                    best_heading = heading;
                }
            }

            if deepest == 0.0 {
                warn!(
                    "Walker boxed in at ({:.1}, {:.1}) after {} steps",
                    position.x, position.y, step
                );
                termination = WalkTermination::DeadEnd;
                break;
            }

            let previous = position;
            position += best_heading * cfg.step_size;
            travelled += cfg.step_size;

            let blended =
                direction * (1.0 - cfg.direction_blend) + best_heading * cfg.direction_blend;
            direction = match blended.normalize() {
                v if v == Vec2::ZERO => best_heading,
                v => v,
            };

            visited.mark(position, cfg.visited_radius, step);

            let waypoint = Waypoint {
                id: step,
                position,
                normal: direction.perp(),
                width: start.width,
                arc_length: travelled,
            };

            let from_start = position.distance(start.center);
            if from_start > cfg.departure_distance() {
                departed = true;
            }
            let back_at_start =
                from_start < cfg.closure_distance() || gate.crossed(previous, position);
            if departed && step + 1 >= cfg.min_closure_steps && back_at_start {
                // A point past the start line would overlap the first waypoint
                if gate.along(position) < 0.0 {
                    waypoints.push(waypoint);
                }
                debug!("Loop closed after {} steps", step + 1);
                termination = WalkTermination::LoopClosed;
                break;
            }
            if departed {
                if let Some(k) = rejoined_at(&waypoints, position, step, home_steps, cfg) {
                    // The loop starts where the walker rejoined its own trail
                    debug!("Rejoined waypoint {} after {} steps", k, step + 1);
                    waypoints.drain(..k);
                    for (id, wp) in waypoints.iter_mut().enumerate() {
                        wp.id = id;
                    }
                    termination = WalkTermination::LoopClosed;
                    break;
                }
            }
            waypoints.push(waypoint);
        }

        if termination == WalkTermination::IterationCap {
            warn!(
                "Walk hit the iteration cap ({}) without closing the loop",
                cfg.max_iterations
            );
        }

        Walk {
            waypoints,
            termination,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn cast(
        &self,
        grid: &OccupancyGrid,
        visited: &VisitedMap,
        trail: &TrailRule,
        origin: Vec2,
        heading: Vec2,
        step: usize,
        departed: bool,
    ) -> RayHit {
        let cfg = &self.config;
        let mut hit = RayHit {
            depth: 0.0,
            crossed_trail: false,
        };

        for i in 1.. {
            let d = i as f64 * cfg.ray_step;
            if d >= cfg.lookahead {
                break;
            }
            let p = origin + heading * d;
            if grid.is_wall_at(p) {
                break;
            }
            if !hit.crossed_trail {
                hit.crossed_trail = visited
                    .stamp_at(p)
                    .is_some_and(|stamp| trail.blocks(stamp, step, departed));
            }
            hit.depth = d;
        }

        hit
    }

    fn center(&self, grid: &OccupancyGrid, waypoints: &mut [Waypoint]) {
        let n = waypoints.len();
        if n < 3 {
            return;
        }
        let cfg = &self.config;

        for pass in 0..cfg.centering_passes {
            // Normals come from the positions at the start of the pass
            let positions: Vec<Vec2> = waypoints.iter().map(|w| w.position).collect();
            let mut adjusted = 0usize;
            for i in 0..n {
                let prev = positions[(i + n - 1) % n];
                let next = positions[(i + 1) % n];
                let normal = (next - prev).perp().normalize();
                if normal == Vec2::ZERO {
                    continue;
                }

                let p = waypoints[i].position;
                let right = wall_distance(grid, p, normal, 1.0, cfg.centering_radius);
                let left = wall_distance(grid, p, -normal, 1.0, cfg.centering_radius);

                if let (Some(left), Some(right)) = (left, right) {
                    let correction = ((right - left) / 2.0 * cfg.centering_damping)
                        .clamp(-cfg.max_centering_shift, cfg.max_centering_shift);
                    waypoints[i].position += normal * correction;
                    waypoints[i].width = left + right;
                    adjusted += 1;
                }
            }
            debug!("Centering pass {}: adjusted {}/{} waypoints", pass, adjusted, n);
        }
    }

    fn smooth(&self, waypoints: &mut [Waypoint]) {
        let n = waypoints.len();
        if n == 0 {
            return;
        }
        let cfg = &self.config;

        for _ in 0..cfg.position_passes {
            let positions: Vec<Vec2> = waypoints.iter().map(|w| w.position).collect();
            for (i, wp) in waypoints.iter_mut().enumerate() {
                wp.position = circular_mean(&positions, i, cfg.position_window);
            }
        }

        for i in 0..n {
            let prev = waypoints[(i + n - 1) % n].position;
            let next = waypoints[(i + 1) % n].position;
            let normal = (next - prev).perp().normalize();
            if normal != Vec2::ZERO {
                waypoints[i].normal = normal;
            }
        }

        for _ in 0..cfg.normal_passes {
            let normals: Vec<Vec2> = waypoints.iter().map(|w| w.normal).collect();
            for (i, wp) in waypoints.iter_mut().enumerate() {
                let averaged = circular_mean(&normals, i, cfg.normal_window).normalize();
                if averaged != Vec2::ZERO {
                    wp.normal = averaged;
                }
            }
        }
    }
}

/// Decides whether a visited cell penalises a ray
struct TrailRule {
    /// Cells from this many most recent steps are ignored
    grace: usize,
    /// Cells stamped before this step form the start zone
    home_steps: usize,
}

impl TrailRule {
    fn blocks(&self, stamp: usize, step: usize, departed: bool) -> bool {
        if stamp + self.grace >= step {
            return false;
        }
        !(departed && stamp < self.home_steps)
    }
}

/// Line across the track through the start center, perpendicular to the
/// initial travel direction
struct StartGate {
    center: Vec2,
    direction: Vec2,
    half_span: f64,
}

impl StartGate {
    /// Signed distance past the line along the initial direction
    fn along(&self, p: Vec2) -> f64 {
        (p - self.center).dot(self.direction)
    }

    /// Whether the step `from -> to` crosses the line forwards within the span
    fn crossed(&self, from: Vec2, to: Vec2) -> bool {
        let a = self.along(from);
        let b = self.along(to);
        if a >= 0.0 || b < 0.0 {
            return false;
        }
        let hit = from + (to - from) * (a / (a - b));
        (hit - self.center).dot(self.direction.perp()).abs() <= self.half_span
    }
}

/// First start-zone waypoint the walker is back within closure distance of,
/// once enough steps separate them
fn rejoined_at(
    waypoints: &[Waypoint],
    position: Vec2,
    step: usize,
    home_steps: usize,
    cfg: &MeshConfig,
) -> Option<usize> {
    waypoints.iter().take(home_steps).position(|wp| {
        step >= wp.id + cfg.min_closure_steps
            && wp.position.distance(position) < cfg.closure_distance()
    })
}

/// Distance to the first wall along `direction`, sampling at unit spacing
/// from `first` up to (not including) `limit`
fn wall_distance(
    grid: &OccupancyGrid,
    origin: Vec2,
    direction: Vec2,
    first: f64,
    limit: f64,
) -> Option<f64> {
    let mut d = first;
    while d < limit {
        if grid.is_wall_at(origin + direction * d) {
            return Some(d);
        }
        d += 1.0;
    }
    None
}

/// Mean of `values` over a centred window that wraps around the loop
fn circular_mean(values: &[Vec2], index: usize, window: usize) -> Vec2 {
    let n = values.len();
    let half = window / 2;
    let mut sum = Vec2::ZERO;
    for k in 0..=2 * half {
        sum += values[(index + n * (half / n + 1) + k - half) % n];
    }
    sum * (1.0 / (2 * half + 1) as f64)
}

/// Resample a closed loop at uniform spacing close to `spacing`, interpolating
/// widths. Normals are left for the smoothing pass to recompute.
fn resample_closed(waypoints: &[Waypoint], spacing: f64) -> Vec<Waypoint> {
    let n = waypoints.len();
    if n < 3 {
        return waypoints.to_vec();
    }

    let segments: Vec<f64> = (0..n)
        .map(|i| waypoints[i].position.distance(waypoints[(i + 1) % n].position))
        .collect();
    let perimeter: f64 = segments.iter().sum();
    if perimeter <= 0.0 {
        return waypoints.to_vec();
    }

    let count = ((perimeter / spacing).round() as usize).max(3);
    let spacing = perimeter / count as f64;

    let mut resampled = Vec::with_capacity(count);
    let mut i = 0;
    let mut walked = 0.0;
    for k in 0..count {
        let target = k as f64 * spacing;
        while i < n - 1 && walked + segments[i] < target {
            walked += segments[i];
            i += 1;
        }

        let a = &waypoints[i];
        let b = &waypoints[(i + 1) % n];
        let t = if segments[i] > 0.0 {
            ((target - walked) / segments[i]).clamp(0.0, 1.0)
        } else {
            0.0
        };

        resampled.push(Waypoint {
            id: k,
            position: a.position + (b.position - a.position) * t,
            normal: a.normal,
            width: a.width + (b.width - a.width) * t,
            arc_length: 0.0,
        });
    }

    debug!("Resampled {} walk points into {} waypoints", n, count);
    resampled
}

fn assign_arc_lengths(waypoints: &mut [Waypoint]) {
    let mut total = 0.0;
    let mut prev: Option<Vec2> = None;
    for wp in waypoints.iter_mut() {
        if let Some(p) = prev {
            total += wp.position.distance(p);
        }
        wp.arc_length = total;
        prev = Some(wp.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use track_grid::synthetic;

    fn generator() -> MeshGenerator {
        MeshGenerator::new(MeshConfig::default()).unwrap()
    }

    fn rectangle_ring() -> OccupancyGrid {
        synthetic::to_grid(&synthetic::rectangle_ring(200, 140, 20, 30)).unwrap()
    }

    /// Smallest signed turn between consecutive normals and the total turn
    /// over the loop
    fn normal_turns(mesh: &TrackMesh) -> (f64, f64) {
        let wps = mesh.waypoints();
        let n = wps.len();
        let mut min_cross = f64::INFINITY;
        let mut total = 0.0;
        for i in 0..n {
            let a = wps[i].normal;
            let b = wps[(i + 1) % n].normal;
            let cross = a.x * b.y - a.y * b.x;
            min_cross = min_cross.min(cross);
            total += cross.atan2(a.dot(b));
        }
        (min_cross, total)
    }

    #[test]
    fn test_rectangle_ring_closes_at_expected_density() {
        let mesh = generator().generate_from_seed(&rectangle_ring(), Vec2::new(100.0, 35.0));

        assert_eq!(mesh.termination(), WalkTermination::LoopClosed);

        // Centerline perimeter is 2 * (130 + 70) = 400
        let expected = 400.0 / 6.0;
        let count = mesh.len() as f64;
        assert!(
            (count - expected).abs() <= expected * 0.15,
            "got {} waypoints, expected about {:.0}",
            mesh.len(),
            expected
        );
        assert_eq!(mesh.total_length(), count * 6.0);
        assert!(mesh.validate(20).is_ok());

        let on_band = mesh
            .waypoints()
            .iter()
            .filter(|w| (28.0..=34.0).contains(&w.width))
            .count();
        assert!(on_band as f64 >= count * 0.6);
    }

    #[test]
    fn test_waypoint_invariants() {
        let mesh = generator().generate_from_seed(&rectangle_ring(), Vec2::new(100.0, 35.0));
        let wps = mesh.waypoints();

        assert_eq!(wps[0].arc_length, 0.0);
        for (i, pair) in wps.windows(2).enumerate() {
            assert!(pair[1].arc_length >= pair[0].arc_length);
            assert_eq!(pair[0].id, i);
        }
        for wp in wps {
            assert!((wp.normal.length() - 1.0).abs() < 1e-9);
        }
        // Started eastbound along the top straight: normal points down (+y)
        assert!(wps[0].normal.y > 0.9);
    }

    #[test]
    fn test_annulus_follows_centerline_radius() {
        let center = (150.0, 150.0);
        let grid = synthetic::to_grid(&synthetic::annulus(300, 300, center, 60.0, 100.0)).unwrap();
        let mesh = generator().generate_from_seed(&grid, Vec2::new(150.0, 70.0));

        assert!(mesh.is_closed());
        for wp in mesh.waypoints() {
            let r = wp.position.distance(Vec2::new(center.0, center.1));
            assert!((r - 80.0).abs() < 3.0, "waypoint {} at radius {:.2}", wp.id, r);
        }

        let (min_cross, total) = normal_turns(&mesh);
        assert!(min_cross > 0.0, "normal rotation reversed ({})", min_cross);
        assert!((total - std::f64::consts::TAU).abs() < 0.1);
    }

    #[test]
    fn test_corner_seed_closes_after_one_lap() {
        // No start marker: the walk starts in the top-left corner and never
        // passes back through its own start center
        let mesh = generator().generate(&rectangle_ring()).unwrap();

        assert!(mesh.is_closed());
        let expected = 400.0 / 6.0;
        let count = mesh.len() as f64;
        assert!(
            (count - expected).abs() <= expected * 0.15,
            "got {} waypoints, expected about {:.0}",
            mesh.len(),
            expected
        );
        assert!(mesh.validate(20).is_ok());
        for (i, wp) in mesh.waypoints().iter().enumerate() {
            assert_eq!(wp.id, i);
        }
    }

    #[test]
    fn test_annulus_side_seed_closes_after_one_lap() {
        let center = (150.0, 150.0);
        let grid = synthetic::to_grid(&synthetic::annulus(300, 300, center, 60.0, 100.0)).unwrap();
        let mesh = generator().generate_from_seed(&grid, Vec2::new(230.0, 150.0));

        assert!(mesh.is_closed());
        let expected = std::f64::consts::TAU * 80.0 / 6.0;
        let count = mesh.len() as f64;
        assert!(
            (count - expected).abs() <= expected * 0.15,
            "got {} waypoints, expected about {:.0}",
            mesh.len(),
            expected
        );
        assert!(mesh.validate(20).is_ok());
    }

    #[test]
    fn test_rejoin_needs_start_zone_and_separation() {
        let config = MeshConfig::default();
        let trail: Vec<Waypoint> = (0..30)
            .map(|i| Waypoint {
                id: i,
                position: Vec2::new(i as f64 * 6.0, 0.0),
                normal: Vec2::new(0.0, 1.0),
                width: 20.0,
                arc_length: i as f64 * 6.0,
            })
            .collect();

        // Within closure distance of waypoints 2 and 3; the earliest wins
        let back_home = Vec2::new(18.0, 5.0);
        assert_eq!(rejoined_at(&trail, back_home, 40, 17, &config), Some(2));
        // Too soon after either was laid down
        assert_eq!(rejoined_at(&trail, back_home, 11, 17, &config), None);
        // Waypoint 25 is outside the start zone
        assert_eq!(rejoined_at(&trail, Vec2::new(150.0, 5.0), 40, 17, &config), None);
    }

    #[test]
    fn test_generate_uses_start_and_direction_markers() {
        let grid = synthetic::to_grid(&synthetic::elliptical_track(400, 300)).unwrap();
        let mesh = generator().generate(&grid).unwrap();

        assert!(mesh.is_closed());
        let first = mesh.get(0).unwrap();
        // Marker sits clockwise of the start line at the top of the ellipse
        assert!(first.position.x > 200.0);
        assert!(first.tangent().x > 0.9);
    }

    #[test]
    fn test_direction_marker_reverses_walk() {
        let grid = OccupancyGrid::from_fn(200, 140, |x, y| {
            let outer = (20..180).contains(&x) && (20..120).contains(&y);
            let inner = (50..150).contains(&x) && (50..90).contains(&y);
            if (86..90).contains(&x) && (30..40).contains(&y) {
                CellKind::Direction
            } else if outer && !inner {
                CellKind::Tarmac
            } else {
                CellKind::Wall
            }
        });

        let mesh = generator().generate_from_seed(&grid, Vec2::new(100.0, 35.0));
        assert!(mesh.is_closed());
        assert!(mesh.get(0).unwrap().tangent().x < -0.9);
    }

    #[test]
    fn test_seed_inside_wall_is_dead_end() {
        let mesh = generator().generate_from_seed(&rectangle_ring(), Vec2::new(5.0, 5.0));
        assert_eq!(mesh.termination(), WalkTermination::DeadEnd);
        assert!(mesh.is_empty());
        assert!(matches!(mesh.validate(1), Err(MeshError::NotClosed { .. })));
    }

    #[test]
    fn test_open_field_uses_default_width_and_hits_cap() {
        let grid = OccupancyGrid::from_fn(300, 300, |_, _| CellKind::Tarmac);
        let config = MeshConfig {
            max_iterations: 10,
            ..Default::default()
        };
        let mesh = MeshGenerator::new(config)
            .unwrap()
            .generate_from_seed(&grid, Vec2::new(150.0, 150.0));

        assert_eq!(mesh.termination(), WalkTermination::IterationCap);
        assert_eq!(mesh.len(), 10);
        assert!(mesh.waypoints().iter().all(|w| w.width == 20.0));
    }

    #[test]
    fn test_fan_is_symmetric_with_straight_ahead() {
        let fan = generator().fan_offsets();
        assert_eq!(fan.len() % 2, 1);
        assert_eq!(fan[fan.len() / 2], 0.0);
        assert_eq!(fan[0], -fan[fan.len() - 1]);
        assert!(fan[0] < 0.0);
        assert!(fan[0].abs() <= PI / 1.5);
    }

    #[test]
    fn test_start_gate_crossing() {
        let gate = StartGate {
            center: Vec2::new(0.0, 0.0),
            direction: Vec2::new(1.0, 0.0),
            half_span: 10.0,
        };
        assert!(gate.crossed(Vec2::new(-3.0, 4.0), Vec2::new(3.0, 4.0)));
        // Backwards, outside the span, and not reaching the line
        assert!(!gate.crossed(Vec2::new(3.0, 4.0), Vec2::new(-3.0, 4.0)));
        assert!(!gate.crossed(Vec2::new(-3.0, 40.0), Vec2::new(3.0, 40.0)));
        assert!(!gate.crossed(Vec2::new(-9.0, 0.0), Vec2::new(-3.0, 0.0)));
    }

    #[test]
    fn test_trail_rule() {
        let rule = TrailRule {
            grace: 3,
            home_steps: 17,
        };
        // Fresh trail never blocks
        assert!(!rule.blocks(47, 50, true));
        assert!(rule.blocks(30, 50, true));
        // Start zone is open only after departure
        assert!(rule.blocks(5, 50, false));
        assert!(!rule.blocks(5, 50, true));
    }

    #[test]
    fn test_resample_uniform_spacing() {
        let square: Vec<Waypoint> = [(0.0, 0.0), (30.0, 0.0), (30.0, 30.0), (0.0, 30.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Waypoint {
                id: i,
                position: Vec2::new(x, y),
                normal: Vec2::new(0.0, 1.0),
                width: 10.0 + i as f64,
                arc_length: 0.0,
            })
            .collect();

        let resampled = resample_closed(&square, 6.0);
        assert_eq!(resampled.len(), 20);
        for (i, pair) in resampled.windows(2).enumerate() {
            assert_eq!(pair[0].id, i);
            assert!((pair[0].position.distance(pair[1].position) - 6.0).abs() < 1e-9);
        }
        assert_eq!(resampled[0].position, Vec2::new(0.0, 0.0));
        assert!((resampled[1].width - 10.2).abs() < 1e-9);
    }

    #[test]
    fn test_circular_mean_wraps() {
        let values = [
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(6.0, 0.0),
            Vec2::new(9.0, 3.0),
        ];
        assert_eq!(circular_mean(&values, 0, 3), Vec2::new(4.0, 1.0));
        assert_eq!(circular_mean(&values, 2, 1), Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MeshConfig {
            normal_window: 6,
            ..Default::default()
        };
        assert!(matches!(
            MeshGenerator::new(config),
            Err(MeshError::InvalidConfig(_))
        ));
    }
}
