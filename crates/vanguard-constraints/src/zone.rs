//! No-go zone polygons.
//!
//! A [`NoGoZone`] is a named, implicitly-closed 2-D polygon (the last vertex
//! connects back to the first; z is ignored throughout). Zones model hazards
//! that span all altitudes, which is why containment and path tests are
//! strictly planar while the separate minimum-separation check uses full 3-D
//! distance.

use serde::{Deserialize, Serialize};
use vanguard_types::Position;

/// A restricted polygonal area that commands may not target or path through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoGoZone {
    pub name: String,
    /// Ordered `(x, y)` vertices; at least 3 for a valid polygon.
    pub vertices: Vec<(f64, f64)>,
}

impl NoGoZone {
    pub fn new(name: impl Into<String>, vertices: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.into(),
            vertices,
        }
    }

    /// Even-odd ray-casting containment test.
    ///
    /// Boundary convention: edges are half-open – each edge counts its
    /// lower-y endpoint and excludes its upper-y endpoint, and the strict
    /// `<` comparison on the crossing abscissa classifies points lying
    /// exactly on an edge as *outside*. The result is deterministic and
    /// internally consistent: a point shared by two zones tiled edge-to-edge
    /// is claimed by at most one of them.
    ///
    /// Degenerate polygons (fewer than 3 vertices) contain nothing.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = self.vertices[i];
            let (xj, yj) = self.vertices[j];
            if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Planar containment for a 3-D position (altitude ignored).
    pub fn contains_position(&self, pos: &Position) -> bool {
        self.contains_point(pos.x, pos.y)
    }

    /// `true` when the straight segment `start → end` touches this zone:
    /// either endpoint inside, or the segment crosses any polygon edge.
    pub fn path_intersects(&self, start: &Position, end: &Position) -> bool {
        if self.contains_position(start) || self.contains_position(end) {
            return true;
        }

        let n = self.vertices.len();
        for i in 0..n {
            let (x1, y1) = self.vertices[i];
            let (x2, y2) = self.vertices[(i + 1) % n];
            if segments_intersect(start.x, start.y, end.x, end.y, x1, y1, x2, y2) {
                return true;
            }
        }
        false
    }

    /// Axis-aligned bounding box as `(min_x, min_y, max_x, max_y)`.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for &(x, y) in &self.vertices {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// Candidate detour waypoints around this zone, excluding start and end.
    ///
    /// The zone's bounding box is expanded by `margin`; the four corners are
    /// tried as single-waypoint routes and the four adjacent corner pairs as
    /// two-waypoint routes, keeping whichever minimises total path length.
    /// This is a bounding-box heuristic, not a path planner: the result is
    /// never guaranteed optimal, nor collision-free against *other* zones.
    /// Callers must re-validate every produced leg.
    pub fn detour_waypoints(&self, start: &Position, end: &Position, margin: f64) -> Vec<Position> {
        let (mut min_x, mut min_y, mut max_x, mut max_y) = self.bounding_box();
        min_x -= margin;
        min_y -= margin;
        max_x += margin;
        max_y += margin;

        let corners = [
            (min_x, min_y),
            (min_x, max_y),
            (max_x, max_y),
            (max_x, min_y),
        ];

        let mut best_path: Vec<Position> = Vec::new();
        let mut best_distance = f64::INFINITY;

        for &(cx, cy) in &corners {
            let dist = planar_dist(start.x, start.y, cx, cy) + planar_dist(end.x, end.y, cx, cy);
            if dist < best_distance {
                best_distance = dist;
                best_path = vec![Position::new(cx, cy, start.z)];
            }
        }

        for i in 0..4 {
            let (c1x, c1y) = corners[i];
            let (c2x, c2y) = corners[(i + 1) % 4];
            let dist = planar_dist(start.x, start.y, c1x, c1y)
                + planar_dist(c1x, c1y, c2x, c2y)
                + planar_dist(c2x, c2y, end.x, end.y);
            if dist < best_distance {
                best_distance = dist;
                best_path = vec![
                    Position::new(c1x, c1y, start.z),
                    Position::new(c2x, c2y, start.z),
                ];
            }
        }

        best_path
    }
}

fn planar_dist(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// Proper-crossing test for two 2-D segments via CCW orientation.
#[allow(clippy::too_many_arguments)]
fn segments_intersect(
    ax1: f64,
    ay1: f64,
    ax2: f64,
    ay2: f64,
    bx1: f64,
    by1: f64,
    bx2: f64,
    by2: f64,
) -> bool {
    fn ccw(px: f64, py: f64, qx: f64, qy: f64, rx: f64, ry: f64) -> bool {
        (ry - py) * (qx - px) > (qy - py) * (rx - px)
    }

    ccw(ax1, ay1, bx1, by1, bx2, by2) != ccw(ax2, ay2, bx1, by1, bx2, by2)
        && ccw(ax1, ay1, ax2, ay2, bx1, by1) != ccw(ax1, ay1, ax2, ay2, bx2, by2)
}
