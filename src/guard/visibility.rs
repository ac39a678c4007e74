//! Range- and cone-limited line of sight
//!
//! A target is visible when it is within range, inside the vision cone
//! centred on the guard's facing, and no wall lies strictly between the
//! two cells on the Bresenham line.

use crate::core::types::{Action, Position};
use crate::world::grid::GridWorld;

/// Angles within this much of the cone edge count as inside
const FOV_TOLERANCE_DEG: f64 = 1e-9;

/// Vision parameters for a single observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionCone {
    pub max_range: f64,
    pub fov_degrees: f64,
}

impl VisionCone {
    pub fn new(max_range: f64, fov_degrees: f64) -> Self {
        Self { max_range, fov_degrees }
    }

    pub fn can_see(&self, observer: Position, target: Position, grid: &GridWorld, facing: Action) -> bool {
        is_visible(observer, target, grid, facing, self.max_range, self.fov_degrees)
    }
}

/// Line-of-sight test between two cells
pub fn is_visible(
    observer: Position,
    target: Position,
    grid: &GridWorld,
    facing: Action,
    max_range: f64,
    fov_degrees: f64,
) -> bool {
    let dist = observer.distance(&target);
    if dist == 0.0 || dist > max_range {
        return false;
    }

    if angle_from_facing(observer, target, facing) > fov_degrees / 2.0 + FOV_TOLERANCE_DEG {
        return false;
    }

    BresenhamLine::new(observer, target)
        .filter(|cell| *cell != target)
        .all(|cell| !grid.is_wall(cell))
}

/// Angle in degrees between the facing direction and observer→target
pub fn angle_from_facing(observer: Position, target: Position, facing: Action) -> f64 {
    let (dr, dc) = observer.offset_to(&target);
    let dist = observer.distance(&target);
    if dist == 0.0 {
        return 0.0;
    }
    let (fr, fc) = facing.unit_vector();
    let cos = ((dr as f64 * fr + dc as f64 * fc) / dist).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Cells on the line from `from` to `to`, excluding `from`, ending at `to`
///
/// The error term is kept doubled so both the row-major and column-major
/// branches step with pure integer arithmetic. Ties in axis length are
/// walked column-major.
#[derive(Debug, Clone)]
pub struct BresenhamLine {
    current: Position,
    remaining: i32,
    row_major: bool,
    step_row: i32,
    step_col: i32,
    major: i32,
    minor: i32,
    err: i32,
}

impl BresenhamLine {
    pub fn new(from: Position, to: Position) -> Self {
        let (dr, dc) = from.offset_to(&to);
        let row_major = dr.abs() > dc.abs();
        let (major, minor) = if row_major {
            (dr.abs(), dc.abs())
        } else {
            (dc.abs(), dr.abs())
        };
        Self {
            current: from,
            remaining: major,
            row_major,
            step_row: dr.signum(),
            step_col: dc.signum(),
            major,
            minor,
            err: major,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        self.err -= 2 * self.minor;
        if self.err < 0 {
            if self.row_major {
                self.current.col += self.step_col;
            } else {
                self.current.row += self.step_row;
            }
            self.err += 2 * self.major;
        }
        if self.row_major {
            self.current.row += self.step_row;
        } else {
            self.current.col += self.step_col;
        }
        Some(self.current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}
