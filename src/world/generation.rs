//! Room layout generation

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::error::{GuardError, Result};
use crate::core::types::{CellKind, Position};
use crate::world::grid::GridWorld;

/// Placement attempts before giving up on reaching `room_count`
const MAX_ROOM_ATTEMPTS: u32 = 100;

/// Room interior side lengths (inclusive)
const MIN_ROOM_SIDE: i32 = 3;
const MAX_ROOM_SIDE: i32 = 5;

/// A placed room: interior rectangle plus its single door cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomRect {
    pub top: i32,
    pub left: i32,
    pub rows: i32,
    pub cols: i32,
    pub door: Position,
}

impl RoomRect {
    /// Bounds including the wall ring, inclusive on both ends
    fn outer(&self) -> (i32, i32, i32, i32) {
        (self.top - 1, self.left - 1, self.top + self.rows, self.left + self.cols)
    }

    fn overlaps(&self, other: &RoomRect) -> bool {
        let (t0, l0, b0, r0) = self.outer();
        let (t1, l1, b1, r1) = other.outer();
        !(b0 + 1 < t1 || t0 > b1 + 1 || r0 + 1 < l1 || l0 > r1 + 1)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= self.top
            && pos.row < self.top + self.rows
            && pos.col >= self.left
            && pos.col < self.left + self.cols
    }
}

/// Generated layout and the rooms carved into it
#[derive(Debug, Clone)]
pub struct Layout {
    pub grid: GridWorld,
    pub rooms: Vec<RoomRect>,
}

/// Generate a square world: wall border, floor corridors, and up to
/// `room_count` walled rooms each with one door
pub fn generate_rooms(size: usize, room_count: usize, rng: &mut ChaCha8Rng) -> Result<Layout> {
    if size < 3 {
        return Err(GuardError::InvalidMap(format!(
            "world size {size} is too small for a wall border"
        )));
    }

    let mut grid = GridWorld::open(size, size);
    let mut rooms: Vec<RoomRect> = Vec::new();
    let size = size as i32;

    let mut attempts = 0;
    while rooms.len() < room_count && attempts < MAX_ROOM_ATTEMPTS {
        attempts += 1;

        let rows = rng.gen_range(MIN_ROOM_SIDE..=MAX_ROOM_SIDE);
        let cols = rng.gen_range(MIN_ROOM_SIDE..=MAX_ROOM_SIDE);
        // Keep a corridor between the room's wall ring and the border so
        // every door opens onto floor
        if size - rows - 2 <= 3 || size - cols - 2 <= 3 {
            continue;
        }
        let top = rng.gen_range(3..size - rows - 2);
        let left = rng.gen_range(3..size - cols - 2);

        let door = match rng.gen_range(0..4) {
            0 => Position::new(top - 1, rng.gen_range(left..left + cols)),
            1 => Position::new(top + rows, rng.gen_range(left..left + cols)),
            2 => Position::new(rng.gen_range(top..top + rows), left - 1),
            _ => Position::new(rng.gen_range(top..top + rows), left + cols),
        };

        let room = RoomRect { top, left, rows, cols, door };
        if rooms.iter().any(|r| r.overlaps(&room)) {
            continue;
        }

        carve_room(&mut grid, &room)?;
        rooms.push(room);
    }

    tracing::debug!(rooms = rooms.len(), attempts, "generated layout");
    Ok(Layout { grid, rooms })
}

fn carve_room(grid: &mut GridWorld, room: &RoomRect) -> Result<()> {
    let (top, left, bottom, right) = room.outer();
    for row in top..=bottom {
        for col in left..=right {
            let pos = Position::new(row, col);
            let kind = if room.contains(pos) { CellKind::Room } else { CellKind::Wall };
            grid.set(pos, kind)?;
        }
    }
    grid.set(room.door, CellKind::Floor)
}
