use serde::{Deserialize, Serialize};

use crate::{
    Position,
    cell::{Cell, DoorDirection, WallDirection},
    error::ConfigurationError,
    map::Grid,
};

/// Smallest side length that leaves an interior and keeps doors off the corners.
pub const MIN_ROOM_SIDE: usize = 3;
/// Largest side length a single room may have.
pub const MAX_ROOM_SIDE: usize = 100;

/// Location of the door on each side of a room.
///
/// The perimeter is column 0, column `width - 1`, row 0 and row `height - 1`.
/// Each door sits at the integer midpoint of its side:
///
/// ```text
///                      maxY
///   (0, maxY) +------- door -------+ (maxX, maxY)
///             |                    |
///        door |                    | door
///             |                    |
///      (0, 0) +------- door -------+ (maxX, 0)
///                      minY
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorPositions {
    pub top: Position,
    pub bottom: Position,
    pub left: Position,
    pub right: Position,
}

impl DoorPositions {
    /// Midpoint doors for a `width x height` room. Sizes are not validated here.
    pub fn for_size(width: usize, height: usize) -> Self {
        let max_x = width.saturating_sub(1);
        let max_y = height.saturating_sub(1);
        DoorPositions {
            top: Position::new(max_x / 2, max_y),
            bottom: Position::new(max_x / 2, 0),
            left: Position::new(0, max_y / 2),
            right: Position::new(max_x, max_y / 2),
        }
    }

    pub fn get(&self, direction: DoorDirection) -> Position {
        match direction {
            DoorDirection::Top => self.top,
            DoorDirection::Bottom => self.bottom,
            DoorDirection::Left => self.left,
            DoorDirection::Right => self.right,
        }
    }

    /// Doors in [`DoorDirection::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (DoorDirection, Position)> + '_ {
        DoorDirection::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}

/// Checks that a room of this size can hold four distinct midpoint doors.
pub fn validate_size(width: usize, height: usize) -> Result<(), ConfigurationError> {
    let range = MIN_ROOM_SIDE..=MAX_ROOM_SIDE;
    if range.contains(&width) && range.contains(&height) {
        Ok(())
    } else {
        Err(ConfigurationError::RoomSize {
            width,
            height,
            min: MIN_ROOM_SIDE,
            max: MAX_ROOM_SIDE,
        })
    }
}

/// Returns the door facing for `(x, y)` if that position holds a door.
pub fn check_door(x: usize, y: usize, width: usize, height: usize) -> Option<DoorDirection> {
    let doors = DoorPositions::for_size(width, height);
    let position = Position::new(x, y);
    DoorDirection::ALL
        .into_iter()
        .find(|direction| doors.get(*direction) == position)
}

/// Returns the wall facing for `(x, y)` if that position is on the perimeter.
///
/// Door positions are perimeter cells too; callers test [`check_door`] first.
pub fn check_wall(x: usize, y: usize, width: usize, height: usize) -> Option<WallDirection> {
    if x >= width || y >= height {
        return None;
    }
    let max_x = width - 1;
    let max_y = height - 1;

    let left = x == 0;
    let right = x == max_x;
    let bottom = y == 0;
    let top = y == max_y;

    match (left, right, bottom, top) {
        (true, _, true, _) => Some(WallDirection::BottomLeft),
        (true, _, _, true) => Some(WallDirection::TopLeft),
        (true, _, _, _) => Some(WallDirection::Left),
        (_, true, true, _) => Some(WallDirection::BottomRight),
        (_, true, _, true) => Some(WallDirection::TopRight),
        (_, true, _, _) => Some(WallDirection::Right),
        (_, _, true, _) => Some(WallDirection::Bottom),
        (_, _, _, true) => Some(WallDirection::Top),
        _ => None,
    }
}

/// Classifies a position as door, wall or interior (`None`).
pub fn classify(x: usize, y: usize, width: usize, height: usize) -> Option<Cell> {
    if let Some(direction) = check_door(x, y, width, height) {
        return Some(Cell::Door {
            direction,
            open: true,
        });
    }
    check_wall(x, y, width, height).map(Cell::Wall)
}

/// The result of one scan over the room perimeter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLayout {
    width: usize,
    height: usize,
    doors: DoorPositions,
    door_positions: Vec<Position>,
    walls: Vec<(Position, WallDirection)>,
}

impl BoundaryLayout {
    /// Scans a `width x height` grid once, collecting door and wall positions in
    /// row-major order.
    pub fn compute(width: usize, height: usize) -> Result<Self, ConfigurationError> {
        validate_size(width, height)?;

        let mut door_positions = Vec::with_capacity(4);
        let mut walls = Vec::with_capacity(2 * (width + height));
        for y in 0..height {
            for x in 0..width {
                match classify(x, y, width, height) {
                    Some(Cell::Door { .. }) => door_positions.push(Position::new(x, y)),
                    Some(Cell::Wall(direction)) => walls.push((Position::new(x, y), direction)),
                    _ => {}
                }
            }
        }

        Ok(BoundaryLayout {
            width,
            height,
            doors: DoorPositions::for_size(width, height),
            door_positions,
            walls,
        })
    }

    pub fn doors(&self) -> &DoorPositions {
        &self.doors
    }

    /// Door positions in scan order.
    pub fn door_positions(&self) -> &[Position] {
        &self.door_positions
    }

    pub fn walls(&self) -> &[(Position, WallDirection)] {
        &self.walls
    }

    /// Writes the doors and walls into `grid`, which must match the layout size.
    pub fn apply(&self, grid: &mut Grid<Cell>) -> Result<(), ConfigurationError> {
        if grid.width() != self.width || grid.height() != self.height {
            return Err(ConfigurationError::Invalid {
                name: "grid",
                reason: format!(
                    "grid is {}x{} but the layout was computed for {}x{}",
                    grid.width(),
                    grid.height(),
                    self.width,
                    self.height
                ),
            });
        }
        for (position, direction) in &self.walls {
            grid[*position] = Cell::Wall(*direction);
        }
        for (direction, position) in self.doors.iter() {
            grid[position] = Cell::Door {
                direction,
                open: true,
            };
        }
        Ok(())
    }
}
