use serde::{Deserialize, Serialize};

use crate::palette::TileArchetype;

/// Facing of a boundary wall piece, corners included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallDirection {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl WallDirection {
    pub const ALL: [WallDirection; 8] = [
        WallDirection::Top,
        WallDirection::Bottom,
        WallDirection::Left,
        WallDirection::Right,
        WallDirection::TopLeft,
        WallDirection::TopRight,
        WallDirection::BottomLeft,
        WallDirection::BottomRight,
    ];
}

/// The side of the room a door sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DoorDirection {
    Top,
    Bottom,
    Left,
    Right,
}

impl DoorDirection {
    pub const ALL: [DoorDirection; 4] = [
        DoorDirection::Top,
        DoorDirection::Bottom,
        DoorDirection::Left,
        DoorDirection::Right,
    ];
}

/// Collectable items that can be placed on the floor of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Coin,
    Bomb,
    Key,
}

impl ItemKind {
    /// Picks an item from a single uniform draw in `[0, 1)`.
    ///
    /// `[0, 0.33)` is a coin, `[0.33, 0.66)` a key and the rest a bomb.
    pub fn from_uniform(value: f32) -> Self {
        if value < 0.33 {
            ItemKind::Coin
        } else if value < 0.66 {
            ItemKind::Key
        } else {
            ItemKind::Bomb
        }
    }
}

/// The content of one grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall(WallDirection),
    Door { direction: DoorDirection, open: bool },
    Floor { explored: bool },
    Pit,
    /// An item lying on a floor cell.
    Item { kind: ItemKind, value: u32 },
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Floor { explored: false }
    }
}

/// What happens when an agent tries to enter a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Solid cell; the move is refused.
    Blocked,
    /// Plain floor. `first_visit` is set when the cell has not been explored yet.
    Walk { first_visit: bool },
    /// The item is collected and the cell becomes floor.
    Pickup { kind: ItemKind, value: u32 },
    /// The agent leaves the room through this door.
    Exit(DoorDirection),
}

impl Cell {
    /// Whether a generated path may run through this cell.
    pub fn is_walkable(&self) -> bool {
        matches!(self, Cell::Floor { .. } | Cell::Item { .. })
    }

    pub fn is_door(&self) -> bool {
        matches!(self, Cell::Door { .. })
    }

    /// Collision and interaction behaviour of the cell.
    pub fn contact(&self) -> Contact {
        match *self {
            Cell::Wall(_) | Cell::Pit => Contact::Blocked,
            Cell::Door { open: false, .. } => Contact::Blocked,
            Cell::Door {
                direction,
                open: true,
            } => Contact::Exit(direction),
            Cell::Floor { explored } => Contact::Walk {
                first_visit: !explored,
            },
            Cell::Item { kind, value } => Contact::Pickup { kind, value },
        }
    }

    /// The palette entry needed to draw this cell.
    pub fn archetype(&self) -> TileArchetype {
        match *self {
            Cell::Wall(direction) => TileArchetype::Wall(direction),
            Cell::Door { direction, .. } => TileArchetype::Door(direction),
            Cell::Floor { .. } => TileArchetype::Floor,
            Cell::Pit => TileArchetype::Pit,
            Cell::Item { kind, .. } => TileArchetype::Item(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_from_uniform_bands() {
        assert_eq!(ItemKind::from_uniform(0.0), ItemKind::Coin);
        assert_eq!(ItemKind::from_uniform(0.329), ItemKind::Coin);
        assert_eq!(ItemKind::from_uniform(0.33), ItemKind::Key);
        assert_eq!(ItemKind::from_uniform(0.659), ItemKind::Key);
        assert_eq!(ItemKind::from_uniform(0.66), ItemKind::Bomb);
        assert_eq!(ItemKind::from_uniform(0.999), ItemKind::Bomb);
    }

    #[test]
    fn test_contact_dispatch() {
        assert_eq!(Cell::Wall(WallDirection::Top).contact(), Contact::Blocked);
        assert_eq!(Cell::Pit.contact(), Contact::Blocked);
        assert_eq!(
            Cell::default().contact(),
            Contact::Walk { first_visit: true }
        );
        assert_eq!(
            Cell::Floor { explored: true }.contact(),
            Contact::Walk { first_visit: false }
        );
        assert_eq!(
            Cell::Door {
                direction: DoorDirection::Left,
                open: true
            }
            .contact(),
            Contact::Exit(DoorDirection::Left)
        );
        assert_eq!(
            Cell::Door {
                direction: DoorDirection::Left,
                open: false
            }
            .contact(),
            Contact::Blocked
        );
        assert_eq!(
            Cell::Item {
                kind: ItemKind::Key,
                value: 2
            }
            .contact(),
            Contact::Pickup {
                kind: ItemKind::Key,
                value: 2
            }
        );
    }

    #[test]
    fn test_walkable_cells() {
        assert!(Cell::default().is_walkable());
        assert!(
            Cell::Item {
                kind: ItemKind::Coin,
                value: 1
            }
            .is_walkable()
        );
        assert!(!Cell::Pit.is_walkable());
        assert!(!Cell::Wall(WallDirection::BottomLeft).is_walkable());
        assert!(
            !Cell::Door {
                direction: DoorDirection::Top,
                open: true
            }
            .is_walkable()
        );
    }
}
