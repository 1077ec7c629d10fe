use serde::{Deserialize, Serialize};

pub mod agent;
pub mod boundary;
pub mod cell;
pub mod engagement;
pub mod environment;
pub mod error;
pub mod generator;
pub mod map;
pub mod noise;
pub mod palette;
pub mod pathfinding;
pub mod weighting;

pub use agent::{Agent, PlanningAgent, RandomWalker};
pub use cell::{Cell, DoorDirection, ItemKind, WallDirection};
pub use engagement::{EngagementMetrics, EngagementTracker, EpisodeOutcome};
pub use environment::{Action, ActionResult, Environment, RewardTable};
pub use error::{ConfigurationError, RoomError};
pub use generator::{
    GenerationMethod, GeneratorConfig, InMemoryArchive, LayoutArchive, RoomData, RoomGenerator,
    generate_room,
};
pub use map::Grid;
pub use palette::{TileArchetype, TilePalette};

/// Represents a 2D coordinate. `(0, 0)` is the bottom-left corner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns manhattan distance between two positions
    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}
