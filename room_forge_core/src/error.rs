use crate::{generator::GenerationStage, map::GridError, palette::TileArchetype};

/// Fatal setup problems. Retrying with the same inputs fails the same way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Room size {width}x{height} is outside the supported range {min}..={max} per side")]
    RoomSize {
        width: usize,
        height: usize,
        min: usize,
        max: usize,
    },
    #[error("Tile archetype {0:?} is missing from the palette")]
    MissingTile(TileArchetype),
    #[error("Engagement increase buffer {0} must lie within 1.0..=3.0")]
    IncreaseBuffer(f32),
    #[error("Invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Errors returned by room generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoomError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Cannot {operation} while the room is in stage {stage:?}")]
    InvalidStage {
        operation: &'static str,
        stage: GenerationStage,
    },
}
