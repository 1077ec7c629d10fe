use std::collections::BTreeSet;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Position,
    boundary::{self, BoundaryLayout, DoorPositions},
    cell::Cell,
    engagement::{EngagementMetrics, EpisodeOutcome, INCREASE_BUFFER_RANGE},
    error::{ConfigurationError, RoomError},
    map::Grid,
    noise::PerlinNoise1D,
    palette::TilePalette,
    pathfinding,
    weighting::ContentWeights,
};

/// How the interior of a room is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenerationMethod {
    /// Door-to-door paths are carved first, the rest is weighted by engagement.
    #[default]
    AStar,
    /// Floor or pit with even odds everywhere; rooms may not be completable.
    Random,
    /// Each column is floor up to a height read from seeded noise and pit above it.
    /// No paths are carved, so rooms may not be completable.
    PerlinNoise,
}

/// Distance between neighbouring columns on the noise curve.
const NOISE_FREQUENCY: f32 = 0.35;

/// Settings for room generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub width: usize,
    pub height: usize,
    pub method: GenerationMethod,
    /// Factor the best score must be beaten by before a layout is archived.
    pub engagement_increase_buffer: f32,
    /// Value carried by every generated item.
    pub item_value: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            width: 17,
            height: 9,
            method: GenerationMethod::AStar,
            engagement_increase_buffer: 1.5,
            item_value: 1,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        boundary::validate_size(self.width, self.height)?;
        if !INCREASE_BUFFER_RANGE.contains(&self.engagement_increase_buffer) {
            return Err(ConfigurationError::IncreaseBuffer(
                self.engagement_increase_buffer,
            ));
        }
        if self.item_value == 0 {
            return Err(ConfigurationError::Invalid {
                name: "item_value",
                reason: "items must be worth at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Progress of a room through generation. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GenerationStage {
    Empty,
    BoundaryPlaced,
    PathsComputed,
    ContentFilled,
    Rendered,
}

/// A room and everything generation learned about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    grid: Grid<Cell>,
    doors: DoorPositions,
    guaranteed_floor: BTreeSet<Position>,
    unreachable: Vec<(Position, Position)>,
    weights: Option<ContentWeights>,
    stage: GenerationStage,
}

impl RoomData {
    /// Allocates an empty `width x height` room.
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigurationError> {
        boundary::validate_size(width, height)?;
        Ok(RoomData {
            grid: Grid::new(width, height),
            doors: DoorPositions::for_size(width, height),
            guaranteed_floor: BTreeSet::new(),
            unreachable: Vec::new(),
            weights: None,
            stage: GenerationStage::Empty,
        })
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    pub fn doors(&self) -> &DoorPositions {
        &self.doors
    }

    /// Interior cells kept as floor so every door reaches every other door.
    pub fn guaranteed_floor(&self) -> &BTreeSet<Position> {
        &self.guaranteed_floor
    }

    /// Door pairs the pathfinder could not connect. Empty for a healthy room.
    pub fn unreachable(&self) -> &[(Position, Position)] {
        &self.unreachable
    }

    /// Weights used for the content fill, once it has run with [`GenerationMethod::AStar`].
    pub fn weights(&self) -> Option<ContentWeights> {
        self.weights
    }

    pub fn stage(&self) -> GenerationStage {
        self.stage
    }

    fn expect_stage(
        &self,
        operation: &'static str,
        allowed: &[GenerationStage],
    ) -> Result<(), RoomError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(RoomError::InvalidStage {
                operation,
                stage: self.stage,
            })
        }
    }

    /// Writes walls and doors around the room.
    pub fn place_boundary(&mut self) -> Result<(), RoomError> {
        self.expect_stage("place the boundary", &[GenerationStage::Empty])?;
        let layout = BoundaryLayout::compute(self.width(), self.height())?;
        layout.apply(&mut self.grid)?;
        self.doors = *layout.doors();
        self.stage = GenerationStage::BoundaryPlaced;
        log::debug!(
            "Placed {} walls and {} doors",
            layout.walls().len(),
            layout.door_positions().len()
        );
        Ok(())
    }

    /// Connects every pair of doors and records the cells those paths use.
    ///
    /// Missing connections are logged and kept in [`RoomData::unreachable`];
    /// they do not abort generation.
    pub fn compute_paths(&mut self) -> Result<(), RoomError> {
        self.expect_stage("compute paths", &[GenerationStage::BoundaryPlaced])?;
        let doors: Vec<Position> = self.doors.iter().map(|(_, p)| p).collect();
        let report = pathfinding::connect_doors(&self.grid, &doors, Cell::is_walkable);
        if !report.is_complete() {
            log::warn!(
                "{} door pair(s) unreachable; filling the room without them",
                report.unreachable.len()
            );
        }
        self.guaranteed_floor = report.floor;
        self.unreachable = report.unreachable;
        self.stage = GenerationStage::PathsComputed;
        Ok(())
    }

    /// Fills the interior: guaranteed cells become floor, everything else is
    /// sampled from `weights`. Cells are visited row by row from the bottom.
    pub fn fill_content<R: Rng>(
        &mut self,
        weights: ContentWeights,
        item_value: u32,
        rng: &mut R,
    ) -> Result<(), RoomError> {
        self.expect_stage("fill content", &[GenerationStage::PathsComputed])?;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let position = Position::new(x, y);
                if !self.grid.is_interior(position) {
                    continue;
                }
                self.grid[position] = if self.guaranteed_floor.contains(&position) {
                    Cell::Floor { explored: false }
                } else {
                    weights.sample(rng, item_value)
                };
            }
        }
        self.weights = Some(weights);
        self.stage = GenerationStage::ContentFilled;
        Ok(())
    }

    /// Fills the interior with floor or pit at even odds, without carving paths.
    pub fn fill_uniform<R: Rng>(&mut self, rng: &mut R) -> Result<(), RoomError> {
        self.expect_stage("fill content", &[GenerationStage::BoundaryPlaced])?;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let position = Position::new(x, y);
                if self.grid.is_interior(position) {
                    self.grid[position] = if rng.random_bool(0.5) {
                        Cell::Floor { explored: false }
                    } else {
                        Cell::Pit
                    };
                }
            }
        }
        self.stage = GenerationStage::ContentFilled;
        Ok(())
    }

    /// Fills the interior column by column: floor from the bottom row up to the
    /// noise height, pit above it. Paths are not carved.
    pub fn fill_noise(&mut self, noise: &PerlinNoise1D) -> Result<(), RoomError> {
        self.expect_stage("fill content", &[GenerationStage::BoundaryPlaced])?;
        let rows = self.height() as i64 - 2;
        for x in 1..self.width() - 1 {
            let n = noise.sample(x as f32 * NOISE_FREQUENCY + 0.5);
            let surface = (((n - 0.5) * rows as f32).floor() as i64 + rows / 2).clamp(0, rows - 1);
            for y in 1..self.height() - 1 {
                self.grid[Position::new(x, y)] = if (y as i64 - 1) <= surface {
                    Cell::Floor { explored: false }
                } else {
                    Cell::Pit
                };
            }
        }
        self.stage = GenerationStage::ContentFilled;
        Ok(())
    }

    /// Resolves every cell to a palette handle.
    ///
    /// A missing archetype is a configuration error and leaves the stage unchanged.
    pub fn render<H: Clone>(&mut self, palette: &TilePalette<H>) -> Result<Grid<H>, RoomError> {
        self.expect_stage(
            "render",
            &[GenerationStage::ContentFilled, GenerationStage::Rendered],
        )?;
        let tiles = self
            .grid
            .try_map(|_, cell| palette.resolve(cell.archetype()).cloned())?;
        self.stage = GenerationStage::Rendered;
        Ok(tiles)
    }
}

/// Generates a room of `config`'s size and method, up to the content fill.
pub fn build_room(
    config: &GeneratorConfig,
    previous: &EngagementMetrics,
    seed: u64,
) -> Result<RoomData, RoomError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut room = RoomData::new(config.width, config.height)?;
    room.place_boundary()?;

    match config.method {
        GenerationMethod::AStar => {
            room.compute_paths()?;
            let weights = ContentWeights::from_engagement(previous);
            log::debug!(
                "Content weights item={:.3} pit={:.3} floor={:.3}",
                weights.item_weight(),
                weights.pit_weight(),
                weights.floor_weight()
            );
            room.fill_content(weights, config.item_value, &mut rng)?;
        }
        GenerationMethod::Random => room.fill_uniform(&mut rng)?,
        GenerationMethod::PerlinNoise => room.fill_noise(&PerlinNoise1D::new(seed))?,
    }

    log::info!(
        "Generated {}x{} room (seed {}, {} guaranteed floor cells)",
        room.width(),
        room.height(),
        seed,
        room.guaranteed_floor().len()
    );
    Ok(room)
}

/// Generates a `width x height` room whose doors are all connected, with
/// content weighted by the previous episode's engagement.
pub fn generate_room(
    width: usize,
    height: usize,
    previous: &EngagementMetrics,
    seed: u64,
) -> Result<RoomData, RoomError> {
    let config = GeneratorConfig {
        width,
        height,
        ..GeneratorConfig::default()
    };
    build_room(&config, previous, seed)
}

/// Receives layouts whose engagement beat the best score by the configured margin.
pub trait LayoutArchive {
    fn on_high_engagement_layout(&mut self, grid: &Grid<Cell>, score: f32);
}

impl<A: LayoutArchive + ?Sized> LayoutArchive for Box<A> {
    fn on_high_engagement_layout(&mut self, grid: &Grid<Cell>, score: f32) {
        (**self).on_high_engagement_layout(grid, score)
    }
}

/// A layout kept by [`InMemoryArchive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedLayout {
    pub grid: Grid<Cell>,
    pub score: f32,
}

/// Keeps archived layouts in memory, newest last.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchive {
    layouts: Vec<ArchivedLayout>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layouts(&self) -> &[ArchivedLayout] {
        &self.layouts
    }

    pub fn best(&self) -> Option<&ArchivedLayout> {
        self.layouts.last()
    }
}

impl LayoutArchive for InMemoryArchive {
    fn on_high_engagement_layout(&mut self, grid: &Grid<Cell>, score: f32) {
        self.layouts.push(ArchivedLayout {
            grid: grid.clone(),
            score,
        });
    }
}

/// A generated room together with its palette handles.
#[derive(Debug, Clone)]
pub struct RenderedRoom<H> {
    pub room: RoomData,
    pub tiles: Grid<H>,
    pub seed: u64,
}

/// Owns the current room, the palette and the archive for one host.
pub struct RoomGenerator<H, A> {
    config: GeneratorConfig,
    palette: TilePalette<H>,
    archive: A,
    current: Option<RenderedRoom<H>>,
}

impl<H: Clone, A: LayoutArchive> RoomGenerator<H, A> {
    pub fn new(
        config: GeneratorConfig,
        palette: TilePalette<H>,
        archive: A,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let missing = palette.missing();
        if !missing.is_empty() {
            log::warn!("Tile palette is missing {:?}", missing);
        }
        Ok(RoomGenerator {
            config,
            palette,
            archive,
            current: None,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn palette(&self) -> &TilePalette<H> {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut TilePalette<H> {
        &mut self.palette
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    /// The last room that generated and rendered successfully.
    pub fn current(&self) -> Option<&RenderedRoom<H>> {
        self.current.as_ref()
    }

    /// Generates and renders a new room. On error the current room is kept.
    pub fn generate(
        &mut self,
        previous: &EngagementMetrics,
        seed: u64,
    ) -> Result<&RenderedRoom<H>, RoomError> {
        let mut room = build_room(&self.config, previous, seed)?;
        let tiles = room.render(&self.palette).inspect_err(|err| {
            log::error!("Room generation aborted: {}", err);
        })?;
        Ok(&*self.current.insert(RenderedRoom { room, tiles, seed }))
    }

    /// Hands the current layout to the archive when the episode set a new best.
    ///
    /// Returns whether the layout was archived.
    pub fn complete_episode(&mut self, outcome: &EpisodeOutcome) -> bool {
        if !outcome.new_best {
            return false;
        }
        match &self.current {
            Some(current) => {
                log::info!(
                    "Archiving layout from seed {} with engagement {:.2}",
                    current.seed,
                    outcome.score
                );
                self.archive
                    .on_high_engagement_layout(current.room.grid(), outcome.score);
                true
            }
            None => false,
        }
    }
}
