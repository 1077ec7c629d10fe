use serde::{Deserialize, Serialize};

use crate::{
    Position,
    agent::Agent,
    boundary::DoorPositions,
    cell::{Cell, Contact, DoorDirection, ItemKind},
    engagement::EngagementTracker,
    error::{ConfigurationError, RoomError},
    generator::RoomData,
    map::Grid,
};

/// Reward handed out for each kind of interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    pub coin: f32,
    pub bomb: f32,
    pub key: f32,
    /// Reward for stepping onto a floor cell for the first time.
    pub exploration: f32,
}

impl Default for RewardTable {
    fn default() -> Self {
        RewardTable {
            coin: 3.0,
            bomb: 6.0,
            key: 6.0,
            exploration: 0.25,
        }
    }
}

impl RewardTable {
    pub fn for_item(&self, kind: ItemKind) -> f32 {
        match kind {
            ItemKind::Coin => self.coin,
            ItemKind::Bomb => self.bomb,
            ItemKind::Key => self.key,
        }
    }
}

/// Items collected during an episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub coins: u32,
    pub bombs: u32,
    pub keys: u32,
}

impl Inventory {
    /// Adds `value` units of `kind`.
    pub fn add(&mut self, kind: ItemKind, value: u32) {
        match kind {
            ItemKind::Coin => self.coins += value,
            ItemKind::Bomb => self.bombs += value,
            ItemKind::Key => self.keys += value,
        }
    }

    pub fn count(&self, kind: ItemKind) -> u32 {
        match kind {
            ItemKind::Coin => self.coins,
            ItemKind::Bomb => self.bombs,
            ItemKind::Key => self.keys,
        }
    }

    pub fn total(&self) -> u32 {
        self.coins + self.bombs + self.keys
    }
}

/// Represents actions an agent can decide to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Wait,
    Move { dx: isize, dy: isize },
}

impl Action {
    pub const UP: Action = Action::Move { dx: 0, dy: 1 };
    pub const DOWN: Action = Action::Move { dx: 0, dy: -1 };
    pub const LEFT: Action = Action::Move { dx: -1, dy: 0 };
    pub const RIGHT: Action = Action::Move { dx: 1, dy: 0 };
    pub const MOVES: [Action; 4] = [Action::UP, Action::DOWN, Action::LEFT, Action::RIGHT];

    /// The single step that leads from `src` to the adjacent `dst`.
    pub fn between(src: Position, dst: Position) -> Option<Action> {
        let dx = dst.x as isize - src.x as isize;
        let dy = dst.y as isize - src.y as isize;
        match (dx, dy) {
            (0, 0) => Some(Action::Wait),
            (0, 1) | (0, -1) | (1, 0) | (-1, 0) => Some(Action::Move { dx, dy }),
            _ => None,
        }
    }
}

/// Represents the outcome of processing an agent's action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Waited,
    /// The agent stepped onto floor. `first_visit` is set when it was unexplored.
    Moved { first_visit: bool },
    Collected { kind: ItemKind, value: u32 },
    /// Wall, pit or closed door in the way.
    Blocked,
    /// The agent walked through a door; the episode is over.
    Exited(DoorDirection),
    /// The episode has already ended.
    Finished,
    Failure(String),
}

/// Holds the state of the agent within the room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Position,
    pub inventory: Inventory,
}

/// Provides a read-only view of the room relevant to an agent.
#[derive(Debug)]
pub struct EnvironmentView<'a> {
    pub agent_state: &'a AgentState,
    pub location: Position,
    pub grid: &'a Grid<Cell>,
    pub doors: &'a DoorPositions,
}

/// Picks where the agent enters a room: the centre cell when it lies on a
/// guaranteed path, otherwise the guaranteed-floor cell closest to the centre.
/// Rooms without guaranteed paths fall back to the closest plain floor.
pub fn spawn_point(room: &RoomData) -> Option<Position> {
    let centre = Position::new(room.width() / 2, room.height() / 2);
    let floor = room.guaranteed_floor();
    if floor.contains(&centre) {
        return Some(centre);
    }
    if let Some(nearest) = floor.iter().min_by_key(|p| p.manhattan_distance(&centre)) {
        return Some(*nearest);
    }
    room.grid()
        .enumerate()
        .filter(|(_, cell)| matches!(cell, Cell::Floor { .. }))
        .map(|((x, y), _)| Position::new(x, y))
        .min_by_key(|p| p.manhattan_distance(&centre))
}

/// One episode: an agent moving through a working copy of a room.
pub struct Environment {
    grid: Grid<Cell>,
    doors: DoorPositions,
    rewards: RewardTable,
    max_steps: usize,
    agent: AgentState,
    behavior: Box<dyn Agent>,
    steps: usize,
    exit: Option<DoorDirection>,
}

impl Environment {
    /// Places `behavior` at `spawn` in `grid`.
    pub fn new(
        grid: Grid<Cell>,
        spawn: Position,
        behavior: Box<dyn Agent>,
        rewards: RewardTable,
        max_steps: usize,
    ) -> Result<Self, RoomError> {
        if !matches!(grid.get(spawn.x, spawn.y), Some(Cell::Floor { .. })) {
            return Err(ConfigurationError::Invalid {
                name: "spawn",
                reason: format!("{:?} is not a floor cell", spawn),
            }
            .into());
        }
        let doors = DoorPositions::for_size(grid.width(), grid.height());
        let mut environment = Environment {
            grid,
            doors,
            rewards,
            max_steps,
            agent: AgentState {
                position: spawn,
                inventory: Inventory::default(),
            },
            behavior,
            steps: 0,
            exit: None,
        };
        environment.grid[spawn] = Cell::Floor { explored: true };
        Ok(environment)
    }

    /// Starts an episode in `room` at its [`spawn_point`].
    pub fn for_room(
        room: &RoomData,
        behavior: Box<dyn Agent>,
        rewards: RewardTable,
        max_steps: usize,
    ) -> Result<Self, RoomError> {
        let spawn = spawn_point(room).ok_or_else(|| ConfigurationError::Invalid {
            name: "room",
            reason: "no floor cell to spawn on".to_string(),
        })?;
        Self::new(room.grid().clone(), spawn, behavior, rewards, max_steps)
    }

    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    pub fn agent(&self) -> &AgentState {
        &self.agent
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// The door the agent left through, if it has.
    pub fn exit(&self) -> Option<DoorDirection> {
        self.exit
    }

    pub fn is_finished(&self) -> bool {
        self.exit.is_some() || self.steps >= self.max_steps
    }

    /// Asks the agent for an action and applies it.
    pub fn process_turn(&mut self, tracker: &mut EngagementTracker) -> ActionResult {
        if self.is_finished() {
            return ActionResult::Finished;
        }
        let view = EnvironmentView {
            agent_state: &self.agent,
            location: self.agent.position,
            grid: &self.grid,
            doors: &self.doors,
        };
        let action = self.behavior.get_action(&view);
        let result = self.process_action(action, tracker);
        self.steps += 1;
        if self.steps >= self.max_steps && self.exit.is_none() {
            log::debug!("Episode ran out of steps after {}", self.steps);
        }
        result
    }

    /// Applies a single action and reports engagement to `tracker`.
    pub fn process_action(
        &mut self,
        action: Action,
        tracker: &mut EngagementTracker,
    ) -> ActionResult {
        if self.exit.is_some() {
            return ActionResult::Finished;
        }
        let (dx, dy) = match action {
            Action::Wait => return ActionResult::Waited,
            Action::Move { dx, dy } => (dx, dy),
        };
        if dx.abs() + dy.abs() != 1 {
            return ActionResult::Failure(format!("Move ({}, {}) is not a single step", dx, dy));
        }

        let current = self.agent.position;
        let target = match (
            current.x.checked_add_signed(dx),
            current.y.checked_add_signed(dy),
        ) {
            (Some(x), Some(y)) if self.grid.is_valid(x, y) => Position::new(x, y),
            _ => return ActionResult::Failure("Target position is out of bounds.".to_string()),
        };

        match self.grid[target].contact() {
            Contact::Blocked => ActionResult::Blocked,
            Contact::Walk { first_visit } => {
                self.agent.position = target;
                if first_visit {
                    self.grid[target] = Cell::Floor { explored: true };
                    tracker.record_exploration(1.0);
                    tracker.record_reward(self.rewards.exploration);
                }
                ActionResult::Moved { first_visit }
            }
            Contact::Pickup { kind, value } => {
                self.agent.position = target;
                self.agent.inventory.add(kind, value);
                self.grid[target] = Cell::Floor { explored: true };
                tracker.record_item_pickup(value as f32);
                tracker.record_reward(self.rewards.for_item(kind));
                ActionResult::Collected { kind, value }
            }
            Contact::Exit(direction) => {
                self.agent.position = target;
                self.exit = Some(direction);
                log::debug!("Agent left through the {:?} door", direction);
                ActionResult::Exited(direction)
            }
        }
    }
}
