use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Position,
    cell::{Cell, Contact},
    environment::{Action, EnvironmentView},
    pathfinding,
};

/// Trait defining the behavior of an agent.
/// Agents decide which action to take based on the EnvironmentView.
pub trait Agent {
    /// Determines the action the agent wants to perform based on its view of the room.
    fn get_action(&mut self, view: &EnvironmentView) -> Action;
}

/// An agent that steps in a random direction every turn.
#[derive(Debug)]
pub struct RandomWalker {
    rng: StdRng,
}

impl RandomWalker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomWalker {
    fn get_action(&mut self, _view: &EnvironmentView) -> Action {
        Action::MOVES[self.rng.random_range(0..Action::MOVES.len())]
    }
}

/// Collects the nearest reachable item until none are left, then heads for the nearest door.
#[derive(Debug, Default)]
pub struct PlanningAgent {
    current_plan: VecDeque<Position>,
}

impl PlanningAgent {
    pub fn new() -> Self {
        Self {
            current_plan: VecDeque::new(),
        }
    }

    /// Positions still queued in the current plan.
    pub fn plan(&self) -> &VecDeque<Position> {
        &self.current_plan
    }

    fn find_items(view: &EnvironmentView) -> Vec<Position> {
        view.grid
            .enumerate()
            .filter(|(_, cell)| matches!(cell, Cell::Item { .. }))
            .map(|((x, y), _)| Position::new(x, y))
            .collect()
    }

    /// Shortest plan to any of `targets`; earlier targets win ties.
    fn plan_to_nearest_target(
        start: Position,
        targets: &[Position],
        view: &EnvironmentView,
    ) -> Option<Vec<Position>> {
        let mut best_plan: Option<Vec<Position>> = None;
        for target in targets {
            if let Some(plan) = pathfinding::find_path(view.grid, start, *target, Cell::is_walkable)
            {
                if best_plan.as_ref().is_none_or(|best| plan.len() < best.len()) {
                    best_plan = Some(plan);
                }
            }
        }
        best_plan
    }

    fn replan(&mut self, view: &EnvironmentView) {
        self.current_plan.clear();
        let start = view.location;

        let items = Self::find_items(view);
        let plan = Self::plan_to_nearest_target(start, &items, view).or_else(|| {
            let doors: Vec<Position> = view.doors.iter().map(|(_, p)| p).collect();
            Self::plan_to_nearest_target(start, &doors, view)
        });

        if let Some(plan) = plan {
            // Skip the first position (current position)
            self.current_plan.extend(plan.into_iter().skip(1));
        }
    }
}

impl Agent for PlanningAgent {
    fn get_action(&mut self, view: &EnvironmentView) -> Action {
        let current_pos = view.location;

        let stale = match self.current_plan.front() {
            Some(next) => {
                view.grid.get(next.x, next.y).map(Cell::contact) == Some(Contact::Blocked)
                    || Action::between(current_pos, *next).is_none()
            }
            None => true,
        };
        if stale {
            self.replan(view);
        }

        match self.current_plan.pop_front() {
            Some(next_pos) => Action::between(current_pos, next_pos).unwrap_or(Action::Wait),
            None => Action::Wait,
        }
    }
}
