use std::{
    cmp::Ordering,
    collections::{BTreeSet, BinaryHeap, HashMap, HashSet},
};

use crate::{Position, map::Grid};

/// Frontier entry. The heap pops the lowest `f`, then the lowest `h`, then the
/// entry that was pushed first.
#[derive(Clone, Copy, Eq, PartialEq)]
struct PrioritizedItem {
    f: usize,
    h: usize,
    sequence: u64,
    position: Position,
}

impl Ord for PrioritizedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for PrioritizedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* search over 4-connected cells with unit move cost and a manhattan heuristic.
///
/// A cell may be entered when it is `goal` or when `walkable` accepts it. The
/// returned path runs from `start` to `goal`, both included. Returns `None`
/// once the frontier is exhausted without reaching the goal.
pub fn find_path<T, F>(
    grid: &Grid<T>,
    start: Position,
    goal: Position,
    walkable: F,
) -> Option<Vec<Position>>
where
    F: Fn(&T) -> bool,
{
    if !grid.is_valid(start.x, start.y) || !grid.is_valid(goal.x, goal.y) {
        return None;
    }

    let mut frontier = BinaryHeap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut cost_so_far: HashMap<Position, usize> = HashMap::new();
    let mut closed: HashSet<Position> = HashSet::new();
    let mut sequence = 0u64;

    frontier.push(PrioritizedItem {
        f: start.manhattan_distance(&goal),
        h: start.manhattan_distance(&goal),
        sequence,
        position: start,
    });
    cost_so_far.insert(start, 0);

    while let Some(PrioritizedItem {
        position: current, ..
    }) = frontier.pop()
    {
        if current == goal {
            return Some(retrace(&came_from, start, goal));
        }
        // Stale heap entries for already expanded cells.
        if !closed.insert(current) {
            continue;
        }

        let current_cost = cost_so_far[&current];
        for neighbour in grid.neighbours(current) {
            if closed.contains(&neighbour) {
                continue;
            }
            if neighbour != goal && !walkable(&grid[neighbour]) {
                continue;
            }

            let new_cost = current_cost + 1;
            let improved = cost_so_far
                .get(&neighbour)
                .is_none_or(|known| new_cost < *known);
            if improved {
                cost_so_far.insert(neighbour, new_cost);
                came_from.insert(neighbour, current);
                let h = neighbour.manhattan_distance(&goal);
                sequence += 1;
                frontier.push(PrioritizedItem {
                    f: new_cost + h,
                    h,
                    sequence,
                    position: neighbour,
                });
            }
        }
    }

    None
}

fn retrace(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(previous) => {
                current = *previous;
                path.push(current);
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Outcome of connecting every pair of doors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathReport {
    /// Interior cells on at least one door-to-door path.
    pub floor: BTreeSet<Position>,
    /// Door pairs for which no path exists.
    pub unreachable: Vec<(Position, Position)>,
}

impl PathReport {
    pub fn is_complete(&self) -> bool {
        self.unreachable.is_empty()
    }
}

/// Runs [`find_path`] between every distinct pair of doors and unions the
/// interior cells of the resulting paths.
///
/// Pairs are searched in `(i, j)` order with `i < j`, following the order of `doors`.
pub fn connect_doors<T, F>(grid: &Grid<T>, doors: &[Position], walkable: F) -> PathReport
where
    F: Fn(&T) -> bool,
{
    let mut report = PathReport::default();

    for (i, from) in doors.iter().enumerate() {
        for to in &doors[i + 1..] {
            match find_path(grid, *from, *to, &walkable) {
                Some(path) => {
                    report
                        .floor
                        .extend(path.into_iter().filter(|p| grid.is_interior(*p)));
                }
                None => {
                    log::warn!("No path between doors {:?} and {:?}", from, to);
                    report.unreachable.push((*from, *to));
                }
            }
        }
    }

    report
}
