use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// Offsets of the four orthogonal neighbours, in expansion order: up, down, left, right.
///
/// `y` grows upwards, so "up" is `y + 1`.
pub const NEIGHBOUR_OFFSETS: [(isize, isize); 4] = [(0, 1), (0, -1), (-1, 0), (1, 0)];

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order, with
/// `(0, 0)` at the bottom-left corner of the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Creates a new grid with the specified dimensions, filled by a generator function.
    ///
    /// The generator function `f` takes `(x, y)` coordinates and returns the value for that cell.
    /// Cells are produced in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Builds a grid of the same shape by mapping every cell through `f`.
    ///
    /// Stops at the first error, which makes it usable for lookups that can fail.
    pub fn try_map<U, E, F>(&self, mut f: F) -> Result<Grid<U>, E>
    where
        F: FnMut(Position, &T) -> Result<U, E>,
    {
        let mut cells = Vec::with_capacity(self.cells.len());
        for ((x, y), cell) in self.enumerate() {
            cells.push(f(Position { x, y }, cell)?);
        }
        Ok(Grid {
            width: self.width,
            height: self.height,
            cells,
        })
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts (x, y) coordinates to a flat vector index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    pub fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Whether the position lies on the outermost ring of the grid.
    #[inline]
    pub fn is_perimeter(&self, position: Position) -> bool {
        self.is_valid(position.x, position.y)
            && (position.x == 0
                || position.y == 0
                || position.x + 1 == self.width
                || position.y + 1 == self.height)
    }

    /// Whether the position is inside the grid and not on its perimeter.
    #[inline]
    pub fn is_interior(&self, position: Position) -> bool {
        self.is_valid(position.x, position.y) && !self.is_perimeter(position)
    }

    /// Gets an immutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get(index)
    }

    /// Gets a mutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get_mut(index)
    }

    /// Sets the value of the cell at the given coordinates.
    ///
    /// Returns `Ok(())` on success, or `Err(GridError::OutOfBounds)` if the
    /// coordinates are invalid.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<(), GridError> {
        let index = self.coords_to_index(x, y).ok_or(GridError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns the in-bounds orthogonal neighbours of `position`, in
    /// [`NEIGHBOUR_OFFSETS`] order.
    pub fn neighbours(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        NEIGHBOUR_OFFSETS.iter().filter_map(move |(dx, dy)| {
            let x = position.x.checked_add_signed(*dx)?;
            let y = position.y.checked_add_signed(*dy)?;
            self.is_valid(x, y).then_some(Position { x, y })
        })
    }

    /// Returns an iterator over the cells of the grid in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Returns an iterator that yields `((x, y), &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| ((index % width, index / width), cell))
    }

    /// Returns a slice containing all cells in the grid.
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Position) -> &Self::Output {
        let (x, y) = (index.x, index.y);
        match self.coords_to_index(x, y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: Position) -> &mut Self::Output {
        let (x, y) = (index.x, index.y);
        let width = self.width;
        let height = self.height;
        match self.coords_to_index(x, y) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, width, height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_generator_is_row_major() {
        let grid = Grid::from_generator(3, 2, |x, y| x + 10 * y);
        assert_eq!(grid.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(grid[Position { x: 2, y: 1 }], 12);
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut grid: Grid<u8> = Grid::new(2, 2);
        assert!(grid.set(1, 1, 7).is_ok());
        assert_eq!(
            grid.set(2, 0, 1),
            Err(GridError::OutOfBounds {
                x: 2,
                y: 0,
                width: 2,
                height: 2
            })
        );
    }

    #[test]
    fn test_perimeter_and_interior() {
        let grid: Grid<u8> = Grid::new(5, 4);
        assert!(grid.is_perimeter(Position { x: 0, y: 2 }));
        assert!(grid.is_perimeter(Position { x: 4, y: 3 }));
        assert!(grid.is_interior(Position { x: 1, y: 1 }));
        assert!(grid.is_interior(Position { x: 3, y: 2 }));
        assert!(!grid.is_interior(Position { x: 5, y: 1 }));
        assert_eq!(grid.iter().count(), 20);
    }

    #[test]
    fn test_neighbours_order_and_bounds() {
        let grid: Grid<u8> = Grid::new(3, 3);
        let centre: Vec<_> = grid.neighbours(Position { x: 1, y: 1 }).collect();
        assert_eq!(
            centre,
            vec![
                Position { x: 1, y: 2 },
                Position { x: 1, y: 0 },
                Position { x: 0, y: 1 },
                Position { x: 2, y: 1 },
            ]
        );
        let corner: Vec<_> = grid.neighbours(Position { x: 0, y: 0 }).collect();
        assert_eq!(corner, vec![Position { x: 0, y: 1 }, Position { x: 1, y: 0 }]);
    }

    #[test]
    fn test_try_map_stops_on_error() {
        let grid = Grid::from_generator(2, 2, |x, y| x + y);
        let doubled: Result<Grid<usize>, ()> = grid.try_map(|_, v| Ok(v * 2));
        assert_eq!(doubled.unwrap().as_slice(), &[0, 2, 2, 4]);
        let failed: Result<Grid<usize>, Position> =
            grid.try_map(|pos, v| if *v == 2 { Err(pos) } else { Ok(*v) });
        assert_eq!(failed, Err(Position { x: 1, y: 1 }));
    }
}
