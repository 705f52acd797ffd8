/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

#![warn(missing_docs)]

//! Grid world logic.
//!
//! A square grid of cells holding graded dirt and static obstacles. It is intended to be used by
//! an agent that perceives the grid, plans over it and cleans it. Searching and planning live in
//! other crates; this one only knows what is in each cell.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod generation;

pub use generation::{generate, GenerationConfig};

/// Cleaning value of a dirty cell.
pub type Reward = u32;

/// Grid world error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Position is outside of the grid.
    #[error("position is out of bounds: {0}")]
    OutOfBounds(Position),

    /// Text could not be parsed into a grid.
    #[error("cannot parse grid at line {line}: {reason}")]
    Parse {
        /// 1-based line number of the offending row.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A grid needs at least one cell.
    #[error("grid size must be at least 1, got {0}")]
    InvalidSize(usize),

    /// Serialized cells do not fill a square grid of the stated size.
    #[error("a {size}x{size} grid needs {expected} cells, found {found}")]
    CellCount {
        /// Stated side length.
        size: usize,
        /// Cells a grid of that size holds.
        expected: usize,
        /// Cells actually present.
        found: usize,
    },

    /// The requested content does not fit on the grid.
    #[error("cannot place {requested} cells of content on a {size}x{size} grid")]
    NotEnoughSpace {
        /// Number of cells that were requested.
        requested: usize,
        /// Side length of the grid.
        size: usize,
    },
}

/// Grid cell. Part of the grid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing to clean.
    #[default]
    Clean,

    /// Dust, worth 1.
    Dust,

    /// Liquid, worth 2.
    Liquid,

    /// Debris, worth 3.
    Debris,

    /// Furniture. Impassable.
    Obstacle,
}

impl Cell {
    /// All the dirty cell kinds, cheapest first.
    pub const DIRT: [Cell; 3] = [Cell::Dust, Cell::Liquid, Cell::Debris];

    /// Reward for cleaning this cell, or None if there is nothing to clean.
    pub fn reward(self) -> Option<Reward> {
        match self {
            Cell::Dust => Some(1),
            Cell::Liquid => Some(2),
            Cell::Debris => Some(3),
            Cell::Clean | Cell::Obstacle => None,
        }
    }

    /// Whether the cell holds dirt of any kind.
    pub fn is_dirty(self) -> bool {
        self.reward().is_some()
    }

    /// Whether an agent may stand on the cell.
    pub fn is_passable(self) -> bool {
        self != Cell::Obstacle
    }

    fn to_char(self) -> char {
        match self {
            Cell::Clean => '.',
            Cell::Dust => '1',
            Cell::Liquid => '2',
            Cell::Debris => '3',
            Cell::Obstacle => '#',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Cell::Clean),
            '1' => Some(Cell::Dust),
            '2' => Some(Cell::Liquid),
            '3' => Some(Cell::Debris),
            '#' => Some(Cell::Obstacle),
            _ => None,
        }
    }
}

/// One of the four orthogonal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards row 0.
    North,

    /// Towards the last row.
    South,

    /// Towards the last column.
    East,

    /// Towards column 0.
    West,
}

impl Direction {
    /// All directions, in the order neighbours are expanded.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The direction pointing the other way.
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::North => write!(f, "North"),
            Direction::South => write!(f, "South"),
            Direction::East => write!(f, "East"),
            Direction::West => write!(f, "West"),
        }
    }
}

/// A (row, col) coordinate, 0-based. Ordering is row-major.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    /// Row, growing southwards.
    pub row: usize,

    /// Column, growing eastwards.
    pub col: usize,
}

impl Position {
    /// Create a new position.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The position one step away. None if the step would go below row or column 0; the upper
    /// bound is the grid's business.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let Position { row, col } = self;
        match direction {
            Direction::North => row.checked_sub(1).map(|row| Position { row, col }),
            Direction::South => row.checked_add(1).map(|row| Position { row, col }),
            Direction::East => col.checked_add(1).map(|col| Position { row, col }),
            Direction::West => col.checked_sub(1).map(|col| Position { row, col }),
        }
    }

    /// Number of orthogonal steps between two positions, ignoring obstacles.
    pub fn manhattan_distance(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Square grid of cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    cells: Vec<Cell>,
    size: usize,
}

// unchecked wire form of a grid.
#[derive(Deserialize)]
struct RawGrid {
    cells: Vec<Cell>,
    size: usize,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let found = raw.cells.len();
        match raw.size.checked_mul(raw.size) {
            Some(expected) if expected == found => Ok(Self {
                cells: raw.cells,
                size: raw.size,
            }),
            expected => Err(GridError::CellCount {
                size: raw.size,
                expected: expected.unwrap_or(usize::MAX),
                found,
            }),
        }
    }
}

impl Grid {
    /// Create a new, entirely clean grid.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![Cell::Clean; size * size],
            size,
        }
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the position is inside the grid.
    pub fn in_bounds(&self, position: Position) -> bool {
        position.row < self.size && position.col < self.size
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.in_bounds(position)
            .then(|| position.row * self.size + position.col)
    }

    /// Get a cell. None if the position is out of bounds.
    pub fn get(&self, position: Position) -> Option<Cell> {
        self.index(position).and_then(|idx| self.cells.get(idx).copied())
    }

    /// Overwrite a cell.
    pub fn set(&mut self, position: Position, cell: Cell) -> Result<(), GridError> {
        let idx = self
            .index(position)
            .ok_or(GridError::OutOfBounds(position))?;
        self.cells[idx] = cell;
        Ok(())
    }

    /// Clean a cell, returning the reward of whatever dirt was there.
    pub fn clean(&mut self, position: Position) -> Result<Option<Reward>, GridError> {
        let previous = self
            .get(position)
            .ok_or(GridError::OutOfBounds(position))?;
        if previous.is_passable() {
            self.set(position, Cell::Clean)?;
        }
        Ok(previous.reward())
    }

    /// In bounds and not an obstacle.
    pub fn is_passable(&self, position: Position) -> bool {
        self.get(position).map_or(false, Cell::is_passable)
    }

    /// The in-bounds neighbour in the given direction, passable or not.
    pub fn neighbor(&self, position: Position, direction: Direction) -> Option<Position> {
        position
            .step(direction)
            .filter(|&next| self.in_bounds(next))
    }

    /// Neighbours an agent could move to, in `Direction::ALL` order.
    pub fn passable_neighbors(
        &self,
        position: Position,
    ) -> impl Iterator<Item = (Direction, Position)> + '_ {
        Direction::ALL.into_iter().filter_map(move |direction| {
            self.neighbor(position, direction)
                .filter(|&next| self.is_passable(next))
                .map(|next| (direction, next))
        })
    }

    /// Every position of the grid, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Position { row, col }))
    }

    /// Every dirty cell with its reward, row-major.
    pub fn dirty_cells(&self) -> impl Iterator<Item = (Position, Reward)> + '_ {
        self.positions().filter_map(move |position| {
            self.get(position)
                .and_then(Cell::reward)
                .map(|reward| (position, reward))
        })
    }

    /// Sum of the rewards still on the grid.
    pub fn total_reward(&self) -> Reward {
        self.dirty_cells().map(|(_, reward)| reward).sum()
    }

    /// Number of cells of the given kind.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Render the grid with the agent drawn as `@`.
    pub fn render_with_agent(&self, agent: Position) -> String {
        let mut s = String::with_capacity((self.size + 1) * self.size);
        for row in 0..self.size {
            for col in 0..self.size {
                let position = Position { row, col };
                if position == agent {
                    s.push('@');
                } else if let Some(cell) = self.get(position) {
                    s.push(cell.to_char());
                }
            }
            if row + 1 < self.size {
                s.push('\n');
            }
        }
        s
    }
}

// one row per line: `.` clean, `1` dust, `2` liquid, `3` debris, `#` obstacle.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.cells.chunks(self.size.max(1)).enumerate() {
            let line: String = cells.iter().map(|cell| cell.to_char()).collect();
            if row + 1 < self.size {
                writeln!(f, "{}", line)?;
            } else {
                write!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<(usize, &str)> = s
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(GridError::Parse {
                line: 1,
                reason: "grid is empty".to_string(),
            });
        }

        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for (line, text) in rows {
            let width = text.chars().count();
            if width != size {
                return Err(GridError::Parse {
                    line,
                    reason: format!("expected {} cells, found {}", size, width),
                });
            }
            for c in text.chars() {
                let cell = Cell::from_char(c).ok_or_else(|| GridError::Parse {
                    line,
                    reason: format!("unknown cell '{}'", c),
                })?;
                cells.push(cell);
            }
        }
        Ok(Self { cells, size })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_grid_starts_clean() {
        let grid = Grid::new(5);
        for position in grid.positions() {
            assert_eq!(grid.get(position), Some(Cell::Clean), "{}", position);
        }
        assert_eq!(grid.positions().count(), 25);
        assert_eq!(grid.total_reward(), 0);
    }

    #[test]
    fn test_rewards_follow_dirt_grade() {
        assert_eq!(Cell::Dust.reward(), Some(1));
        assert_eq!(Cell::Liquid.reward(), Some(2));
        assert_eq!(Cell::Debris.reward(), Some(3));
        assert_eq!(Cell::Clean.reward(), None);
        assert_eq!(Cell::Obstacle.reward(), None);
        assert!(!Cell::Obstacle.is_passable());
        assert!(Cell::DIRT.iter().all(|cell| cell.is_passable()));
    }

    #[test]
    fn test_out_of_bounds_is_not_passable() {
        let grid = Grid::new(3);
        assert!(!grid.in_bounds(Position::new(3, 0)));
        assert!(!grid.is_passable(Position::new(0, 3)));
        assert_eq!(grid.get(Position::new(7, 7)), None);
        assert_eq!(
            Grid::new(3).set(Position::new(3, 3), Cell::Dust),
            Err(GridError::OutOfBounds(Position::new(3, 3)))
        );
    }

    #[test]
    fn test_clean_returns_reward_and_clears_cell() {
        let mut grid: Grid = "3.\n..".parse().expect("parse failed");
        assert_eq!(grid.clean(Position::new(0, 0)), Ok(Some(3)));
        assert_eq!(grid.get(Position::new(0, 0)), Some(Cell::Clean));
        assert_eq!(grid.clean(Position::new(0, 0)), Ok(None));
    }

    #[test]
    fn test_clean_leaves_obstacles_alone() {
        let mut grid: Grid = "#.\n..".parse().expect("parse failed");
        assert_eq!(grid.clean(Position::new(0, 0)), Ok(None));
        assert_eq!(grid.get(Position::new(0, 0)), Some(Cell::Obstacle));
    }

    #[test]
    fn test_corner_has_two_neighbors() {
        let grid = Grid::new(4);
        let neighbors: Vec<_> = grid.passable_neighbors(Position::new(0, 0)).collect();
        assert_eq!(
            neighbors,
            vec![
                (Direction::East, Position::new(0, 1)),
                (Direction::South, Position::new(1, 0)),
            ]
        );
    }

    #[test]
    fn test_passable_neighbors_skip_obstacles() {
        let grid: Grid = "...\n#..\n.#.".parse().expect("parse failed");
        let neighbors: Vec<_> = grid.passable_neighbors(Position::new(1, 1)).collect();
        assert_eq!(
            neighbors,
            vec![
                (Direction::North, Position::new(0, 1)),
                (Direction::East, Position::new(1, 2)),
            ]
        );
    }

    #[test]
    fn test_parse_and_display() {
        let text = "1.#\n.2.\n..3";
        let grid: Grid = text.parse().expect("parse failed");
        assert_eq!(grid.size(), 3);
        assert_eq!(grid.get(Position::new(0, 0)), Some(Cell::Dust));
        assert_eq!(grid.get(Position::new(0, 2)), Some(Cell::Obstacle));
        assert_eq!(grid.get(Position::new(1, 1)), Some(Cell::Liquid));
        assert_eq!(grid.get(Position::new(2, 2)), Some(Cell::Debris));
        assert_eq!(grid.total_reward(), 6);
        assert_eq!(grid.to_string(), text);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = "...\n..\n...".parse::<Grid>().unwrap_err();
        assert!(matches!(err, GridError::Parse { line: 2, .. }), "{:?}", err);
    }

    #[test]
    fn test_parse_rejects_unknown_cells() {
        let err = "..\n.x".parse::<Grid>().unwrap_err();
        assert!(matches!(err, GridError::Parse { line: 2, .. }), "{:?}", err);
    }

    #[test]
    fn test_render_with_agent() {
        let grid: Grid = "..\n.3".parse().expect("parse failed");
        assert_eq!(grid.render_with_agent(Position::new(0, 1)), ".@\n.3");
    }

    #[test]
    fn test_serde_keeps_the_grid() {
        let grid: Grid = "..2\n1#.\n..3".parse().expect("parse failed");
        let json = serde_json::to_string(&grid).expect("serialize failed");
        assert_eq!(serde_json::from_str::<Grid>(&json).expect("deserialize failed"), grid);
    }

    #[test]
    fn test_deserialize_rejects_short_cells() {
        let err = serde_json::from_str::<Grid>(r#"{"cells":["Dust"],"size":3}"#)
            .expect_err("grid with missing cells was accepted");
        assert!(
            err.to_string().contains("needs 9 cells, found 1"),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_deserialize_rejects_overflowing_size() {
        let json = format!(r#"{{"cells":[],"size":{}}}"#, usize::MAX);
        assert!(serde_json::from_str::<Grid>(&json).is_err());
    }

    #[test]
    fn test_dirty_cells_are_row_major() {
        let grid: Grid = "..2\n1..\n..3".parse().expect("parse failed");
        let dirty: Vec<_> = grid.dirty_cells().collect();
        assert_eq!(
            dirty,
            vec![
                (Position::new(0, 2), 2),
                (Position::new(1, 0), 1),
                (Position::new(2, 2), 3),
            ]
        );
    }

    proptest! {
        #[test]
        fn test_step_then_opposite_step_returns(
            row in 1..100usize,
            col in 1..100usize,
            direction in prop_oneof![
                Just(Direction::North),
                Just(Direction::South),
                Just(Direction::East),
                Just(Direction::West),
            ],
        ) {
            let start = Position::new(row, col);
            let next = start.step(direction).expect("step failed");
            assert_eq!(start.manhattan_distance(next), 1);
            assert_eq!(next.step(direction.opposite()), Some(start));
        }
    }
}
