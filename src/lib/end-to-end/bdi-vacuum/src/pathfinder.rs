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

//! A* over the grid: 4-connected, unit cost, Manhattan heuristic, obstacles never expanded.
//! Route weighing and single-step navigation both go through here.

use a_star_search::{AStar, Distance, Int, Path, SearchError, SearchSpace};
use grid_world::{Direction, Grid, Position};

use crate::PlanningError;

pub struct GridSearchSpace<'a> {
    grid: &'a Grid,
}

impl<'a> GridSearchSpace<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }
}

impl SearchSpace for GridSearchSpace<'_> {
    type Node = Position;
    type Step = Direction;

    fn contains(&self, node: &Position) -> bool {
        self.grid.in_bounds(*node)
    }

    fn successors(&self, node: &Position) -> Vec<(Direction, Position)> {
        self.grid.passable_neighbors(*node).collect()
    }

    fn heuristic(&self, node: &Position, goal: &Position) -> Int {
        node.manhattan_distance(*goal) as Int
    }
}

fn search(
    grid: &Grid,
    start: Position,
    goal: Position,
) -> Result<a_star_search::SearchOutcome<Position, Direction>, PlanningError> {
    let space = GridSearchSpace::new(grid);
    AStar::new(&space)
        .search(start, goal)
        .map_err(|err| match err {
            SearchError::StartOutside => PlanningError::InvalidPosition(start),
            SearchError::GoalOutside => PlanningError::InvalidPosition(goal),
        })
}

/// Number of moves on a shortest path, or `Distance::Unreachable`.
pub fn shortest_distance(
    grid: &Grid,
    start: Position,
    goal: Position,
) -> Result<Distance, PlanningError> {
    search(grid, start, goal).map(|outcome| outcome.distance())
}

/// Direction of the first move on a shortest path. None when already there or when there is no
/// way there.
pub fn first_step(
    grid: &Grid,
    start: Position,
    goal: Position,
) -> Result<Option<Direction>, PlanningError> {
    search(grid, start, goal).map(|outcome| outcome.first_step())
}

pub fn find_path(
    grid: &Grid,
    start: Position,
    goal: Position,
) -> Result<Option<Path<Position, Direction>>, PlanningError> {
    search(grid, start, goal).map(|outcome| outcome.into_path())
}

#[cfg(test)]
mod tests {
    use grid_world::Cell;
    use proptest::prelude::*;

    use super::*;

    fn grid(text: &str) -> Grid {
        text.parse().expect("parse failed")
    }

    #[test]
    fn test_same_position_is_zero_and_no_step() {
        let grid = grid("...\n.#.\n...");
        let p = Position::new(2, 1);
        assert_eq!(shortest_distance(&grid, p, p), Ok(Distance::Finite(0)));
        assert_eq!(first_step(&grid, p, p), Ok(None));
    }

    #[test]
    fn test_straight_line_east() {
        let grid = Grid::new(5);
        assert_eq!(
            shortest_distance(&grid, Position::new(0, 0), Position::new(0, 4)),
            Ok(Distance::Finite(4))
        );
        assert_eq!(
            first_step(&grid, Position::new(0, 0), Position::new(0, 4)),
            Ok(Some(Direction::East))
        );
    }

    #[test]
    fn test_detour_around_obstacles() {
        let grid = grid(
            "
            .#...
            .#.#.
            .#.#.
            .#.#.
            ...#.
            ",
        );
        let start = Position::new(0, 0);
        let goal = Position::new(0, 2);
        assert_eq!(shortest_distance(&grid, start, goal), Ok(Distance::Finite(10)));
        assert_eq!(first_step(&grid, start, goal), Ok(Some(Direction::South)));
        let path = find_path(&grid, start, goal)
            .expect("search failed")
            .expect("path should exist");
        assert!(path.nodes.iter().all(|&p| grid.is_passable(p)));
    }

    #[test]
    fn test_boxed_in_goal_is_unreachable() {
        let grid = grid(
            "
            .....
            ..#..
            .#3#.
            ..#..
            .....
            ",
        );
        let goal = Position::new(2, 2);
        assert_eq!(
            shortest_distance(&grid, Position::new(0, 0), goal),
            Ok(Distance::Unreachable)
        );
        assert_eq!(first_step(&grid, Position::new(0, 0), goal), Ok(None));
        assert_eq!(find_path(&grid, Position::new(0, 0), goal), Ok(None));
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let grid = Grid::new(3);
        let outside = Position::new(0, 3);
        assert_eq!(
            shortest_distance(&grid, outside, Position::new(0, 0)),
            Err(PlanningError::InvalidPosition(outside))
        );
        assert_eq!(
            first_step(&grid, Position::new(0, 0), outside),
            Err(PlanningError::InvalidPosition(outside))
        );
    }

    fn arb_grid() -> impl Strategy<Value = Grid> {
        (2..8usize).prop_flat_map(|size| {
            prop::collection::vec(prop::bool::weighted(0.25), size * size).prop_map(
                move |blocked| {
                    let mut grid = Grid::new(size);
                    let positions: Vec<Position> = grid.positions().collect();
                    for (position, blocked) in positions.into_iter().zip(blocked) {
                        if blocked {
                            grid.set(position, Cell::Obstacle).expect("set failed");
                        }
                    }
                    grid
                },
            )
        })
    }

    // picks two passable positions, if the grid has any.
    fn passable_pair(grid: &Grid, a: usize, b: usize) -> Option<(Position, Position)> {
        let passable: Vec<Position> = grid.positions().filter(|&p| grid.is_passable(p)).collect();
        if passable.is_empty() {
            return None;
        }
        Some((passable[a % passable.len()], passable[b % passable.len()]))
    }

    proptest! {
        #[test]
        fn test_following_first_step_matches_distance(
            grid in arb_grid(),
            a in any::<usize>(),
            b in any::<usize>(),
        ) {
            let Some((start, goal)) = passable_pair(&grid, a, b) else { return Ok(()); };
            let distance = shortest_distance(&grid, start, goal).expect("search failed");
            if let Some(expected) = distance.finite() {
                let mut position = start;
                let mut steps = 0;
                while let Some(direction) = first_step(&grid, position, goal).expect("search failed") {
                    position = grid.neighbor(position, direction).expect("stepped off the grid");
                    prop_assert!(grid.is_passable(position));
                    steps += 1;
                    prop_assert!(steps <= expected);
                }
                prop_assert_eq!(position, goal);
                prop_assert_eq!(steps, expected);
            } else {
                prop_assert_eq!(first_step(&grid, start, goal), Ok(None));
            }
        }

        #[test]
        fn test_distance_never_beats_manhattan(
            grid in arb_grid(),
            a in any::<usize>(),
            b in any::<usize>(),
        ) {
            let Some((start, goal)) = passable_pair(&grid, a, b) else { return Ok(()); };
            let manhattan = start.manhattan_distance(goal) as Int;
            if let Some(d) = shortest_distance(&grid, start, goal).expect("search failed").finite() {
                prop_assert!(d >= manhattan);
            }
        }

        #[test]
        fn test_open_grid_distance_is_manhattan(
            size in 1..10usize,
            a in any::<usize>(),
            b in any::<usize>(),
        ) {
            let grid = Grid::new(size);
            let (start, goal) = passable_pair(&grid, a, b).expect("open grid has cells");
            prop_assert_eq!(
                shortest_distance(&grid, start, goal),
                Ok(Distance::Finite(start.manhattan_distance(goal) as Int))
            );
        }
    }
}
