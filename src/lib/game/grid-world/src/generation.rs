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

//! Random initial placement of dirt and obstacles.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Cell, Direction, Grid, GridError, Position};

/// How many of each thing to put on a freshly generated grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Side length of the square grid.
    pub size: usize,

    /// Number of dust cells.
    pub dust: usize,

    /// Number of liquid cells.
    pub liquid: usize,

    /// Number of debris cells.
    pub debris: usize,

    /// Number of obstacles. Each one covers two adjacent cells.
    pub obstacles: usize,
}

impl GenerationConfig {
    /// Number of cells the configured content covers.
    pub fn requested_cells(&self) -> usize {
        self.dust + self.liquid + self.debris + 2 * self.obstacles
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            size: 5,
            dust: 2,
            liquid: 2,
            debris: 2,
            obstacles: 2,
        }
    }
}

/// Generate a grid. Dirt goes on distinct random cells first, then each obstacle is laid
/// horizontally or vertically over two free cells. No obstacle covers a `reserved` position.
pub fn generate<R>(
    config: &GenerationConfig,
    reserved: &[Position],
    rng: &mut R,
) -> Result<Grid, GridError>
where
    R: Rng + ?Sized,
{
    let not_enough_space = || GridError::NotEnoughSpace {
        requested: config.requested_cells(),
        size: config.size,
    };
    if config.size == 0 {
        return Err(GridError::InvalidSize(config.size));
    }
    if config.requested_cells() > config.size * config.size {
        return Err(not_enough_space());
    }

    let mut grid = Grid::new(config.size);
    let mut free: Vec<Position> = grid.positions().collect();
    free.shuffle(rng);

    let dirt = [
        (Cell::Dust, config.dust),
        (Cell::Liquid, config.liquid),
        (Cell::Debris, config.debris),
    ];
    for (cell, count) in dirt {
        for _ in 0..count {
            let position = free.pop().ok_or_else(not_enough_space)?;
            grid.set(position, cell)?;
        }
    }

    for _ in 0..config.obstacles {
        let placements = obstacle_placements(&grid, reserved);
        let &(first, second) = placements.choose(rng).ok_or_else(not_enough_space)?;
        grid.set(first, Cell::Obstacle)?;
        grid.set(second, Cell::Obstacle)?;
    }

    Ok(grid)
}

// every (cell, cell to the east) and (cell, cell to the south) pair that is still clean.
fn obstacle_placements(grid: &Grid, reserved: &[Position]) -> Vec<(Position, Position)> {
    let is_free = |position: Position| {
        grid.get(position) == Some(Cell::Clean) && !reserved.contains(&position)
    };
    grid.positions()
        .filter(|&position| is_free(position))
        .flat_map(|position| {
            [Direction::East, Direction::South]
                .into_iter()
                .filter_map(move |direction| grid.neighbor(position, direction))
                .filter(|&next| is_free(next))
                .map(move |next| (position, next))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;

    use super::*;

    fn rng(seed: u64) -> rand_pcg::Pcg64 {
        rand_pcg::Pcg64::seed_from_u64(seed)
    }

    #[test]
    fn test_default_config_places_everything() {
        let grid =
            generate(&GenerationConfig::default(), &[], &mut rng(42)).expect("generate failed");
        assert_eq!(grid.size(), 5);
        assert_eq!(grid.count(Cell::Dust), 2);
        assert_eq!(grid.count(Cell::Liquid), 2);
        assert_eq!(grid.count(Cell::Debris), 2);
        assert_eq!(grid.count(Cell::Obstacle), 4);
        assert_eq!(grid.total_reward(), 12);
    }

    #[test]
    fn test_same_seed_same_grid() {
        let config = GenerationConfig::default();
        let a = generate(&config, &[], &mut rng(7)).expect("generate failed");
        let b = generate(&config, &[], &mut rng(7)).expect("generate failed");
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_much_content_is_rejected() {
        let config = GenerationConfig {
            size: 2,
            dust: 3,
            liquid: 0,
            debris: 0,
            obstacles: 1,
        };
        assert_eq!(
            generate(&config, &[], &mut rng(1)),
            Err(GridError::NotEnoughSpace {
                requested: 5,
                size: 2
            })
        );
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let config = GenerationConfig {
            size: 0,
            ..GenerationConfig::default()
        };
        assert_eq!(
            generate(&config, &[], &mut rng(1)),
            Err(GridError::InvalidSize(0))
        );
    }

    #[test]
    fn test_no_room_for_obstacle_is_rejected() {
        // a 2x2 grid with the two diagonal corners reserved has no two adjacent free cells.
        let config = GenerationConfig {
            size: 2,
            dust: 0,
            liquid: 0,
            debris: 0,
            obstacles: 1,
        };
        let reserved = [Position::new(0, 0), Position::new(1, 1)];
        assert!(matches!(
            generate(&config, &reserved, &mut rng(3)),
            Err(GridError::NotEnoughSpace { .. })
        ));
    }

    proptest! {
        #[test]
        fn test_generated_counts_match_config(
            seed in any::<u64>(),
            size in 6..10usize,
            dust in 0..3usize,
            liquid in 0..3usize,
            debris in 0..3usize,
            obstacles in 0..3usize,
        ) {
            let config = GenerationConfig { size, dust, liquid, debris, obstacles };
            let start = Position::new(0, 0);
            let grid = generate(&config, &[start], &mut rng(seed)).expect("generate failed");
            prop_assert_eq!(grid.count(Cell::Dust), dust);
            prop_assert_eq!(grid.count(Cell::Liquid), liquid);
            prop_assert_eq!(grid.count(Cell::Debris), debris);
            prop_assert_eq!(grid.count(Cell::Obstacle), 2 * obstacles);
            prop_assert!(grid.is_passable(start));
        }
    }
}
