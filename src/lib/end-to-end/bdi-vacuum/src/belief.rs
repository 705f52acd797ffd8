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

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use grid_world::{Direction, Grid, Position, Reward};
use serde::{Deserialize, Serialize};

/// What the agent knows about one dirty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Belief {
    pub coordinate: Position,
    pub reward: Reward,
}

impl Belief {
    pub fn new(coordinate: Position, reward: Reward) -> Self {
        Self { coordinate, reward }
    }
}

/// Beliefs keyed by coordinate. Inserting a coordinate twice keeps the last reward, and
/// iteration is always in row-major order, which is the order the planner breaks ties in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeliefSet {
    beliefs: BTreeMap<Position, Reward>,
}

impl BeliefSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, belief: Belief) {
        self.beliefs.insert(belief.coordinate, belief.reward);
    }

    pub fn remove(&mut self, coordinate: Position) -> Option<Belief> {
        self.beliefs
            .remove(&coordinate)
            .map(|reward| Belief::new(coordinate, reward))
    }

    pub fn get(&self, coordinate: Position) -> Option<Belief> {
        self.beliefs
            .get(&coordinate)
            .map(|&reward| Belief::new(coordinate, reward))
    }

    pub fn contains(&self, coordinate: Position) -> bool {
        self.beliefs.contains_key(&coordinate)
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Belief> + '_ {
        self.beliefs
            .iter()
            .map(|(&coordinate, &reward)| Belief::new(coordinate, reward))
    }

    pub fn coordinates(&self) -> impl Iterator<Item = Position> + '_ {
        self.beliefs.keys().copied()
    }
}

impl FromIterator<Belief> for BeliefSet {
    fn from_iter<T: IntoIterator<Item = Belief>>(iter: T) -> Self {
        let mut beliefs = BeliefSet::new();
        for belief in iter {
            beliefs.insert(belief);
        }
        beliefs
    }
}

impl Extend<Belief> for BeliefSet {
    fn extend<T: IntoIterator<Item = Belief>>(&mut self, iter: T) {
        for belief in iter {
            self.insert(belief);
        }
    }
}

/// Every dirty cell on the grid.
pub fn perceive(grid: &Grid) -> BeliefSet {
    grid.dirty_cells()
        .map(|(coordinate, reward)| Belief::new(coordinate, reward))
        .collect()
}

/// Dirty cells among the four orthogonal neighbours of `position`. Neighbours off the grid or
/// blocked by an obstacle are never sensed.
pub fn perceive_local(grid: &Grid, position: Position) -> BeliefSet {
    Direction::ALL
        .into_iter()
        .filter_map(|direction| grid.neighbor(position, direction))
        .filter(|&neighbor| grid.is_passable(neighbor))
        .filter_map(|neighbor| {
            grid.get(neighbor)
                .and_then(|cell| cell.reward())
                .map(|reward| Belief::new(neighbor, reward))
        })
        .collect()
}

/// How the agent turns the world into beliefs. The result replaces the previous beliefs
/// wholesale every tick.
pub trait PerceptionStrategy {
    fn perceive(&self, grid: &Grid, position: Position) -> BeliefSet;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalPerception;

impl PerceptionStrategy for GlobalPerception {
    fn perceive(&self, grid: &Grid, _position: Position) -> BeliefSet {
        perceive(grid)
    }

    fn name(&self) -> &'static str {
        "global"
    }
}

/// Neighbour sensors plus the dirt sensor under the agent. Without the latter the agent could
/// never believe, and so never clean, the cell it stands on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPerception;

impl PerceptionStrategy for LocalPerception {
    fn perceive(&self, grid: &Grid, position: Position) -> BeliefSet {
        let mut beliefs = perceive_local(grid, position);
        if let Some(reward) = grid.get(position).and_then(|cell| cell.reward()) {
            beliefs.insert(Belief::new(position, reward));
        }
        beliefs
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerceptionMode {
    #[default]
    Global,
    Local,
}

impl PerceptionMode {
    pub fn strategy(self) -> Box<dyn PerceptionStrategy> {
        match self {
            PerceptionMode::Global => Box::new(GlobalPerception),
            PerceptionMode::Local => Box::new(LocalPerception),
        }
    }
}

impl fmt::Display for PerceptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerceptionMode::Global => write!(f, "global"),
            PerceptionMode::Local => write!(f, "local"),
        }
    }
}

impl FromStr for PerceptionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(PerceptionMode::Global),
            "local" => Ok(PerceptionMode::Local),
            other => Err(format!(
                "unknown perception mode '{}', expected 'global' or 'local'",
                other
            )),
        }
    }
}
