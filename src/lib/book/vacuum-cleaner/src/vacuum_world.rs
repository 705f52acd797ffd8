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

use std::convert::Infallible;

use grid_world::{Cell, Direction, Grid, GridError, Position, Reward};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{Agent, Environment};

pub type Battery = u32;

pub const MOVE_COST: Battery = 1;
pub const CLEAN_COST: Battery = 2;

/// Order the local sensors are read in by the reflex agents.
const SENSOR_ORDER: [Direction; 4] = [
    Direction::South,
    Direction::North,
    Direction::East,
    Direction::West,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VacuumWorldError {
    #[error("agent cannot start at {0}: outside the grid or on an obstacle")]
    InvalidStart(Position),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VacuumWorldAction {
    Move(Direction),
    Clean,
}

impl VacuumWorldAction {
    pub fn cost(self) -> Battery {
        match self {
            VacuumWorldAction::Move(_) => MOVE_COST,
            VacuumWorldAction::Clean => CLEAN_COST,
        }
    }
}

impl std::fmt::Display for VacuumWorldAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VacuumWorldAction::Move(direction) => write!(f, "Move({})", direction),
            VacuumWorldAction::Clean => write!(f, "Clean"),
        }
    }
}

/// VacuumWorldPercept is everything the Agent could sense: where it is, how much battery is
/// left, and a copy of the grid. Agents with local sensors only look at the cells around
/// `location`. The same shape doubles as the per-tick snapshot handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VacuumWorldPercept {
    pub location: Position,
    pub battery: Battery,
    pub grid: Grid,
}

impl VacuumWorldPercept {
    /// What the dirt sensor looking straight down reports.
    pub fn current_cell(&self) -> Cell {
        self.grid.get(self.location).unwrap_or(Cell::Obstacle)
    }

    /// Bump sensor: can the Agent move this way?
    pub fn can_move(&self, direction: Direction) -> bool {
        self.neighbor(direction).is_some()
    }

    /// Dirt sensor for a neighbouring cell the Agent could move to.
    pub fn neighbor_is_dirty(&self, direction: Direction) -> bool {
        self.neighbor(direction)
            .and_then(|position| self.grid.get(position))
            .map_or(false, Cell::is_dirty)
    }

    /// The passable neighbour in that direction, if any.
    pub fn neighbor(&self, direction: Direction) -> Option<Position> {
        self.grid
            .neighbor(self.location, direction)
            .filter(|&position| self.grid.is_passable(position))
    }
}

pub type VacuumWorldSnapshot = VacuumWorldPercept;

/// ReflexVacuumAgent cleans whatever it is standing on, otherwise heads for a dirty neighbour,
/// otherwise wanders to the first open neighbour. It has no memory, so it can oscillate.
#[derive(Default)]
pub struct ReflexVacuumAgent {}

impl ReflexVacuumAgent {
    pub fn new() -> Self {
        Self {}
    }
}

impl Agent for ReflexVacuumAgent {
    type Action = VacuumWorldAction;
    type Percept = VacuumWorldPercept;
    type Error = Infallible;

    fn act(&mut self, percept: &Self::Percept) -> Result<Option<Self::Action>, Self::Error> {
        if percept.battery == 0 {
            return Ok(None);
        }
        if percept.current_cell().is_dirty() {
            return Ok(Some(VacuumWorldAction::Clean));
        }

        let direction = SENSOR_ORDER
            .into_iter()
            .find(|&d| percept.neighbor_is_dirty(d))
            .or_else(|| SENSOR_ORDER.into_iter().find(|&d| percept.can_move(d)));
        Ok(direction.map(VacuumWorldAction::Move))
    }
}

/// ModelBasedVacuumAgent is the reflex agent plus a memory of the cells it has been on. It
/// prefers dirt it has not visited, then any dirt, then unvisited cells, then anything open.
#[derive(Default)]
pub struct ModelBasedVacuumAgent {
    visited: FxHashSet<Position>,
}

impl ModelBasedVacuumAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_visited(&self, position: Position) -> bool {
        self.visited.contains(&position)
    }
}

impl Agent for ModelBasedVacuumAgent {
    type Action = VacuumWorldAction;
    type Percept = VacuumWorldPercept;
    type Error = Infallible;

    fn act(&mut self, percept: &Self::Percept) -> Result<Option<Self::Action>, Self::Error> {
        self.visited.insert(percept.location);
        if percept.battery == 0 {
            return Ok(None);
        }
        if percept.current_cell().is_dirty() {
            return Ok(Some(VacuumWorldAction::Clean));
        }

        let unvisited = |d: Direction| {
            percept
                .neighbor(d)
                .map_or(false, |position| !self.visited.contains(&position))
        };
        let dirty = |d: Direction| percept.neighbor_is_dirty(d);
        let open = |d: Direction| percept.can_move(d);

        let direction = SENSOR_ORDER
            .into_iter()
            .find(|&d| dirty(d) && unvisited(d))
            .or_else(|| SENSOR_ORDER.into_iter().find(|&d| dirty(d)))
            .or_else(|| SENSOR_ORDER.into_iter().find(|&d| unvisited(d)))
            .or_else(|| SENSOR_ORDER.into_iter().find(|&d| open(d)));
        Ok(direction.map(VacuumWorldAction::Move))
    }
}

pub struct VacuumWorldEnvironment {
    grid: Grid,
    agent_location: Position,
    battery: Battery,
}

impl VacuumWorldEnvironment {
    pub fn new(
        grid: Grid,
        agent_location: Position,
        battery: Battery,
    ) -> Result<Self, VacuumWorldError> {
        if !grid.is_passable(agent_location) {
            return Err(VacuumWorldError::InvalidStart(agent_location));
        }
        Ok(Self {
            grid,
            agent_location,
            battery,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agent_location(&self) -> Position {
        self.agent_location
    }

    pub fn battery(&self) -> Battery {
        self.battery
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }
}

/// The rules of the world for an agent at `location`. A move goes only onto a passable
/// neighbour and costs `MOVE_COST`; a blocked move changes nothing and is free. A clean empties
/// the cell and costs `CLEAN_COST`. Battery saturates at zero. Returns the reward collected.
pub fn apply_action(
    grid: &mut Grid,
    location: &mut Position,
    battery: &mut Battery,
    action: VacuumWorldAction,
) -> Result<Reward, GridError> {
    match action {
        VacuumWorldAction::Clean => {
            let reward = grid.clean(*location)?;
            *battery = battery.saturating_sub(CLEAN_COST);
            Ok(reward.unwrap_or(0))
        }
        VacuumWorldAction::Move(direction) => {
            let next = grid
                .neighbor(*location, direction)
                .filter(|&next| grid.is_passable(next));
            match next {
                Some(next) => {
                    *location = next;
                    *battery = battery.saturating_sub(MOVE_COST);
                }
                None => {
                    tracing::debug!(location = %location, %direction, "move blocked");
                }
            }
            Ok(0)
        }
    }
}

impl Environment for VacuumWorldEnvironment {
    type Action = VacuumWorldAction;
    type Percept = VacuumWorldPercept;
    type Score = Reward;
    type Snapshot = VacuumWorldSnapshot;

    fn percept(&self) -> Self::Percept {
        VacuumWorldPercept {
            location: self.agent_location,
            battery: self.battery,
            grid: self.grid.clone(),
        }
    }

    fn execute_action(&mut self, action: &Self::Action) -> Self::Score {
        apply_action(
            &mut self.grid,
            &mut self.agent_location,
            &mut self.battery,
            *action,
        )
        .unwrap_or_else(|err| {
            tracing::warn!(%err, "action outside the grid");
            0
        })
    }

    fn is_exhausted(&self) -> bool {
        self.battery == 0
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.percept()
    }
}
