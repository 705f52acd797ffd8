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

//! Belief-desire-intention vacuum cleaner.
//!
//! Every tick the agent perceives the dirt on the grid (beliefs), orders it into a cleaning
//! route (desires) and commits to exactly one move or clean towards the head of that route
//! (intention). A* is used both to weigh the route and to take the next step, so the two can
//! never disagree about what is reachable.

use grid_world::{GridError, Position};
use vacuum_cleaner::vacuum_world::VacuumWorldError;

pub mod agent;
pub mod belief;
pub mod intention;
pub mod pathfinder;
pub mod planner;
pub mod simulation;

pub use a_star_search::Distance;
pub use agent::{apply_action, tick, AgentState, BdiVacuumAgent};
pub use belief::{
    perceive, perceive_local, Belief, BeliefSet, GlobalPerception, LocalPerception,
    PerceptionMode, PerceptionStrategy,
};
pub use intention::{next_action, Action, Intention, IntentionState};
pub use planner::{build_distance_graph, build_route, plan_route, score, DistanceGraph, Route, RouteStats};
pub use simulation::{
    run_simulation, run_simulation_on, AgentKind, SimulationConfig, SimulationReport, TickRecord,
};

/// Contract violations from the planning core. Unreachable targets and empty routes are not
/// errors; they show up as `Distance::Unreachable`, `None` or `IntentionState::NoGoal`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanningError {
    #[error("position is outside the grid: {0}")]
    InvalidPosition(Position),
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    World(#[from] VacuumWorldError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error("invalid simulation config: {0}")]
    Config(#[source] serde_json::Error),

    #[error("cannot serialize simulation report: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl From<std::convert::Infallible> for SimulationError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
