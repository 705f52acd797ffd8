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

use grid_world::{Grid, Position, Reward};
use vacuum_cleaner::vacuum_world::{self, Battery, VacuumWorldPercept};
use vacuum_cleaner::Agent;

use crate::belief::{BeliefSet, PerceptionStrategy};
use crate::intention::{next_action, Action, IntentionState};
use crate::planner::{build_route, Route, RouteStats};
use crate::PlanningError;

/// Everything the agent carries from one tick to the next. Beliefs and route are rebuilt every
/// tick and owned only by this value.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    pub position: Position,
    pub battery: Battery,
    pub beliefs: BeliefSet,
    pub route: Route,
    pub next_action: Option<Action>,
    pub intention: IntentionState,
    pub route_stats: RouteStats,
}

impl AgentState {
    pub fn new(position: Position, battery: Battery) -> Self {
        Self {
            position,
            battery,
            beliefs: BeliefSet::new(),
            route: Route::new(),
            next_action: None,
            intention: IntentionState::NoGoal,
            route_stats: RouteStats::default(),
        }
    }

    /// After a tick: nothing left to do, either for lack of battery or of reachable dirt.
    pub fn is_halted(&self) -> bool {
        self.battery == 0 || self.next_action.is_none()
    }
}

/// One perceive, plan, decide cycle. The chosen action is stored in `next_action` and not
/// applied; see [`apply_action`].
pub fn tick(
    grid: &Grid,
    state: AgentState,
    perception: &dyn PerceptionStrategy,
) -> Result<AgentState, PlanningError> {
    if state.battery == 0 {
        return Ok(AgentState {
            next_action: None,
            intention: IntentionState::NoGoal,
            ..state
        });
    }

    let beliefs = perception.perceive(grid, state.position);
    let (mut route, route_stats) = build_route(grid, state.position, &beliefs)?;
    let intention = next_action(grid, &mut route, state.position)?;
    tracing::debug!(
        position = %state.position,
        battery = state.battery,
        beliefs = beliefs.len(),
        route = route.len(),
        intention = ?intention.state,
        action = ?intention.action,
        "agent ticked"
    );

    Ok(AgentState {
        position: state.position,
        battery: state.battery,
        beliefs,
        route,
        next_action: intention.action,
        intention: intention.state,
        route_stats,
    })
}

/// Applies `state.next_action` to the grid and the agent under the same rules as the vacuum
/// world environment. Returns the reward collected.
pub fn apply_action(grid: &mut Grid, state: &mut AgentState) -> Result<Reward, PlanningError> {
    let Some(action) = state.next_action else {
        return Ok(0);
    };
    let position = state.position;
    vacuum_world::apply_action(grid, &mut state.position, &mut state.battery, action)
        .map_err(|_| PlanningError::InvalidPosition(position))
}

/// The BDI loop as a PEAS agent. Position and battery are taken from each percept, so the
/// environment stays the single source of truth for them.
pub struct BdiVacuumAgent {
    state: AgentState,
    perception: Box<dyn PerceptionStrategy>,
}

impl BdiVacuumAgent {
    pub fn new(position: Position, battery: Battery, perception: Box<dyn PerceptionStrategy>) -> Self {
        Self {
            state: AgentState::new(position, battery),
            perception,
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }
}

impl Agent for BdiVacuumAgent {
    type Action = Action;
    type Percept = VacuumWorldPercept;
    type Error = PlanningError;

    fn act(&mut self, percept: &Self::Percept) -> Result<Option<Self::Action>, Self::Error> {
        let previous = std::mem::replace(
            &mut self.state,
            AgentState::new(percept.location, percept.battery),
        );
        let synced = AgentState {
            position: percept.location,
            battery: percept.battery,
            ..previous
        };
        self.state = tick(&percept.grid, synced, self.perception.as_ref())?;
        Ok(self.state.next_action)
    }
}
