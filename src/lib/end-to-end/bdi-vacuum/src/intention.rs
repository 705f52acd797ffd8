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

use grid_world::{Grid, Position};
use serde::Serialize;
use vacuum_cleaner::vacuum_world::VacuumWorldAction;

use crate::belief::Belief;
use crate::pathfinder;
use crate::planner::Route;
use crate::PlanningError;

pub type Action = VacuumWorldAction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum IntentionState {
    #[default]
    NoGoal,
    NavigatingToTarget,
    AtTarget,
}

/// The single decision taken this tick, and the route head it was taken for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Intention {
    pub state: IntentionState,
    pub action: Option<Action>,
    pub target: Option<Belief>,
}

impl Intention {
    fn no_goal() -> Self {
        Self::default()
    }
}

/// Turns the head of `route` into at most one action. Standing on the head cleans it and pops
/// it. Otherwise the agent steps towards it and the head stays. Heads that cannot be reached
/// are popped until a reachable one is found or the route is empty.
///
/// Nothing is applied here: the caller moves the agent, cleans the cell and pays the battery.
pub fn next_action(
    grid: &Grid,
    route: &mut Route,
    position: Position,
) -> Result<Intention, PlanningError> {
    if !grid.in_bounds(position) {
        return Err(PlanningError::InvalidPosition(position));
    }

    while let Some(&head) = route.front() {
        if head.coordinate == position {
            route.pop_front();
            return Ok(Intention {
                state: IntentionState::AtTarget,
                action: Some(Action::Clean),
                target: Some(head),
            });
        }

        match pathfinder::first_step(grid, position, head.coordinate)? {
            Some(direction) => {
                return Ok(Intention {
                    state: IntentionState::NavigatingToTarget,
                    action: Some(Action::Move(direction)),
                    target: Some(head),
                })
            }
            None => {
                tracing::debug!(goal = %head.coordinate, %position, "dropping unreachable target");
                route.pop_front();
            }
        }
    }

    Ok(Intention::no_goal())
}
