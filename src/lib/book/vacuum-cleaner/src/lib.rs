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

// PEAS - Performance, Environment, Action, Sensing
//
// See:
// -  Chapter 2: Intelligent Agents, page 40

use num_traits::Zero;
use serde::Serialize;

pub mod vacuum_world;

/// An Agent acts in a Performance, Environment, Action, Sensing (PEAS) cycle.
/// For a given Perception, the Agent will return an Action, or None once it has nothing left
/// worth doing.
///
/// Agents that deliberate (e.g. plan routes) can fail on malformed input; reflex agents use
/// `std::convert::Infallible` as their Error.
///
/// Notice that the Agent is not aware of an Environment, it's only interface
/// is the Perception coming in then the Action going out.
pub trait Agent {
    type Action;
    type Percept;
    type Error;

    fn act(&mut self, percept: &Self::Percept) -> Result<Option<Self::Action>, Self::Error>;
}

/// An Environment runs a single Agent in a Performance, Environment, Action, Sensing (PEAS) cycle.
///
/// Notice that the Environment is not aware of an Agent.
pub trait Environment {
    type Action;
    type Percept;
    type Score: num_traits::NumAssign + Copy;
    type Snapshot;

    fn percept(&self) -> Self::Percept;

    /// Applies the action and returns the score earned by this action alone.
    fn execute_action(&mut self, action: &Self::Action) -> Self::Score;

    /// Whether the Environment accepts no more actions, e.g. the Agent ran out of energy.
    fn is_exhausted(&self) -> bool;

    /// Everything an external renderer needs to draw the current state.
    fn snapshot(&self) -> Self::Snapshot;
}

/// What happened during one tick of a Simulation. `score` is cumulative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickRecord<_Action, _Snapshot, _Score> {
    pub tick: usize,
    pub action: _Action,
    pub snapshot: _Snapshot,
    pub score: _Score,
}

/// Why a Simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    Exhausted,
    NoAction,
    StepLimit,
}

pub type SimulationRecord<_Environment> = TickRecord<
    <_Environment as Environment>::Action,
    <_Environment as Environment>::Snapshot,
    <_Environment as Environment>::Score,
>;

/// A Simulation runs a single Agent in repeated Performance, Environment, Action, Sensing (PEAS)
/// cycles until the Environment is exhausted, the Agent has no action, or `max_steps` ticks
/// have passed. The Agent's score (Performance) is continually kept up to date, and every tick is
/// recorded so it can be replayed or rendered afterwards.
///
/// The Simulation is aware of both the Environment and the single Agent. Notice that the Agent's
/// generic Action and Percept come from the Environment. The Agent still does not need to know that
/// the Environment exists, but the Agent definitely needs the Environment's Action and Percept
/// types.
pub struct Simulation<_Environment, _Agent>
where
    _Environment: Environment,
    _Agent: Agent<Action = _Environment::Action, Percept = _Environment::Percept>,
{
    environment: _Environment,
    agent: _Agent,
    max_steps: usize,
    score: _Environment::Score,
    history: Vec<SimulationRecord<_Environment>>,
}

impl<_Environment, _Agent> Simulation<_Environment, _Agent>
where
    _Environment: Environment,
    _Agent: Agent<Action = _Environment::Action, Percept = _Environment::Percept>,
{
    pub fn new(environment: _Environment, agent: _Agent, max_steps: usize) -> Self {
        Self {
            environment,
            agent,
            max_steps,
            score: _Environment::Score::zero(),
            history: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<StopReason, _Agent::Error> {
        for tick in self.history.len()..self.max_steps {
            if self.environment.is_exhausted() {
                return Ok(StopReason::Exhausted);
            }

            let percept = self.environment.percept();
            let action = match self.agent.act(&percept)? {
                Some(action) => action,
                None => return Ok(StopReason::NoAction),
            };
            self.score += self.environment.execute_action(&action);
            self.history.push(TickRecord {
                tick,
                action,
                snapshot: self.environment.snapshot(),
                score: self.score,
            });
        }

        if self.environment.is_exhausted() {
            Ok(StopReason::Exhausted)
        } else {
            Ok(StopReason::StepLimit)
        }
    }

    pub fn score(&self) -> <_Environment as Environment>::Score {
        self.score
    }

    pub fn history(&self) -> &[SimulationRecord<_Environment>] {
        &self.history
    }

    pub fn environment(&self) -> &_Environment {
        &self.environment
    }

    pub fn agent(&self) -> &_Agent {
        &self.agent
    }

    pub fn into_parts(self) -> (_Environment, _Agent, Vec<SimulationRecord<_Environment>>) {
        (self.environment, self.agent, self.history)
    }
}
