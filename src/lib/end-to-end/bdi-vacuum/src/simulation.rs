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

//! Runs one agent in a vacuum world until its battery is gone or it has nothing left to do,
//! keeping a per-tick record for renderers and trace dumps.

use std::fmt;
use std::str::FromStr;

use grid_world::{generate, GenerationConfig, Grid, GridError, Position, Reward};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use vacuum_cleaner::vacuum_world::{
    Battery, ModelBasedVacuumAgent, ReflexVacuumAgent, VacuumWorldAction,
    VacuumWorldEnvironment, VacuumWorldPercept,
};
use vacuum_cleaner::{Agent, Simulation, SimulationRecord, StopReason};

use crate::agent::BdiVacuumAgent;
use crate::belief::PerceptionMode;
use crate::SimulationError;

pub type TickRecord = SimulationRecord<VacuumWorldEnvironment>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    #[default]
    Bdi,
    Reflex,
    ModelBased,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [AgentKind::Bdi, AgentKind::Reflex, AgentKind::ModelBased];

    /// Only the BDI agent reads [`SimulationConfig::perception`]. The reflex agents always sense
    /// their own cell and its four neighbours.
    pub fn uses_perception_mode(self) -> bool {
        matches!(self, AgentKind::Bdi)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Bdi => write!(f, "bdi"),
            AgentKind::Reflex => write!(f, "reflex"),
            AgentKind::ModelBased => write!(f, "model-based"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| {
                format!(
                    "unknown agent '{}', expected one of 'bdi', 'reflex', 'model-based'",
                    s
                )
            })
    }
}

/// Everything needed to reproduce a run. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub generation: GenerationConfig,
    pub battery: Battery,
    pub max_steps: usize,
    pub seed: u64,
    pub start: Position,
    /// How the BDI agent forms beliefs. Ignored by the reflex agents, see
    /// [`AgentKind::uses_perception_mode`].
    pub perception: PerceptionMode,
    pub agent: AgentKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            battery: 30,
            max_steps: 100,
            seed: 42,
            start: Position::new(0, 0),
            perception: PerceptionMode::Global,
            agent: AgentKind::Bdi,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(SimulationError::Config)
    }

    /// Same seed, same grid. The start cell never gets an obstacle.
    pub fn generate_grid(&self) -> Result<Grid, GridError> {
        let mut rng = rand_pcg::Pcg64::seed_from_u64(self.seed);
        generate(&self.generation, &[self.start], &mut rng)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub agent: AgentKind,
    pub initial_grid: Grid,
    pub final_grid: Grid,
    pub final_position: Position,
    pub battery: Battery,
    pub total_reward: Reward,
    pub available_reward: Reward,
    pub stop_reason: StopReason,
    pub ticks: Vec<TickRecord>,
}

impl SimulationReport {
    pub fn actions(&self) -> impl Iterator<Item = VacuumWorldAction> + '_ {
        self.ticks.iter().map(|record| record.action)
    }

    /// Share of the reward on the initial grid that was collected. 1 if there was none.
    pub fn cleaned_fraction(&self) -> f64 {
        if self.available_reward == 0 {
            return 1.0;
        }
        f64::from(self.total_reward) / f64::from(self.available_reward)
    }

    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string_pretty(self).map_err(SimulationError::Serialize)
    }
}

pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationReport, SimulationError> {
    let grid = config.generate_grid()?;
    run_simulation_on(grid, config)
}

/// Runs on a given grid; `config.generation` and `config.seed` are ignored.
pub fn run_simulation_on(
    grid: Grid,
    config: &SimulationConfig,
) -> Result<SimulationReport, SimulationError> {
    match config.agent {
        AgentKind::Bdi => {
            let agent =
                BdiVacuumAgent::new(config.start, config.battery, config.perception.strategy());
            run_agent(grid, agent, config)
        }
        AgentKind::Reflex => run_agent(grid, ReflexVacuumAgent::new(), config),
        AgentKind::ModelBased => run_agent(grid, ModelBasedVacuumAgent::new(), config),
    }
}

fn run_agent<A>(
    grid: Grid,
    agent: A,
    config: &SimulationConfig,
) -> Result<SimulationReport, SimulationError>
where
    A: Agent<Action = VacuumWorldAction, Percept = VacuumWorldPercept>,
    SimulationError: From<A::Error>,
{
    let available_reward = grid.total_reward();
    let perception = config
        .agent
        .uses_perception_mode()
        .then_some(config.perception);
    tracing::info!(
        agent = %config.agent,
        perception = ?perception,
        size = grid.size(),
        battery = config.battery,
        available_reward,
        "starting simulation"
    );

    let environment = VacuumWorldEnvironment::new(grid.clone(), config.start, config.battery)?;
    let mut simulation = Simulation::new(environment, agent, config.max_steps);
    let stop_reason = simulation.run()?;
    let total_reward = simulation.score();
    let (environment, _agent, ticks) = simulation.into_parts();

    let report = SimulationReport {
        agent: config.agent,
        initial_grid: grid,
        final_position: environment.agent_location(),
        battery: environment.battery(),
        final_grid: environment.into_grid(),
        total_reward,
        available_reward,
        stop_reason,
        ticks,
    };
    tracing::info!(
        agent = %report.agent,
        ticks = report.ticks.len(),
        total_reward = report.total_reward,
        battery = report.battery,
        stop_reason = ?report.stop_reason,
        "simulation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.generation.size, 5);
        assert_eq!(config.battery, 30);
        assert_eq!(config.max_steps, 100);
        assert_eq!(config.seed, 42);
        assert_eq!(config.start, Position::new(0, 0));
        assert_eq!(config.perception, PerceptionMode::Global);
        assert_eq!(config.agent, AgentKind::Bdi);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimulationConfig::from_json(
            r#"{ "battery": 12, "agent": "model-based", "generation": { "size": 7 } }"#,
        )
        .expect("parse failed");
        assert_eq!(config.battery, 12);
        assert_eq!(config.agent, AgentKind::ModelBased);
        assert_eq!(config.generation.size, 7);
        assert_eq!(config.generation.dust, 2);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_bad_json_is_a_config_error() {
        assert!(matches!(
            SimulationConfig::from_json(r#"{ "agent": "roomba" }"#),
            Err(SimulationError::Config(_))
        ));
    }

    #[test]
    fn test_agent_kind_round_trips_through_text() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.to_string().parse::<AgentKind>(), Ok(kind));
        }
        assert!("roomba".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = SimulationConfig::default();
        let first = run_simulation(&config).expect("run failed");
        let second = run_simulation(&config).expect("run failed");
        assert_eq!(first.initial_grid, second.initial_grid);
        assert_eq!(
            first.actions().collect::<Vec<_>>(),
            second.actions().collect::<Vec<_>>()
        );
        assert_eq!(first.total_reward, second.total_reward);
    }

    #[test]
    fn test_reward_is_conserved() {
        for agent in AgentKind::ALL {
            let config = SimulationConfig {
                agent,
                ..SimulationConfig::default()
            };
            let report = run_simulation(&config).expect("run failed");
            assert_eq!(
                report.total_reward + report.final_grid.total_reward(),
                report.available_reward,
                "{}",
                agent
            );
            assert!(report.ticks.len() <= config.max_steps);
        }
    }

    #[test]
    fn test_bdi_with_enough_battery_cleans_everything_reachable() {
        let grid: Grid = "
            .2...
            .##..
            ...3.
            1....
            ....1
            "
        .parse()
        .expect("parse failed");
        let config = SimulationConfig {
            battery: 100,
            ..SimulationConfig::default()
        };
        let report = run_simulation_on(grid, &config).expect("run failed");
        assert_eq!(report.stop_reason, StopReason::NoAction);
        assert_eq!(report.final_grid.total_reward(), 0);
        assert_relative_eq!(report.cleaned_fraction(), 1.0);
    }

    #[test]
    fn test_start_on_obstacle_is_rejected() {
        let grid: Grid = "#.\n..".parse().expect("parse failed");
        assert!(matches!(
            run_simulation_on(grid, &SimulationConfig::default()),
            Err(SimulationError::World(_))
        ));
    }

    #[test]
    fn test_report_serializes() {
        let report = run_simulation(&SimulationConfig::default()).expect("run failed");
        let json = report.to_json().expect("serialize failed");
        let value: serde_json::Value = serde_json::from_str(&json).expect("not json");
        assert_eq!(value["agent"], "bdi");
        assert_eq!(
            value["ticks"].as_array().map(Vec::len),
            Some(report.ticks.len())
        );
    }

    #[test]
    fn test_reflex_agents_ignore_perception_mode() {
        for agent in [AgentKind::Reflex, AgentKind::ModelBased] {
            assert!(!agent.uses_perception_mode());
            let global = SimulationConfig {
                agent,
                perception: PerceptionMode::Global,
                ..SimulationConfig::default()
            };
            let local = SimulationConfig {
                perception: PerceptionMode::Local,
                ..global.clone()
            };
            let global = run_simulation(&global).expect("run failed");
            let local = run_simulation(&local).expect("run failed");
            assert_eq!(
                global.actions().collect::<Vec<_>>(),
                local.actions().collect::<Vec<_>>(),
                "{}",
                agent
            );
            assert_eq!(global.total_reward, local.total_reward, "{}", agent);
        }
        assert!(AgentKind::Bdi.uses_perception_mode());
    }
}
