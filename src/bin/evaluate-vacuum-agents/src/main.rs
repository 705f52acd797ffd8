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

//! Chapter 2, Exercise 12, evaluate the vacuum cleaner agents.

use std::ops::Range;

use anyhow::{anyhow, Result};
use bdi_vacuum::{run_simulation, AgentKind, PerceptionMode, SimulationConfig, SimulationReport};
use clap::Parser;
use grid_world::GenerationConfig;
use rayon::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

// Exercise 12:
//
// Implement a simple reflex agent for the vacuum environment in Exercise 2.10. Run the environment
// with this agent for all possible initial dirt configurations and agent locations. Record the
// performance score for each configuration and the overall average score.
//
// Enumerating every configuration is hopeless once dirt is graded and furniture moves around, so
// every agent runs on the same seeded sample of generated maps instead.

/// Compare the vacuum cleaner agents over many generated maps.
#[derive(Parser)]
#[command(name = "evaluate-vacuum-agents", version)]
struct Cli {
    /// Number of maps per agent.
    #[arg(long, default_value_t = 200)]
    runs: u64,

    /// Seed of the first map; map i uses seed + i.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 5)]
    size: usize,

    #[arg(long, default_value_t = 30)]
    battery: u32,

    #[arg(long, default_value_t = 100)]
    max_steps: usize,
}

#[derive(Default)]
struct Summary {
    runs: usize,
    reward: f64,
    cleaned: f64,
    ticks: f64,
    battery: f64,
}

impl Summary {
    fn add(mut self, report: &SimulationReport) -> Self {
        self.runs += 1;
        self.reward += f64::from(report.total_reward);
        self.cleaned += report.cleaned_fraction();
        self.ticks += report.ticks.len() as f64;
        self.battery += f64::from(report.battery);
        self
    }

    fn print(&self, label: &str) {
        let n = self.runs.max(1) as f64;
        println!(
            "{:<22} runs {:>5}  score {:>6.2}  cleaned {:>5.1}%  ticks {:>6.1}  battery left {:>5.1}",
            label,
            self.runs,
            self.reward / n,
            100.0 * self.cleaned / n,
            self.ticks / n,
            self.battery / n,
        );
    }
}

/// Seeds `seed, seed + 1, ..` for `runs` maps, or an error if the last one does not fit.
fn seed_range(seed: u64, runs: u64) -> Result<Range<u64>> {
    let end = seed
        .checked_add(runs)
        .ok_or_else(|| anyhow!("--seed {} plus --runs {} overflows u64", seed, runs))?;
    Ok(seed..end)
}

/// Row label. The perception mode is shown only for agents that read it.
fn label(agent: AgentKind, perception: PerceptionMode) -> String {
    if agent.uses_perception_mode() {
        format!("{} ({})", agent, perception)
    } else {
        agent.to_string()
    }
}

fn evaluate(cli: &Cli, agent: AgentKind, perception: PerceptionMode) -> Result<Summary> {
    let reports = seed_range(cli.seed, cli.runs)?
        .into_par_iter()
        .map(|seed| {
            let config = SimulationConfig {
                generation: GenerationConfig {
                    size: cli.size,
                    ..GenerationConfig::default()
                },
                battery: cli.battery,
                max_steps: cli.max_steps,
                seed,
                perception,
                agent,
                ..SimulationConfig::default()
            };
            run_simulation(&config)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reports.iter().fold(Summary::default(), Summary::add))
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(runs = cli.runs, size = cli.size, battery = cli.battery, "evaluating agents");

    seed_range(cli.seed, cli.runs)?;
    for agent in AgentKind::ALL {
        let modes: &[PerceptionMode] = if agent.uses_perception_mode() {
            &[PerceptionMode::Global, PerceptionMode::Local]
        } else {
            &[PerceptionMode::default()]
        };
        for &perception in modes {
            let summary = evaluate(&cli, agent, perception)?;
            summary.print(&label(agent, perception));
        }
    }
    Ok(())
}
