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

use std::path::PathBuf;

use anyhow::{Context, Result};
use bdi_vacuum::{
    run_simulation, run_simulation_on, AgentKind, PerceptionMode, SimulationConfig,
    SimulationReport,
};
use clap::Parser;
use grid_world::{Grid, Position};
use tracing_subscriber::{fmt, EnvFilter};

// Chapter 2 Intelligent Agents, Exercise 11:
//
// Implement a performance-measuring environment simulator for the vacuum-cleaner world. Your
// implementation should be modular so that the sensors, actuators, and environment
// characteristics (size, shape, dirt placement, etc.) can be changed easily.
//
// Here the world has graded dirt, furniture and a battery, and the agent can be swapped between
// the BDI planner and the two reflex agents.

/// Run one vacuum cleaner simulation and print every tick.
#[derive(Parser)]
#[command(name = "vacuum-sim", version)]
struct Cli {
    /// JSON simulation config. Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text grid to run on instead of generating one ('.', '1', '2', '3', '#').
    #[arg(long)]
    map: Option<PathBuf>,

    /// Side length of the generated grid.
    #[arg(long)]
    size: Option<usize>,

    #[arg(long)]
    battery: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    max_steps: Option<usize>,

    /// Start position as ROW,COL.
    #[arg(long, value_parser = parse_position)]
    start: Option<Position>,

    /// global or local. Only the bdi agent reads it.
    #[arg(long)]
    perception: Option<PerceptionMode>,

    /// bdi, reflex or model-based.
    #[arg(long)]
    agent: Option<AgentKind>,

    /// Write the full tick trace as JSON to this file.
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Only print the summary.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_position(s: &str) -> Result<Position, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{}'", s))?;
    let row = row.trim().parse().map_err(|e| format!("bad row: {}", e))?;
    let col = col.trim().parse().map_err(|e| format!("bad col: {}", e))?;
    Ok(Position::new(row, col))
}

fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            SimulationConfig::from_json(&json)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(size) = cli.size {
        config.generation.size = size;
    }
    if let Some(battery) = cli.battery {
        config.battery = battery;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(max_steps) = cli.max_steps {
        config.max_steps = max_steps;
    }
    if let Some(start) = cli.start {
        config.start = start;
    }
    if let Some(perception) = cli.perception {
        config.perception = perception;
    }
    if let Some(agent) = cli.agent {
        config.agent = agent;
    }
    Ok(config)
}

fn print_ticks(report: &SimulationReport, config: &SimulationConfig) {
    println!("start, battery {}", config.battery);
    println!("{}\n", report.initial_grid.render_with_agent(config.start));
    for record in &report.ticks {
        println!(
            "tick {}: {}, battery {}, score {}",
            record.tick, record.action, record.snapshot.battery, record.score
        );
        println!(
            "{}\n",
            record.snapshot.grid.render_with_agent(record.snapshot.location)
        );
    }
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let report = match &cli.map {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read map {}", path.display()))?;
            let grid: Grid = text
                .parse()
                .with_context(|| format!("cannot parse map {}", path.display()))?;
            run_simulation_on(grid, &config)?
        }
        None => run_simulation(&config)?,
    };

    if !cli.quiet {
        print_ticks(&report, &config);
    }

    if report.agent.uses_perception_mode() {
        println!("agent:      {} ({} perception)", report.agent, config.perception);
    } else {
        println!("agent:      {}", report.agent);
    }
    println!("stopped:    {:?} after {} ticks", report.stop_reason, report.ticks.len());
    println!("score:      {} of {}", report.total_reward, report.available_reward);
    println!("cleaned:    {:.1}%", 100.0 * report.cleaned_fraction());
    println!("battery:    {}", report.battery);
    println!("position:   {}", report.final_position);

    if let Some(path) = &cli.trace {
        let json = report.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("cannot write trace {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote trace");
    }

    Ok(())
}
