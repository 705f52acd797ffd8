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

//! Greedy route construction.
//!
//! All pairwise A* distances between the agent and the believed dirt are computed afresh, then
//! the route is grown one target at a time by picking the reachable target with the best
//! `reward² / (distance + 1)` from wherever the route currently ends. This is a heuristic, not
//! a travelling-salesman solver.

use std::collections::VecDeque;

use a_star_search::{Distance, Int};
use grid_world::{Grid, Position, Reward};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::belief::{Belief, BeliefSet};
use crate::pathfinder;
use crate::PlanningError;

/// Planned visiting order. The head is the current target.
pub type Route = VecDeque<Belief>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteStats {
    pub total_distance: Int,
    pub total_reward: Reward,
    /// `total_reward / (total_distance + 1)`.
    pub efficiency: f64,
    pub dirt_in_route: usize,
    pub dirt_total: usize,
}

/// Shortest distances between every ordered pair of nodes. Not assumed symmetric.
#[derive(Debug, Clone, Default)]
pub struct DistanceGraph {
    distances: FxHashMap<Position, FxHashMap<Position, Distance>>,
}

impl DistanceGraph {
    pub fn distance(&self, from: Position, to: Position) -> Distance {
        if from == to {
            return Distance::Finite(0);
        }
        self.distances
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .unwrap_or(Distance::Unreachable)
    }

    pub fn node_count(&self) -> usize {
        self.distances.len()
    }
}

/// Runs A* between every ordered pair drawn from `start` and the belief coordinates.
pub fn build_distance_graph(
    grid: &Grid,
    start: Position,
    beliefs: &BeliefSet,
) -> Result<DistanceGraph, PlanningError> {
    if !grid.in_bounds(start) {
        return Err(PlanningError::InvalidPosition(start));
    }
    let mut nodes: Vec<Position> = Vec::with_capacity(beliefs.len() + 1);
    nodes.push(start);
    nodes.extend(beliefs.coordinates().filter(|&coordinate| coordinate != start));

    let mut distances: FxHashMap<Position, FxHashMap<Position, Distance>> = FxHashMap::default();
    for &from in &nodes {
        let mut row = FxHashMap::default();
        for &to in &nodes {
            if from != to {
                row.insert(to, pathfinder::shortest_distance(grid, from, to)?);
            }
        }
        distances.insert(from, row);
    }
    Ok(DistanceGraph { distances })
}

pub fn score(reward: Reward, distance: Int) -> f64 {
    let reward = f64::from(reward);
    reward * reward / (f64::from(distance) + 1.0)
}

/// Orders `beliefs` into a route starting from `start`. Unreachable beliefs are left out. On an
/// exact score tie the belief enumerated first (row-major) wins.
pub fn plan_route(graph: &DistanceGraph, start: Position, beliefs: &BeliefSet) -> (Route, RouteStats) {
    let mut remaining: Vec<Belief> = beliefs.iter().collect();
    let mut route = Route::with_capacity(remaining.len());
    let mut current = start;
    let mut total_distance: Int = 0;
    let mut total_reward: Reward = 0;

    loop {
        let mut best: Option<(usize, f64, Int)> = None;
        for (idx, belief) in remaining.iter().enumerate() {
            let Some(distance) = graph.distance(current, belief.coordinate).finite() else {
                continue;
            };
            let candidate = score(belief.reward, distance);
            if best.map_or(true, |(_, best_score, _)| candidate > best_score) {
                best = Some((idx, candidate, distance));
            }
        }
        let Some((idx, _, distance)) = best else {
            break;
        };

        let belief = remaining.remove(idx);
        total_distance += distance;
        total_reward += belief.reward;
        current = belief.coordinate;
        route.push_back(belief);
    }

    let stats = RouteStats {
        total_distance,
        total_reward,
        efficiency: f64::from(total_reward) / (f64::from(total_distance) + 1.0),
        dirt_in_route: route.len(),
        dirt_total: beliefs.len(),
    };
    (route, stats)
}

pub fn build_route(
    grid: &Grid,
    position: Position,
    beliefs: &BeliefSet,
) -> Result<(Route, RouteStats), PlanningError> {
    let graph = build_distance_graph(grid, position, beliefs)?;
    let (route, stats) = plan_route(&graph, position, beliefs);
    tracing::debug!(
        %position,
        nodes = graph.node_count(),
        dirt_in_route = stats.dirt_in_route,
        dirt_total = stats.dirt_total,
        total_distance = stats.total_distance,
        total_reward = stats.total_reward,
        efficiency = stats.efficiency,
        "route built"
    );
    Ok((route, stats))
}
