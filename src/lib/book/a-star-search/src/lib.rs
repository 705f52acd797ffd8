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

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

pub type Int = u32;
pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A graph with unit-cost edges that A* can search. Edges are labelled with a `Step`, e.g. the
/// direction taken, so that callers can ask which way to go rather than where to go.
pub trait SearchSpace {
    type Node: Clone + Copy + PartialEq + Eq + Hash + Debug;
    type Step: Clone + Copy + PartialEq + Eq + Debug;

    fn contains(&self, node: &Self::Node) -> bool;

    /// Nodes reachable with a single step. Order matters only for which of several equal-cost
    /// paths is found.
    fn successors(&self, node: &Self::Node) -> Vec<(Self::Step, Self::Node)>;

    /// Must never overestimate the remaining cost, otherwise distances are not shortest.
    fn heuristic(&self, node: &Self::Node, goal: &Self::Node) -> Int;
}

/// Length of a shortest path. `Unreachable` sorts after every finite distance and deliberately
/// has no arithmetic, so it cannot leak into sums by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Distance {
    Finite(Int),
    Unreachable,
}

impl Distance {
    pub fn finite(self) -> Option<Int> {
        match self {
            Distance::Finite(d) => Some(d),
            Distance::Unreachable => None,
        }
    }

    pub fn is_reachable(self) -> bool {
        self.finite().is_some()
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Distance::Finite(d) => write!(f, "{}", d),
            Distance::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("start node is outside the search space")]
    StartOutside,

    #[error("goal node is outside the search space")]
    GoalOutside,
}

/// A path from start to goal. `nodes` includes both ends, `steps[i]` leads from `nodes[i]` to
/// `nodes[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<_Node, _Step> {
    pub nodes: Vec<_Node>,
    pub steps: Vec<_Step>,
}

impl<_Node, _Step: Copy> Path<_Node, _Step> {
    pub fn cost(&self) -> Int {
        self.steps.len() as Int
    }

    pub fn first_step(&self) -> Option<_Step> {
        self.steps.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<_Node, _Step> {
    Found(Path<_Node, _Step>),
    Unreachable,
}

impl<_Node, _Step: Copy> SearchOutcome<_Node, _Step> {
    pub fn distance(&self) -> Distance {
        match self {
            SearchOutcome::Found(path) => Distance::Finite(path.cost()),
            SearchOutcome::Unreachable => Distance::Unreachable,
        }
    }

    pub fn first_step(&self) -> Option<_Step> {
        match self {
            SearchOutcome::Found(path) => path.first_step(),
            SearchOutcome::Unreachable => None,
        }
    }

    pub fn into_path(self) -> Option<Path<_Node, _Step>> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::Unreachable => None,
        }
    }
}

/// Bookkeeping about a single search, for tests and tracing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub expanded: usize,
    pub pushed: usize,
}

#[derive(Debug)]
struct OpenNode<_Node> {
    f: Int,
    g: Int,
    tie: u64,
    node: _Node,
}

impl<_Node> OpenNode<_Node> {
    fn key(&self) -> (Int, u64) {
        (self.f, self.tie)
    }
}

impl<_Node> PartialEq for OpenNode<_Node> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<_Node> Eq for OpenNode<_Node> {}

impl<_Node> PartialOrd for OpenNode<_Node> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<_Node> Ord for OpenNode<_Node> {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed so BinaryHeap pops the lowest f, then the earliest pushed.
        other.key().cmp(&self.key())
    }
}

fn reconstruct_path<_Node, _Step>(
    came_from: &HashMap<_Node, (_Node, _Step)>,
    start: _Node,
    goal: _Node,
) -> Path<_Node, _Step>
where
    _Node: Copy + Eq + Hash,
    _Step: Copy,
{
    let mut nodes = vec![goal];
    let mut steps = Vec::new();
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&(previous, step)) => {
                steps.push(step);
                nodes.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    nodes.reverse();
    steps.reverse();
    Path { nodes, steps }
}

// AStar is shortest-path search guided by an admissible heuristic.
// See section 3.5.2 A* search page 85.
pub struct AStar<'a, _Space: SearchSpace> {
    space: &'a _Space,
}

impl<'a, _Space> AStar<'a, _Space>
where
    _Space: SearchSpace,
{
    pub fn new(space: &'a _Space) -> Self {
        Self { space }
    }

    pub fn search(
        &self,
        start: _Space::Node,
        goal: _Space::Node,
    ) -> Result<SearchOutcome<_Space::Node, _Space::Step>, SearchError> {
        self.search_with_stats(start, goal)
            .map(|(outcome, _stats)| outcome)
    }

    pub fn search_with_stats(
        &self,
        start: _Space::Node,
        goal: _Space::Node,
    ) -> Result<(SearchOutcome<_Space::Node, _Space::Step>, SearchStats), SearchError> {
        if !self.space.contains(&start) {
            return Err(SearchError::StartOutside);
        }
        if !self.space.contains(&goal) {
            return Err(SearchError::GoalOutside);
        }

        let mut stats = SearchStats::default();
        if start == goal {
            let path = Path {
                nodes: vec![start],
                steps: Vec::new(),
            };
            return Ok((SearchOutcome::Found(path), stats));
        }

        let mut open = BinaryHeap::<OpenNode<_Space::Node>>::new();
        let mut tie: u64 = 0;
        let mut g_score: HashMap<_Space::Node, Int> = HashMap::default();
        let mut came_from: HashMap<_Space::Node, (_Space::Node, _Space::Step)> =
            HashMap::default();

        g_score.insert(start, 0);
        open.push(OpenNode {
            f: self.space.heuristic(&start, &goal),
            g: 0,
            tie,
            node: start,
        });
        stats.pushed += 1;

        while let Some(OpenNode { g, node, .. }) = open.pop() {
            if node == goal {
                let path = reconstruct_path(&came_from, start, goal);
                tracing::trace!(
                    ?start,
                    ?goal,
                    cost = path.cost(),
                    expanded = stats.expanded,
                    "goal reached"
                );
                return Ok((SearchOutcome::Found(path), stats));
            }

            let best_g = g_score.get(&node).copied().unwrap_or(Int::MAX);
            if g > best_g {
                // stale heap entry.
                continue;
            }
            stats.expanded += 1;

            for (step, next) in self.space.successors(&node) {
                let tentative_g = g.saturating_add(1);
                if tentative_g >= g_score.get(&next).copied().unwrap_or(Int::MAX) {
                    continue;
                }

                g_score.insert(next, tentative_g);
                came_from.insert(next, (node, step));
                tie += 1;
                open.push(OpenNode {
                    f: tentative_g.saturating_add(self.space.heuristic(&next, &goal)),
                    g: tentative_g,
                    tie,
                    node: next,
                });
                stats.pushed += 1;
            }
        }

        tracing::trace!(?start, ?goal, expanded = stats.expanded, "goal unreachable");
        Ok((SearchOutcome::Unreachable, stats))
    }

    pub fn shortest_distance(
        &self,
        start: _Space::Node,
        goal: _Space::Node,
    ) -> Result<Distance, SearchError> {
        self.search(start, goal).map(|outcome| outcome.distance())
    }

    pub fn first_step(
        &self,
        start: _Space::Node,
        goal: _Space::Node,
    ) -> Result<Option<_Space::Step>, SearchError> {
        self.search(start, goal).map(|outcome| outcome.first_step())
    }
}
