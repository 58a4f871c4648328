//! Waypoint graph recorded from observed player positions.

use std::collections::VecDeque;

use maple_bot_core::{Layout, Position};
use tracing::debug;

/// Recorded waypoints linked whenever two of them lie within `link_distance`.
///
/// Paths are searched breadth-first, so they minimise the number of hops
/// rather than the travelled distance. Each hop is bounded by the link
/// distance, which keeps the two close in practice.
#[derive(Clone, Debug)]
pub struct WaypointGraph {
    link_distance: f64,
    nodes: Vec<Position>,
}

impl WaypointGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new(link_distance: f64) -> Self {
        Self {
            link_distance,
            nodes: Vec::new(),
        }
    }

    /// Creates a graph from previously recorded waypoints.
    #[must_use]
    pub fn from_nodes(link_distance: f64, nodes: Vec<Position>) -> Self {
        Self {
            link_distance,
            nodes,
        }
    }

    /// Waypoints in recording order.
    #[must_use]
    pub fn nodes(&self) -> &[Position] {
        &self.nodes
    }

    fn closest(&self, position: Position) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| position.distance(**a).total_cmp(&position.distance(**b)))
            .map(|(index, _)| index)
    }

    fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let origin = self.nodes[index];
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(candidate, node)| {
                *candidate != index && origin.distance(**node) <= self.link_distance
            })
            .map(|(candidate, _)| candidate)
    }

    fn search(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let mut previous: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();

        visited[start] = true;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut hops = vec![goal];
                let mut cursor = goal;
                while let Some(parent) = previous[cursor] {
                    hops.push(parent);
                    cursor = parent;
                }
                hops.reverse();
                return Some(hops);
            }

            for neighbor in self.neighbors(current) {
                if visited[neighbor] {
                    continue;
                }
                visited[neighbor] = true;
                previous[neighbor] = Some(current);
                queue.push_back(neighbor);
            }
        }

        None
    }
}

impl Layout for WaypointGraph {
    fn shortest_path(&self, from: Position, to: Position) -> Vec<Position> {
        let (Some(start), Some(goal)) = (self.closest(from), self.closest(to)) else {
            return vec![to];
        };

        let Some(hops) = self.search(start, goal) else {
            debug!(%from, %to, "no recorded route between waypoints");
            return vec![to];
        };

        let mut path: Vec<Position> = hops.into_iter().map(|index| self.nodes[index]).collect();
        path.push(to);
        path
    }

    fn add(&mut self, position: Position) {
        debug!(%position, nodes = self.nodes.len() + 1, "recorded waypoint");
        self.nodes.push(position);
    }
}
