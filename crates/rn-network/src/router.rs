//! Routing trait and the default A* implementation.
//!
//! # Cost models
//!
//! A [`CostModel`] is a plain value: an edge-cost function pointer, the scale
//! applied to the straight-line heuristic, and the penalty for entering an
//! unlit node.  [`CostModel::for_mode`] builds one from a [`CostMode`] and a
//! [`LightPolicy`]; the search itself never looks at the mode.
//!
//! | Mode       | Edge cost                         | Heuristic scale                   |
//! |------------|-----------------------------------|-----------------------------------|
//! | `Distance` | length (km)                       | 1                                 |
//! | `Speed`    | length / weighted speed (hours)   | `min(ceiling, 1 / fastest speed)` |
//!
//! Both scales keep the heuristic admissible: no segment is shorter than the
//! straight line between its ends, and no road is faster than the fastest.
//! A network with an unlimited road drives the speed scale to ~0, which turns
//! the search into plain Dijkstra.
//!
//! # Turn restrictions
//!
//! When node `N` is finalised having been reached from `P`, every neighbour
//! `Q` named by a restriction `P → N → Q` is skipped.  Restrictions match on
//! nodes only.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::trace;
use ordered_float::OrderedFloat;

use rn_core::{EdgeId, EngineConfig, NodeId, NodeIdx};

use crate::error::{QueryError, QueryResult};
use crate::network::RoadGraph;

// ── Cost model ────────────────────────────────────────────────────────────────

/// What a route minimises.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostMode {
    /// Total length in kilometres.
    #[default]
    Distance,
    /// Total travel time in hours at weighted road speeds.
    Speed,
}

/// Whether routing steers towards intersections with traffic lights.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightPolicy {
    #[default]
    Ignore,
    /// Edges into unlit nodes cost `unlit_penalty` times as much.
    PreferLit,
}

/// Edge cost: segment length in km.
pub fn distance_cost(graph: &RoadGraph, edge: EdgeId) -> f64 {
    graph.edge_length[edge.index()]
}

/// Edge cost: hours to traverse at the road's weighted speed.
pub fn travel_time_cost(graph: &RoadGraph, edge: EdgeId) -> f64 {
    graph.edge_length[edge.index()] / graph.edge_speed[edge.index()]
}

#[derive(Copy, Clone, Debug)]
pub struct CostModel {
    pub edge_cost:       fn(&RoadGraph, EdgeId) -> f64,
    /// Multiplier on the straight-line distance to the goal.
    pub heuristic_scale: f64,
    /// Multiplier on edges whose destination has no traffic light.  1 means
    /// no preference.
    pub unlit_penalty:   f64,
}

impl CostModel {
    pub fn for_mode(
        mode: CostMode,
        lights: LightPolicy,
        graph: &RoadGraph,
        config: &EngineConfig,
    ) -> Self {
        let (edge_cost, heuristic_scale): (fn(&RoadGraph, EdgeId) -> f64, f64) = match mode {
            CostMode::Distance => (distance_cost, 1.0),
            CostMode::Speed => {
                let fastest = graph.max_weighted_speed();
                let scale = if fastest > 0.0 {
                    config.speed_heuristic_ceiling.min(1.0 / fastest)
                } else {
                    config.speed_heuristic_ceiling
                };
                (travel_time_cost, scale)
            }
        };
        let unlit_penalty = match lights {
            LightPolicy::Ignore => 1.0,
            LightPolicy::PreferLit => config.unlit_penalty,
        };
        Self { edge_cost, heuristic_scale, unlit_penalty }
    }

    /// Full cost of taking `edge`, penalty included.
    #[inline]
    pub fn cost(&self, graph: &RoadGraph, edge: EdgeId) -> f64 {
        let base = (self.edge_cost)(graph, edge);
        if graph.node(graph.edge_to[edge.index()]).traffic_light {
            base
        } else {
            base * self.unlit_penalty
        }
    }

    #[inline]
    fn heuristic(&self, graph: &RoadGraph, from: NodeIdx, goal: NodeIdx) -> f64 {
        if self.heuristic_scale == 0.0 {
            return 0.0;
        }
        graph.node(from).location.distance(graph.node(goal).location) * self.heuristic_scale
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query.
///
/// An empty route means `start == goal` or that no path exists.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Route {
    /// Visited nodes, start and goal included.
    pub nodes:      Vec<NodeId>,
    /// Directed edges traversed, `nodes.len() - 1` of them.
    pub edges:      Vec<EdgeId>,
    /// Sum of edge costs under the cost model used, penalties included.
    pub total_cost: f64,
}

/// A stretch of a route along one named road.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteLeg {
    pub label:  String,
    /// Kilometres.
    pub length: f64,
}

impl Route {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total length in km, regardless of the cost model.
    pub fn length(&self, graph: &RoadGraph) -> f64 {
        self.edges.iter().map(|e| graph.edge_length[e.index()]).sum()
    }

    /// Merge consecutive edges on roads with the same label.
    pub fn legs(&self, graph: &RoadGraph) -> Vec<RouteLeg> {
        let mut legs: Vec<RouteLeg> = Vec::new();
        for &edge in &self.edges {
            let label = graph.edge_road(edge).map_or("", |r| r.label.as_str());
            let length = graph.edge_length[edge.index()];
            match legs.last_mut() {
                Some(leg) if leg.label == label => leg.length += length,
                _ => legs.push(RouteLeg { label: label.to_owned(), length }),
            }
        }
        legs
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// Implementations must be `Send + Sync` so one router can serve snapshots
/// held on several threads.
pub trait Router: Send + Sync {
    /// Cheapest route from `from` to `to`.
    ///
    /// Returns an empty route when `from == to`, when no path exists, and on
    /// an empty graph.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownNode`] if either id is absent from a non-empty
    /// graph.
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        cost: &CostModel,
    ) -> QueryResult<Route>;
}

/// A* over the directed CSR graph.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarRouter;

impl Router for AStarRouter {
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        cost: &CostModel,
    ) -> QueryResult<Route> {
        search(graph, from, to, cost)
    }
}

/// Uniform-cost search: A* with the heuristic switched off.  Used as a
/// reference in tests.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        cost: &CostModel,
    ) -> QueryResult<Route> {
        let blind = CostModel { heuristic_scale: 0.0, ..*cost };
        search(graph, from, to, &blind)
    }
}

// ── Search internals ──────────────────────────────────────────────────────────

fn search(graph: &RoadGraph, from: NodeId, to: NodeId, cost: &CostModel) -> QueryResult<Route> {
    if graph.is_empty() {
        return Ok(Route::empty());
    }
    let start = graph.index_of(from).ok_or(QueryError::UnknownNode(from))?;
    let goal  = graph.index_of(to).ok_or(QueryError::UnknownNode(to))?;
    if start == goal {
        return Ok(Route::empty());
    }

    let n = graph.node_count();
    // g[v] = best known cost to reach v.
    let mut g         = vec![f64::INFINITY; n];
    // prev_edge[v] = edge that reached v; INVALID for the start and unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];
    let mut closed    = vec![false; n];

    g[start.index()] = 0.0;

    // Min-heap on f = g + h; NodeIdx breaks ties.
    let mut fringe: BinaryHeap<Reverse<(OrderedFloat<f64>, NodeIdx)>> = BinaryHeap::new();
    fringe.push(Reverse((OrderedFloat(cost.heuristic(graph, start, goal)), start)));

    let mut expanded = 0usize;
    while let Some(Reverse((_, node))) = fringe.pop() {
        if closed[node.index()] {
            continue;
        }
        closed[node.index()] = true;

        if node == goal {
            trace!("route {from} -> {to}: {expanded} nodes expanded");
            return Ok(reconstruct(graph, &prev_edge, goal, g[goal.index()]));
        }
        expanded += 1;

        let came_from = match prev_edge[node.index()] {
            EdgeId::INVALID => NodeIdx::INVALID,
            e => graph.edge_from[e.index()],
        };
        let restrictions = graph.restrictions_at(node);

        for edge in graph.out_edges(node) {
            let next = graph.edge_to[edge.index()];
            if closed[next.index()] {
                continue;
            }
            if restrictions.iter().any(|r| r.from == came_from && r.to == next) {
                continue;
            }

            let new_g = g[node.index()] + cost.cost(graph, edge);
            if new_g < g[next.index()] {
                g[next.index()] = new_g;
                prev_edge[next.index()] = edge;
                let f = new_g + cost.heuristic(graph, next, goal);
                fringe.push(Reverse((OrderedFloat(f), next)));
            }
        }
    }

    trace!("route {from} -> {to}: no path after {expanded} expansions");
    Ok(Route::empty())
}

fn reconstruct(graph: &RoadGraph, prev_edge: &[EdgeId], goal: NodeIdx, total_cost: f64) -> Route {
    let mut edges = Vec::new();
    let mut cur = goal;
    loop {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = graph.edge_from[e.index()];
    }
    edges.reverse();

    let mut nodes = Vec::with_capacity(edges.len() + 1);
    nodes.push(graph.node(cur).id);
    nodes.extend(edges.iter().map(|e| graph.node(graph.edge_to[e.index()]).id));

    Route { nodes, edges, total_cost }
}
