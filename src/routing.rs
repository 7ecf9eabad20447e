//! Priority-weighted A* search over a filtered road network.
//!
//! Every edge cost decomposes into four components (travel time, traffic,
//! risk, priority adjustment) that are recorded per segment in the result,
//! so a route's total cost can always be explained after the fact.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use geo::HaversineDistance;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{RoadNetwork, Segment};
use crate::rules::{risk_penalty_min, traffic_penalty_min};

/// Fixed weights of the edge cost model
/// `g = clamp(alpha*travel + beta*traffic + gamma*risk - delta*allowance, 0, inf)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        CostWeights {
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
            delta: 1.0,
        }
    }
}

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("node {0} is not in the road network")]
    UnknownNode(String),

    #[error("no path from {origin} to {destination} in the filtered network")]
    NoPath { origin: String, destination: String },
}

/// Weighted cost components of one traversed segment. The clamped `cost`
/// is what the search minimized; the components are kept separately for
/// display and auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCost {
    pub segment_id: String,
    pub from: String,
    pub to: String,
    pub travel_min: f64,
    pub traffic_min: f64,
    pub risk_min: f64,
    pub priority_adjustment_min: f64,
    pub cost: f64,
}

/// A computed route with its per-segment cost breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub nodes: Vec<String>,
    pub segments: Vec<SegmentCost>,
    /// Sum of the travel-time components, in minutes.
    pub eta_min: f64,
    /// Sum of the risk components.
    pub total_risk: f64,
    /// Sum of the clamped per-segment costs; the quantity A* minimized.
    pub total_cost: f64,
}

struct EdgeCost {
    travel: f64,
    traffic: f64,
    risk: f64,
    adjustment: f64,
    total: f64,
}

fn edge_cost(segment: &Segment, allowance_min: f64, weights: &CostWeights) -> EdgeCost {
    let travel = weights.alpha * segment.base_time_min;
    let traffic = weights.beta * traffic_penalty_min(segment.traffic_level);
    let risk = weights.gamma * risk_penalty_min(segment);
    let adjustment = weights.delta * allowance_min;
    // Clamp at zero: the allowance discount must never make an edge
    // profitable, or A* admissibility breaks.
    let total = (travel + traffic + risk - adjustment).max(0.0);
    EdgeCost {
        travel,
        traffic,
        risk,
        adjustment,
        total,
    }
}

/// Cheapest cost-per-km over the whole graph for this convoy's allowance.
///
/// Scales the straight-line heuristic: every edge costs at least this much
/// per km, and recorded segment distances are never shorter than the
/// straight line, so `haversine_km * ratio` never overestimates.
fn min_cost_per_km(network: &RoadNetwork, allowance_min: f64, weights: &CostWeights) -> f64 {
    let min_ratio = network
        .graph
        .edge_references()
        .filter_map(|e| {
            let segment = e.weight();
            if segment.distance_km > 0.0 {
                Some(edge_cost(segment, allowance_min, weights).total / segment.distance_km)
            } else {
                None
            }
        })
        .fold(f64::INFINITY, f64::min);
    if min_ratio.is_finite() {
        min_ratio
    } else {
        0.0
    }
}

/// A* frontier entry.
#[derive(Clone)]
struct SearchNode {
    node: NodeIndex,
    /// Node id carried for deterministic tie-breaking on equal f.
    node_id: String,
    g_score: f64,
    f_score: f64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.node_id == other.node_id
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lower f_score = higher priority);
        // ties break toward the lower node id so equal-cost frontiers pop
        // in a reproducible order on every platform.
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node_id.cmp(&self.node_id))
    }
}

/// Find the cost-optimal route with the default cost weights.
pub fn route(
    network: &RoadNetwork,
    origin: &str,
    destination: &str,
    allowance_min: f64,
) -> Result<RouteResult, RouteError> {
    route_with_weights(network, origin, destination, allowance_min, &CostWeights::default())
}

/// Find the cost-optimal route from `origin` to `destination`.
///
/// `allowance_min` uniformly discounts every edge cost, biasing high
/// priority convoys toward otherwise costlier routes without touching the
/// graph topology.
pub fn route_with_weights(
    network: &RoadNetwork,
    origin: &str,
    destination: &str,
    allowance_min: f64,
    weights: &CostWeights,
) -> Result<RouteResult, RouteError> {
    let origin_idx = network
        .node_index(origin)
        .ok_or_else(|| RouteError::UnknownNode(origin.to_string()))?;
    let dest_idx = network
        .node_index(destination)
        .ok_or_else(|| RouteError::UnknownNode(destination.to_string()))?;

    let cost_per_km = min_cost_per_km(network, allowance_min, weights);
    let dest_coord = network.node(dest_idx).and_then(|n| n.coord);

    // Admissible heuristic: straight-line distance scaled by the cheapest
    // observed per-km cost; zero when coordinates are missing (the search
    // degrades to uniform-cost).
    let heuristic = |idx: NodeIndex| -> f64 {
        match (network.node(idx).and_then(|n| n.coord), dest_coord) {
            (Some(from), Some(to)) => from.haversine_distance(&to) / 1000.0 * cost_per_km,
            _ => 0.0,
        }
    };

    let mut open_set = BinaryHeap::new();
    let mut g_scores: HashMap<NodeIndex, f64> = HashMap::new();
    let mut came_from: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();

    g_scores.insert(origin_idx, 0.0);
    open_set.push(SearchNode {
        node: origin_idx,
        node_id: origin.to_string(),
        g_score: 0.0,
        f_score: heuristic(origin_idx),
    });

    while let Some(current) = open_set.pop() {
        if current.node == dest_idx {
            return Ok(assemble_result(
                network,
                origin_idx,
                dest_idx,
                &came_from,
                allowance_min,
                weights,
            ));
        }

        // Skip stale frontier entries for nodes already settled cheaper.
        if let Some(&best_g) = g_scores.get(&current.node) {
            if current.g_score > best_g {
                continue;
            }
        }

        for edge in network.graph.edges(current.node) {
            let neighbor = edge.target();
            let tentative_g = current.g_score + edge_cost(edge.weight(), allowance_min, weights).total;

            let neighbor_id = network
                .node(neighbor)
                .expect("edge target exists in the graph")
                .id
                .clone();

            match g_scores.get(&neighbor) {
                Some(&g) if tentative_g > g => continue,
                Some(&g) if tentative_g == g => {
                    // Equal cost: keep whichever full node sequence is
                    // lexicographically smaller. Comparing whole prefixes
                    // matters because equal-total routes can diverge with
                    // unequal intermediate g-costs.
                    let mut candidate = path_ids(network, &came_from, current.node);
                    candidate.push(neighbor_id.clone());
                    let incumbent = path_ids(network, &came_from, neighbor);
                    if candidate >= incumbent {
                        continue;
                    }
                }
                _ => {}
            }

            came_from.insert(neighbor, (current.node, edge.id()));
            g_scores.insert(neighbor, tentative_g);

            // Re-pushed on tie improvements too (g unchanged), so the
            // better prefix propagates through already-settled successors.
            open_set.push(SearchNode {
                node: neighbor,
                node_id: neighbor_id,
                g_score: tentative_g,
                f_score: tentative_g + heuristic(neighbor),
            });
        }
    }

    Err(RouteError::NoPath {
        origin: origin.to_string(),
        destination: destination.to_string(),
    })
}

/// Node-id sequence from the origin to `node` along the current
/// predecessor chain. Used to order equal-cost route candidates.
fn path_ids(
    network: &RoadNetwork,
    came_from: &HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    node: NodeIndex,
) -> Vec<String> {
    let mut ids = vec![network.node(node).expect("path node exists").id.clone()];
    let mut node = node;
    while let Some(&(prev, _)) = came_from.get(&node) {
        ids.push(network.node(prev).expect("path node exists").id.clone());
        node = prev;
    }
    ids.reverse();
    ids
}

fn assemble_result(
    network: &RoadNetwork,
    origin_idx: NodeIndex,
    dest_idx: NodeIndex,
    came_from: &HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    allowance_min: f64,
    weights: &CostWeights,
) -> RouteResult {
    // Walk predecessors back to the origin, then reverse.
    let mut hops: Vec<EdgeIndex> = Vec::new();
    let mut node_path = vec![dest_idx];
    let mut node = dest_idx;
    while node != origin_idx {
        let &(prev, edge) = came_from
            .get(&node)
            .expect("every settled node has a predecessor");
        hops.push(edge);
        node_path.push(prev);
        node = prev;
    }
    hops.reverse();
    node_path.reverse();

    let nodes: Vec<String> = node_path
        .iter()
        .map(|&idx| network.node(idx).expect("path node exists").id.clone())
        .collect();

    let mut segments = Vec::with_capacity(hops.len());
    let mut eta_min = 0.0;
    let mut total_risk = 0.0;
    let mut total_cost = 0.0;
    for edge_idx in hops {
        let segment = network.segment(edge_idx).expect("path edge exists");
        let (from, to) = network.endpoints(edge_idx).expect("path edge endpoints exist");
        let cost = edge_cost(segment, allowance_min, weights);
        eta_min += cost.travel;
        total_risk += cost.risk;
        total_cost += cost.total;
        segments.push(SegmentCost {
            segment_id: segment.id.clone(),
            from: from.to_string(),
            to: to.to_string(),
            travel_min: cost.travel,
            traffic_min: cost.traffic,
            risk_min: cost.risk,
            priority_adjustment_min: cost.adjustment,
            cost: cost.total,
        });
    }

    RouteResult {
        nodes,
        segments,
        eta_min,
        total_risk,
        total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TrafficLevel;
    use crate::test_utils::TestNetworkBuilder;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_chain_route() {
        let network = TestNetworkBuilder::new()
            .node("A")
            .node("B")
            .node("C")
            .segment("A-B", "A", "B", 5.0, 6.0)
            .segment("B-C", "B", "C", 5.0, 7.0)
            .build();

        let result = route(&network, "A", "C", 0.0).unwrap();
        assert_eq!(result.nodes, vec!["A", "B", "C"]);
        assert_eq!(result.segments.len(), 2);
        assert!(close(result.eta_min, 13.0));
        assert!(close(result.total_cost, 13.0));
        assert!(close(result.total_risk, 0.0));
    }

    #[test]
    fn test_unknown_node() {
        let network = TestNetworkBuilder::new().node("A").build();
        assert!(matches!(
            route(&network, "A", "Z", 0.0),
            Err(RouteError::UnknownNode(n)) if n == "Z"
        ));
        assert!(matches!(
            route(&network, "Z", "A", 0.0),
            Err(RouteError::UnknownNode(n)) if n == "Z"
        ));
    }

    #[test]
    fn test_no_path() {
        let network = TestNetworkBuilder::new().node("A").node("B").build();
        assert!(matches!(
            route(&network, "A", "B", 0.0),
            Err(RouteError::NoPath { .. })
        ));
    }

    #[test]
    fn test_origin_equals_destination() {
        let network = TestNetworkBuilder::new()
            .node("A")
            .node("B")
            .segment("A-B", "A", "B", 5.0, 6.0)
            .build();
        let result = route(&network, "A", "A", 0.0).unwrap();
        assert_eq!(result.nodes, vec!["A"]);
        assert!(result.segments.is_empty());
        assert!(close(result.total_cost, 0.0));
    }

    #[test]
    fn test_traffic_and_risk_enter_cost() {
        let network = TestNetworkBuilder::new()
            .node("A")
            .node("B")
            .segment_with("A-B", "A", "B", 5.0, 6.0, |s| {
                s.traffic_level = TrafficLevel::Moderate;
                s.risk_level = 0.5;
            })
            .build();
        let result = route(&network, "A", "B", 0.0).unwrap();
        let seg = &result.segments[0];
        assert!(close(seg.travel_min, 6.0));
        assert!(close(seg.traffic_min, 5.0));
        assert!(close(seg.risk_min, 10.0));
        assert!(close(seg.priority_adjustment_min, 0.0));
        assert!(close(seg.cost, 21.0));
        assert!(close(result.total_risk, 10.0));
        // ETA counts travel time only, not penalties.
        assert!(close(result.eta_min, 6.0));
    }

    #[test]
    fn test_cost_clamped_non_negative() {
        let network = TestNetworkBuilder::new()
            .node("A")
            .node("B")
            .segment("A-B", "A", "B", 2.0, 3.0)
            .build();
        let result = route(&network, "A", "B", 8.0).unwrap();
        let seg = &result.segments[0];
        assert!(close(seg.cost, 0.0));
        assert!(close(seg.priority_adjustment_min, 8.0));
        // Components stay unclamped for explainability.
        assert!(close(seg.travel_min, 3.0));
    }

    #[test]
    fn test_allowance_changes_route_choice() {
        let build = || {
            TestNetworkBuilder::new()
                .node("A")
                .node("B")
                .node("C")
                .segment("A-C", "A", "C", 10.0, 10.0)
                .segment_with("A-B", "A", "B", 3.0, 3.0, |s| s.risk_level = 0.25)
                .segment_with("B-C", "B", "C", 3.0, 3.0, |s| s.risk_level = 0.25)
                .build()
        };

        // Low allowance: the risk penalty dominates, direct route wins.
        let low = route(&build(), "A", "C", 1.84).unwrap();
        assert_eq!(low.nodes, vec!["A", "C"]);

        // Max allowance: the two-edge discount flips the choice.
        let high = route(&build(), "A", "C", 8.0).unwrap();
        assert_eq!(high.nodes, vec!["A", "B", "C"]);
        assert!(high.total_cost < 2.0);
    }

    #[test]
    fn test_equal_cost_tie_breaks_to_lower_node_id() {
        let network = TestNetworkBuilder::new()
            .node("A")
            .node("B")
            .node("C")
            .node("D")
            .segment("A-C", "A", "C", 5.0, 5.0)
            .segment("C-D", "C", "D", 5.0, 5.0)
            .segment("A-B", "A", "B", 5.0, 5.0)
            .segment("B-D", "B", "D", 5.0, 5.0)
            .build();
        let result = route(&network, "A", "D", 0.0).unwrap();
        assert_eq!(result.nodes, vec!["A", "B", "D"]);
    }

    #[test]
    fn test_equal_cost_tie_break_with_unequal_prefixes() {
        // Both routes cost 5, but they diverge with unequal intermediate
        // g-costs: Z settles first at g=1, yet A-B-X is the
        // lexicographically smaller sequence and must win.
        let network = TestNetworkBuilder::new()
            .node("A")
            .node("B")
            .node("X")
            .node("Z")
            .segment("A-Z", "A", "Z", 1.0, 1.0)
            .segment("Z-X", "Z", "X", 4.0, 4.0)
            .segment("A-B", "A", "B", 4.0, 4.0)
            .segment("B-X", "B", "X", 1.0, 1.0)
            .build();
        let result = route(&network, "A", "X", 0.0).unwrap();
        assert_eq!(result.nodes, vec!["A", "B", "X"]);
        assert!(close(result.total_cost, 5.0));
    }

    #[test]
    fn test_heuristic_with_coordinates_stays_optimal() {
        // Nodes on a line; recorded distances exceed the straight-line
        // separation so the heuristic underestimates as required.
        let network = TestNetworkBuilder::new()
            .node_at("A", 52.00, 13.00)
            .node_at("B", 52.01, 13.00)
            .node_at("C", 52.02, 13.00)
            .segment("A-B", "A", "B", 2.0, 4.0)
            .segment("B-C", "B", "C", 2.0, 4.0)
            .segment_with("A-C", "A", "C", 4.0, 20.0, |s| s.risk_level = 0.1)
            .build();
        let result = route(&network, "A", "C", 0.0).unwrap();
        assert_eq!(result.nodes, vec!["A", "B", "C"]);
        assert!(close(result.total_cost, 8.0));
    }
}
