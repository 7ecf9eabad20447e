use geo::Point;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::convoy::ConvoyClass;

/// Congestion band reported for a road segment. The minutes-equivalent
/// penalty for each band lives in [`crate::rules`] with the rest of the
/// tuning constants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficLevel {
    #[default]
    Free,
    Moderate,
    Heavy,
}

/// A node in the road network (junction, depot, or checkpoint).
///
/// Coordinates are optional: synthetic planning graphs often carry none, in
/// which case the routing heuristic degrades to uniform-cost search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub coord: Option<Point<f64>>,
}

/// A directed road segment with its physical and operational limits.
///
/// All attributes are immutable once the network is built; per-convoy
/// admissibility is decided by the filtering rules, never by mutating
/// the segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub distance_km: f64,
    pub base_time_min: f64,
    pub max_height_m: f64,
    pub max_width_m: f64,
    pub max_load_tons: f64,
    pub allowed_classes: Vec<ConvoyClass>,
    pub blocked: bool,
    /// Risk estimate in 0..=1 (0 = benign).
    pub risk_level: f64,
    pub traffic_level: TrafficLevel,
    /// Weather severity in 0..=1; feeds the hard penalty ceiling.
    pub weather_severity: f64,
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("segment {segment} references unknown node {node}")]
    UnknownEndpoint { segment: String, node: String },

    #[error("duplicate node id {0}")]
    DuplicateNode(String),
}

/// The road network graph.
///
/// The base network is loaded once and shared read-only across planning
/// requests; per-request filtered copies are built by [`crate::rules::filter`].
#[derive(Debug)]
pub struct RoadNetwork {
    pub graph: DiGraph<Node, Segment>,
    node_id_to_index: HashMap<String, NodeIndex>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        RoadNetwork {
            graph: DiGraph::new(),
            node_id_to_index: HashMap::new(),
        }
    }

    /// Create a new network with pre-allocated capacity.
    pub fn with_capacity(node_hint: usize, edge_hint: usize) -> Self {
        RoadNetwork {
            graph: DiGraph::with_capacity(node_hint, edge_hint),
            node_id_to_index: HashMap::with_capacity(node_hint),
        }
    }

    /// Add a node to the network. Node ids must be unique.
    pub fn add_node(&mut self, node: Node) -> Result<NodeIndex, NetworkError> {
        if self.node_id_to_index.contains_key(&node.id) {
            return Err(NetworkError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_id_to_index.insert(id, idx);
        Ok(idx)
    }

    /// Add a directed segment between two existing nodes.
    ///
    /// Dangling endpoints are a hard error so malformed network data is
    /// rejected at load time instead of silently dropping edges.
    pub fn add_edge(
        &mut self,
        from_node: &str,
        to_node: &str,
        segment: Segment,
    ) -> Result<EdgeIndex, NetworkError> {
        let from_idx = self
            .node_index(from_node)
            .ok_or_else(|| NetworkError::UnknownEndpoint {
                segment: segment.id.clone(),
                node: from_node.to_string(),
            })?;
        let to_idx = self
            .node_index(to_node)
            .ok_or_else(|| NetworkError::UnknownEndpoint {
                segment: segment.id.clone(),
                node: to_node.to_string(),
            })?;
        Ok(self.graph.add_edge(from_idx, to_idx, segment))
    }

    /// Look up a node index by id
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_id_to_index.get(id).copied()
    }

    /// Get node by index
    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    /// Get segment by edge index
    pub fn segment(&self, idx: EdgeIndex) -> Option<&Segment> {
        self.graph.edge_weight(idx)
    }

    /// Node ids of an edge's endpoints, (source, target).
    pub fn endpoints(&self, idx: EdgeIndex) -> Option<(&str, &str)> {
        let (s, t) = self.graph.edge_endpoints(idx)?;
        Some((
            self.graph.node_weight(s)?.id.as_str(),
            self.graph.node_weight(t)?.id.as_str(),
        ))
    }

    /// Node indices in ascending node-id order.
    ///
    /// Used wherever iteration order must be independent of insertion or
    /// hash-map internals.
    pub fn sorted_node_indices(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id));
        indices
    }

    /// Edge indices in ascending (source id, target id, segment id) order.
    ///
    /// This is the stable iteration order for filtering, so the filtered
    /// graph and the filter log come out identical across runs regardless
    /// of hash-map internals.
    pub fn sorted_edge_indices(&self) -> Vec<EdgeIndex> {
        let mut indices: Vec<EdgeIndex> = self.graph.edge_references().map(|e| e.id()).collect();
        indices.sort_by(|a, b| {
            let (sa, ta) = self.endpoints(*a).expect("edge endpoints exist");
            let (sb, tb) = self.endpoints(*b).expect("edge endpoints exist");
            let ia = &self.graph[*a].id;
            let ib = &self.graph[*b].id;
            (sa, ta, ia).cmp(&(sb, tb, ib))
        });
        indices
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for RoadNetwork {
    fn default() -> Self {
        Self::new()
    }
}
