//! Test utilities for building road networks programmatically.
//!
//! A small builder so tests can construct networks without JSON files.
//! Segments default to fully permissive limits; customize individual
//! attributes through the closure variant.
//!
//! # Example
//!
//! ```rust
//! use convoy_planner::test_utils::TestNetworkBuilder;
//!
//! let network = TestNetworkBuilder::new()
//!     .node("A")
//!     .node("B")
//!     .segment("A-B", "A", "B", 10.0, 12.0)
//!     .build();
//!
//! assert_eq!(network.node_count(), 2);
//! assert_eq!(network.edge_count(), 1);
//! ```

use geo::Point;

use crate::convoy::ConvoyClass;
use crate::graph::{Node, RoadNetwork, Segment, TrafficLevel};

/// A segment no convoy could ever be rejected from: generous limits, all
/// classes allowed, no risk, no traffic, clear weather.
pub fn open_segment(id: &str) -> Segment {
    Segment {
        id: id.to_string(),
        distance_km: 1.0,
        base_time_min: 1.0,
        max_height_m: 9999.0,
        max_width_m: 9999.0,
        max_load_tons: 9999.0,
        allowed_classes: vec![ConvoyClass::Light, ConvoyClass::Medium, ConvoyClass::Heavy],
        blocked: false,
        risk_level: 0.0,
        traffic_level: TrafficLevel::Free,
        weather_severity: 0.0,
    }
}

struct PendingSegment {
    from: String,
    to: String,
    segment: Segment,
}

/// Builder for test road networks.
pub struct TestNetworkBuilder {
    nodes: Vec<Node>,
    segments: Vec<PendingSegment>,
}

impl TestNetworkBuilder {
    pub fn new() -> Self {
        TestNetworkBuilder {
            nodes: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Add a node without coordinates (heuristic degrades to zero).
    pub fn node(mut self, id: &str) -> Self {
        self.nodes.push(Node {
            id: id.to_string(),
            coord: None,
        });
        self
    }

    /// Add a node with coordinates, (lat, lon) order.
    pub fn node_at(mut self, id: &str, lat: f64, lon: f64) -> Self {
        self.nodes.push(Node {
            id: id.to_string(),
            coord: Some(Point::new(lon, lat)), // geo uses (x, y) = (lon, lat)
        });
        self
    }

    /// Add a directed segment with permissive limits.
    pub fn segment(
        self,
        id: &str,
        from: &str,
        to: &str,
        distance_km: f64,
        base_time_min: f64,
    ) -> Self {
        self.segment_with(id, from, to, distance_km, base_time_min, |_| {})
    }

    /// Add a directed segment, then let `customize` adjust its attributes.
    pub fn segment_with(
        mut self,
        id: &str,
        from: &str,
        to: &str,
        distance_km: f64,
        base_time_min: f64,
        customize: impl FnOnce(&mut Segment),
    ) -> Self {
        let mut segment = open_segment(id);
        segment.distance_km = distance_km;
        segment.base_time_min = base_time_min;
        customize(&mut segment);
        self.segments.push(PendingSegment {
            from: from.to_string(),
            to: to.to_string(),
            segment,
        });
        self
    }

    /// Build the road network.
    ///
    /// # Panics
    /// Panics on duplicate node ids or dangling segment endpoints; a test
    /// fixture with either is a bug in the test.
    pub fn build(self) -> RoadNetwork {
        let mut network = RoadNetwork::with_capacity(self.nodes.len(), self.segments.len());
        for node in self.nodes {
            let id = node.id.clone();
            network
                .add_node(node)
                .unwrap_or_else(|e| panic!("adding node {id}: {e}"));
        }
        for pending in self.segments {
            let id = pending.segment.id.clone();
            network
                .add_edge(&pending.from, &pending.to, pending.segment)
                .unwrap_or_else(|e| panic!("adding segment {id}: {e}"));
        }
        network
    }
}

impl Default for TestNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
