//! JSON boundary: decode road networks and convoys from their on-disk
//! records, and write plans back out.
//!
//! The record layout matches the project's existing artifacts: a graph
//! file with `nodes` and `segments` arrays, and a convoy file with the
//! legacy field names. Segment records are undirected; the loader
//! materializes one directed edge per direction (reverse ids get a
//! `_rev` suffix) unless a record is marked `oneway`.

use ahash::AHashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::Point;
use serde::{Deserialize, Serialize};

use crate::convoy::{Convoy, ConvoyClass};
use crate::graph::{Node, RoadNetwork, Segment, TrafficLevel};
use crate::planner::Plan;

/// On-disk form of a road network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkFile {
    pub nodes: Vec<NodeRecord>,
    pub segments: Vec<SegmentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// One undirected road segment record. Limit fields default to values
/// permissive enough to never trip a rule, matching how the original
/// data treated absent limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub segment_id: String,
    pub from_node: String,
    pub to_node: String,
    pub distance_km: f64,
    pub base_time_min: f64,
    #[serde(default = "default_max_height_m")]
    pub max_height_m: f64,
    #[serde(default = "default_max_width_m")]
    pub max_width_m: f64,
    #[serde(default = "default_max_load_tons")]
    pub max_load_tons: f64,
    #[serde(default = "default_allowed_classes")]
    pub allowed_classes: Vec<ConvoyClass>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub risk_level: f64,
    #[serde(default)]
    pub traffic_level: TrafficLevel,
    #[serde(default)]
    pub weather_severity: f64,
    #[serde(default)]
    pub oneway: bool,
}

fn default_max_height_m() -> f64 {
    9999.0
}

fn default_max_width_m() -> f64 {
    9999.0
}

fn default_max_load_tons() -> f64 {
    9999.0
}

fn default_allowed_classes() -> Vec<ConvoyClass> {
    vec![ConvoyClass::Light, ConvoyClass::Medium, ConvoyClass::Heavy]
}

impl SegmentRecord {
    fn to_segment(&self, id: String) -> Segment {
        Segment {
            id,
            distance_km: self.distance_km,
            base_time_min: self.base_time_min,
            max_height_m: self.max_height_m,
            max_width_m: self.max_width_m,
            max_load_tons: self.max_load_tons,
            allowed_classes: self.allowed_classes.clone(),
            blocked: self.is_blocked,
            risk_level: self.risk_level,
            traffic_level: self.traffic_level,
            weather_severity: self.weather_severity,
        }
    }
}

/// Build a [`RoadNetwork`] from decoded records.
///
/// Fails loudly on dangling segment endpoints or duplicate ids; a
/// malformed network file must never silently lose edges.
pub fn network_from_records(file: &NetworkFile) -> Result<RoadNetwork> {
    let mut network = RoadNetwork::with_capacity(file.nodes.len(), file.segments.len() * 2);

    for record in &file.nodes {
        let coord = match (record.lon, record.lat) {
            (Some(lon), Some(lat)) => Some(Point::new(lon, lat)),
            (None, None) => None,
            _ => bail!("node {} has only one of lat/lon", record.node_id),
        };
        network
            .add_node(Node {
                id: record.node_id.clone(),
                coord,
            })
            .with_context(|| format!("adding node {}", record.node_id))?;
    }

    let mut seen_segments: AHashSet<&str> = AHashSet::with_capacity(file.segments.len());
    for record in &file.segments {
        if !seen_segments.insert(record.segment_id.as_str()) {
            bail!("duplicate segment id {}", record.segment_id);
        }

        network
            .add_edge(
                &record.from_node,
                &record.to_node,
                record.to_segment(record.segment_id.clone()),
            )
            .with_context(|| format!("adding segment {}", record.segment_id))?;

        if !record.oneway {
            network
                .add_edge(
                    &record.to_node,
                    &record.from_node,
                    record.to_segment(format!("{}_rev", record.segment_id)),
                )
                .with_context(|| format!("adding reverse of segment {}", record.segment_id))?;
        }
    }

    tracing::debug!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        "road network built"
    );
    Ok(network)
}

/// Parse a road network from a JSON string.
pub fn parse_network(json: &str) -> Result<RoadNetwork> {
    let file: NetworkFile = serde_json::from_str(json).context("decoding network JSON")?;
    network_from_records(&file)
}

/// Load a road network from a JSON file.
pub fn load_network(path: &Path) -> Result<RoadNetwork> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading network file {}", path.display()))?;
    parse_network(&json)
}

/// Parse a convoy from a JSON string.
pub fn parse_convoy(json: &str) -> Result<Convoy> {
    serde_json::from_str(json).context("decoding convoy JSON")
}

/// Load a convoy from a JSON file.
pub fn load_convoy(path: &Path) -> Result<Convoy> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading convoy file {}", path.display()))?;
    parse_convoy(&json)
}

/// Write a plan to a JSON file.
pub fn save_plan(path: &Path, plan: &Plan) -> Result<()> {
    let json = serde_json::to_string_pretty(plan).context("encoding plan JSON")?;
    fs::write(path, json).with_context(|| format!("writing plan file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner;

    const GRAPH_JSON: &str = r#"{
        "nodes": [
            {"node_id": "A", "lat": 52.0, "lon": 13.0},
            {"node_id": "B", "lat": 52.01, "lon": 13.0},
            {"node_id": "C"}
        ],
        "segments": [
            {"segment_id": "A-B", "from_node": "A", "to_node": "B",
             "distance_km": 2.0, "base_time_min": 4.0,
             "max_height_m": 4.5, "max_load_tons": 30.0},
            {"segment_id": "B-C", "from_node": "B", "to_node": "C",
             "distance_km": 3.0, "base_time_min": 5.0, "oneway": true}
        ]
    }"#;

    const CONVOY_JSON: &str = r#"{
        "convoy_id": "CVY-L",
        "mission_type": "Fuel",
        "urgency": "P2",
        "civil_impact": "Low",
        "risk_zone": "Medium",
        "special_flags": [],
        "height_m": 3.1,
        "width_m": 2.4,
        "weight_tons": 12.0,
        "convoy_class": "Medium"
    }"#;

    #[test]
    fn test_parse_network_materializes_directions() {
        let network = parse_network(GRAPH_JSON).unwrap();
        assert_eq!(network.node_count(), 3);
        // A-B becomes two edges, oneway B-C stays single.
        assert_eq!(network.edge_count(), 3);

        let ids: Vec<String> = network
            .sorted_edge_indices()
            .iter()
            .map(|&e| network.segment(e).unwrap().id.clone())
            .collect();
        // Sorted by (source, target, id): A-B_rev keys as (B, A).
        assert_eq!(ids, vec!["A-B", "A-B_rev", "B-C"]);
    }

    #[test]
    fn test_limit_defaults_are_permissive() {
        let network = parse_network(GRAPH_JSON).unwrap();
        let idx = network.sorted_edge_indices()[2]; // B-C
        let seg = network.segment(idx).unwrap();
        assert_eq!(seg.id, "B-C");
        assert_eq!(seg.max_height_m, default_max_height_m());
        assert_eq!(seg.allowed_classes.len(), 3);
        assert!(!seg.blocked);
    }

    #[test]
    fn test_dangling_endpoint_fails_loudly() {
        let json = r#"{
            "nodes": [{"node_id": "A"}],
            "segments": [
                {"segment_id": "A-X", "from_node": "A", "to_node": "X",
                 "distance_km": 1.0, "base_time_min": 1.0}
            ]
        }"#;
        let err = parse_network(json).unwrap_err();
        assert!(format!("{err:#}").contains("unknown node X"));
    }

    #[test]
    fn test_duplicate_segment_id_rejected() {
        let json = r#"{
            "nodes": [{"node_id": "A"}, {"node_id": "B"}],
            "segments": [
                {"segment_id": "S", "from_node": "A", "to_node": "B",
                 "distance_km": 1.0, "base_time_min": 1.0},
                {"segment_id": "S", "from_node": "B", "to_node": "A",
                 "distance_km": 1.0, "base_time_min": 1.0}
            ]
        }"#;
        assert!(parse_network(json).is_err());
    }

    #[test]
    fn test_half_specified_coordinates_rejected() {
        let json = r#"{
            "nodes": [{"node_id": "A", "lat": 52.0}],
            "segments": []
        }"#;
        assert!(parse_network(json).is_err());
    }

    #[test]
    fn test_round_trip_reproduces_identical_plan() {
        let network = parse_network(GRAPH_JSON).unwrap();
        let convoy = parse_convoy(CONVOY_JSON).unwrap();
        let plan1 = planner::plan(&network, &convoy, "A", "C").unwrap();

        // Re-encode both inputs and plan again from the decoded copies.
        let file: NetworkFile = serde_json::from_str(GRAPH_JSON).unwrap();
        let network2 = network_from_records(
            &serde_json::from_str(&serde_json::to_string(&file).unwrap()).unwrap(),
        )
        .unwrap();
        let convoy2 = parse_convoy(&serde_json::to_string(&convoy).unwrap()).unwrap();
        let plan2 = planner::plan(&network2, &convoy2, "A", "C").unwrap();

        assert_eq!(
            serde_json::to_string(&plan1).unwrap(),
            serde_json::to_string(&plan2).unwrap()
        );
    }

    #[test]
    fn test_save_plan_writes_file() {
        let network = parse_network(GRAPH_JSON).unwrap();
        let convoy = parse_convoy(CONVOY_JSON).unwrap();
        let plan = planner::plan(&network, &convoy, "A", "C").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan_CVY-L.json");
        save_plan(&path, &plan).unwrap();

        let loaded: Plan = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, plan);
    }
}
