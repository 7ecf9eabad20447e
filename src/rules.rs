//! Rule-based edge filtering: prune segments a convoy cannot use and log
//! exactly one reason per rejected segment.
//!
//! The hard rules are an ordered list of independent predicates evaluated
//! short-circuit, in a fixed documented order. Soft penalties (traffic,
//! risk) live here too so filtering and routing share one set of tuning
//! constants, mirroring the original rules table.

use serde::{Deserialize, Serialize};

use crate::convoy::Convoy;
use crate::graph::{RoadNetwork, Segment, TrafficLevel};

/// Minutes-equivalent penalty multiplier applied to a segment's risk level.
pub const RISK_PENALTY_FACTOR: f64 = 20.0;

/// Minutes-equivalent penalty multiplier applied to weather severity.
pub const WEATHER_PENALTY_FACTOR: f64 = 10.0;

/// Hard ceiling on the combined traffic+weather penalty, in minutes.
/// Segments above it are rejected outright; below it the penalty is only
/// a soft routing cost.
pub const HARD_PENALTY_CEILING_MIN: f64 = 20.0;

/// Minutes-equivalent penalty for a segment's congestion band.
pub fn traffic_penalty_min(level: TrafficLevel) -> f64 {
    match level {
        TrafficLevel::Free => 0.0,
        TrafficLevel::Moderate => 5.0,
        TrafficLevel::Heavy => 15.0,
    }
}

/// Minutes-equivalent penalty for a segment's risk level (0 when benign).
pub fn risk_penalty_min(segment: &Segment) -> f64 {
    segment.risk_level * RISK_PENALTY_FACTOR
}

/// Minutes-equivalent penalty for a segment's weather severity.
pub fn weather_penalty_min(segment: &Segment) -> f64 {
    segment.weather_severity * WEATHER_PENALTY_FACTOR
}

/// Why a segment was excluded from a convoy's working graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    HeightClearance,
    WidthClearance,
    LoadCapacityExceeded,
    ClassNotAllowed,
    BlockedSegment,
    PenaltyCeilingExceeded,
}

impl RejectionReason {
    /// Stable machine-readable code, also the serialized form.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::HeightClearance => "height_clearance",
            RejectionReason::WidthClearance => "width_clearance",
            RejectionReason::LoadCapacityExceeded => "load_capacity_exceeded",
            RejectionReason::ClassNotAllowed => "class_not_allowed",
            RejectionReason::BlockedSegment => "blocked_segment",
            RejectionReason::PenaltyCeilingExceeded => "penalty_ceiling_exceeded",
        }
    }
}

/// One excluded segment with its cause. The filter log is append-only and
/// ordered by the stable edge iteration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterLogEntry {
    pub segment_id: String,
    pub from: String,
    pub to: String,
    pub reason: RejectionReason,
    pub detail: String,
}

struct HardRule {
    reason: RejectionReason,
    violates: fn(&Convoy, &Segment) -> bool,
    detail: fn(&Convoy, &Segment) -> String,
}

/// The fixed rule chain. Order matters: the first violated rule is the one
/// logged, so a segment failing several rules still gets exactly one entry.
static HARD_RULES: [HardRule; 6] = [
    HardRule {
        reason: RejectionReason::HeightClearance,
        violates: |c, s| c.height_m > s.max_height_m,
        detail: |c, s| {
            format!(
                "convoy height {:.2}m exceeds clearance {:.2}m",
                c.height_m, s.max_height_m
            )
        },
    },
    HardRule {
        reason: RejectionReason::WidthClearance,
        violates: |c, s| c.width_m > s.max_width_m,
        detail: |c, s| {
            format!(
                "convoy width {:.2}m exceeds clearance {:.2}m",
                c.width_m, s.max_width_m
            )
        },
    },
    HardRule {
        reason: RejectionReason::LoadCapacityExceeded,
        violates: |c, s| c.weight_tons > s.max_load_tons,
        detail: |c, s| {
            format!(
                "convoy weight {:.1}t exceeds load capacity {:.1}t",
                c.weight_tons, s.max_load_tons
            )
        },
    },
    HardRule {
        reason: RejectionReason::ClassNotAllowed,
        violates: |c, s| !s.allowed_classes.contains(&c.class),
        detail: |c, s| {
            format!(
                "convoy class {:?} not in allowed set {:?}",
                c.class, s.allowed_classes
            )
        },
    },
    HardRule {
        reason: RejectionReason::BlockedSegment,
        violates: |_, s| s.blocked,
        detail: |_, _| "segment is marked blocked".to_string(),
    },
    HardRule {
        reason: RejectionReason::PenaltyCeilingExceeded,
        violates: |_, s| {
            traffic_penalty_min(s.traffic_level) + weather_penalty_min(s) > HARD_PENALTY_CEILING_MIN
        },
        detail: |_, s| {
            format!(
                "traffic+weather penalty {:.1} min exceeds ceiling {:.1} min",
                traffic_penalty_min(s.traffic_level) + weather_penalty_min(s),
                HARD_PENALTY_CEILING_MIN
            )
        },
    },
];

/// First rule a segment violates for this convoy, if any.
fn first_violation(convoy: &Convoy, segment: &Segment) -> Option<&'static HardRule> {
    HARD_RULES.iter().find(|rule| (rule.violates)(convoy, segment))
}

/// Build the convoy's working graph: every node of the base network, plus
/// the segments that pass all hard rules, copied unchanged.
///
/// The base network is never mutated; the returned graph is owned by the
/// current planning request. Edges are visited in ascending
/// (source, target, segment id) order so the output is deterministic for
/// identical inputs.
pub fn filter(network: &RoadNetwork, convoy: &Convoy) -> (RoadNetwork, Vec<FilterLogEntry>) {
    let mut filtered = RoadNetwork::with_capacity(network.node_count(), network.edge_count());
    for idx in network.sorted_node_indices() {
        let node = network.node(idx).expect("node index from this network");
        filtered
            .add_node(node.clone())
            .expect("base network node ids are unique");
    }

    let mut log = Vec::new();
    for edge_idx in network.sorted_edge_indices() {
        let segment = network.segment(edge_idx).expect("edge index from this network");
        let (from, to) = network.endpoints(edge_idx).expect("edge endpoints exist");

        match first_violation(convoy, segment) {
            Some(rule) => log.push(FilterLogEntry {
                segment_id: segment.id.clone(),
                from: from.to_string(),
                to: to.to_string(),
                reason: rule.reason,
                detail: format!("{}: {}", rule.reason.code(), (rule.detail)(convoy, segment)),
            }),
            None => {
                filtered
                    .add_edge(from, to, segment.clone())
                    .expect("all nodes were copied into the filtered network");
            }
        }
    }

    (filtered, log)
}
