//! Planner orchestrator: score -> filter -> route, in fixed sequence.
//!
//! An unreachable destination is a first-class outcome, not an error: the
//! caller still gets the filter log and a summary explaining why no route
//! exists. Only malformed convoys and unknown nodes propagate as errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convoy::{Convoy, InvalidConvoyInput};
use crate::graph::RoadNetwork;
use crate::priority::{self, PriorityScore};
use crate::routing::{self, RouteError, RouteResult};
use crate::rules::{self, FilterLogEntry};

#[derive(Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    InvalidConvoy(#[from] InvalidConvoyInput),

    #[error("node {0} is not in the road network")]
    UnknownNode(String),
}

/// Outcome of the routing stage. `NotFound` is a normal result carrying
/// an explanation, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteOutcome {
    Found(RouteResult),
    NotFound { reason: String },
}

impl RouteOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, RouteOutcome::Found(_))
    }
}

/// The aggregate returned across the system boundary: priority score,
/// filter log, route (or failure marker), and a human-readable summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub convoy_id: String,
    pub priority: PriorityScore,
    pub filter_log: Vec<FilterLogEntry>,
    pub outcome: RouteOutcome,
    pub summary: String,
}

/// Plan a route for one convoy.
///
/// Reentrant and side-effect-free with respect to `network`: the base
/// graph is only read, and every intermediate artifact is freshly
/// allocated for this request.
pub fn plan(
    network: &RoadNetwork,
    convoy: &Convoy,
    origin: &str,
    destination: &str,
) -> Result<Plan, PlanError> {
    convoy.validate()?;

    // Validate endpoints against the base network up front, so a typo in
    // the request can never masquerade as "no viable route".
    for node in [origin, destination] {
        if network.node_index(node).is_none() {
            return Err(PlanError::UnknownNode(node.to_string()));
        }
    }

    let priority = priority::score(convoy);
    let (filtered, filter_log) = rules::filter(network, convoy);
    tracing::debug!(
        convoy = %convoy.id,
        score = priority.score,
        kept = filtered.edge_count(),
        rejected = filter_log.len(),
        "filtered network for convoy"
    );

    let outcome = match routing::route(&filtered, origin, destination, priority.allowance_min) {
        Ok(result) => RouteOutcome::Found(result),
        Err(err @ RouteError::NoPath { .. }) => RouteOutcome::NotFound {
            reason: err.to_string(),
        },
        // Filtering keeps every node, so this only fires if the caller
        // routed against some other graph; treat it as the hard error it is.
        Err(RouteError::UnknownNode(node)) => return Err(PlanError::UnknownNode(node)),
    };

    let summary = render_summary(convoy, origin, destination, &priority, &filter_log, &outcome);
    tracing::info!(convoy = %convoy.id, found = outcome.is_found(), "plan computed");

    Ok(Plan {
        convoy_id: convoy.id.clone(),
        priority,
        filter_log,
        outcome,
        summary,
    })
}

fn render_summary(
    convoy: &Convoy,
    origin: &str,
    destination: &str,
    priority: &PriorityScore,
    filter_log: &[FilterLogEntry],
    outcome: &RouteOutcome,
) -> String {
    match outcome {
        RouteOutcome::Found(result) => format!(
            "convoy {} ({:?}, priority {} {:?}): route {} -> {} via {} nodes, eta {:.1} min, risk {:.1}, {} segments excluded",
            convoy.id,
            convoy.mission,
            priority.score,
            priority.label,
            origin,
            destination,
            result.nodes.len(),
            result.eta_min,
            result.total_risk,
            filter_log.len(),
        ),
        RouteOutcome::NotFound { reason } => format!(
            "convoy {} ({:?}, priority {} {:?}): no viable route {} -> {} ({}); {} segments excluded by hard rules",
            convoy.id,
            convoy.mission,
            priority.score,
            priority.label,
            origin,
            destination,
            reason,
            filter_log.len(),
        ),
    }
}
