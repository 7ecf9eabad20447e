pub mod convoy;
pub mod graph;
pub mod loader;
pub mod planner;
pub mod priority;
pub mod routing;
pub mod rules;
pub mod test_utils;

pub use convoy::{Convoy, ConvoyClass, ImpactLevel, InvalidConvoyInput, MissionType, SpecialFlag, Urgency};
pub use graph::{NetworkError, Node, RoadNetwork, Segment, TrafficLevel};
pub use loader::{load_convoy, load_network, parse_convoy, parse_network, save_plan};
pub use planner::{plan, Plan, PlanError, RouteOutcome};
pub use priority::{score, PriorityScore};
pub use routing::{route, CostWeights, RouteError, RouteResult, SegmentCost};
pub use rules::{filter, FilterLogEntry, RejectionReason};
