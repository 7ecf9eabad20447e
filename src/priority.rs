//! Priority scoring: convoy attributes -> scalar score and risk allowance.
//!
//! The score is a weighted sum of independently normalized sub-scores.
//! All weights are fixed named constants carried over from the project's
//! tuning tables; change them here, not at call sites.

use serde::{Deserialize, Serialize};

use crate::convoy::{Convoy, ImpactLevel, MissionType, SpecialFlag, Urgency};

/// Weight of the urgency sub-score.
pub const W_URGENCY: f64 = 0.5;
/// Weight of the mission-type sub-score.
pub const W_MISSION: f64 = 0.2;
/// Weight of the risk-zone sub-score.
pub const W_RISK: f64 = 0.2;
/// Weight of the civil-impact sub-score. Subtracts: operating through a
/// sensitive civil zone lowers priority rather than raising it.
pub const W_CIVIL: f64 = 0.1;

/// Minutes of routing-cost discount granted to a score of 100.
/// The per-edge allowance scales linearly below that.
pub const ALLOWANCE_FACTOR_MIN: f64 = 8.0;

fn urgency_weight(urgency: Urgency) -> f64 {
    match urgency {
        Urgency::P1 => 100.0,
        Urgency::P2 => 70.0,
        Urgency::P3 => 40.0,
    }
}

fn mission_weight(mission: MissionType) -> f64 {
    match mission {
        MissionType::Medical => 40.0,
        MissionType::Ammo => 35.0,
        MissionType::Fuel => 30.0,
        MissionType::TroopMove => 25.0,
        MissionType::Routine => 10.0,
    }
}

fn zone_weight(level: ImpactLevel) -> f64 {
    match level {
        ImpactLevel::High => 30.0,
        ImpactLevel::Medium => 20.0,
        ImpactLevel::Low => 10.0,
    }
}

fn flag_weight(flag: SpecialFlag) -> f64 {
    match flag {
        SpecialFlag::Medical => 30.0,
        SpecialFlag::Vip => 20.0,
        SpecialFlag::Training => -10.0,
        SpecialFlag::NoNight => 0.0,
    }
}

/// Raw sub-scores kept alongside the final score so a plan can explain
/// where the number came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub urgency: f64,
    pub mission: f64,
    pub risk_zone: f64,
    pub civil_impact: f64,
    pub flags: f64,
    pub raw: f64,
}

/// Derived priority of one convoy. Computed once per planning request and
/// never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    /// Rounded and clamped to 0..=100.
    pub score: u32,
    /// Priority band: P1 for 80+, P2 for 50+, P3 below.
    pub label: Urgency,
    pub components: ScoreComponents,
    /// Per-edge routing-cost discount in minutes, monotonic in `score`.
    pub allowance_min: f64,
}

/// Score a convoy. Pure and total: a convoy that passed
/// [`Convoy::validate`] always scores.
pub fn score(convoy: &Convoy) -> PriorityScore {
    let urgency = urgency_weight(convoy.urgency);
    let mission = mission_weight(convoy.mission);
    let risk_zone = zone_weight(convoy.risk_zone);
    let civil_impact = zone_weight(convoy.civil_impact);
    let flags: f64 = convoy.special_flags.iter().map(|&f| flag_weight(f)).sum();

    let raw = W_URGENCY * urgency + W_MISSION * mission + W_RISK * risk_zone
        - W_CIVIL * civil_impact
        + flags;
    let score = raw.round().clamp(0.0, 100.0) as u32;

    let label = if score >= 80 {
        Urgency::P1
    } else if score >= 50 {
        Urgency::P2
    } else {
        Urgency::P3
    };

    let allowance_min =
        (f64::from(score) / 100.0 * ALLOWANCE_FACTOR_MIN).clamp(0.0, ALLOWANCE_FACTOR_MIN);

    PriorityScore {
        score,
        label,
        components: ScoreComponents {
            urgency,
            mission,
            risk_zone,
            civil_impact,
            flags,
            raw,
        },
        allowance_min,
    }
}
