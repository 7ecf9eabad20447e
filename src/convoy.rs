use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Weight class of a convoy; segments list the classes they admit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvoyClass {
    Light,
    Medium,
    Heavy,
}

/// Mission category. The priority weight of each category is a fixed
/// constant in [`crate::priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionType {
    Medical,
    Ammo,
    Fuel,
    TroopMove,
    Routine,
}

/// Urgency band, P1 highest. Doubles as the label derived from a
/// computed priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    P1,
    P2,
    P3,
}

/// Three-level indicator used for both the civil-impact zone and the
/// risk zone of a convoy's area of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

/// Special handling flags. Serialized with the legacy wire names so
/// existing convoy records keep decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialFlag {
    #[serde(rename = "medical")]
    Medical,
    #[serde(rename = "VIP")]
    Vip,
    #[serde(rename = "training")]
    Training,
    #[serde(rename = "no-night")]
    NoNight,
}

#[derive(Error, Debug)]
pub enum InvalidConvoyInput {
    #[error("convoy {field} must be a positive finite number, got {value}")]
    NonPositiveDimension { field: &'static str, value: f64 },
}

/// A convoy and its mission attributes. Immutable for the duration of a
/// planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Convoy {
    #[serde(rename = "convoy_id")]
    pub id: String,
    #[serde(rename = "mission_type")]
    pub mission: MissionType,
    pub urgency: Urgency,
    pub civil_impact: ImpactLevel,
    pub risk_zone: ImpactLevel,
    #[serde(default)]
    pub special_flags: Vec<SpecialFlag>,
    pub height_m: f64,
    pub width_m: f64,
    pub weight_tons: f64,
    #[serde(rename = "convoy_class")]
    pub class: ConvoyClass,
}

impl Convoy {
    /// Reject out-of-range physical attributes before any scoring or
    /// filtering runs. Unknown enum values never get this far; they fail
    /// at decode time.
    pub fn validate(&self) -> Result<(), InvalidConvoyInput> {
        for (field, value) in [
            ("height_m", self.height_m),
            ("width_m", self.width_m),
            ("weight_tons", self.weight_tons),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(InvalidConvoyInput::NonPositiveDimension { field, value });
            }
        }
        Ok(())
    }

    pub fn has_flag(&self, flag: SpecialFlag) -> bool {
        self.special_flags.contains(&flag)
    }
}
