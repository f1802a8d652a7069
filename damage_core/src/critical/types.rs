//! Critical event types and their fixed configuration table

use super::protocols::EmergencyProtocol;
use serde::{Deserialize, Serialize};

/// A time-bounded structural failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalEventType {
    HullBreach,
    EngineFire,
    PowerCoreOverload,
    ElectricalFailure,
    LifeSupportFailure,
    FuelLeak,
    StructuralCollapse,
    ControlSystemFailure,
}

/// Lasting effect an event has on the ship while active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum SpecialEffect {
    /// Immediate loss of this fraction of max hull (scaled by severity)
    StructuralLoss(f64),
    ThrustLoss(f64),
    PowerLoss(f64),
    ControlLoss(f64),
}

/// Per-type event parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalEventConfig {
    /// Seconds the event stays active
    pub duration: f64,
    /// Hull damage per second at severity 1.0
    pub damage_rate: f64,
    /// Chance to spread on each spread interval
    pub spread_chance: f64,
    pub effect: SpecialEffect,
    /// Radius of the immediate explosion (0 = none)
    pub blast_radius: f64,
}

impl CriticalEventType {
    pub fn all() -> &'static [CriticalEventType] {
        &[
            CriticalEventType::HullBreach,
            CriticalEventType::EngineFire,
            CriticalEventType::PowerCoreOverload,
            CriticalEventType::ElectricalFailure,
            CriticalEventType::LifeSupportFailure,
            CriticalEventType::FuelLeak,
            CriticalEventType::StructuralCollapse,
            CriticalEventType::ControlSystemFailure,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            CriticalEventType::HullBreach => "hull_breach",
            CriticalEventType::EngineFire => "engine_fire",
            CriticalEventType::PowerCoreOverload => "power_core_overload",
            CriticalEventType::ElectricalFailure => "electrical_failure",
            CriticalEventType::LifeSupportFailure => "life_support_failure",
            CriticalEventType::FuelLeak => "fuel_leak",
            CriticalEventType::StructuralCollapse => "structural_collapse",
            CriticalEventType::ControlSystemFailure => "control_system_failure",
        }
    }

    pub fn config(self) -> CriticalEventConfig {
        let (duration, damage_rate, spread_chance, effect, blast_radius) = match self {
            CriticalEventType::HullBreach => (20.0, 2.0, 0.15, SpecialEffect::StructuralLoss(0.05), 0.0),
            CriticalEventType::EngineFire => (15.0, 3.0, 0.30, SpecialEffect::ThrustLoss(0.3), 0.0),
            CriticalEventType::PowerCoreOverload => (10.0, 5.0, 0.10, SpecialEffect::PowerLoss(0.5), 8.0),
            CriticalEventType::ElectricalFailure => (12.0, 1.0, 0.25, SpecialEffect::PowerLoss(0.25), 0.0),
            CriticalEventType::LifeSupportFailure => (30.0, 0.5, 0.05, SpecialEffect::ControlLoss(0.2), 0.0),
            CriticalEventType::FuelLeak => (25.0, 1.5, 0.20, SpecialEffect::ThrustLoss(0.15), 0.0),
            CriticalEventType::StructuralCollapse => (8.0, 8.0, 0.10, SpecialEffect::StructuralLoss(0.10), 0.0),
            CriticalEventType::ControlSystemFailure => (15.0, 1.0, 0.15, SpecialEffect::ControlLoss(0.4), 0.0),
        };

        CriticalEventConfig {
            duration,
            damage_rate,
            spread_chance,
            effect,
            blast_radius,
        }
    }

    /// Event types this one can cascade into
    pub fn cascade_targets(self) -> &'static [CriticalEventType] {
        match self {
            CriticalEventType::PowerCoreOverload => &[
                CriticalEventType::ElectricalFailure,
                CriticalEventType::LifeSupportFailure,
            ],
            CriticalEventType::EngineFire => &[CriticalEventType::FuelLeak],
            CriticalEventType::FuelLeak => &[CriticalEventType::EngineFire],
            CriticalEventType::HullBreach => &[
                CriticalEventType::LifeSupportFailure,
                CriticalEventType::StructuralCollapse,
            ],
            CriticalEventType::ElectricalFailure => &[CriticalEventType::ControlSystemFailure],
            CriticalEventType::StructuralCollapse => &[CriticalEventType::HullBreach],
            CriticalEventType::LifeSupportFailure | CriticalEventType::ControlSystemFailure => &[],
        }
    }

    /// Emergency protocol that responds to this event type
    pub fn protocol(self) -> EmergencyProtocol {
        match self {
            CriticalEventType::EngineFire | CriticalEventType::FuelLeak => EmergencyProtocol::FireSuppression,
            CriticalEventType::PowerCoreOverload | CriticalEventType::ElectricalFailure => {
                EmergencyProtocol::EmergencyPower
            }
            CriticalEventType::HullBreach | CriticalEventType::StructuralCollapse => EmergencyProtocol::DamageControl,
            CriticalEventType::ControlSystemFailure | CriticalEventType::LifeSupportFailure => {
                EmergencyProtocol::EmergencyShutdown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_core_config() {
        let config = CriticalEventType::PowerCoreOverload.config();
        assert!((config.duration - 10.0).abs() < f64::EPSILON);
        assert!((config.damage_rate - 5.0).abs() < f64::EPSILON);
        assert!((config.blast_radius - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.effect, SpecialEffect::PowerLoss(0.5));
    }

    #[test]
    fn test_cascade_graph() {
        assert_eq!(
            CriticalEventType::PowerCoreOverload.cascade_targets(),
            &[CriticalEventType::ElectricalFailure, CriticalEventType::LifeSupportFailure]
        );
        assert!(CriticalEventType::ControlSystemFailure.cascade_targets().is_empty());
        // Fire and fuel feed each other
        assert!(CriticalEventType::FuelLeak.cascade_targets().contains(&CriticalEventType::EngineFire));
    }

    #[test]
    fn test_every_type_has_a_protocol() {
        for event_type in CriticalEventType::all() {
            assert!(event_type.protocol().handles(*event_type));
        }
    }

    #[test]
    fn test_serialization_names() {
        for event_type in CriticalEventType::all() {
            let json = serde_json::to_string(event_type).unwrap();
            assert_eq!(json, format!("\"{}\"", event_type.name()));
        }
    }
}
