//! Outbound notifications for the visualization and AI layers
//!
//! Components push notifications in the order they happen; consumers drain
//! them after each hit or tick. Nothing here is ever awaited.

use crate::critical::{CriticalEventType, EmergencyProtocol};
use crate::hull::HullThreshold;
use crate::shield::Quadrant;
use crate::types::{DamageType, ObjectHandle};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A single damage-model notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DamageNotification {
    /// Hull took damage
    HullDamaged {
        amount: f64,
        damage_type: DamageType,
        location: DVec3,
        integrity: f64,
    },
    /// Hull integrity crossed a threshold on the way down
    ThresholdCrossed {
        threshold: HullThreshold,
        integrity: f64,
    },
    CriticalEventTriggered {
        event_type: CriticalEventType,
        severity: f64,
        location: DVec3,
    },
    CriticalEventExpired {
        event_type: CriticalEventType,
        location: DVec3,
    },
    /// A critical event spawned a different event type
    CascadeTriggered {
        from: CriticalEventType,
        to: CriticalEventType,
        severity: f64,
    },
    EmergencyProtocolActivated {
        protocol: EmergencyProtocol,
        duration: f64,
    },
    ShieldAbsorbed {
        quadrant: Quadrant,
        amount: f64,
    },
    ShieldDepleted {
        quadrant: Quadrant,
    },
    ShieldRestored {
        quadrant: Quadrant,
    },
    /// Structural integrity of an armor zone changed
    StructuralIntegrity {
        zone: String,
        integrity: f64,
        location: DVec3,
    },
    ArmorPenetrated {
        zone: String,
        residual: f64,
        location: DVec3,
    },
    CriticalPenetration {
        zone: String,
        depth: f64,
        location: DVec3,
    },
    /// A hit was classified as anything better than normal
    CriticalHit {
        classification: crate::armor::HitClassification,
        multiplier: f64,
        location: DVec3,
    },
    CollisionImpact {
        other: ObjectHandle,
        damage: f64,
        location: DVec3,
        ramming: bool,
    },
    CatastrophicCountdownStarted {
        duration: f64,
    },
    ShipDestroyed {
        location: DVec3,
    },
}

impl DamageNotification {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            DamageNotification::HullDamaged { .. } => "hull_damaged",
            DamageNotification::ThresholdCrossed { .. } => "threshold_crossed",
            DamageNotification::CriticalEventTriggered { .. } => "critical_event_triggered",
            DamageNotification::CriticalEventExpired { .. } => "critical_event_expired",
            DamageNotification::CascadeTriggered { .. } => "cascade_triggered",
            DamageNotification::EmergencyProtocolActivated { .. } => "emergency_protocol_activated",
            DamageNotification::ShieldAbsorbed { .. } => "shield_absorbed",
            DamageNotification::ShieldDepleted { .. } => "shield_depleted",
            DamageNotification::ShieldRestored { .. } => "shield_restored",
            DamageNotification::StructuralIntegrity { .. } => "structural_integrity",
            DamageNotification::ArmorPenetrated { .. } => "armor_penetrated",
            DamageNotification::CriticalPenetration { .. } => "critical_penetration",
            DamageNotification::CriticalHit { .. } => "critical_hit",
            DamageNotification::CollisionImpact { .. } => "collision_impact",
            DamageNotification::CatastrophicCountdownStarted { .. } => "catastrophic_countdown_started",
            DamageNotification::ShipDestroyed { .. } => "ship_destroyed",
        }
    }
}

/// Ordered, fire-and-forget notification queue
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<DamageNotification>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a notification to the back of the queue
    pub fn push(&mut self, event: DamageNotification) {
        self.events.push(event);
    }

    /// Move every notification from another queue to the back of this one
    pub fn append(&mut self, other: &mut EventQueue) {
        self.events.append(&mut other.events);
    }

    /// Take all pending notifications, oldest first
    pub fn drain(&mut self) -> Vec<DamageNotification> {
        std::mem::take(&mut self.events)
    }

    pub fn peek(&self) -> &[DamageNotification] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Count pending notifications matching a predicate
    pub fn count_where(&self, predicate: impl Fn(&DamageNotification) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}
