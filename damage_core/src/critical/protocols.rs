//! Emergency protocols - crew responses that damp matching critical events

use super::types::CriticalEventType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyProtocol {
    FireSuppression,
    EmergencyPower,
    DamageControl,
    EmergencyShutdown,
}

impl EmergencyProtocol {
    pub fn all() -> &'static [EmergencyProtocol] {
        &[
            EmergencyProtocol::FireSuppression,
            EmergencyProtocol::EmergencyPower,
            EmergencyProtocol::DamageControl,
            EmergencyProtocol::EmergencyShutdown,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            EmergencyProtocol::FireSuppression => 0,
            EmergencyProtocol::EmergencyPower => 1,
            EmergencyProtocol::DamageControl => 2,
            EmergencyProtocol::EmergencyShutdown => 3,
        }
    }

    /// Seconds the protocol stays active
    pub fn duration(self) -> f64 {
        match self {
            EmergencyProtocol::FireSuppression => 10.0,
            EmergencyProtocol::EmergencyPower => 15.0,
            EmergencyProtocol::DamageControl => 20.0,
            EmergencyProtocol::EmergencyShutdown => 8.0,
        }
    }

    /// Seconds after activation before it can fire again
    pub fn cooldown(self) -> f64 {
        match self {
            EmergencyProtocol::FireSuppression => 30.0,
            EmergencyProtocol::EmergencyPower => 45.0,
            EmergencyProtocol::DamageControl => 60.0,
            EmergencyProtocol::EmergencyShutdown => 90.0,
        }
    }

    /// Multiplier on the damage rate of matching events while active
    pub fn damping(self) -> f64 {
        match self {
            EmergencyProtocol::FireSuppression => 0.3,
            EmergencyProtocol::EmergencyPower => 0.5,
            EmergencyProtocol::DamageControl => 0.4,
            EmergencyProtocol::EmergencyShutdown => 0.2,
        }
    }

    pub fn handles(self, event_type: CriticalEventType) -> bool {
        event_type.protocol() == self
    }
}

/// Timers for one protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolState {
    pub active_remaining: f64,
    pub cooldown_remaining: f64,
    pub activations: u32,
}

/// Protocol snapshot for HUD/AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolStatus {
    pub protocol: EmergencyProtocol,
    pub active: bool,
    pub active_remaining: f64,
    pub cooldown_remaining: f64,
    pub activations: u32,
}

/// All four protocols with their activation and cooldown timers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyProtocols {
    states: [ProtocolState; 4],
}

impl EmergencyProtocols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, protocol: EmergencyProtocol) -> &ProtocolState {
        &self.states[protocol.index()]
    }

    pub fn is_active(&self, protocol: EmergencyProtocol) -> bool {
        self.state(protocol).active_remaining > 0.0
    }

    /// Activate unless already active or cooling down
    pub fn try_activate(&mut self, protocol: EmergencyProtocol) -> bool {
        let state = &mut self.states[protocol.index()];
        if state.active_remaining > 0.0 || state.cooldown_remaining > 0.0 {
            return false;
        }
        state.active_remaining = protocol.duration();
        state.cooldown_remaining = protocol.cooldown();
        state.activations += 1;
        true
    }

    /// Damage-rate multiplier for an event type (1.0 when no protocol damps it)
    pub fn damping_for(&self, event_type: CriticalEventType) -> f64 {
        let protocol = event_type.protocol();
        if self.is_active(protocol) {
            protocol.damping()
        } else {
            1.0
        }
    }

    pub fn tick(&mut self, delta: f64) {
        for state in &mut self.states {
            state.active_remaining = (state.active_remaining - delta).max(0.0);
            state.cooldown_remaining = (state.cooldown_remaining - delta).max(0.0);
        }
    }

    pub fn status(&self) -> Vec<ProtocolStatus> {
        EmergencyProtocol::all()
            .iter()
            .map(|p| {
                let s = self.state(*p);
                ProtocolStatus {
                    protocol: *p,
                    active: s.active_remaining > 0.0,
                    active_remaining: s.active_remaining,
                    cooldown_remaining: s.cooldown_remaining,
                    activations: s.activations,
                }
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.states = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_and_cooldown() {
        let mut protocols = EmergencyProtocols::new();
        assert!(protocols.try_activate(EmergencyProtocol::FireSuppression));
        assert!(!protocols.try_activate(EmergencyProtocol::FireSuppression));

        protocols.tick(10.0);
        assert!(!protocols.is_active(EmergencyProtocol::FireSuppression));
        // Still cooling down
        assert!(!protocols.try_activate(EmergencyProtocol::FireSuppression));

        protocols.tick(20.0);
        assert!(protocols.try_activate(EmergencyProtocol::FireSuppression));
        assert_eq!(protocols.state(EmergencyProtocol::FireSuppression).activations, 2);
    }

    #[test]
    fn test_damping_only_matching_events() {
        let mut protocols = EmergencyProtocols::new();
        protocols.try_activate(EmergencyProtocol::DamageControl);
        assert!((protocols.damping_for(CriticalEventType::HullBreach) - 0.4).abs() < f64::EPSILON);
        assert!((protocols.damping_for(CriticalEventType::EngineFire) - 1.0).abs() < f64::EPSILON);
    }
}
