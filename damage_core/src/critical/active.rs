//! Active critical events and their per-tick aging

use super::types::{CriticalEventConfig, CriticalEventType};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A running critical event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalEvent {
    pub id: u64,
    pub event_type: CriticalEventType,
    pub severity: f64,
    /// Ship-local location
    pub location: DVec3,
    pub start_time: f64,
    pub elapsed: f64,
    /// Time since the last spread roll
    pub spread_timer: f64,
    /// 0 for directly triggered events, +1 per cascade generation
    pub cascade_depth: u32,
    /// Configuration at trigger time
    pub config: CriticalEventConfig,
}

impl CriticalEvent {
    pub fn new(
        id: u64,
        event_type: CriticalEventType,
        severity: f64,
        location: DVec3,
        start_time: f64,
        cascade_depth: u32,
    ) -> Self {
        CriticalEvent {
            id,
            event_type,
            severity,
            location,
            start_time,
            elapsed: 0.0,
            spread_timer: 0.0,
            cascade_depth,
            config: event_type.config(),
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.config.duration - self.elapsed).max(0.0)
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.config.duration
    }

    /// Damage per second after severity and protocol damping
    pub fn damage_rate(&self, damping: f64) -> f64 {
        self.config.damage_rate * self.severity * damping
    }

    /// Age the event, returning (damage dealt, spread rolls due).
    ///
    /// Damage stops accruing once the event's duration is used up.
    pub fn advance(&mut self, delta: f64, damping: f64, spread_interval: f64) -> (f64, u32) {
        let active_time = delta.min(self.remaining()).max(0.0);
        self.elapsed += delta;
        self.spread_timer += active_time;

        let mut spreads = 0;
        while spread_interval > 0.0 && self.spread_timer >= spread_interval {
            self.spread_timer -= spread_interval;
            spreads += 1;
        }

        (self.damage_rate(damping) * active_time, spreads)
    }
}

/// Active event snapshot for HUD/AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEventStatus {
    pub id: u64,
    pub event_type: CriticalEventType,
    pub severity: f64,
    pub location: DVec3,
    pub remaining: f64,
    /// Damage per second after protocol damping
    pub damage_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accrues_damage() {
        let mut event = CriticalEvent::new(1, CriticalEventType::EngineFire, 2.0, DVec3::ZERO, 0.0, 0);
        let (damage, spreads) = event.advance(1.0, 1.0, 5.0);
        // 3.0/s * severity 2.0
        assert!((damage - 6.0).abs() < 1e-12);
        assert_eq!(spreads, 0);
    }

    #[test]
    fn test_spread_rolls_every_interval() {
        let mut event = CriticalEvent::new(1, CriticalEventType::FuelLeak, 1.0, DVec3::ZERO, 0.0, 0);
        let (_, spreads) = event.advance(11.0, 1.0, 5.0);
        assert_eq!(spreads, 2);
    }

    #[test]
    fn test_damage_stops_at_expiry() {
        let mut event = CriticalEvent::new(1, CriticalEventType::StructuralCollapse, 1.0, DVec3::ZERO, 0.0, 0);
        let (damage, _) = event.advance(10.0, 1.0, 5.0);
        // 8 s at 8.0/s
        assert!((damage - 64.0).abs() < 1e-12);
        assert!(event.is_expired());
    }

    #[test]
    fn test_damping() {
        let event = CriticalEvent::new(1, CriticalEventType::HullBreach, 1.0, DVec3::ZERO, 0.0, 0);
        assert!((event.damage_rate(0.4) - 0.8).abs() < 1e-12);
    }
}
