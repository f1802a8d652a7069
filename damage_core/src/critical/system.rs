//! Critical damage system - event lifecycle, cascades and the catastrophic countdown
//!
//! Ship-wide state machine:
//! `Nominal -> Critical (integrity <= cascade threshold)
//!  -> CatastrophicCountdown (integrity <= catastrophic threshold) -> Destroyed`
//!
//! Each active event deals damage over time into a shared accumulator that
//! the owning `DamageManager` drains and applies to the hull. Cascade chance
//! is `severity * cascade_factor`, doubled below the cascade threshold.

use super::active::{ActiveEventStatus, CriticalEvent};
use super::protocols::{EmergencyProtocols, ProtocolStatus};
use super::types::{CriticalEventType, SpecialEffect};
use crate::config::CriticalConstants;
use crate::error::DamageError;
use crate::events::{DamageNotification, EventQueue};
use crate::save::{from_save_data, to_save_data, SaveData};
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Explosion damage per unit of severity for events with a blast radius
const BLAST_DAMAGE_PER_SEVERITY: f64 = 25.0;
const MIN_PERFORMANCE: f64 = 0.1;

/// Ship-wide critical state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipCriticalState {
    #[default]
    Nominal,
    Critical,
    CatastrophicCountdown,
    Destroyed,
}

/// Ship performance multipliers from active events (each >= 0.1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceState {
    pub thrust: f64,
    pub power: f64,
    pub control: f64,
}

impl Default for PerformanceState {
    fn default() -> Self {
        PerformanceState {
            thrust: 1.0,
            power: 1.0,
            control: 1.0,
        }
    }
}

/// An explosion that damages subsystems around a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlastDamage {
    /// Ship-local centre
    pub location: DVec3,
    pub radius: f64,
    pub damage: f64,
}

/// Damage the owner must apply after a trigger or tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalUpdate {
    /// Direct hull damage (event damage over time, structural loss, countdown)
    pub hull_damage: f64,
    pub blasts: Vec<BlastDamage>,
    /// The countdown reached zero during this update
    pub detonated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalStats {
    pub triggered: u64,
    pub cascades: u64,
    pub spreads: u64,
    pub expired: u64,
}

/// Read-only critical snapshot for HUD/AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalStatus {
    pub state: ShipCriticalState,
    pub integrity: f64,
    pub active_events: Vec<ActiveEventStatus>,
    pub countdown_remaining: Option<f64>,
    pub performance: PerformanceState,
    pub protocols: Vec<ProtocolStatus>,
    pub stats: CriticalStats,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CriticalSave {
    state: ShipCriticalState,
    events: Vec<CriticalEvent>,
    countdown_remaining: f64,
    detonated: bool,
    time: f64,
    accumulator: f64,
    integrity: Option<f64>,
    next_id: u64,
    protocols: EmergencyProtocols,
    stats: CriticalStats,
}

/// Critical events and catastrophic failure for one ship
#[derive(Debug, Clone)]
pub struct CriticalDamageSystem {
    constants: CriticalConstants,
    max_hull: f64,
    /// Hull half-extents, for detonation sites
    half_extents: DVec3,
    state: ShipCriticalState,
    events: Vec<CriticalEvent>,
    protocols: EmergencyProtocols,
    countdown_remaining: f64,
    detonated: bool,
    integrity: f64,
    time: f64,
    next_id: u64,
    accumulator: f64,
    blasts: Vec<BlastDamage>,
    stats: CriticalStats,
    rng: ChaCha8Rng,
    notifications: EventQueue,
}

impl CriticalDamageSystem {
    pub fn new(max_hull: f64, half_extents: DVec3, constants: CriticalConstants, seed: u64) -> Self {
        CriticalDamageSystem {
            constants,
            max_hull: max_hull.max(0.0),
            half_extents,
            state: ShipCriticalState::Nominal,
            events: Vec::new(),
            protocols: EmergencyProtocols::new(),
            countdown_remaining: 0.0,
            detonated: false,
            integrity: 100.0,
            time: 0.0,
            next_id: 1,
            accumulator: 0.0,
            blasts: Vec::new(),
            stats: CriticalStats::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            notifications: EventQueue::new(),
        }
    }

    pub fn state(&self) -> ShipCriticalState {
        self.state
    }

    pub fn active_events(&self) -> &[CriticalEvent] {
        &self.events
    }

    pub fn protocols(&self) -> &EmergencyProtocols {
        &self.protocols
    }

    pub fn countdown_remaining(&self) -> Option<f64> {
        (self.state == ShipCriticalState::CatastrophicCountdown).then_some(self.countdown_remaining)
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.notifications
    }

    /// Cascade chance for a parent event of this severity at the current integrity
    pub fn cascade_probability(&self, severity: f64) -> f64 {
        let mut p = severity.max(0.0) * self.constants.cascade_factor;
        if self.integrity < self.constants.cascade_threshold {
            p *= 2.0;
        }
        p.min(1.0)
    }

    /// Start a critical event at a ship-local location.
    /// Returns the event id, or `None` if the ship is destroyed, the
    /// severity is invalid, or too many events are already active.
    pub fn trigger_critical_event(
        &mut self,
        event_type: CriticalEventType,
        severity: f64,
        location: DVec3,
    ) -> Option<u64> {
        self.spawn(event_type, severity, location, 0)
    }

    fn spawn(&mut self, event_type: CriticalEventType, severity: f64, location: DVec3, depth: u32) -> Option<u64> {
        if self.state == ShipCriticalState::Destroyed {
            return None;
        }
        if severity <= 0.0 || !severity.is_finite() {
            tracing::warn!("Rejected {} with severity {}", event_type.name(), severity);
            return None;
        }
        // The final detonation always lands, even at the event limit
        if !self.detonated && self.events.len() >= self.constants.max_active_events {
            tracing::debug!("Critical event limit reached, dropping {}", event_type.name());
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        let event = CriticalEvent::new(id, event_type, severity, location, self.time, depth);

        // Immediate effects
        if let SpecialEffect::StructuralLoss(fraction) = event.config.effect {
            self.accumulator += self.max_hull * fraction * severity;
        }
        if event.config.blast_radius > 0.0 {
            self.blasts.push(BlastDamage {
                location,
                radius: event.config.blast_radius,
                damage: BLAST_DAMAGE_PER_SEVERITY * severity,
            });
        }

        self.events.push(event);
        self.stats.triggered += 1;
        tracing::info!(
            "Critical event {} (severity {:.2}) at {:?}",
            event_type.name(),
            severity,
            location
        );
        self.notifications.push(DamageNotification::CriticalEventTriggered {
            event_type,
            severity,
            location,
        });

        let protocol = event_type.protocol();
        if self.protocols.try_activate(protocol) {
            tracing::info!("Emergency protocol {:?} activated", protocol);
            self.notifications.push(DamageNotification::EmergencyProtocolActivated {
                protocol,
                duration: protocol.duration(),
            });
        }

        if depth < self.constants.max_cascade_depth {
            let chance = self.cascade_probability(severity);
            for target in event_type.cascade_targets() {
                if self.rng.gen::<f64>() < chance {
                    let child_severity = severity * self.constants.cascade_severity_factor;
                    if self.spawn(*target, child_severity, location, depth + 1).is_some() {
                        self.stats.cascades += 1;
                        self.notifications.push(DamageNotification::CascadeTriggered {
                            from: event_type,
                            to: *target,
                            severity: child_severity,
                        });
                    }
                }
            }
        }

        Some(id)
    }

    /// Feed the current hull integrity percentage into the state machine
    pub fn update_integrity(&mut self, integrity: f64) {
        self.integrity = integrity.clamp(0.0, 100.0);
        let catastrophic = self.constants.catastrophic_threshold;

        match self.state {
            ShipCriticalState::Destroyed => {}
            ShipCriticalState::CatastrophicCountdown => {
                if self.integrity > catastrophic {
                    tracing::info!("Catastrophic countdown aborted at {:.1}% integrity", self.integrity);
                    self.countdown_remaining = 0.0;
                    self.state = self.state_for_integrity();
                }
            }
            _ => {
                if self.integrity <= catastrophic && self.integrity > 0.0 {
                    self.state = ShipCriticalState::CatastrophicCountdown;
                    self.countdown_remaining = self.constants.countdown_duration;
                    tracing::info!(
                        "Catastrophic countdown started ({:.0} s) at {:.1}% integrity",
                        self.countdown_remaining,
                        self.integrity
                    );
                    self.notifications.push(DamageNotification::CatastrophicCountdownStarted {
                        duration: self.countdown_remaining,
                    });
                } else {
                    self.state = self.state_for_integrity();
                }
            }
        }
    }

    fn state_for_integrity(&self) -> ShipCriticalState {
        if self.integrity <= self.constants.cascade_threshold {
            ShipCriticalState::Critical
        } else {
            ShipCriticalState::Nominal
        }
    }

    /// Destruction by hull depletion. Returns true if the ship was not already destroyed.
    pub fn mark_destroyed(&mut self) -> bool {
        if self.state == ShipCriticalState::Destroyed {
            return false;
        }
        self.state = ShipCriticalState::Destroyed;
        self.countdown_remaining = 0.0;
        true
    }

    /// Advance events, protocols and the countdown
    pub fn tick(&mut self, delta: f64) -> CriticalUpdate {
        if self.state == ShipCriticalState::Destroyed || delta <= 0.0 {
            return self.take_pending();
        }

        self.time += delta;
        self.protocols.tick(delta);

        let spread_interval = self.constants.spread_interval;
        let mut spreads = Vec::new();
        for event in &mut self.events {
            let damping = self.protocols.damping_for(event.event_type);
            let (damage, rolls) = event.advance(delta, damping, spread_interval);
            self.accumulator += damage;

            for _ in 0..rolls {
                if self.rng.gen::<f64>() < event.config.spread_chance {
                    spreads.push((event.event_type, event.severity, event.location, event.cascade_depth));
                }
            }
        }

        let mut expired = Vec::new();
        self.events.retain(|e| {
            if e.is_expired() {
                expired.push((e.event_type, e.location));
                false
            } else {
                true
            }
        });
        for (event_type, location) in expired {
            self.stats.expired += 1;
            tracing::debug!("Critical event {} expired", event_type.name());
            self.notifications
                .push(DamageNotification::CriticalEventExpired { event_type, location });
        }

        for (event_type, severity, location, depth) in spreads {
            let child_severity = severity * self.constants.spread_severity_factor;
            if child_severity < self.constants.min_spread_severity {
                continue;
            }
            let jitter = self.constants.spread_jitter;
            let offset = DVec3::new(
                self.rng.gen_range(-jitter..=jitter),
                self.rng.gen_range(-jitter..=jitter),
                self.rng.gen_range(-jitter..=jitter),
            );
            if self.spawn(event_type, child_severity, location + offset, depth).is_some() {
                self.stats.spreads += 1;
            }
        }

        let mut detonated = false;
        if self.state == ShipCriticalState::CatastrophicCountdown {
            let duration = self.constants.countdown_duration;
            let step = delta.min(self.countdown_remaining);
            self.countdown_remaining -= delta;

            // Countdown damage accelerates from min to max rate
            let progress = 1.0 - self.countdown_remaining.max(0.0) / duration;
            let rate = self.constants.countdown_min_rate
                + (self.constants.countdown_max_rate - self.constants.countdown_min_rate) * progress;
            self.accumulator += self.max_hull * rate * step;

            if self.countdown_remaining <= 0.0 {
                detonated = self.detonate();
            }
        }

        let mut update = self.take_pending();
        update.detonated = detonated;
        update
    }

    /// Five hull detonations plus the power core. Fires at most once.
    fn detonate(&mut self) -> bool {
        if self.detonated {
            return false;
        }
        self.detonated = true;
        self.countdown_remaining = 0.0;
        tracing::info!("Catastrophic countdown complete, ship detonating");

        let h = self.half_extents;
        let severity = self.constants.detonation_severity;
        // No cascades from the final detonation
        let depth = self.constants.max_cascade_depth;
        let sites = [
            (CriticalEventType::HullBreach, DVec3::new(0.0, 0.0, h.z)),
            (CriticalEventType::EngineFire, DVec3::new(0.0, 0.0, -h.z)),
            (CriticalEventType::StructuralCollapse, DVec3::new(-h.x, 0.0, 0.0)),
            (CriticalEventType::HullBreach, DVec3::new(h.x, 0.0, 0.0)),
            (CriticalEventType::ElectricalFailure, DVec3::new(0.0, h.y, 0.0)),
        ];
        for (event_type, location) in sites {
            self.spawn(event_type, severity, location, depth);
        }
        self.spawn(CriticalEventType::PowerCoreOverload, severity, DVec3::ZERO, depth);
        self.blasts.push(BlastDamage {
            location: DVec3::ZERO,
            radius: h.max_element() * 2.0,
            damage: self.max_hull,
        });

        self.state = ShipCriticalState::Destroyed;
        true
    }

    /// Drain accumulated hull damage and pending blasts
    pub fn take_pending(&mut self) -> CriticalUpdate {
        CriticalUpdate {
            hull_damage: std::mem::take(&mut self.accumulator),
            blasts: std::mem::take(&mut self.blasts),
            detonated: false,
        }
    }

    /// End every event within `radius` of a point (damage control).
    /// Returns the number of events resolved.
    pub fn resolve_events_near(&mut self, location: DVec3, radius: f64) -> usize {
        let mut resolved = Vec::new();
        self.events.retain(|e| {
            if e.location.distance(location) <= radius {
                resolved.push((e.event_type, e.location));
                false
            } else {
                true
            }
        });
        for (event_type, location) in &resolved {
            self.notifications.push(DamageNotification::CriticalEventExpired {
                event_type: *event_type,
                location: *location,
            });
        }
        resolved.len()
    }

    /// Performance multipliers from active thrust, power and control effects
    pub fn performance(&self) -> PerformanceState {
        let mut p = PerformanceState::default();
        for event in &self.events {
            let scale = event.severity.min(1.0);
            match event.config.effect {
                SpecialEffect::ThrustLoss(loss) => p.thrust *= 1.0 - loss * scale,
                SpecialEffect::PowerLoss(loss) => p.power *= 1.0 - loss * scale,
                SpecialEffect::ControlLoss(loss) => p.control *= 1.0 - loss * scale,
                SpecialEffect::StructuralLoss(_) => {}
            }
        }
        PerformanceState {
            thrust: p.thrust.max(MIN_PERFORMANCE),
            power: p.power.max(MIN_PERFORMANCE),
            control: p.control.max(MIN_PERFORMANCE),
        }
    }

    pub fn get_critical_status(&self) -> CriticalStatus {
        CriticalStatus {
            state: self.state,
            integrity: self.integrity,
            active_events: self
                .events
                .iter()
                .map(|e| ActiveEventStatus {
                    id: e.id,
                    event_type: e.event_type,
                    severity: e.severity,
                    location: e.location,
                    remaining: e.remaining(),
                    damage_rate: e.damage_rate(self.protocols.damping_for(e.event_type)),
                })
                .collect(),
            countdown_remaining: self.countdown_remaining(),
            performance: self.performance(),
            protocols: self.protocols.status(),
            stats: self.stats.clone(),
        }
    }

    pub fn save_data(&self) -> SaveData {
        to_save_data(&CriticalSave {
            state: self.state,
            events: self.events.clone(),
            countdown_remaining: self.countdown_remaining,
            detonated: self.detonated,
            time: self.time,
            accumulator: self.accumulator,
            integrity: Some(self.integrity),
            next_id: self.next_id,
            protocols: self.protocols.clone(),
            stats: self.stats.clone(),
        })
    }

    pub fn load_save_data(&mut self, data: &SaveData) -> Result<(), DamageError> {
        let save: CriticalSave = from_save_data(data)?;
        let mut events = save.events;
        events.truncate(self.constants.max_active_events);
        events.retain(|e| e.severity > 0.0 && e.severity.is_finite());

        let max_id = events.iter().map(|e| e.id).max().unwrap_or(0);
        self.next_id = save.next_id.max(max_id + 1);
        self.events = events;
        self.state = save.state;
        self.countdown_remaining = save.countdown_remaining.max(0.0);
        self.detonated = save.detonated;
        self.time = save.time.max(0.0);
        self.accumulator = save.accumulator.max(0.0);
        self.integrity = save.integrity.unwrap_or(self.integrity).clamp(0.0, 100.0);
        self.protocols = save.protocols;
        self.stats = save.stats;
        self.blasts.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical::EmergencyProtocol;

    fn system(seed: u64) -> CriticalDamageSystem {
        CriticalDamageSystem::new(1000.0, DVec3::new(10.0, 5.0, 30.0), CriticalConstants::default(), seed)
    }

    fn cascaded(sys: &CriticalDamageSystem, from: CriticalEventType, to: CriticalEventType) -> bool {
        sys.notifications.peek().iter().any(|n| {
            matches!(n, DamageNotification::CascadeTriggered { from: f, to: t, .. } if *f == from && *t == to)
        })
    }

    fn cascade_rate(integrity: f64) -> f64 {
        let trials = 2000;
        let mut hits = 0;
        for seed in 0..trials {
            let mut sys = system(seed);
            sys.update_integrity(integrity);
            sys.trigger_critical_event(CriticalEventType::PowerCoreOverload, 2.0, DVec3::ZERO);
            if cascaded(&sys, CriticalEventType::PowerCoreOverload, CriticalEventType::ElectricalFailure) {
                hits += 1;
            }
        }
        hits as f64 / trials as f64
    }

    #[test]
    fn test_cascade_probability_above_threshold() {
        let rate = cascade_rate(40.0);
        assert!((rate - 0.6).abs() < 0.05, "cascade rate {}", rate);
    }

    #[test]
    fn test_cascade_probability_doubles_below_threshold() {
        let sys = {
            let mut s = system(1);
            s.update_integrity(20.0);
            s
        };
        assert!((sys.cascade_probability(0.4) - 0.24).abs() < 1e-12);
        assert!((sys.cascade_probability(2.0) - 1.0).abs() < f64::EPSILON);
        assert!((cascade_rate(20.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trigger_applies_immediate_effects() {
        let mut sys = system(3);
        sys.trigger_critical_event(CriticalEventType::HullBreach, 1.0, DVec3::ZERO);
        sys.trigger_critical_event(CriticalEventType::PowerCoreOverload, 1.0, DVec3::ZERO);
        let update = sys.take_pending();

        // 5% of 1000 hull from the breach, plus whatever cascades added
        assert!(update.hull_damage >= 50.0 - 1e-9);
        assert_eq!(update.blasts.len(), 1);
        assert!((update.blasts[0].radius - 8.0).abs() < f64::EPSILON);
        assert!(sys.protocols().is_active(EmergencyProtocol::DamageControl));
    }

    #[test]
    fn test_events_expire() {
        let mut sys = system(4);
        let mut constants = CriticalConstants::default();
        constants.max_cascade_depth = 0;
        sys.constants = constants;

        sys.trigger_critical_event(CriticalEventType::StructuralCollapse, 0.2, DVec3::ZERO);
        sys.tick(9.0);
        assert!(sys.active_events().is_empty());
        assert_eq!(sys.get_critical_status().stats.expired, 1);
    }

    #[test]
    fn test_protocol_damps_damage() {
        let mut sys = system(5);
        sys.constants.max_cascade_depth = 0;
        sys.constants.spread_interval = 1000.0;

        sys.trigger_critical_event(CriticalEventType::EngineFire, 1.0, DVec3::ZERO);
        sys.take_pending();
        let update = sys.tick(1.0);
        // 3.0/s damped by fire suppression 0.3
        assert!((update.hull_damage - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_performance_floor() {
        let mut sys = system(6);
        sys.constants.max_cascade_depth = 0;
        for _ in 0..10 {
            sys.trigger_critical_event(CriticalEventType::ControlSystemFailure, 1.0, DVec3::ZERO);
        }
        let performance = sys.performance();
        assert!((performance.control - 0.1).abs() < f64::EPSILON);
        assert!((performance.thrust - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_state_transitions() {
        let mut sys = system(7);
        sys.update_integrity(60.0);
        assert_eq!(sys.state(), ShipCriticalState::Nominal);
        sys.update_integrity(25.0);
        assert_eq!(sys.state(), ShipCriticalState::Critical);
        sys.update_integrity(8.0);
        assert_eq!(sys.state(), ShipCriticalState::CatastrophicCountdown);
        assert!((sys.countdown_remaining().unwrap() - 30.0).abs() < f64::EPSILON);

        // Repair above the threshold aborts
        sys.update_integrity(15.0);
        assert_eq!(sys.state(), ShipCriticalState::Critical);
        assert!(sys.countdown_remaining().is_none());
    }

    #[test]
    fn test_countdown_detonates_once() {
        let mut sys = system(8);
        sys.update_integrity(5.0);

        let mut detonations = 0;
        let mut countdown_damage = 0.0;
        for _ in 0..400 {
            let update = sys.tick(0.1);
            countdown_damage += update.hull_damage;
            if update.detonated {
                detonations += 1;
            }
        }

        assert_eq!(detonations, 1);
        assert_eq!(sys.state(), ShipCriticalState::Destroyed);
        assert!(countdown_damage > 0.0);
        assert!(sys.trigger_critical_event(CriticalEventType::HullBreach, 1.0, DVec3::ZERO).is_none());
        let triggered = sys
            .notifications
            .count_where(|n| matches!(n, DamageNotification::CriticalEventTriggered { .. }));
        assert_eq!(triggered, 6);
    }

    #[test]
    fn test_detonation_ignores_event_limit() {
        let mut sys = system(12);
        sys.constants.max_active_events = 0;
        assert!(sys.trigger_critical_event(CriticalEventType::HullBreach, 1.0, DVec3::ZERO).is_none());

        sys.update_integrity(5.0);
        let mut detonated = false;
        for _ in 0..400 {
            detonated |= sys.tick(0.1).detonated;
        }

        assert!(detonated);
        let triggered = sys
            .notifications
            .count_where(|n| matches!(n, DamageNotification::CriticalEventTriggered { .. }));
        assert_eq!(triggered, 6);
    }

    #[test]
    fn test_countdown_damage_accelerates() {
        let mut sys = system(9);
        sys.update_integrity(5.0);
        let first = sys.tick(1.0).hull_damage;
        for _ in 0..26 {
            sys.tick(1.0);
        }
        let late = sys.tick(1.0).hull_damage;
        assert!(late > first);
        // Rates stay within 0.5% - 2% of max hull per second
        assert!(first >= 5.0 - 1e-9 && late <= 20.0 + 1e-9);
    }

    #[test]
    fn test_resolve_events_near() {
        let mut sys = system(10);
        sys.constants.max_cascade_depth = 0;
        sys.trigger_critical_event(CriticalEventType::EngineFire, 1.0, DVec3::new(0.0, 0.0, -25.0));
        sys.trigger_critical_event(CriticalEventType::HullBreach, 1.0, DVec3::new(0.0, 0.0, 25.0));
        assert_eq!(sys.resolve_events_near(DVec3::new(0.0, 0.0, -24.0), 3.0), 1);
        assert_eq!(sys.active_events().len(), 1);
    }

    #[test]
    fn test_save_round_trip() {
        let mut sys = system(11);
        sys.trigger_critical_event(CriticalEventType::FuelLeak, 1.5, DVec3::new(1.0, 2.0, 3.0));
        sys.update_integrity(8.0);
        sys.tick(2.0);

        let data = sys.save_data();
        let mut restored = system(11);
        restored.load_save_data(&data).unwrap();
        assert_eq!(restored.get_critical_status(), sys.get_critical_status());
        assert_eq!(restored.active_events(), sys.active_events());
    }
}
