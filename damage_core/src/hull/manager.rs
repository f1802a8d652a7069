//! Damage manager - per-ship coordinator for every damage component
//!
//! Pipeline for one hit (`process_damage_event`):
//! 1. Shields absorb what they can in the covering quadrants
//! 2. Weapon-vs-armor effectiveness and ricochet check
//! 3. Critical-hit analysis (weak points, bypass, critical roll)
//! 4. Armor resistance, penetration history and zone degradation
//! 5. Hull/subsystem split, hull damage and threshold evaluation
//!
//! Time-based state (recharge, critical events, progressive damage,
//! countdown) advances in `tick`, which also drains queued hits first.

use super::state::{HullState, HullThreshold};
use super::subsystems::{SubsystemGrid, SubsystemProvider};
use crate::armor::{ArmorDegradationTracker, CriticalHitDetector, DegradationStatus, HitClassification, ShipArmorConfiguration, ZoneRole};
use crate::collision::{CollisionContact, CollisionDamageSystem, HazardType, ShipDescriptor};
use crate::config::{DamageConstants, ShipClass};
use crate::critical::{
    CriticalDamageSystem, CriticalEventType, CriticalStatus, CriticalUpdate, PerformanceState, ShipCriticalState,
};
use crate::defense::{
    base_resistance, thickness_modifier, ArmorHit, ArmorResistanceCalculator, PenetrationCalculator,
    ResistanceOutcome, WeaponPenetrationSystem,
};
use crate::error::DamageError;
use crate::events::{DamageNotification, EventQueue};
use crate::save::{from_save_data, nested, to_save_data, SaveData};
use crate::shield::{ShieldQuadrantManager, ShieldStatus};
use crate::types::{impact_angle_degrees, ArmorClass, DamageEvent, DamageType, ObjectHandle};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// Damage multiplier for a round that glances off the plate
const RICOCHET_MULTIPLIER: f64 = 0.25;
/// Subsystem health pool of the default layout, as a fraction of max hull
const DEFAULT_SUBSYSTEM_POOL: f64 = 0.5;
/// Damage type reported for internal damage (critical events, progressive failure)
const INTERNAL_DAMAGE_TYPE: DamageType = DamageType::Explosive;

/// Read-only hull snapshot for HUD/AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullStatus {
    pub max_strength: f64,
    pub current_strength: f64,
    /// Integrity percentage (0 - 100)
    pub integrity: f64,
    pub structural_damage: f64,
    pub crossed_thresholds: Vec<HullThreshold>,
    pub critical_state: ShipCriticalState,
    /// Progressive self-damage per second at the current integrity
    pub progressive_damage_rate: f64,
    pub queued_events: usize,
    pub destroyed: bool,
}

/// Where the damage from one hit went
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageReport {
    pub raw_damage: f64,
    pub shield_absorbed: f64,
    pub armor_absorbed: f64,
    pub hull_damage: f64,
    pub subsystem_damage: f64,
    /// Zone the hit landed in
    pub zone: Option<String>,
    /// Hit classification, when critical-hit analysis ran
    pub classification: Option<HitClassification>,
    /// Combined critical-hit and critical-zone multiplier
    pub multiplier: f64,
    pub ricochet: bool,
    pub penetrated: bool,
    pub critical_penetration: bool,
    /// The ship was already destroyed and the hit was ignored
    pub ignored: bool,
}

impl DamageReport {
    fn ignored(raw_damage: f64) -> Self {
        DamageReport {
            raw_damage,
            multiplier: 1.0,
            ignored: true,
            ..Default::default()
        }
    }

    /// Damage that reached the hull or subsystems
    pub fn total_applied(&self) -> f64 {
        self.hull_damage + self.subsystem_damage
    }
}

/// One hit on the hull after shields
#[derive(Debug, Clone)]
struct HullHit {
    damage: f64,
    damage_type: DamageType,
    local_point: DVec3,
    local_velocity: DVec3,
    weapon_effectiveness: f64,
    /// Critical-hit multiplier from hit analysis
    critical_multiplier: f64,
    /// A weak point already scaled the damage, so the zone multiplier is skipped
    weak_point_hit: bool,
    bypass: bool,
    source: Option<ObjectHandle>,
}

impl HullHit {
    fn plain(damage: f64, damage_type: DamageType, local_point: DVec3, local_velocity: DVec3) -> Self {
        HullHit {
            damage,
            damage_type,
            local_point,
            local_velocity,
            weapon_effectiveness: 1.0,
            critical_multiplier: 1.0,
            weak_point_hit: false,
            bypass: false,
            source: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct HullHitOutcome {
    zone: Option<String>,
    armor: ResistanceOutcome,
    multiplier: f64,
    hull: f64,
    subsystems: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ManagerSave {
    destroyed: bool,
    time: f64,
}

/// Damage coordinator owned by one ship
#[derive(Debug)]
pub struct DamageManager {
    constants: DamageConstants,
    ship_class: ShipClass,
    armor: Arc<ShipArmorConfiguration>,
    hull: HullState,
    shields: ShieldQuadrantManager,
    resistance: ArmorResistanceCalculator,
    penetration: PenetrationCalculator,
    weapon_penetration: WeaponPenetrationSystem,
    degradation: ArmorDegradationTracker,
    critical_hits: CriticalHitDetector,
    critical: CriticalDamageSystem,
    collisions: CollisionDamageSystem,
    subsystems: Box<dyn SubsystemProvider>,
    position: DVec3,
    rotation: DQuat,
    queue: VecDeque<DamageEvent>,
    outbox: EventQueue,
    destroyed: bool,
    seed: u64,
    time: f64,
}

impl DamageManager {
    /// Create a manager for a ship class with the standard armor and subsystem layout
    pub fn new(ship_class: &ShipClass, constants: DamageConstants, seed: u64) -> Result<Self, DamageError> {
        let armor = Arc::new(ShipArmorConfiguration::from_ship_class(ship_class));
        Self::with_shared_armor(ship_class, constants, armor, seed)
    }

    /// Create a manager that reads a shared, immutable armor layout.
    /// Fails on a non-positive hull, a negative shield or constants that do not validate.
    pub fn with_shared_armor(
        ship_class: &ShipClass,
        constants: DamageConstants,
        armor: Arc<ShipArmorConfiguration>,
        seed: u64,
    ) -> Result<Self, DamageError> {
        if ship_class.max_hull <= 0.0 || !ship_class.max_hull.is_finite() {
            return Err(DamageError::InvalidParameter("max_hull must be positive"));
        }
        if ship_class.max_shield < 0.0 || !ship_class.max_shield.is_finite() {
            return Err(DamageError::InvalidParameter("max_shield must be >= 0"));
        }
        constants
            .validate()
            .map_err(|e| DamageError::InvalidConfig(e.to_string()))?;

        let half_extents = ship_class.ship_type.half_extents();
        let subsystems = SubsystemGrid::for_archetype(ship_class.ship_type, ship_class.max_hull * DEFAULT_SUBSYSTEM_POOL);

        tracing::debug!(
            "Damage manager for {} ({:?}, {} hull, {} shield)",
            ship_class.id,
            ship_class.ship_type,
            ship_class.max_hull,
            ship_class.max_shield
        );

        Ok(DamageManager {
            hull: HullState::new(ship_class.max_hull),
            shields: ShieldQuadrantManager::from_ship_class(ship_class, constants.shields.clone()),
            resistance: ArmorResistanceCalculator::new(constants.armor.clone()),
            penetration: PenetrationCalculator::new(),
            weapon_penetration: WeaponPenetrationSystem::new(),
            degradation: ArmorDegradationTracker::new(&armor, constants.degradation.clone()),
            critical_hits: CriticalHitDetector::new(Arc::clone(&armor), constants.critical_hits.clone(), seed),
            critical: CriticalDamageSystem::new(
                ship_class.max_hull,
                half_extents,
                constants.critical.clone(),
                seed.wrapping_add(1),
            ),
            collisions: CollisionDamageSystem::new(constants.collision.clone()),
            subsystems: Box::new(subsystems),
            position: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            queue: VecDeque::new(),
            outbox: EventQueue::new(),
            destroyed: false,
            seed,
            time: 0.0,
            ship_class: ship_class.clone(),
            armor,
            constants,
        })
    }

    /// Replace the default subsystem layout
    pub fn with_subsystems(mut self, subsystems: Box<dyn SubsystemProvider>) -> Self {
        self.subsystems = subsystems;
        self
    }

    pub fn set_transform(&mut self, position: DVec3, rotation: DQuat) {
        self.position = position;
        self.rotation = rotation.normalize();
    }

    pub fn world_to_local(&self, world_point: DVec3) -> DVec3 {
        self.rotation.inverse() * (world_point - self.position)
    }

    pub fn local_to_world(&self, local_point: DVec3) -> DVec3 {
        self.position + self.rotation * local_point
    }

    fn direction_to_local(&self, world_direction: DVec3) -> DVec3 {
        self.rotation.inverse() * world_direction
    }

    pub fn ship_class(&self) -> &ShipClass {
        &self.ship_class
    }

    pub fn constants(&self) -> &DamageConstants {
        &self.constants
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn hull(&self) -> &HullState {
        &self.hull
    }

    pub fn armor_configuration(&self) -> &Arc<ShipArmorConfiguration> {
        &self.armor
    }

    pub fn shields(&self) -> &ShieldQuadrantManager {
        &self.shields
    }

    /// Shield controls (distribution, transfer, energy allocation)
    pub fn shields_mut(&mut self) -> &mut ShieldQuadrantManager {
        &mut self.shields
    }

    pub fn resistance(&self) -> &ArmorResistanceCalculator {
        &self.resistance
    }

    pub fn degradation(&self) -> &ArmorDegradationTracker {
        &self.degradation
    }

    pub fn critical_hits(&self) -> &CriticalHitDetector {
        &self.critical_hits
    }

    pub fn critical(&self) -> &CriticalDamageSystem {
        &self.critical
    }

    pub fn collisions(&self) -> &CollisionDamageSystem {
        &self.collisions
    }

    /// Collision immunity list
    pub fn collisions_mut(&mut self) -> &mut CollisionDamageSystem {
        &mut self.collisions
    }

    pub fn subsystems(&self) -> &dyn SubsystemProvider {
        self.subsystems.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn performance(&self) -> PerformanceState {
        self.critical.performance()
    }

    /// Take all pending notifications, oldest first
    pub fn drain_events(&mut self) -> Vec<DamageNotification> {
        self.outbox.drain()
    }

    pub fn pending_events(&self) -> &[DamageNotification] {
        self.outbox.peek()
    }

    fn collect_shield_events(&mut self) {
        self.outbox.append(self.shields.events_mut());
    }

    fn collect_critical_events(&mut self) {
        self.outbox.append(self.critical.events_mut());
    }

    /// Queue a hit for the next tick
    pub fn queue_damage(&mut self, event: DamageEvent) {
        if self.destroyed {
            return;
        }
        self.queue.push_back(event);
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Apply damage directly to the hull at a world point, bypassing shields.
    /// Returns the damage that reached the hull and subsystems.
    pub fn apply_hull_damage(
        &mut self,
        amount: f64,
        world_point: DVec3,
        damage_type: DamageType,
        source: Option<ObjectHandle>,
    ) -> f64 {
        if self.destroyed {
            return 0.0;
        }
        if amount <= 0.0 || !amount.is_finite() {
            tracing::warn!("Rejected hull damage amount {}", amount);
            return 0.0;
        }

        let local_point = self.world_to_local(world_point);
        let mut hit = HullHit::plain(amount, damage_type, local_point, DVec3::ZERO);
        hit.source = source;
        let outcome = self.resolve_hull_hit(&hit);
        outcome.hull + outcome.subsystems
    }

    fn resolve_hull_hit(&mut self, hit: &HullHit) -> HullHitOutcome {
        let mut outcome = HullHitOutcome {
            multiplier: 1.0,
            ..Default::default()
        };
        if self.destroyed || hit.damage <= 0.0 {
            return outcome;
        }

        let armor = Arc::clone(&self.armor);
        let sample = armor.armor_at(hit.local_point);
        let (zone, armor_class, thickness) = match &sample {
            Some(s) => (Some(s.zone), s.armor_class, s.thickness * self.degradation.effectiveness(&s.zone.name)),
            None => (None, ArmorClass::None, 0.0),
        };
        let world_point = self.local_to_world(hit.local_point);

        // Armor
        outcome.armor = if hit.bypass {
            ResistanceOutcome {
                residual: hit.damage,
                ..Default::default()
            }
        } else {
            let armor_hit = ArmorHit::new(
                hit.damage,
                hit.damage_type,
                armor_class,
                thickness,
                hit.local_point,
                hit.local_velocity,
            )
            .with_weapon_effectiveness(hit.weapon_effectiveness);
            self.resistance.evaluate(&armor_hit)
        };

        if let Some(zone) = zone {
            outcome.zone = Some(zone.name.clone());
            if outcome.armor.penetrated {
                self.outbox.push(DamageNotification::ArmorPenetrated {
                    zone: zone.name.clone(),
                    residual: outcome.armor.residual,
                    location: world_point,
                });
            }
            if outcome.armor.critical_penetration {
                tracing::info!(
                    "Critical penetration of {} (depth {:.2})",
                    zone.name,
                    outcome.armor.penetration_depth
                );
                self.outbox.push(DamageNotification::CriticalPenetration {
                    zone: zone.name.clone(),
                    depth: outcome.armor.penetration_depth,
                    location: world_point,
                });
                self.trigger_critical(CriticalEventType::HullBreach, 1.0, hit.local_point);
            }

            match self.degradation.record_impact(&zone.name, hit.damage, hit.damage_type) {
                Ok(added) if added > 0.0 => {
                    self.outbox.push(DamageNotification::StructuralIntegrity {
                        zone: zone.name.clone(),
                        integrity: self.degradation.effectiveness(&zone.name),
                        location: world_point,
                    });
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Degradation not recorded: {}", e),
            }
        }

        // Critical zones scale damage unless a weak point already did
        outcome.multiplier = hit.critical_multiplier;
        if let Some(zone) = zone {
            if zone.is_critical() && !hit.weak_point_hit {
                outcome.multiplier *= zone.vulnerability;
            }
        }
        let damage = outcome.armor.residual * outcome.multiplier;

        // Hull/subsystem split
        let mut subsystem_share = damage * self.constants.hull.subsystem_damage_ratio.clamp(0.0, 1.0);
        let mut hull_share = damage - subsystem_share;
        let applied = self.distribute_to_subsystems(subsystem_share, hit.local_point, self.constants.hull.subsystem_search_radius);
        outcome.subsystems = applied;
        hull_share += subsystem_share - applied;
        subsystem_share = applied;

        outcome.hull = self.hull.apply_damage(hull_share);
        tracing::debug!(
            "Hull hit {:.2} {} -> armor {:.2}, x{:.2}, hull {:.2}, subsystems {:.2} (source {:?})",
            hit.damage,
            hit.damage_type.name(),
            outcome.armor.absorbed,
            outcome.multiplier,
            outcome.hull,
            subsystem_share,
            hit.source
        );
        if outcome.hull > 0.0 {
            self.outbox.push(DamageNotification::HullDamaged {
                amount: outcome.hull,
                damage_type: hit.damage_type,
                location: world_point,
                integrity: self.hull.integrity(),
            });
        }

        self.after_hull_change(hit.local_point);
        outcome
    }

    /// Spread damage over live subsystems near a point, weighted towards the
    /// closest. Returns the damage the subsystems actually took.
    fn distribute_to_subsystems(&mut self, amount: f64, local_point: DVec3, radius: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let nearby = self.subsystems.get_subsystems_near_location(local_point, radius);
        if nearby.is_empty() {
            return 0.0;
        }

        let weights: Vec<f64> = nearby.iter().map(|n| 1.0 / (1.0 + n.distance)).collect();
        let total_weight: f64 = weights.iter().sum();
        nearby
            .iter()
            .zip(weights)
            .map(|(n, w)| self.subsystems.apply_damage(n.subsystem, amount * w / total_weight, local_point))
            .sum()
    }

    /// Thresholds, critical state and destruction after any hull change
    fn after_hull_change(&mut self, local_point: DVec3) {
        let integrity = self.hull.integrity();
        for threshold in self.hull.update_thresholds(&self.constants.hull) {
            tracing::info!("Hull integrity crossed {:?} threshold ({:.1}%)", threshold, integrity);
            self.outbox.push(DamageNotification::ThresholdCrossed { threshold, integrity });
            match threshold {
                HullThreshold::Moderate => {}
                HullThreshold::Heavy => self.trigger_critical(CriticalEventType::HullBreach, 1.0, local_point),
                HullThreshold::Critical => self.trigger_critical(CriticalEventType::HullBreach, 1.5, local_point),
                HullThreshold::StructuralFailure => {
                    self.trigger_critical(CriticalEventType::StructuralCollapse, 2.0, local_point)
                }
            }
        }

        self.critical.update_integrity(integrity);
        self.collect_critical_events();

        if self.hull.is_destroyed() {
            self.destroy();
        }
    }

    fn trigger_critical(&mut self, event_type: CriticalEventType, severity: f64, local_point: DVec3) {
        self.critical.trigger_critical_event(event_type, severity, local_point);
        self.collect_critical_events();
    }

    /// Terminal state: fires `ShipDestroyed` once and drops queued hits
    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.critical.mark_destroyed();
        self.queue.clear();
        tracing::info!("Ship {} destroyed", self.ship_class.id);
        self.outbox.push(DamageNotification::ShipDestroyed { location: self.position });
    }

    /// Run a hit through the full pipeline
    pub fn process_damage_event(&mut self, event: &DamageEvent) -> DamageReport {
        self.run_pipeline(event, true)
    }

    fn run_pipeline(&mut self, event: &DamageEvent, analyze: bool) -> DamageReport {
        if self.destroyed {
            return DamageReport::ignored(event.amount);
        }
        if event.amount <= 0.0 || !event.amount.is_finite() {
            tracing::warn!("Rejected damage event amount {}", event.amount);
            return DamageReport::ignored(event.amount);
        }

        let local_point = self.world_to_local(event.world_point);
        let local_velocity = self.direction_to_local(event.impact_velocity);
        let mut report = DamageReport {
            raw_damage: event.amount,
            multiplier: 1.0,
            ..Default::default()
        };

        // Shields
        let absorption = self.shields.absorb_damage(event.amount, local_point);
        self.collect_shield_events();
        report.shield_absorbed = absorption.absorbed;
        let mut hit = HullHit::plain(absorption.residual, event.damage_type, local_point, local_velocity);
        hit.source = event.source;
        if hit.damage <= 0.0 {
            return report;
        }

        let armor = Arc::clone(&self.armor);
        let sample = armor.armor_at(local_point);
        let (zone_name, zone_role, armor_class, thickness) = match &sample {
            Some(s) => (
                Some(s.zone.name.as_str()),
                Some(s.zone.role),
                s.armor_class,
                s.thickness * self.degradation.effectiveness(&s.zone.name),
            ),
            None => (None, None, ArmorClass::None, 0.0),
        };
        let angle = impact_angle_degrees(local_point, local_velocity);

        // Weapon penetration
        if let Some(weapon) = &event.weapon {
            let result = self.weapon_penetration.evaluate(
                weapon,
                armor_class,
                thickness,
                local_velocity.length(),
                angle,
            );
            hit.weapon_effectiveness = result.effectiveness;

            let check = self
                .penetration
                .calculate(result.effective_power, thickness, angle, event.damage_type);
            if check.ricochet {
                tracing::debug!("Ricochet at {:.1} degrees", angle);
                report.ricochet = true;
                hit.damage *= RICOCHET_MULTIPLIER;
            }
        }

        // Critical-hit analysis
        if analyze && !report.ricochet {
            let zone_degradation = zone_name.map(|z| self.degradation.zone_degradation(z)).unwrap_or(0.0);
            let result = self.critical_hits.analyze_hit(
                local_point,
                event.damage_type,
                event.weapon.as_ref(),
                thickness,
                zone_degradation,
            );
            hit.critical_multiplier = result.multiplier;
            hit.weak_point_hit = result.weak_point.is_some();
            hit.bypass = result.bypass;
            report.classification = Some(result.classification);

            if result.classification != HitClassification::Normal {
                self.outbox.push(DamageNotification::CriticalHit {
                    classification: result.classification,
                    multiplier: result.multiplier,
                    location: event.world_point,
                });
            }
            if result.classification.is_major() {
                let severity = if result.classification == HitClassification::PerfectCritical {
                    1.5
                } else {
                    1.0
                };
                self.trigger_critical(critical_event_for_zone(zone_role), severity, local_point);
            }
        }

        let outcome = self.resolve_hull_hit(&hit);
        report.armor_absorbed = outcome.armor.absorbed;
        report.penetrated = outcome.armor.penetrated;
        report.critical_penetration = outcome.armor.critical_penetration;
        report.hull_damage = outcome.hull;
        report.subsystem_damage = outcome.subsystems;
        report.multiplier = outcome.multiplier;
        report.zone = outcome.zone;
        report
    }

    /// Advance the ship by `delta` seconds: queued hits first, then
    /// recharge, cooldowns, degradation, critical events and progressive damage
    pub fn tick(&mut self, delta: f64) {
        if delta <= 0.0 || !delta.is_finite() || self.destroyed {
            return;
        }
        self.time += delta;

        while let Some(event) = self.queue.pop_front() {
            self.process_damage_event(&event);
            if self.destroyed {
                return;
            }
        }

        if let Some(health) = self.subsystems.health_fraction("shield_generator") {
            if let Err(e) = self.shields.set_subsystem_health(health) {
                tracing::warn!("Shield generator health not applied: {}", e);
            }
        }
        self.shields.tick(delta);
        self.collect_shield_events();

        self.collisions.tick(delta);
        self.degradation.tick(delta);
        self.critical_hits.tick(delta, &self.degradation);

        let update = self.critical.tick(delta);
        self.collect_critical_events();
        self.apply_critical_update(update);
        if self.destroyed {
            return;
        }

        let progressive = self.progressive_damage_rate() * delta;
        if progressive > 0.0 {
            self.apply_internal_damage(progressive);
            self.after_hull_change(DVec3::ZERO);
        }
    }

    /// Progressive self-damage per second (zero above the progressive threshold)
    pub fn progressive_damage_rate(&self) -> f64 {
        let threshold = self.constants.hull.progressive_threshold;
        let integrity = self.hull.integrity();
        if self.destroyed || threshold <= 0.0 || integrity >= threshold {
            return 0.0;
        }
        self.hull.max_strength * self.constants.hull.progressive_rate * (1.0 - integrity / threshold)
    }

    fn apply_critical_update(&mut self, update: CriticalUpdate) {
        if update.hull_damage > 0.0 {
            self.apply_internal_damage(update.hull_damage);
        }

        for blast in &update.blasts {
            let nearby = self.subsystems.get_subsystems_near_location(blast.location, blast.radius);
            for n in nearby {
                let falloff = if blast.radius > 0.0 {
                    1.0 - n.distance / blast.radius
                } else {
                    1.0
                };
                self.subsystems
                    .apply_damage(n.subsystem, blast.damage * falloff.max(0.0), blast.location);
            }
        }

        if update.detonated {
            let remaining = self.hull.current_strength;
            self.hull.apply_damage(remaining);
            self.destroy();
            return;
        }
        self.after_hull_change(DVec3::ZERO);
    }

    /// Damage from inside the ship (critical events, progressive failure).
    /// While the catastrophic countdown runs it cannot take the hull below
    /// the countdown floor, so the countdown always reaches detonation.
    fn apply_internal_damage(&mut self, amount: f64) -> f64 {
        let mut amount = amount;
        if self.critical.state() == ShipCriticalState::CatastrophicCountdown {
            let floor = (self.hull.max_strength * self.constants.critical.countdown_hull_floor)
                .min(self.hull.current_strength);
            amount = amount.min(self.hull.current_strength - floor);
        }
        let actual = self.hull.apply_damage(amount);
        if actual > 0.0 {
            self.outbox.push(DamageNotification::HullDamaged {
                amount: actual,
                damage_type: INTERNAL_DAMAGE_TYPE,
                location: self.position,
                integrity: self.hull.integrity(),
            });
        }
        actual
    }

    /// Restore hull strength. Climbing back over a threshold re-arms it and
    /// can abort a running catastrophic countdown.
    pub fn repair_hull(&mut self, amount: f64) -> f64 {
        if self.destroyed {
            return 0.0;
        }
        let actual = self.hull.repair(amount);
        if actual > 0.0 {
            tracing::info!("Hull repaired by {:.1} ({:.1}%)", actual, self.hull.integrity());
            self.after_hull_change(DVec3::ZERO);
        }
        actual
    }

    /// Repair an armor zone: removes wear, patches penetration history and
    /// puts out critical events inside it. Returns the degradation removed.
    pub fn repair_zone(&mut self, zone: &str, amount: f64) -> Result<f64, DamageError> {
        if self.destroyed {
            return Err(DamageError::InvalidParameter("ship is destroyed"));
        }
        let armor = Arc::clone(&self.armor);
        let zone = armor.zone(zone).ok_or_else(|| DamageError::UnknownZone(zone.to_string()))?;

        let repaired = self.degradation.repair(&zone.name, amount)?;
        let center = zone.bounds.center();
        let radius = zone.bounds.size().max_element() * 0.5;
        let patched = self.resistance.clear_penetration_near(center, radius);
        let resolved = self.critical.resolve_events_near(center, radius);
        self.collect_critical_events();

        tracing::info!(
            "Repaired zone {}: {:.3} wear removed, {} cells patched, {} events resolved",
            zone.name,
            repaired,
            patched,
            resolved
        );
        self.outbox.push(DamageNotification::StructuralIntegrity {
            zone: zone.name.clone(),
            integrity: self.degradation.effectiveness(&zone.name),
            location: self.local_to_world(center),
        });
        Ok(repaired)
    }

    /// Resolve a physics contact. Returns the damage that reached the hull
    /// and subsystems, or `None` when the contact was ignored.
    pub fn process_collision(&mut self, contact: &CollisionContact) -> Option<f64> {
        if self.destroyed {
            return None;
        }
        let own = ShipDescriptor {
            mass: self.ship_class.mass,
            armor_class: self.ship_class.armor_type,
            integrity: self.hull.integrity() / 100.0,
        };
        // Impact angle compares the velocity against the ship-local normal
        let local_contact = CollisionContact {
            relative_velocity: self.direction_to_local(contact.relative_velocity),
            ..contact.clone()
        };
        let result = self.collisions.process_collision(&local_contact, &own)?;

        self.outbox.push(DamageNotification::CollisionImpact {
            other: result.other,
            damage: result.damage,
            location: contact.impact_position,
            ramming: result.ramming,
        });

        let event = DamageEvent::new(result.damage, result.damage_type, contact.impact_position)
            .with_velocity(contact.relative_velocity)
            .with_source(result.other);
        let report = self.run_pipeline(&event, false);
        Some(report.total_applied())
    }

    /// Environmental hazard exposure for a time step. Hazards skip shields
    /// and zones and hit the structure directly, reduced by the ship's
    /// base armor. Returns the hull damage dealt.
    pub fn apply_environmental_damage(&mut self, hazard: HazardType, intensity: f64, delta: f64) -> f64 {
        if self.destroyed || intensity <= 0.0 || delta <= 0.0 || !intensity.is_finite() || !delta.is_finite() {
            return 0.0;
        }
        let raw = CollisionDamageSystem::hazard_damage(hazard, intensity, delta);
        let damage_type = hazard.damage_type();
        let resistance = base_resistance(self.ship_class.armor_type, damage_type)
            * thickness_modifier(self.ship_class.armor_thickness, self.constants.armor.reference_thickness);
        let damage = raw * (1.0 - resistance.clamp(0.0, self.constants.armor.max_resistance));

        if damage_type.is_thermal() {
            let armor = Arc::clone(&self.armor);
            for zone in armor.zones() {
                if let Err(e) = self.degradation.apply_thermal(&zone.name, raw) {
                    tracing::warn!("Thermal exposure not recorded: {}", e);
                }
            }
        }

        let actual = self.hull.apply_damage(damage);
        tracing::debug!("{:?} exposure: {:.2} raw, {:.2} to hull", hazard, raw, actual);
        if actual > 0.0 {
            self.outbox.push(DamageNotification::HullDamaged {
                amount: actual,
                damage_type,
                location: self.position,
                integrity: self.hull.integrity(),
            });
        }
        self.after_hull_change(DVec3::ZERO);
        actual
    }

    /// Start a critical event directly (scripted damage, debug tools)
    pub fn trigger_critical_event(&mut self, event_type: CriticalEventType, severity: f64, local_point: DVec3) -> Option<u64> {
        if self.destroyed {
            return None;
        }
        let id = self.critical.trigger_critical_event(event_type, severity, local_point);
        self.collect_critical_events();
        id
    }

    pub fn get_hull_status(&self) -> HullStatus {
        HullStatus {
            max_strength: self.hull.max_strength,
            current_strength: self.hull.current_strength,
            integrity: self.hull.integrity(),
            structural_damage: self.hull.structural_damage,
            crossed_thresholds: self.hull.crossed_thresholds(),
            critical_state: self.critical.state(),
            progressive_damage_rate: self.progressive_damage_rate(),
            queued_events: self.queue.len(),
            destroyed: self.destroyed,
        }
    }

    pub fn get_shield_status(&self) -> ShieldStatus {
        self.shields.get_shield_status()
    }

    pub fn get_degradation_status(&self, zone: &str) -> Option<DegradationStatus> {
        self.degradation.get_degradation_status(zone)
    }

    pub fn get_critical_status(&self) -> CriticalStatus {
        self.critical.get_critical_status()
    }

    /// Aggregated save record, one nested record per component
    pub fn save_data(&self) -> SaveData {
        let mut data = to_save_data(&ManagerSave {
            destroyed: self.destroyed,
            time: self.time,
        });
        let sections = [
            ("hull", to_save_data(&self.hull)),
            ("shields", self.shields.save_data()),
            ("armor", self.resistance.save_data()),
            ("degradation", self.degradation.save_data()),
            ("critical_hits", self.critical_hits.save_data()),
            ("critical", self.critical.save_data()),
            ("collisions", self.collisions.save_data()),
            ("subsystems", self.subsystems.save_data()),
        ];
        for (key, section) in sections {
            data.insert(key.to_string(), Value::Object(section));
        }
        data
    }

    /// Load an aggregated save record. Nothing changes unless every section loads.
    pub fn load_save_data(&mut self, data: &SaveData) -> Result<(), DamageError> {
        let save: ManagerSave = from_save_data(data)?;

        let hull = match data.get("hull") {
            Some(Value::Object(map)) => {
                let mut hull: HullState = from_save_data(map)?;
                if hull.max_strength <= 0.0 {
                    hull.max_strength = self.hull.max_strength;
                }
                hull.current_strength = hull.current_strength.clamp(0.0, hull.max_strength);
                hull
            }
            _ => self.hull.clone(),
        };

        let mut shields = self.shields.clone();
        shields.load_save_data(&nested(data, "shields"))?;
        let mut resistance = self.resistance.clone();
        resistance.load_save_data(&nested(data, "armor"))?;
        let mut degradation = self.degradation.clone();
        degradation.load_save_data(&nested(data, "degradation"))?;
        let mut critical_hits = self.critical_hits.clone();
        let critical_hit_data = nested(data, "critical_hits");
        critical_hits.load_save_data(&critical_hit_data)?;
        if !critical_hit_data.contains_key("weak_points") {
            // Older records carry no weak points; rebuild them from the loaded wear
            critical_hits.refresh(&degradation);
        }
        let mut critical = self.critical.clone();
        critical.load_save_data(&nested(data, "critical"))?;
        let mut collisions = self.collisions.clone();
        collisions.load_save_data(&nested(data, "collisions"))?;
        self.subsystems.load_save_data(&nested(data, "subsystems"))?;

        self.hull = hull;
        self.shields = shields;
        self.resistance = resistance;
        self.degradation = degradation;
        self.critical_hits = critical_hits;
        self.critical = critical;
        self.collisions = collisions;
        self.destroyed = save.destroyed;
        self.time = save.time.max(0.0);
        self.queue.clear();
        tracing::debug!("Loaded damage state for {} at t={:.1}", self.ship_class.id, self.time);
        Ok(())
    }
}

/// Critical event raised by a major critical hit in a zone
fn critical_event_for_zone(role: Option<ZoneRole>) -> CriticalEventType {
    match role {
        Some(ZoneRole::Core) => CriticalEventType::PowerCoreOverload,
        Some(ZoneRole::Stern) => CriticalEventType::EngineFire,
        Some(ZoneRole::Bridge) => CriticalEventType::ControlSystemFailure,
        _ => CriticalEventType::HullBreach,
    }
}
