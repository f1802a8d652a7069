//! Collision damage - contacts, ramming and environmental hazards
//!
//! Formula:
//! - momentum = other_mass * |relative_velocity|
//! - damage = momentum * damage_per_momentum * type_mult * velocity_factor
//!   * angle_factor / armor_factor
//! - ramming (other body is a ship) also multiplies by the attacker/defender
//!   mass ratio and by `1 + 0.5 * (1 - integrity)`
//!
//! A contact that persists over several physics frames only counts once per
//! cooldown window.

use crate::config::CollisionConstants;
use crate::error::DamageError;
use crate::save::{from_save_data, to_save_data, SaveData};
use crate::types::{impact_angle_degrees, ArmorClass, DamageType, ObjectHandle};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const DEBRIS_TAGS: &[&str] = &["debris", "asteroid", "wreck"];
const ENVIRONMENTAL_TAGS: &[&str] = &["hazard", "mine", "star", "anomaly"];

/// What we collided with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionObjectType {
    Ship,
    Debris,
    Environmental,
    Generic,
}

/// Mass, armor and integrity of a ship taking part in a collision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipDescriptor {
    pub mass: f64,
    pub armor_class: ArmorClass,
    /// Hull integrity fraction (0.0 - 1.0)
    pub integrity: f64,
}

/// The other body in a contact, as reported by the physics layer
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionBody {
    pub handle: ObjectHandle,
    pub mass: f64,
    /// Present when the other body is a ship
    pub ship: Option<ShipDescriptor>,
    pub tags: Vec<String>,
}

impl CollisionBody {
    pub fn new(handle: ObjectHandle, mass: f64) -> Self {
        CollisionBody {
            handle,
            mass,
            ship: None,
            tags: Vec::new(),
        }
    }

    pub fn ship(handle: ObjectHandle, descriptor: ShipDescriptor) -> Self {
        CollisionBody {
            handle,
            mass: descriptor.mass,
            ship: Some(descriptor),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }
}

/// Contact event from the physics layer
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionContact {
    pub other: CollisionBody,
    /// Velocity of the other body relative to us, world space
    pub relative_velocity: DVec3,
    /// Contact point in world space
    pub impact_position: DVec3,
    /// Outward hull normal at the contact point, ship-local
    pub impact_normal: DVec3,
}

/// Damage computed for one contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionDamage {
    pub other: ObjectHandle,
    pub object_type: CollisionObjectType,
    pub damage: f64,
    pub damage_type: DamageType,
    pub ramming: bool,
    pub momentum: f64,
    pub velocity_factor: f64,
    pub angle_factor: f64,
}

/// Environmental hazard dealing damage over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    Radiation,
    PlasmaStorm,
    GravityShear,
    StellarCorona,
}

impl HazardType {
    pub fn damage_type(self) -> DamageType {
        match self {
            HazardType::Radiation => DamageType::Ion,
            HazardType::PlasmaStorm => DamageType::Plasma,
            HazardType::GravityShear => DamageType::Kinetic,
            HazardType::StellarCorona => DamageType::Energy,
        }
    }

    /// Damage per second at intensity 1.0
    pub fn damage_per_second(self) -> f64 {
        match self {
            HazardType::Radiation => 3.0,
            HazardType::PlasmaStorm => 6.0,
            HazardType::GravityShear => 8.0,
            HazardType::StellarCorona => 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionStats {
    pub collisions: u64,
    pub ramming_collisions: u64,
    pub ignored_contacts: u64,
    pub total_damage: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CollisionSave {
    cooldowns: Vec<(u64, f64)>,
    immune: Vec<u64>,
    stats: CollisionStats,
}

/// Collision damage for one ship
#[derive(Debug, Clone)]
pub struct CollisionDamageSystem {
    constants: CollisionConstants,
    cooldowns: HashMap<ObjectHandle, f64>,
    immune: HashSet<ObjectHandle>,
    stats: CollisionStats,
}

impl CollisionDamageSystem {
    pub fn new(constants: CollisionConstants) -> Self {
        CollisionDamageSystem {
            constants,
            cooldowns: HashMap::new(),
            immune: HashSet::new(),
            stats: CollisionStats::default(),
        }
    }

    pub fn stats(&self) -> &CollisionStats {
        &self.stats
    }

    /// Classify a body from its ship descriptor or tags
    pub fn classify(body: &CollisionBody) -> CollisionObjectType {
        if body.ship.is_some() {
            return CollisionObjectType::Ship;
        }
        let has_tag = |set: &[&str]| {
            body.tags
                .iter()
                .any(|t| set.iter().any(|s| t.to_ascii_lowercase().contains(s)))
        };
        if has_tag(DEBRIS_TAGS) {
            CollisionObjectType::Debris
        } else if has_tag(ENVIRONMENTAL_TAGS) {
            CollisionObjectType::Environmental
        } else {
            CollisionObjectType::Generic
        }
    }

    pub fn type_multiplier(&self, object_type: CollisionObjectType) -> f64 {
        match object_type {
            CollisionObjectType::Ship => self.constants.ship_multiplier,
            CollisionObjectType::Debris => self.constants.debris_multiplier,
            CollisionObjectType::Environmental => self.constants.environmental_multiplier,
            CollisionObjectType::Generic => self.constants.generic_multiplier,
        }
    }

    /// Square-root diminishing returns, floor 0.1, saturating at max velocity
    pub fn velocity_factor(&self, speed: f64) -> f64 {
        let max = self.constants.max_velocity;
        (speed.clamp(0.0, max) / max).sqrt().clamp(0.1, 1.0)
    }

    /// 1.5 head-on (<= 30°), 1.0 up to 60°, 0.7 glancing
    pub fn angle_factor(relative_velocity: DVec3, impact_normal: DVec3) -> f64 {
        let angle = impact_angle_degrees(impact_normal, relative_velocity);
        if angle <= 30.0 {
            1.5
        } else if angle <= 60.0 {
            1.0
        } else {
            0.7
        }
    }

    pub fn armor_factor(armor_class: ArmorClass) -> f64 {
        1.0 + 0.25 * armor_class.index() as f64
    }

    /// Damage a contact would deal to `own`, ignoring cooldowns and thresholds
    pub fn calculate_damage(&self, contact: &CollisionContact, own: &ShipDescriptor) -> CollisionDamage {
        let object_type = Self::classify(&contact.other);
        let speed = contact.relative_velocity.length();
        let momentum = contact.other.mass.max(0.0) * speed;
        let velocity_factor = self.velocity_factor(speed);
        let angle_factor = Self::angle_factor(contact.relative_velocity, contact.impact_normal);

        let mut damage = momentum
            * self.constants.damage_per_momentum
            * self.type_multiplier(object_type)
            * velocity_factor
            * angle_factor
            / Self::armor_factor(own.armor_class);

        let ramming = object_type == CollisionObjectType::Ship;
        if ramming {
            let mass_ratio = if own.mass > 0.0 {
                (contact.other.mass / own.mass).clamp(0.1, 10.0)
            } else {
                10.0
            };
            let integrity_penalty = 1.0 + 0.5 * (1.0 - own.integrity.clamp(0.0, 1.0));
            damage *= mass_ratio * integrity_penalty;
        }

        CollisionDamage {
            other: contact.other.handle,
            object_type,
            damage,
            damage_type: DamageType::Kinetic,
            ramming,
            momentum,
            velocity_factor,
            angle_factor,
        }
    }

    /// Resolve a contact. Returns `None` for immune objects, contacts still
    /// on cooldown, and impacts too slow or too weak to matter.
    pub fn process_collision(&mut self, contact: &CollisionContact, own: &ShipDescriptor) -> Option<CollisionDamage> {
        let handle = contact.other.handle;
        if self.immune.contains(&handle) || self.is_on_cooldown(handle) {
            self.stats.ignored_contacts += 1;
            return None;
        }

        if contact.relative_velocity.length() < self.constants.min_velocity {
            self.stats.ignored_contacts += 1;
            return None;
        }

        let result = self.calculate_damage(contact, own);
        if result.damage < self.constants.min_damage {
            self.stats.ignored_contacts += 1;
            return None;
        }

        self.cooldowns.insert(handle, self.constants.cooldown);
        self.stats.collisions += 1;
        self.stats.total_damage += result.damage;
        if result.ramming {
            self.stats.ramming_collisions += 1;
        }

        tracing::debug!(
            "Collision with {:?} ({:?}): {:.2} damage{}",
            handle,
            result.object_type,
            result.damage,
            if result.ramming { " (ramming)" } else { "" }
        );
        Some(result)
    }

    /// Raw hazard damage for a time step
    pub fn hazard_damage(hazard: HazardType, intensity: f64, delta: f64) -> f64 {
        hazard.damage_per_second() * intensity.max(0.0) * delta.max(0.0)
    }

    pub fn is_on_cooldown(&self, handle: ObjectHandle) -> bool {
        self.cooldowns.get(&handle).is_some_and(|t| *t > 0.0)
    }

    pub fn add_immunity(&mut self, handle: ObjectHandle) {
        self.immune.insert(handle);
    }

    pub fn remove_immunity(&mut self, handle: ObjectHandle) -> bool {
        self.immune.remove(&handle)
    }

    pub fn is_immune(&self, handle: ObjectHandle) -> bool {
        self.immune.contains(&handle)
    }

    /// Count down cooldowns and drop the expired ones
    pub fn tick(&mut self, delta: f64) {
        if delta <= 0.0 {
            return;
        }
        for remaining in self.cooldowns.values_mut() {
            *remaining -= delta;
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0.0);
    }

    pub fn active_cooldowns(&self) -> usize {
        self.cooldowns.len()
    }

    pub fn save_data(&self) -> SaveData {
        let mut cooldowns: Vec<(u64, f64)> = self.cooldowns.iter().map(|(h, t)| (h.0, *t)).collect();
        cooldowns.sort_by_key(|(h, _)| *h);
        let mut immune: Vec<u64> = self.immune.iter().map(|h| h.0).collect();
        immune.sort_unstable();

        to_save_data(&CollisionSave {
            cooldowns,
            immune,
            stats: self.stats.clone(),
        })
    }

    pub fn load_save_data(&mut self, data: &SaveData) -> Result<(), DamageError> {
        let save: CollisionSave = from_save_data(data)?;
        self.cooldowns = save
            .cooldowns
            .into_iter()
            .filter(|(_, t)| *t > 0.0)
            .map(|(h, t)| (ObjectHandle(h), t))
            .collect();
        self.immune = save.immune.into_iter().map(ObjectHandle).collect();
        self.stats = save.stats;
        Ok(())
    }
}

impl Default for CollisionDamageSystem {
    fn default() -> Self {
        Self::new(CollisionConstants::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWN: ShipDescriptor = ShipDescriptor {
        mass: 1000.0,
        armor_class: ArmorClass::Standard,
        integrity: 1.0,
    };

    fn head_on(other: CollisionBody, speed: f64) -> CollisionContact {
        CollisionContact {
            other,
            relative_velocity: DVec3::new(0.0, 0.0, -speed),
            impact_position: DVec3::new(0.0, 0.0, 30.0),
            impact_normal: DVec3::Z,
        }
    }

    #[test]
    fn test_classification() {
        let debris = CollisionBody::new(ObjectHandle(1), 10.0).with_tag("Asteroid");
        let mine = CollisionBody::new(ObjectHandle(2), 10.0).with_tag("proximity_mine");
        let crate_body = CollisionBody::new(ObjectHandle(3), 10.0).with_tag("cargo");
        let ship = CollisionBody::ship(ObjectHandle(4), OWN);

        assert_eq!(CollisionDamageSystem::classify(&debris), CollisionObjectType::Debris);
        assert_eq!(CollisionDamageSystem::classify(&mine), CollisionObjectType::Environmental);
        assert_eq!(CollisionDamageSystem::classify(&crate_body), CollisionObjectType::Generic);
        assert_eq!(CollisionDamageSystem::classify(&ship), CollisionObjectType::Ship);
    }

    #[test]
    fn test_debris_damage_formula() {
        let system = CollisionDamageSystem::default();
        let contact = head_on(CollisionBody::new(ObjectHandle(1), 100.0).with_tag("debris"), 125.0);
        let result = system.calculate_damage(&contact, &OWN);

        // 100 * 125 * 0.01 * 0.5 * sqrt(0.25) * 1.5 / 1.5
        assert!((result.damage - 31.25).abs() < 1e-9);
        assert!(!result.ramming);
    }

    #[test]
    fn test_velocity_curve() {
        let system = CollisionDamageSystem::default();
        assert!((system.velocity_factor(1.0) - 0.1).abs() < f64::EPSILON);
        assert!((system.velocity_factor(500.0) - 1.0).abs() < f64::EPSILON);
        assert!((system.velocity_factor(5000.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_angle_bands() {
        let n = DVec3::Z;
        assert!((CollisionDamageSystem::angle_factor(DVec3::new(0.0, 0.0, -10.0), n) - 1.5).abs() < f64::EPSILON);
        assert!((CollisionDamageSystem::angle_factor(DVec3::new(10.0, 0.0, -10.0), n) - 1.0).abs() < f64::EPSILON);
        assert!((CollisionDamageSystem::angle_factor(DVec3::new(10.0, 0.0, 0.0), n) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ramming_scales_with_mass_and_integrity() {
        let system = CollisionDamageSystem::default();
        let rammer = ShipDescriptor {
            mass: 2000.0,
            armor_class: ArmorClass::Heavy,
            integrity: 1.0,
        };
        let contact = head_on(CollisionBody::ship(ObjectHandle(9), rammer), 125.0);

        let healthy = system.calculate_damage(&contact, &OWN);
        let damaged = system.calculate_damage(
            &contact,
            &ShipDescriptor {
                integrity: 0.5,
                ..OWN
            },
        );

        assert!(healthy.ramming);
        // 2000 * 125 * 0.01 * 1.0 * 0.5 * 1.5 / 1.5 * ratio 2
        assert!((healthy.damage - 2500.0).abs() < 1e-6);
        assert!((damaged.damage - healthy.damage * 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_cooldown_blocks_repeat_frames() {
        let mut system = CollisionDamageSystem::default();
        let contact = head_on(CollisionBody::new(ObjectHandle(5), 100.0), 100.0);

        assert!(system.process_collision(&contact, &OWN).is_some());
        assert!(system.process_collision(&contact, &OWN).is_none());

        system.tick(0.6);
        assert_eq!(system.active_cooldowns(), 0);
        assert!(system.process_collision(&contact, &OWN).is_some());
        assert_eq!(system.stats().collisions, 2);
    }

    #[test]
    fn test_immunity() {
        let mut system = CollisionDamageSystem::default();
        system.add_immunity(ObjectHandle(7));
        let contact = head_on(CollisionBody::new(ObjectHandle(7), 100.0), 100.0);
        assert!(system.process_collision(&contact, &OWN).is_none());
        assert!(system.remove_immunity(ObjectHandle(7)));
        assert!(system.process_collision(&contact, &OWN).is_some());
    }

    #[test]
    fn test_slow_contact_ignored() {
        let mut system = CollisionDamageSystem::default();
        let contact = head_on(CollisionBody::new(ObjectHandle(8), 100.0), 0.5);
        assert!(system.process_collision(&contact, &OWN).is_none());
        assert!(!system.is_on_cooldown(ObjectHandle(8)));
    }

    #[test]
    fn test_hazard_damage() {
        let damage = CollisionDamageSystem::hazard_damage(HazardType::StellarCorona, 0.5, 2.0);
        assert!((damage - 10.0).abs() < f64::EPSILON);
        assert_eq!(HazardType::PlasmaStorm.damage_type(), DamageType::Plasma);
    }

    #[test]
    fn test_save_round_trip() {
        let mut system = CollisionDamageSystem::default();
        system.add_immunity(ObjectHandle(3));
        system.process_collision(&head_on(CollisionBody::new(ObjectHandle(1), 100.0), 100.0), &OWN);

        let data = system.save_data();
        let mut restored = CollisionDamageSystem::default();
        restored.load_save_data(&data).unwrap();
        assert!(restored.is_immune(ObjectHandle(3)));
        assert!(restored.is_on_cooldown(ObjectHandle(1)));
        assert_eq!(restored.stats(), system.stats());
    }
}
