//! Weapon penetration - weapon-vs-armor effectiveness with shot modifiers
//!
//! effectiveness = matrix[weapon][armor] * velocity_mod * angle_mod * range_mod * ammo_mod
//!
//! The result is clamped to [0.05, 3.0]. A value above 1.0 means the weapon
//! is better than neutral against this armor; the coordinator divides armor
//! resistance by it.

use super::constants::{MAX_CACHE_ENTRIES, WEAPON_ARMOR_MATRIX};
use super::penetration::PenetrationCalculator;
use crate::types::{AmmunitionType, ArmorClass, WeaponHit, WeaponType};
use std::collections::HashMap;

const MIN_EFFECTIVENESS: f64 = 0.05;
const MAX_EFFECTIVENESS: f64 = 3.0;

/// Outcome of a weapon-vs-armor check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponPenetrationResult {
    pub effectiveness: f64,
    /// Penetration power after effectiveness
    pub effective_power: f64,
    /// Effective power meets the plate thickness
    pub can_penetrate: bool,
}

impl WeaponPenetrationResult {
    /// Factor applied to armor resistance against this weapon
    pub fn resistance_modifier(&self) -> f64 {
        1.0 / self.effectiveness.max(MIN_EFFECTIVENESS)
    }
}

type InteractionKey = (WeaponType, ArmorClass, AmmunitionType, i64, i64, i64);

/// Weapon-vs-armor effectiveness with a bounded interaction cache
#[derive(Debug, Clone, Default)]
pub struct WeaponPenetrationSystem {
    cache: HashMap<InteractionKey, f64>,
}

impl WeaponPenetrationSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base weapon-vs-armor effectiveness
    pub fn matrix_effectiveness(weapon: WeaponType, armor: ArmorClass) -> f64 {
        WEAPON_ARMOR_MATRIX[weapon.index()][armor.index()]
    }

    /// Kinetic weapons gain or lose punch with impact speed
    pub fn velocity_modifier(weapon: WeaponType, impact_speed: f64, reference_velocity: f64) -> f64 {
        if !weapon.is_kinetic() || reference_velocity <= 0.0 {
            return 1.0;
        }
        (impact_speed.max(0.0) / reference_velocity).sqrt().clamp(0.5, 1.5)
    }

    /// Full strength to optimal range, linear to 0.5 at max range, 0.25 beyond
    pub fn range_modifier(range: f64, optimal_range: f64, max_range: f64) -> f64 {
        if range <= optimal_range {
            1.0
        } else if range > max_range {
            0.25
        } else if max_range <= optimal_range {
            0.5
        } else {
            let t = (range - optimal_range) / (max_range - optimal_range);
            1.0 - 0.5 * t
        }
    }

    /// Ammunition bonus or penalty against an armor class
    pub fn ammunition_modifier(ammo: AmmunitionType, armor: ArmorClass) -> f64 {
        let heavy = armor >= ArmorClass::Heavy;
        match ammo {
            AmmunitionType::Standard => 1.0,
            AmmunitionType::ArmorPiercing => {
                if heavy {
                    1.4
                } else {
                    0.9
                }
            }
            AmmunitionType::HighExplosive => {
                if armor <= ArmorClass::Light {
                    1.2
                } else {
                    0.8
                }
            }
            AmmunitionType::Incendiary => 1.1,
            AmmunitionType::EmpCharge => 0.5,
        }
    }

    /// Effectiveness of a weapon hit against armor at an angle
    pub fn effectiveness(
        &mut self,
        weapon: &WeaponHit,
        armor: ArmorClass,
        impact_speed: f64,
        angle_degrees: f64,
    ) -> f64 {
        let velocity_mod = Self::velocity_modifier(weapon.weapon_type, impact_speed, weapon.reference_velocity);
        let range_mod = Self::range_modifier(weapon.range, weapon.optimal_range, weapon.max_range);

        // Modifiers are discretized for the cache: 0.01 velocity/range, 1° angle
        let key = (
            weapon.weapon_type,
            armor,
            weapon.ammunition,
            (velocity_mod * 100.0).round() as i64,
            (range_mod * 100.0).round() as i64,
            angle_degrees.round() as i64,
        );

        if let Some(value) = self.cache.get(&key) {
            return *value;
        }

        let value = (Self::matrix_effectiveness(weapon.weapon_type, armor)
            * (key.3 as f64 / 100.0)
            * (key.4 as f64 / 100.0)
            * PenetrationCalculator::angle_effectiveness(key.5 as f64)
            * Self::ammunition_modifier(weapon.ammunition, armor))
        .clamp(MIN_EFFECTIVENESS, MAX_EFFECTIVENESS);

        if self.cache.len() >= MAX_CACHE_ENTRIES {
            self.cache.clear();
        }
        self.cache.insert(key, value);
        value
    }

    /// Full check: effectiveness plus whether the round beats the plate
    pub fn evaluate(
        &mut self,
        weapon: &WeaponHit,
        armor: ArmorClass,
        thickness: f64,
        impact_speed: f64,
        angle_degrees: f64,
    ) -> WeaponPenetrationResult {
        let effectiveness = self.effectiveness(weapon, armor, impact_speed, angle_degrees);
        let effective_power = weapon.penetration_power * effectiveness;
        WeaponPenetrationResult {
            effectiveness,
            effective_power,
            can_penetrate: effective_power >= PenetrationCalculator::effective_thickness(thickness, angle_degrees),
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn railgun() -> WeaponHit {
        WeaponHit {
            weapon_type: WeaponType::Railgun,
            ammunition: AmmunitionType::Standard,
            penetration_power: 45.0,
            critical_bonus: 0.0,
            range: 1000.0,
            optimal_range: 5000.0,
            max_range: 12000.0,
            reference_velocity: 3000.0,
        }
    }

    #[test]
    fn test_neutral_shot_reads_matrix() {
        let mut system = WeaponPenetrationSystem::new();
        let e = system.effectiveness(&railgun(), ArmorClass::Heavy, 3000.0, 0.0);
        assert!((e - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_resistance_modifier_inverts_effectiveness() {
        let mut system = WeaponPenetrationSystem::new();
        let result = system.evaluate(&railgun(), ArmorClass::Heavy, 10.0, 3000.0, 0.0);
        assert!((result.resistance_modifier() * result.effectiveness - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_only_for_kinetic() {
        assert!((WeaponPenetrationSystem::velocity_modifier(WeaponType::Laser, 10.0, 3000.0) - 1.0).abs() < f64::EPSILON);
        // 750 / 3000 = 0.25 -> sqrt 0.5
        assert!((WeaponPenetrationSystem::velocity_modifier(WeaponType::Railgun, 750.0, 3000.0) - 0.5).abs() < 1e-12);
        // Clamped at 1.5
        assert!((WeaponPenetrationSystem::velocity_modifier(WeaponType::MassDriver, 1e6, 800.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_range_falloff() {
        assert!((WeaponPenetrationSystem::range_modifier(500.0, 1000.0, 3000.0) - 1.0).abs() < f64::EPSILON);
        assert!((WeaponPenetrationSystem::range_modifier(2000.0, 1000.0, 3000.0) - 0.75).abs() < 1e-12);
        assert!((WeaponPenetrationSystem::range_modifier(3000.0, 1000.0, 3000.0) - 0.5).abs() < 1e-12);
        assert!((WeaponPenetrationSystem::range_modifier(5000.0, 1000.0, 3000.0) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_armor_piercing_vs_heavy() {
        assert!((WeaponPenetrationSystem::ammunition_modifier(AmmunitionType::ArmorPiercing, ArmorClass::Capital) - 1.4).abs() < f64::EPSILON);
        assert!((WeaponPenetrationSystem::ammunition_modifier(AmmunitionType::ArmorPiercing, ArmorClass::Light) - 0.9).abs() < f64::EPSILON);
        assert!((WeaponPenetrationSystem::ammunition_modifier(AmmunitionType::HighExplosive, ArmorClass::None) - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_effectiveness_clamped() {
        let mut system = WeaponPenetrationSystem::new();
        let mut ion = railgun();
        ion.weapon_type = WeaponType::IonCannon;
        ion.ammunition = AmmunitionType::EmpCharge;
        ion.range = 50_000.0;
        let e = system.effectiveness(&ion, ArmorClass::SuperCapital, 0.0, 85.0);
        assert!((e - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_can_penetrate() {
        let mut system = WeaponPenetrationSystem::new();
        let result = system.evaluate(&railgun(), ArmorClass::Standard, 30.0, 3000.0, 0.0);
        assert!(result.can_penetrate);
        let result = system.evaluate(&railgun(), ArmorClass::Standard, 100.0, 3000.0, 0.0);
        assert!(!result.can_penetrate);
    }

    #[test]
    fn test_cache_reused() {
        let mut system = WeaponPenetrationSystem::new();
        system.effectiveness(&railgun(), ArmorClass::Heavy, 3000.0, 0.0);
        system.effectiveness(&railgun(), ArmorClass::Heavy, 3000.0, 0.2);
        assert_eq!(system.cache_len(), 1);
    }
}
