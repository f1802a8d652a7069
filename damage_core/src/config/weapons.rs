//! Static weapon records

use super::ConfigError;
use crate::types::{AmmunitionType, DamageType, WeaponHit, WeaponType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Per-weapon data supplied by the asset layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponRecord {
    pub id: String,
    pub name: String,
    pub weapon_type: WeaponType,
    /// Damage per hit
    pub damage: f64,
    pub damage_type: DamageType,
    pub penetration_power: f64,
    /// Projectile velocity (m/s)
    pub velocity: f64,
    pub optimal_range: f64,
    pub max_range: f64,
    /// Extra critical-hit chance (0.0 - 1.0)
    #[serde(default)]
    pub critical_bonus: f64,
    #[serde(default)]
    pub ammunition: AmmunitionType,
}

impl WeaponRecord {
    /// Build the per-hit descriptor for a shot fired at `range`
    pub fn hit_at(&self, range: f64) -> WeaponHit {
        WeaponHit {
            weapon_type: self.weapon_type,
            ammunition: self.ammunition,
            penetration_power: self.penetration_power,
            critical_bonus: self.critical_bonus,
            range,
            optimal_range: self.optimal_range,
            max_range: self.max_range,
            reference_velocity: self.velocity,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.damage < 0.0 || self.penetration_power < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "weapon '{}' has negative damage or penetration",
                self.id
            )));
        }
        if self.max_range < self.optimal_range {
            return Err(ConfigError::ValidationError(format!(
                "weapon '{}' max_range is below optimal_range",
                self.id
            )));
        }
        Ok(())
    }
}

/// Weapon registry
#[derive(Debug, Clone, Default)]
pub struct WeaponRegistry {
    weapons: HashMap<String, WeaponRecord>,
}

impl WeaponRegistry {
    pub fn new() -> Self {
        WeaponRegistry {
            weapons: HashMap::new(),
        }
    }

    pub fn register(&mut self, weapon: WeaponRecord) {
        self.weapons.insert(weapon.id.clone(), weapon);
    }

    pub fn get(&self, id: &str) -> Option<&WeaponRecord> {
        self.weapons.get(id)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Weapons sorted by ID
    pub fn all(&self) -> Vec<&WeaponRecord> {
        let mut weapons: Vec<&WeaponRecord> = self.weapons.values().collect();
        weapons.sort_by(|a, b| a.id.cmp(&b.id));
        weapons
    }

    /// Load the built-in weapons
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(WeaponRecord {
            id: "mass_driver".to_string(),
            name: "Mass Driver".to_string(),
            weapon_type: WeaponType::MassDriver,
            damage: 25.0,
            damage_type: DamageType::Kinetic,
            penetration_power: 15.0,
            velocity: 800.0,
            optimal_range: 1500.0,
            max_range: 4000.0,
            critical_bonus: 0.02,
            ammunition: AmmunitionType::Standard,
        });

        registry.register(WeaponRecord {
            id: "railgun".to_string(),
            name: "Railgun".to_string(),
            weapon_type: WeaponType::Railgun,
            damage: 80.0,
            damage_type: DamageType::Kinetic,
            penetration_power: 45.0,
            velocity: 3000.0,
            optimal_range: 5000.0,
            max_range: 12000.0,
            critical_bonus: 0.05,
            ammunition: AmmunitionType::ArmorPiercing,
        });

        registry.register(WeaponRecord {
            id: "pulse_laser".to_string(),
            name: "Pulse Laser".to_string(),
            weapon_type: WeaponType::Laser,
            damage: 18.0,
            damage_type: DamageType::Energy,
            penetration_power: 8.0,
            velocity: 0.0,
            optimal_range: 2500.0,
            max_range: 6000.0,
            critical_bonus: 0.01,
            ammunition: AmmunitionType::Standard,
        });

        registry.register(WeaponRecord {
            id: "plasma_cannon".to_string(),
            name: "Plasma Cannon".to_string(),
            weapon_type: WeaponType::PlasmaCannon,
            damage: 60.0,
            damage_type: DamageType::Plasma,
            penetration_power: 20.0,
            velocity: 600.0,
            optimal_range: 1200.0,
            max_range: 3000.0,
            critical_bonus: 0.04,
            ammunition: AmmunitionType::Incendiary,
        });

        registry.register(WeaponRecord {
            id: "missile".to_string(),
            name: "Guided Missile".to_string(),
            weapon_type: WeaponType::Missile,
            damage: 120.0,
            damage_type: DamageType::Explosive,
            penetration_power: 12.0,
            velocity: 400.0,
            optimal_range: 8000.0,
            max_range: 15000.0,
            critical_bonus: 0.03,
            ammunition: AmmunitionType::HighExplosive,
        });

        registry.register(WeaponRecord {
            id: "torpedo".to_string(),
            name: "Heavy Torpedo".to_string(),
            weapon_type: WeaponType::Torpedo,
            damage: 400.0,
            damage_type: DamageType::Explosive,
            penetration_power: 30.0,
            velocity: 250.0,
            optimal_range: 6000.0,
            max_range: 10000.0,
            critical_bonus: 0.08,
            ammunition: AmmunitionType::HighExplosive,
        });

        registry.register(WeaponRecord {
            id: "ion_cannon".to_string(),
            name: "Ion Cannon".to_string(),
            weapon_type: WeaponType::IonCannon,
            damage: 35.0,
            damage_type: DamageType::Ion,
            penetration_power: 5.0,
            velocity: 0.0,
            optimal_range: 3000.0,
            max_range: 7000.0,
            critical_bonus: 0.0,
            ammunition: AmmunitionType::EmpCharge,
        });

        registry
    }
}

/// Container for weapon definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponsConfig {
    pub weapons: Vec<WeaponRecord>,
}

fn build_registry(config: WeaponsConfig) -> Result<WeaponRegistry, ConfigError> {
    let mut registry = WeaponRegistry::new();
    for weapon in config.weapons {
        weapon.validate()?;
        registry.register(weapon);
    }
    Ok(registry)
}

/// Load weapons from a TOML file
pub fn load_weapons(path: &Path) -> Result<WeaponRegistry, ConfigError> {
    build_registry(super::load_toml(path)?)
}

/// Load weapons from a TOML string
pub fn parse_weapons(content: &str) -> Result<WeaponRegistry, ConfigError> {
    build_registry(super::parse_toml(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_registered() {
        let registry = WeaponRegistry::with_defaults();
        assert_eq!(registry.len(), 7);
        let railgun = registry.get("railgun").unwrap();
        assert_eq!(railgun.weapon_type, WeaponType::Railgun);
        assert_eq!(railgun.ammunition, AmmunitionType::ArmorPiercing);
    }

    #[test]
    fn test_hit_at_carries_range() {
        let registry = WeaponRegistry::with_defaults();
        let hit = registry.get("mass_driver").unwrap().hit_at(2000.0);
        assert!((hit.range - 2000.0).abs() < f64::EPSILON);
        assert!((hit.reference_velocity - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_weapons_with_default_ammo() {
        let toml = r#"
[[weapons]]
id = "flak"
name = "Flak Battery"
weapon_type = "mass_driver"
damage = 10.0
damage_type = "explosive"
penetration_power = 4.0
velocity = 700.0
optimal_range = 800.0
max_range = 2000.0
"#;
        let registry = parse_weapons(toml).unwrap();
        let flak = registry.get("flak").unwrap();
        assert_eq!(flak.ammunition, AmmunitionType::Standard);
        assert!(flak.critical_bonus.abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_ranges_rejected() {
        let toml = r#"
[[weapons]]
id = "broken"
name = "Broken"
weapon_type = "laser"
damage = 10.0
damage_type = "energy"
penetration_power = 4.0
velocity = 0.0
optimal_range = 800.0
max_range = 200.0
"#;
        assert!(matches!(parse_weapons(toml), Err(ConfigError::ValidationError(_))));
    }
}
