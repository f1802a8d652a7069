//! Static ship-class records

use super::ConfigError;
use crate::types::{ArmorClass, ShipType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Per-archetype ship data, read once at spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipClass {
    /// Unique identifier (e.g., "escort_frigate")
    pub id: String,
    /// Display name
    pub name: String,
    pub ship_type: ShipType,
    /// Mass in tonnes, used for ramming
    pub mass: f64,
    pub max_hull: f64,
    /// Total shield capacity across all four quadrants
    pub max_shield: f64,
    pub armor_type: ArmorClass,
    /// Shield recharge per second across all quadrants
    pub shield_recharge_rate: f64,
    /// Nominal armor thickness before zone multipliers
    #[serde(default = "default_armor_thickness")]
    pub armor_thickness: f64,
}

fn default_armor_thickness() -> f64 {
    10.0
}

impl ShipClass {
    /// Minimal class used by tests and tools
    pub fn new(id: &str, ship_type: ShipType, max_hull: f64, max_shield: f64, armor_type: ArmorClass) -> Self {
        ShipClass {
            id: id.to_string(),
            name: id.to_string(),
            ship_type,
            mass: 1000.0,
            max_hull,
            max_shield,
            armor_type,
            shield_recharge_rate: max_shield * 0.05,
            armor_thickness: default_armor_thickness(),
        }
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_armor_thickness(mut self, thickness: f64) -> Self {
        self.armor_thickness = thickness;
        self
    }

    pub fn with_recharge_rate(mut self, rate: f64) -> Self {
        self.shield_recharge_rate = rate;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hull <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "ship class '{}' must have positive max_hull",
                self.id
            )));
        }
        if self.max_shield < 0.0 || self.mass <= 0.0 || self.armor_thickness < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "ship class '{}' has negative shield, mass or armor thickness",
                self.id
            )));
        }
        Ok(())
    }
}

/// Ship class registry
#[derive(Debug, Clone, Default)]
pub struct ShipClassRegistry {
    classes: HashMap<String, ShipClass>,
}

impl ShipClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ShipClassRegistry {
            classes: HashMap::new(),
        }
    }

    /// Register a ship class
    pub fn register(&mut self, class: ShipClass) {
        self.classes.insert(class.id.clone(), class);
    }

    /// Get a ship class by ID
    pub fn get(&self, id: &str) -> Option<&ShipClass> {
        self.classes.get(id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Sorted class IDs
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.classes.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Load the built-in archetypes
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(ShipClass {
            id: "interceptor".to_string(),
            name: "Interceptor".to_string(),
            ship_type: ShipType::Fighter,
            mass: 40.0,
            max_hull: 100.0,
            max_shield: 60.0,
            armor_type: ArmorClass::Light,
            shield_recharge_rate: 6.0,
            armor_thickness: 4.0,
        });

        registry.register(ShipClass {
            id: "patrol_corvette".to_string(),
            name: "Patrol Corvette".to_string(),
            ship_type: ShipType::Corvette,
            mass: 400.0,
            max_hull: 400.0,
            max_shield: 200.0,
            armor_type: ArmorClass::Standard,
            shield_recharge_rate: 12.0,
            armor_thickness: 8.0,
        });

        registry.register(ShipClass {
            id: "escort_frigate".to_string(),
            name: "Escort Frigate".to_string(),
            ship_type: ShipType::Frigate,
            mass: 1500.0,
            max_hull: 1000.0,
            max_shield: 500.0,
            armor_type: ArmorClass::Standard,
            shield_recharge_rate: 20.0,
            armor_thickness: 12.0,
        });

        registry.register(ShipClass {
            id: "line_destroyer".to_string(),
            name: "Line Destroyer".to_string(),
            ship_type: ShipType::Destroyer,
            mass: 4000.0,
            max_hull: 2000.0,
            max_shield: 900.0,
            armor_type: ArmorClass::Heavy,
            shield_recharge_rate: 30.0,
            armor_thickness: 18.0,
        });

        registry.register(ShipClass {
            id: "heavy_cruiser".to_string(),
            name: "Heavy Cruiser".to_string(),
            ship_type: ShipType::Cruiser,
            mass: 12000.0,
            max_hull: 4500.0,
            max_shield: 2000.0,
            armor_type: ArmorClass::Heavy,
            shield_recharge_rate: 45.0,
            armor_thickness: 25.0,
        });

        registry.register(ShipClass {
            id: "dreadnought".to_string(),
            name: "Dreadnought".to_string(),
            ship_type: ShipType::Battleship,
            mass: 50000.0,
            max_hull: 12000.0,
            max_shield: 5000.0,
            armor_type: ArmorClass::Capital,
            shield_recharge_rate: 80.0,
            armor_thickness: 40.0,
        });

        registry.register(ShipClass {
            id: "fleet_carrier".to_string(),
            name: "Fleet Carrier".to_string(),
            ship_type: ShipType::Carrier,
            mass: 60000.0,
            max_hull: 10000.0,
            max_shield: 6000.0,
            armor_type: ArmorClass::Capital,
            shield_recharge_rate: 90.0,
            armor_thickness: 30.0,
        });

        registry
    }
}

/// Container for ship class definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipClassesConfig {
    pub ship_classes: Vec<ShipClass>,
}

fn build_registry(config: ShipClassesConfig) -> Result<ShipClassRegistry, ConfigError> {
    let mut registry = ShipClassRegistry::new();
    for class in config.ship_classes {
        class.validate()?;
        registry.register(class);
    }
    Ok(registry)
}

/// Load ship classes from a TOML file
pub fn load_ship_classes(path: &Path) -> Result<ShipClassRegistry, ConfigError> {
    build_registry(super::load_toml(path)?)
}

/// Load ship classes from a TOML string
pub fn parse_ship_classes(content: &str) -> Result<ShipClassRegistry, ConfigError> {
    build_registry(super::parse_toml(content)?)
}
